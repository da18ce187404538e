pub mod config;
pub mod ml_models;

// Measurements
pub mod length_measurer;
pub mod posture_checker;
pub mod measurement;
