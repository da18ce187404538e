// Data models for pose landmarks, posture and length measurements

pub mod measurement;
pub mod pose;
