// Platform integrations for external inference backends

pub mod pose;
