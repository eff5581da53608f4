// Frameworks layer: configuration and runtime bootstrap.

pub mod bootstrap;
pub mod config;
