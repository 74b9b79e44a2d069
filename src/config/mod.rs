/// Database configuration and connection management
pub mod database;

/// Service settings and seed catalog loading from config.toml
pub mod settings;

/// Admin user configuration from environment variables
pub mod users;
