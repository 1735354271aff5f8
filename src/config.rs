//! Application configuration management.
//!
//! Configuration is loaded from environment variables (optionally via a
//! `.env` file) and deserialized into a type-safe struct with the `envy`
//! crate.

use serde::Deserialize;

/// Runtime configuration for the ledger host process.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Attempts to load a `.env` file first (optional, ignored when absent),
    /// then deserializes the environment into a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a value cannot be
    /// parsed into its expected type.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names map to upper-case env vars: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}
