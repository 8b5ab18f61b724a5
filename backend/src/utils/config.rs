use anyhow::Result;
use std::env;

use crate::constants::DEFAULT_SERVER_PORT;
use crate::models::MatchConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Path to the deployment's tag catalog / weights JSON. Absent means
    /// the built-in catalog (local development).
    pub matching_config_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_SERVER_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_SERVER_PORT),
            matching_config_path: env::var("MATCHING_CONFIG").ok(),
        })
    }

    /// Loads and validates the matching configuration, failing fast on a
    /// malformed catalog instead of matching with silent gaps.
    pub fn load_match_config(&self) -> Result<MatchConfig> {
        match &self.matching_config_path {
            Some(path) => MatchConfig::from_json_file(path),
            None => Ok(MatchConfig::builtin()),
        }
    }
}
