use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Environment variable that selects the deployment environment.
pub const ENV_VAR: &str = "STOREWATCH_ENV";

/// Represents the different deployment environments available for the CLI.
#[derive(Clone, Default, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development environment.
    Local,
    /// Staging environment for pre-production testing.
    Staging,
    /// Production hub environment.
    #[default]
    Production,
}

impl Environment {
    /// Returns the backend hub URL associated with the environment.
    pub fn hub_url(&self) -> String {
        match self {
            Environment::Local => "http://localhost:8069".to_string(),
            Environment::Staging => "https://staging.hub.storewatch.dev".to_string(),
            Environment::Production => "https://hub.storewatch.dev".to_string(),
        }
    }

    /// Resolves the environment from `STOREWATCH_ENV`, falling back to the default.
    pub fn from_env() -> Self {
        std::env::var(ENV_VAR)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            _ => Err(()),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "Local"),
            Environment::Staging => write!(f, "Staging"),
            Environment::Production => write!(f, "Production"),
        }
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Environment::{}, URL: {}", self, self.hub_url())
    }
}
