//! Server configuration.

use clap::ValueEnum;
use std::fmt;

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "powerpoint-mcp";

/// Which backend the selector may choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendPreference {
    /// Live automation on Windows, the file backend elsewhere.
    #[default]
    Auto,
    /// Only a running PowerPoint.
    Live,
    /// Only the `.pptx` file backend.
    Pptx,
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendPreference::Auto => "auto",
            BackendPreference::Live => "live",
            BackendPreference::Pptx => "pptx",
        };
        f.write_str(name)
    }
}

/// Settings the server runs with, resolved from the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub backend: BackendPreference,
    pub name: String,
    pub version: String,
}

impl ServerConfig {
    pub fn new(backend: BackendPreference) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Description of this server build, reported by `get_platform_info`.
    pub fn runtime_description(&self) -> String {
        format!(
            "{} {} ({}-{})",
            self.name,
            self.version,
            std::env::consts::ARCH,
            std::env::consts::OS
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Auto,
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
