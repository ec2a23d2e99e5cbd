//! Runtime configuration loaded from TOML.
//!
//! ```toml
//! log_filter = "debug"
//! name_limit = 64
//! driver = "sim"          # or "vendor"
//!
//! [vendor]
//! library = "TactorInterface.dll"
//!
//! [simulator]
//! devices = ["TDK-USB-0", "TDK-USB-1"]
//! tactors_per_device = 8
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TactorError};

/// Environment variable naming a config file to load when no path is given.
pub const CONFIG_ENV: &str = "TACTOR_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TactorConfig {
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Size of the host string buffer, terminator included. Names longer
    /// than `name_limit - 1` characters are truncated.
    pub name_limit: usize,
    /// Which driver the host talks to.
    pub driver: DriverKind,
    /// Settings for the vendor library driver.
    pub vendor: VendorConfig,
    /// Settings for the in-process simulated driver.
    pub simulator: SimulatorConfig,
}

/// Driver selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// In-process simulator.
    #[default]
    Sim,
    /// The vendor device-interface library, loaded at runtime.
    Vendor,
}

/// Vendor library settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Path or bare file name of the vendor library.
    pub library: PathBuf,
}

impl Default for VendorConfig {
    fn default() -> Self {
        let name = if cfg!(windows) {
            "TactorInterface.dll"
        } else {
            "libTactorInterface.so"
        };
        Self {
            library: PathBuf::from(name),
        }
    }
}

impl Default for TactorConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            name_limit: 64,
            driver: DriverKind::default(),
            vendor: VendorConfig::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}

/// Simulated driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Device names reported by discovery.
    pub devices: Vec<String>,
    /// Number of addressable tactors on each simulated device.
    pub tactors_per_device: i32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            devices: vec!["DEV0".to_string()],
            tactors_per_device: 8,
        }
    }
}

impl TactorConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loaded config from {}", path.display());
        Self::from_toml(&text)
    }

    /// Load from `path`, else from `$TACTOR_CONFIG`, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(env_path) => Self::load(Path::new(&env_path)),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name_limit < 2 {
            return Err(TactorError::Config(format!(
                "name_limit must be at least 2, got {}",
                self.name_limit
            )));
        }
        if self.simulator.tactors_per_device < 1 {
            return Err(TactorError::Config(format!(
                "simulator.tactors_per_device must be positive, got {}",
                self.simulator.tactors_per_device
            )));
        }
        Ok(())
    }

    /// Truncate a host string to what fits in the name buffer.
    pub fn clip_name<'a>(&self, name: &'a str) -> &'a str {
        let max = self.name_limit.saturating_sub(1);
        match name.char_indices().nth(max) {
            Some((idx, _)) => &name[..idx],
            None => name,
        }
    }
}
