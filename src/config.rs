use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::units::UnitPreferences;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// SocketCAN interface carrying NMEA2000; no CAN input when absent
    #[serde(default)]
    pub can_interface: Option<String>,
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub source_filter: SourceFilterConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory where log files will be stored
    pub directory: String,
    /// Log file name prefix (date will be appended)
    pub file_prefix: String,
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: "./logs".to_string(),
            file_prefix: "nav_fusion".to_string(),
            level: "info".to_string(),
        }
    }
}

/// UDP listeners for the text protocols.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Bind address for NMEA0183 sentences, e.g. "0.0.0.0:10110"
    pub nmea0183_udp: Option<String>,
    /// Bind address for SignalK delta datagrams
    pub signalk_udp: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            nmea0183_udp: Some("0.0.0.0:10110".to_string()),
            signalk_udp: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub enabled: bool,
    pub destination: String,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            destination: "255.255.255.255:10120".to_string(),
        }
    }
}

/// Everything the fusion engine itself reads; replaced wholesale at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub units: UnitPreferences,
    /// Instance 0 is the port engine rather than the only one
    pub dual_engine: bool,
    /// Compute true wind against SOG/COG instead of STW
    pub true_wind_over_ground: bool,
    /// Metres added to every transducer depth (negative for below keel)
    pub depth_offset: f64,
    pub sog_damping_seconds: f64,
    pub cog_damping_seconds: f64,
    pub navigation_timeout_ticks: u32,
    pub ambient_timeout_ticks: u32,
    /// SignalK self URN; learnt from the server hello when absent
    pub signalk_self: Option<String>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            units: UnitPreferences::default(),
            dual_engine: false,
            true_wind_over_ground: false,
            depth_offset: 0.0,
            sog_damping_seconds: 0.0,
            cog_damping_seconds: 0.0,
            navigation_timeout_ticks: 6,
            ambient_timeout_ticks: 20,
            signalk_self: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceFilterConfig {
    /// Map of PGN to allowed source address
    /// If a PGN is present in this map, only messages from the specified source will be accepted
    /// If a PGN is not in the map, all sources are accepted
    #[serde(default)]
    pub pgn_source_map: HashMap<u32, u8>,
}

impl SourceFilterConfig {
    /// Returns true if no filter is configured for this PGN or the source matches it
    pub fn should_accept(&self, pgn: u32, source: u8) -> bool {
        match self.pgn_source_map.get(&pgn) {
            Some(&allowed_source) => source == allowed_source,
            None => true,
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, unit, dimension) in self.units.entries() {
            if unit.dimension() != dimension {
                return Err(ConfigError::Invalid(format!(
                    "unit preference '{}' cannot be {:?}",
                    name, unit
                )));
            }
        }
        if self.navigation_timeout_ticks == 0 || self.ambient_timeout_ticks == 0 {
            return Err(ConfigError::Invalid("watchdog timeouts must be at least one tick".to_string()));
        }
        for (name, seconds) in [
            ("sog_damping_seconds", self.sog_damping_seconds),
            ("cog_damping_seconds", self.cog_damping_seconds),
        ] {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(ConfigError::Invalid(format!("{} must be a non-negative number", name)));
            }
        }
        if !self.depth_offset.is_finite() {
            return Err(ConfigError::Invalid("depth_offset must be finite".to_string()));
        }
        Ok(())
    }
}

impl Config {
    /// Load and validate configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(interface) = &self.can_interface {
            if interface.trim().is_empty() {
                return Err(ConfigError::Invalid("CAN interface name is empty".to_string()));
            }
        }
        if self.broadcast.enabled && self.broadcast.destination.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "broadcast destination '{}' is not an address:port",
                self.broadcast.destination
            )));
        }
        for address in [&self.inputs.nmea0183_udp, &self.inputs.signalk_udp].into_iter().flatten() {
            if address.parse::<std::net::SocketAddr>().is_err() {
                return Err(ConfigError::Invalid(format!("input address '{}' is not an address:port", address)));
            }
        }
        self.fusion.validate()
    }
}
