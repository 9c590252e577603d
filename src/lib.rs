//! Multi-protocol navigation data fusion.
//!
//! NMEA0183 sentences, NMEA2000 PGNs and SignalK deltas are decoded into
//! per-channel candidates; a priority arbiter with sticky device locks picks
//! one value per channel, watchdogs expire quiet sources and derived
//! quantities (true wind, heading conversions, variation) are fed back in.
//!
//! ```no_run
//! use nav_fusion::{FusionConfig, LogListener, NavigationEngine};
//!
//! let mut engine = NavigationEngine::new(FusionConfig::default());
//! engine.add_listener(Box::new(LogListener));
//! engine.push_nmea0183("$IIHDT,123.4,T*26\r\n");
//! engine.tick();
//! ```

pub mod app_metrics;
pub mod arbiter;
pub mod candidate;
pub mod channel;
pub mod config;
pub mod derived;
pub mod engine;
pub mod frame_filter;
pub mod n2k_decoder;
pub mod nmea0183;
pub mod priority;
pub mod publisher;
pub mod signalk;
pub mod udp_broadcaster;
pub mod units;
pub mod utilities;
pub mod watchdog;

pub use channel::Channel;
pub use config::{Config, ConfigError, FusionConfig};
pub use engine::NavigationEngine;
pub use publisher::{ChannelListener, LogListener};
pub use units::Unit;
