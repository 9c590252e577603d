mod fields;

pub mod message;
pub mod nmea2000_date_time;
pub mod pgn127245;
pub mod pgn127250;
pub mod pgn127257;
pub mod pgn127258;
pub mod pgn127488;
pub mod pgn127489;
pub mod pgn127505;
pub mod pgn127508;
pub mod pgn128259;
pub mod pgn128267;
pub mod pgn128275;
pub mod pgn129025;
pub mod pgn129026;
pub mod pgn129029;
pub mod pgn129540;
pub mod pgn130306;
pub mod pgn130310;
pub mod pgn130313;

// Re-export commonly used types
pub use message::N2kMessage;
pub use nmea2000_date_time::N2kDateTime;
pub use pgn127245::Rudder;
pub use pgn127250::{HeadingReference, VesselHeading};
pub use pgn127257::Attitude;
pub use pgn127258::MagneticVariation;
pub use pgn127488::EngineRapidUpdate;
pub use pgn127489::EngineDynamic;
pub use pgn127505::{FluidKind, FluidLevel};
pub use pgn127508::BatteryStatus;
pub use pgn128259::SpeedWaterReferenced;
pub use pgn128267::WaterDepth;
pub use pgn128275::DistanceLog;
pub use pgn129025::PositionRapidUpdate;
pub use pgn129026::CogSogRapidUpdate;
pub use pgn129029::{GnssMethod, GnssPositionData, GnssType};
pub use pgn129540::{GnssSatsInView, SatelliteInfo};
pub use pgn130306::{WindData, WindReference};
pub use pgn130310::EnvironmentalParameters;
pub use pgn130313::Humidity;
