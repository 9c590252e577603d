use std::fmt;

use super::pgn127245::Rudder;
use super::pgn127250::VesselHeading;
use super::pgn127257::Attitude;
use super::pgn127258::MagneticVariation;
use super::pgn127488::EngineRapidUpdate;
use super::pgn127489::EngineDynamic;
use super::pgn127505::FluidLevel;
use super::pgn127508::BatteryStatus;
use super::pgn128259::SpeedWaterReferenced;
use super::pgn128267::WaterDepth;
use super::pgn128275::DistanceLog;
use super::pgn129025::PositionRapidUpdate;
use super::pgn129026::CogSogRapidUpdate;
use super::pgn129029::GnssPositionData;
use super::pgn129540::GnssSatsInView;
use super::pgn130306::WindData;
use super::pgn130310::EnvironmentalParameters;
use super::pgn130313::Humidity;

fn format_data_bytes(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

// Enum to hold any decoded message type
#[derive(Debug, Clone)]
pub enum N2kMessage {
    Rudder(Rudder),
    VesselHeading(VesselHeading),
    Attitude(Attitude),
    MagneticVariation(MagneticVariation),
    EngineRapidUpdate(EngineRapidUpdate),
    EngineDynamic(EngineDynamic),
    FluidLevel(FluidLevel),
    BatteryStatus(BatteryStatus),
    SpeedWaterReferenced(SpeedWaterReferenced),
    WaterDepth(WaterDepth),
    DistanceLog(DistanceLog),
    PositionRapidUpdate(PositionRapidUpdate),
    CogSogRapidUpdate(CogSogRapidUpdate),
    GnssPositionData(GnssPositionData),
    GnssSatsInView(GnssSatsInView),
    WindData(WindData),
    EnvironmentalParameters(EnvironmentalParameters),
    Humidity(Humidity),
    Unknown(u32, Vec<u8>),
}

impl N2kMessage {
    pub fn from_pgn(pgn: u32, data: &[u8]) -> Self {
        let decoded = match pgn {
            127245 => Rudder::from_bytes(data).map(N2kMessage::Rudder),
            127250 => VesselHeading::from_bytes(data).map(N2kMessage::VesselHeading),
            127257 => Attitude::from_bytes(data).map(N2kMessage::Attitude),
            127258 => MagneticVariation::from_bytes(data).map(N2kMessage::MagneticVariation),
            127488 => EngineRapidUpdate::from_bytes(data).map(N2kMessage::EngineRapidUpdate),
            127489 => EngineDynamic::from_bytes(data).map(N2kMessage::EngineDynamic),
            127505 => FluidLevel::from_bytes(data).map(N2kMessage::FluidLevel),
            127508 => BatteryStatus::from_bytes(data).map(N2kMessage::BatteryStatus),
            128259 => SpeedWaterReferenced::from_bytes(data).map(N2kMessage::SpeedWaterReferenced),
            128267 => WaterDepth::from_bytes(data).map(N2kMessage::WaterDepth),
            128275 => DistanceLog::from_bytes(data).map(N2kMessage::DistanceLog),
            129025 => PositionRapidUpdate::from_bytes(data).map(N2kMessage::PositionRapidUpdate),
            129026 => CogSogRapidUpdate::from_bytes(data).map(N2kMessage::CogSogRapidUpdate),
            129029 => GnssPositionData::from_bytes(data).map(N2kMessage::GnssPositionData),
            129540 => GnssSatsInView::from_bytes(data).map(N2kMessage::GnssSatsInView),
            130306 => WindData::from_bytes(data).map(N2kMessage::WindData),
            130310 => EnvironmentalParameters::from_bytes(data).map(N2kMessage::EnvironmentalParameters),
            130313 => Humidity::from_bytes(data).map(N2kMessage::Humidity),
            _ => None,
        };
        decoded.unwrap_or_else(|| N2kMessage::Unknown(pgn, data.to_vec()))
    }
}

impl fmt::Display for N2kMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            N2kMessage::Rudder(msg) => write!(f, "{}", msg),
            N2kMessage::VesselHeading(msg) => write!(f, "{}", msg),
            N2kMessage::Attitude(msg) => write!(f, "{}", msg),
            N2kMessage::MagneticVariation(msg) => write!(f, "{}", msg),
            N2kMessage::EngineRapidUpdate(msg) => write!(f, "{}", msg),
            N2kMessage::EngineDynamic(msg) => write!(f, "{}", msg),
            N2kMessage::FluidLevel(msg) => write!(f, "{}", msg),
            N2kMessage::BatteryStatus(msg) => write!(f, "{}", msg),
            N2kMessage::SpeedWaterReferenced(msg) => write!(f, "{}", msg),
            N2kMessage::WaterDepth(msg) => write!(f, "{}", msg),
            N2kMessage::DistanceLog(msg) => write!(f, "{}", msg),
            N2kMessage::PositionRapidUpdate(msg) => write!(f, "{}", msg),
            N2kMessage::CogSogRapidUpdate(msg) => write!(f, "{}", msg),
            N2kMessage::GnssPositionData(msg) => write!(f, "{}", msg),
            N2kMessage::GnssSatsInView(msg) => write!(f, "{}", msg),
            N2kMessage::WindData(msg) => write!(f, "{}", msg),
            N2kMessage::EnvironmentalParameters(msg) => write!(f, "{}", msg),
            N2kMessage::Humidity(msg) => write!(f, "{}", msg),
            N2kMessage::Unknown(_pgn, data) => {
                write!(f, "      Raw data: [{}]", format_data_bytes(data))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_known_pgn() {
        let data = [0x00, 0xFF, 0xFF, 0x7F, 0xD1, 0x06, 0xFF, 0xFF];
        assert!(matches!(N2kMessage::from_pgn(127245, &data), N2kMessage::Rudder(_)));
    }

    #[test]
    fn test_short_payload_falls_back_to_unknown() {
        match N2kMessage::from_pgn(127245, &[0x00, 0x01]) {
            N2kMessage::Unknown(pgn, data) => {
                assert_eq!(pgn, 127245);
                assert_eq!(data, vec![0x00, 0x01]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unhandled_pgn_is_unknown() {
        assert!(matches!(N2kMessage::from_pgn(59904, &[0; 3]), N2kMessage::Unknown(59904, _)));
    }
}
