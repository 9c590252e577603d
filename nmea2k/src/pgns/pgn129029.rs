use std::fmt;

use super::fields::{i16_at, i32_at, i64_at, u8_at};
use super::nmea2000_date_time::N2kDateTime;

#[derive(Debug, Clone)]
pub struct GnssPositionData {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub date_time: Option<N2kDateTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
    pub gnss_type: GnssType,
    pub method: GnssMethod,
    #[allow(dead_code)]
    integrity: u8,
    pub num_svs: Option<u8>,
    pub hdop: Option<f64>,
    pub pdop: Option<f64>,
    #[allow(dead_code)]
    geoidal_separation: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GnssType {
    Gps,
    Glonass,
    GpsGlonass,
    GpsSbasWaas,
    GpsSbasWaasDglonass,
    Chayka,
    Integrated,
    Surveyed,
    Galileo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GnssMethod {
    NoGnss,
    GnssFix,
    DGnss,
    PreciseGnss,
    RtkFixed,
    RtkFloat,
    Estimated,
    Manual,
    Simulated,
}

impl GnssPositionData {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 43 {
            return None;
        }
        Some(Self {
            pgn: 129029,
            sid: data[0],
            date_time: N2kDateTime::read(data, 1),
            latitude: i64_at(data, 7).map(|raw| raw as f64 * 1e-16),
            longitude: i64_at(data, 15).map(|raw| raw as f64 * 1e-16),
            altitude: i64_at(data, 23).map(|raw| raw as f64 * 1e-6),
            gnss_type: match data[31] & 0x0F {
                0 => GnssType::Gps,
                1 => GnssType::Glonass,
                2 => GnssType::GpsGlonass,
                3 => GnssType::GpsSbasWaas,
                4 => GnssType::GpsSbasWaasDglonass,
                5 => GnssType::Chayka,
                6 => GnssType::Integrated,
                7 => GnssType::Surveyed,
                8 => GnssType::Galileo,
                _ => GnssType::Gps,
            },
            method: match (data[31] >> 4) & 0x0F {
                1 => GnssMethod::GnssFix,
                2 => GnssMethod::DGnss,
                3 => GnssMethod::PreciseGnss,
                4 => GnssMethod::RtkFixed,
                5 => GnssMethod::RtkFloat,
                6 => GnssMethod::Estimated,
                7 => GnssMethod::Manual,
                8 => GnssMethod::Simulated,
                _ => GnssMethod::NoGnss,
            },
            integrity: data[32] & 0x03,
            num_svs: u8_at(data, 33),
            hdop: i16_at(data, 34).map(|raw| raw as f64 * 0.01),
            pdop: i16_at(data, 36).map(|raw| raw as f64 * 0.01),
            geoidal_separation: i32_at(data, 38).map(|raw| raw as f64 * 0.01),
        })
    }

    /// A position is only meaningful when the receiver reports a fix.
    pub fn has_fix(&self) -> bool {
        !matches!(self.method, GnssMethod::NoGnss | GnssMethod::Simulated)
    }
}

impl fmt::Display for GnssPositionData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "      Position: {:?}°, {:?}° Satellites: {:?} Type: {:?} Method: {:?} HDOP: {:?} PDOP: {:?}",
            self.latitude, self.longitude, self.num_svs, self.gnss_type, self.method, self.hdop, self.pdop
        )
    }
}
