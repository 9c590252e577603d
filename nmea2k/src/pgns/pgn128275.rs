use std::fmt;

use super::fields::u32_at;

const METERS_PER_NM: f64 = 1852.0;

#[derive(Debug, Clone)]
pub struct DistanceLog {
    #[allow(dead_code)]
    pub pgn: u32,
    pub log: Option<f64>,  // meters
    pub trip: Option<f64>, // meters
}

impl DistanceLog {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 14 {
            return None;
        }
        Some(Self {
            pgn: 128275,
            log: u32_at(data, 6).map(|raw| raw as f64),
            trip: u32_at(data, 10).map(|raw| raw as f64),
        })
    }

    pub fn log_nm(&self) -> Option<f64> {
        self.log.map(|m| m / METERS_PER_NM)
    }

    pub fn trip_nm(&self) -> Option<f64> {
        self.trip.map(|m| m / METERS_PER_NM)
    }
}

impl fmt::Display for DistanceLog {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "      Log: {:?} nm | Trip: {:?} nm",
            self.log_nm(),
            self.trip_nm()
        )
    }
}
