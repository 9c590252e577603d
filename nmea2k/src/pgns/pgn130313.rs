use std::fmt;

use super::fields::{i16_at, u8_at};

#[derive(Debug, Clone)]
pub struct Humidity {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub instance: u8,
    pub source: Option<u8>,
    pub actual_humidity: Option<f64>, // percent (0-100%)
    pub set_humidity: Option<f64>,    // percent (0-100%)
}

impl Humidity {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 5 {
            return None;
        }
        Some(Self {
            pgn: 130313,
            sid: data[0],
            instance: data[1],
            source: u8_at(data, 2),
            actual_humidity: i16_at(data, 3).map(|raw| raw as f64 * 0.004),
            set_humidity: i16_at(data, 5).map(|raw| raw as f64 * 0.004),
        })
    }
}

impl fmt::Display for Humidity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "      Humidity: {:?}% (Source: {:?}, Instance: {})",
            self.actual_humidity, self.source, self.instance
        )?;
        if let Some(set) = self.set_humidity {
            write!(f, " | Set: {:.1}%", set)?;
        }
        Ok(())
    }
}
