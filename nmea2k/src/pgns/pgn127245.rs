use std::fmt;

use super::fields::{i16_at, u8_at};

#[derive(Debug, Clone)]
pub struct Rudder {
    #[allow(dead_code)]
    pub pgn: u32,
    pub instance: u8,
    pub angle_order: Option<f64>, // radians
    pub position: Option<f64>,    // radians, positive to starboard
}

impl Rudder {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 6 {
            return None;
        }
        Some(Self {
            pgn: 127245,
            instance: u8_at(data, 0).unwrap_or(0),
            angle_order: i16_at(data, 2).map(|raw| raw as f64 * 0.0001),
            position: i16_at(data, 4).map(|raw| raw as f64 * 0.0001),
        })
    }

    pub fn position_degrees(&self) -> Option<f64> {
        self.position.map(f64::to_degrees)
    }
}

impl fmt::Display for Rudder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "      Rudder #{}: ", self.instance)?;
        match self.position_degrees() {
            Some(angle) => write!(f, "{:.1}°", angle),
            None => write!(f, "N/A"),
        }
    }
}
