use std::fmt;

use super::fields::{i16_at, u32_at};

#[derive(Debug, Clone)]
pub struct WaterDepth {
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub depth: Option<f64>, // meters below transducer
    pub offset: Option<f64>, // meters, positive to waterline, negative to keel
}

impl WaterDepth {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 7 {
            return None;
        }
        Some(Self {
            pgn: 128267,
            sid: data[0],
            depth: u32_at(data, 1).map(|raw| raw as f64 * 0.01),
            offset: i16_at(data, 5).map(|raw| raw as f64 * 0.001),
        })
    }
}

impl fmt::Display for WaterDepth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.depth {
            Some(depth) => write!(f, "      Depth: {:.2} m | Offset: {:.3} m", depth, self.offset.unwrap_or(0.0)),
            None => write!(f, "      Depth: N/A"),
        }
    }
}
