use std::fmt;

use super::fields::u16_at;

#[derive(Debug, Clone)]
pub struct SpeedWaterReferenced {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub speed: Option<f64>, // m/s
}

impl SpeedWaterReferenced {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 3 {
            return None;
        }
        Some(Self {
            pgn: 128259,
            sid: data[0],
            speed: u16_at(data, 1).map(|raw| raw as f64 * 0.01),
        })
    }

    pub fn speed_knots(&self) -> Option<f64> {
        self.speed.map(|s| s * 1.94384)
    }
}

impl fmt::Display for SpeedWaterReferenced {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.speed {
            Some(speed) => write!(f, "      Speed: {:.2} m/s ({:.2} knots)", speed, speed * 1.94384),
            None => write!(f, "      Speed: N/A"),
        }
    }
}
