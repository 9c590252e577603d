use std::fmt;

use super::fields::u16_at;

#[derive(Debug, Clone)]
pub struct WindData {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub speed: Option<f64>, // m/s
    pub angle: Option<f64>, // radians
    pub reference: WindReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindReference {
    TrueGroundNorth,
    Magnetic,
    Apparent,
    TrueBoat,
    TrueWater,
    Unavailable,
}

impl WindData {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 6 {
            return None;
        }
        Some(Self {
            pgn: 130306,
            sid: data[0],
            speed: u16_at(data, 1).map(|raw| raw as f64 * 0.01),
            angle: u16_at(data, 3).map(|raw| raw as f64 * 0.0001),
            reference: match data[5] & 0x07 {
                0 => WindReference::TrueGroundNorth,
                1 => WindReference::Magnetic,
                2 => WindReference::Apparent,
                3 => WindReference::TrueBoat,
                4 => WindReference::TrueWater,
                _ => WindReference::Unavailable,
            },
        })
    }

    pub fn speed_knots(&self) -> Option<f64> {
        self.speed.map(|speed| speed * 1.94384)
    }

    pub fn angle_degrees(&self) -> Option<f64> {
        self.angle.map(f64::to_degrees)
    }
}

impl fmt::Display for WindData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "      Wind Speed: {:?} knots | Angle: {:?}° | Ref: {:?}",
            self.speed_knots(),
            self.angle_degrees(),
            self.reference
        )
    }
}
