use std::fmt;

use super::fields::i16_at;

#[derive(Debug, Clone)]
pub struct MagneticVariation {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub source: u8,
    pub variation: Option<f64>, // radians, east positive
}

impl MagneticVariation {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 6 {
            return None;
        }
        Some(Self {
            pgn: 127258,
            sid: data[0],
            source: data[1] & 0x0F,
            variation: i16_at(data, 4).map(|raw| raw as f64 * 0.0001),
        })
    }

    pub fn variation_degrees(&self) -> Option<f64> {
        self.variation.map(f64::to_degrees)
    }
}

impl fmt::Display for MagneticVariation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.variation_degrees() {
            Some(var) => write!(f, "      Variation: {:.2}° (Source: {})", var, self.source),
            None => write!(f, "      Variation: N/A (Source: {})", self.source),
        }
    }
}
