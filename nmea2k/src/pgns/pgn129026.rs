use std::fmt;

use super::fields::u16_at;

#[derive(Debug, Clone)]
pub struct CogSogRapidUpdate {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub cog_reference: bool, // true = True, false = Magnetic
    pub cog: Option<f64>, // radians
    pub sog: Option<f64>, // m/s
}

impl CogSogRapidUpdate {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        Some(Self {
            pgn: 129026,
            sid: data[0],
            cog_reference: (data[1] & 0x03) == 0,
            cog: u16_at(data, 2).map(|raw| raw as f64 * 0.0001),
            sog: u16_at(data, 4).map(|raw| raw as f64 * 0.01),
        })
    }

    pub fn sog_knots(&self) -> Option<f64> {
        self.sog.map(|s| s * 1.94384)
    }

    pub fn cog_degrees(&self) -> Option<f64> {
        self.cog.map(f64::to_degrees)
    }
}

impl fmt::Display for CogSogRapidUpdate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "      COG: {:?}° ({}) | SOG: {:?} knots",
            self.cog_degrees(),
            if self.cog_reference { "True" } else { "Mag" },
            self.sog_knots()
        )
    }
}
