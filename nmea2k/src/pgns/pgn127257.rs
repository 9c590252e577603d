use super::fields::i16_at;

#[derive(Debug, Clone)]
pub struct Attitude {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub yaw: Option<f64>,   // radians
    pub pitch: Option<f64>, // radians
    pub roll: Option<f64>,  // radians
}

impl Attitude {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 7 {
            return None;
        }
        Some(Attitude {
            pgn: 127257,
            sid: data[0],
            yaw: i16_at(data, 1).map(|raw| raw as f64 * 0.0001),
            pitch: i16_at(data, 3).map(|raw| raw as f64 * 0.0001),
            roll: i16_at(data, 5).map(|raw| raw as f64 * 0.0001),
        })
    }

    pub fn pitch_degrees(&self) -> Option<f64> {
        self.pitch.map(|p| p.to_degrees())
    }

    pub fn roll_degrees(&self) -> Option<f64> {
        self.roll.map(|r| r.to_degrees())
    }
}

impl std::fmt::Display for Attitude {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let fields = [("Yaw", self.yaw), ("Pitch", self.pitch), ("Roll", self.roll)];
        for (i, (name, value)) in fields.iter().enumerate() {
            let sep = if i == 0 { "      " } else { ", " };
            match value {
                Some(rad) => write!(f, "{}{}: {:.2}° ({:.4} rad)", sep, name, rad.to_degrees(), rad)?,
                None => write!(f, "{}{}: N/A", sep, name)?,
            }
        }
        Ok(())
    }
}
