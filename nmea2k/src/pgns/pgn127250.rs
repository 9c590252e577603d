use std::fmt;

use super::fields::{i16_at, u16_at};

#[derive(Debug, Clone)]
pub struct VesselHeading {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub heading: Option<f64>, // radians
    pub deviation: Option<f64>,
    pub variation: Option<f64>,
    pub reference: HeadingReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingReference {
    True,
    Magnetic,
    Error,
    Null,
}

impl VesselHeading {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        Some(Self {
            pgn: 127250,
            sid: data[0],
            heading: u16_at(data, 1).map(|raw| raw as f64 * 0.0001),
            deviation: i16_at(data, 3).map(|raw| raw as f64 * 0.0001),
            variation: i16_at(data, 5).map(|raw| raw as f64 * 0.0001),
            reference: match data[7] & 0x03 {
                0 => HeadingReference::True,
                1 => HeadingReference::Magnetic,
                2 => HeadingReference::Error,
                _ => HeadingReference::Null,
            },
        })
    }

    /// Heading in degrees with the sensor deviation applied.
    pub fn corrected_heading_degrees(&self) -> Option<f64> {
        let heading = self.heading?;
        Some((heading + self.deviation.unwrap_or(0.0)).to_degrees())
    }
}

impl fmt::Display for VesselHeading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.heading {
            Some(heading) => write!(f, "      Heading: {:.2}° ({:?})", heading.to_degrees(), self.reference)?,
            None => write!(f, "      Heading: N/A ({:?})", self.reference)?,
        }
        if let Some(dev) = self.deviation {
            write!(f, " | Deviation: {:.2}°", dev.to_degrees())?;
        }
        if let Some(var) = self.variation {
            write!(f, " | Variation: {:.2}°", var.to_degrees())?;
        }
        Ok(())
    }
}
