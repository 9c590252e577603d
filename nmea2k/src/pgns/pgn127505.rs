use std::fmt;

use super::fields::{i16_at, u32_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluidKind {
    Fuel,
    FreshWater,
    WasteWater,
    LiveWell,
    Oil,
    BlackWater,
    Other(u8),
}

impl FluidKind {
    fn from_code(code: u8) -> Self {
        match code {
            0 => FluidKind::Fuel,
            1 => FluidKind::FreshWater,
            2 => FluidKind::WasteWater,
            3 => FluidKind::LiveWell,
            4 => FluidKind::Oil,
            5 => FluidKind::BlackWater,
            other => FluidKind::Other(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FluidLevel {
    #[allow(dead_code)]
    pub pgn: u32,
    pub instance: u8,
    pub fluid: FluidKind,
    pub level: Option<f64>,    // percent
    pub capacity: Option<f64>, // litres
}

impl FluidLevel {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 7 {
            return None;
        }
        Some(Self {
            pgn: 127505,
            instance: data[0] & 0x0F,
            fluid: FluidKind::from_code(data[0] >> 4),
            level: i16_at(data, 1).map(|raw| raw as f64 * 0.004),
            capacity: u32_at(data, 3).map(|raw| raw as f64 * 0.1),
        })
    }
}

impl fmt::Display for FluidLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "      Tank {:?} #{}: ", self.fluid, self.instance)?;
        match self.level {
            Some(level) => write!(f, "{:.1}%", level)?,
            None => write!(f, "N/A")?,
        }
        if let Some(capacity) = self.capacity {
            write!(f, " of {:.0} L", capacity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fluid_level_from_bytes() {
        // fresh water (1) instance 2, 62.5 % (15625 * 0.004), 200 L
        let mut data = vec![0x12];
        data.extend_from_slice(&15625i16.to_le_bytes());
        data.extend_from_slice(&2000u32.to_le_bytes());
        data.push(0xFF);
        let msg = FluidLevel::from_bytes(&data).unwrap();
        assert_eq!(msg.fluid, FluidKind::FreshWater);
        assert_eq!(msg.instance, 2);
        assert!((msg.level.unwrap() - 62.5).abs() < 1e-9);
        assert!((msg.capacity.unwrap() - 200.0).abs() < 1e-9);
    }
}
