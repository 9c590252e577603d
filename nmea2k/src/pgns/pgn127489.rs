use std::fmt;

use super::fields::{i16_at, u16_at, u32_at, u8_at};

/// Engine parameters, dynamic (fast-packet, 26 bytes)
#[derive(Debug, Clone)]
pub struct EngineDynamic {
    #[allow(dead_code)]
    pub pgn: u32,
    pub engine_instance: u8,
    pub oil_pressure: Option<f64>,        // Pa
    pub oil_temperature: Option<f64>,     // Kelvin
    pub coolant_temperature: Option<f64>, // Kelvin
    pub alternator_potential: Option<f64>, // volts
    pub fuel_rate: Option<f64>,           // L/h
    pub total_engine_hours: Option<u32>,  // seconds
}

impl EngineDynamic {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 15 {
            return None;
        }
        Some(Self {
            pgn: 127489,
            engine_instance: u8_at(data, 0)?,
            oil_pressure: u16_at(data, 1).map(|raw| raw as f64 * 100.0),
            oil_temperature: u16_at(data, 3).map(|raw| raw as f64 * 0.1),
            coolant_temperature: u16_at(data, 5).map(|raw| raw as f64 * 0.01),
            alternator_potential: i16_at(data, 7).map(|raw| raw as f64 * 0.01),
            fuel_rate: i16_at(data, 9).map(|raw| raw as f64 * 0.1),
            total_engine_hours: u32_at(data, 11),
        })
    }

    pub fn engine_hours(&self) -> Option<f64> {
        self.total_engine_hours.map(|secs| secs as f64 / 3600.0)
    }
}

impl fmt::Display for EngineDynamic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Engine #{}:", self.engine_instance)?;
        if let Some(p) = self.oil_pressure {
            write!(f, " Oil: {:.0} Pa", p)?;
        }
        if let Some(t) = self.coolant_temperature {
            write!(f, " | Coolant: {:.1}°C", t - 273.15)?;
        }
        if let Some(v) = self.alternator_potential {
            write!(f, " | Alternator: {:.2} V", v)?;
        }
        if let Some(h) = self.engine_hours() {
            write!(f, " | Hours: {:.1}", h)?;
        }
        Ok(())
    }
}
