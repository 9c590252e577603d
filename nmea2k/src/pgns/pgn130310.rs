use std::fmt;

use super::fields::u16_at;

/// Outside environmental parameters: water/air temperature and barometric pressure.
#[derive(Debug, Clone)]
pub struct EnvironmentalParameters {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub water_temperature: Option<f64>, // Kelvin
    pub air_temperature: Option<f64>,   // Kelvin
    pub pressure: Option<f64>,          // Pascal
}

impl EnvironmentalParameters {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 7 {
            return None;
        }
        Some(Self {
            pgn: 130310,
            sid: data[0],
            water_temperature: u16_at(data, 1).map(|raw| raw as f64 * 0.01),
            air_temperature: u16_at(data, 3).map(|raw| raw as f64 * 0.01),
            pressure: u16_at(data, 5).map(|raw| raw as f64 * 100.0),
        })
    }

    pub fn water_temperature_celsius(&self) -> Option<f64> {
        self.water_temperature.map(|k| k - 273.15)
    }

    pub fn air_temperature_celsius(&self) -> Option<f64> {
        self.air_temperature.map(|k| k - 273.15)
    }

    pub fn pressure_hpa(&self) -> Option<f64> {
        self.pressure.map(|pa| pa / 100.0)
    }
}

impl fmt::Display for EnvironmentalParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "      Water: {:?}°C | Air: {:?}°C | Pressure: {:?} hPa",
            self.water_temperature_celsius(),
            self.air_temperature_celsius(),
            self.pressure_hpa()
        )
    }
}
