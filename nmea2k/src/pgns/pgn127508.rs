use std::fmt;

use super::fields::{i16_at, u16_at};

#[derive(Debug, Clone)]
pub struct BatteryStatus {
    #[allow(dead_code)]
    pub pgn: u32,
    pub instance: u8,
    pub voltage: Option<f64>,     // volts
    pub current: Option<f64>,     // amperes, positive when charging
    pub temperature: Option<f64>, // Kelvin
}

impl BatteryStatus {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 7 {
            return None;
        }
        Some(Self {
            pgn: 127508,
            instance: data[0],
            voltage: i16_at(data, 1).map(|raw| raw as f64 * 0.01),
            current: i16_at(data, 3).map(|raw| raw as f64 * 0.1),
            temperature: u16_at(data, 5).map(|raw| raw as f64 * 0.01),
        })
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "      Battery #{}:", self.instance)?;
        if let Some(v) = self.voltage {
            write!(f, " {:.2} V", v)?;
        }
        if let Some(a) = self.current {
            write!(f, " {:.1} A", a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_discharging() {
        let mut data = vec![0x01];
        data.extend_from_slice(&1265i16.to_le_bytes());
        data.extend_from_slice(&(-123i16).to_le_bytes());
        data.extend_from_slice(&[0xFF, 0xFF, 0x05]);
        let msg = BatteryStatus::from_bytes(&data).unwrap();
        assert_eq!(msg.instance, 1);
        assert!((msg.voltage.unwrap() - 12.65).abs() < 1e-9);
        assert!((msg.current.unwrap() + 12.3).abs() < 1e-9);
        assert!(msg.temperature.is_none());
    }
}
