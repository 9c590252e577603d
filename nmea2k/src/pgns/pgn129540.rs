use std::fmt;

use super::fields::{i16_at, u16_at, u8_at};

const SATELLITE_RECORD_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteInfo {
    pub prn: u8,
    pub elevation: Option<f64>, // degrees
    pub azimuth: Option<f64>,   // degrees
    pub snr: Option<f64>,       // dB
}

#[derive(Debug, Clone)]
pub struct GnssSatsInView {
    #[allow(dead_code)]
    pub pgn: u32,
    #[allow(dead_code)]
    sid: u8,
    pub sats_in_view: Option<u8>,
    pub satellites: Vec<SatelliteInfo>,
}

impl GnssSatsInView {
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 3 {
            return None;
        }
        let sats_in_view = u8_at(data, 2);
        let mut satellites = Vec::new();
        for index in 0..sats_in_view.unwrap_or(0) as usize {
            let base = 3 + index * SATELLITE_RECORD_LEN;
            // truncated payload: keep what was complete
            if data.len() < base + SATELLITE_RECORD_LEN {
                break;
            }
            let Some(prn) = u8_at(data, base) else {
                continue;
            };
            satellites.push(SatelliteInfo {
                prn,
                elevation: i16_at(data, base + 1).map(|raw| (raw as f64 * 0.0001).to_degrees()),
                azimuth: u16_at(data, base + 3).map(|raw| (raw as f64 * 0.0001).to_degrees()),
                snr: u16_at(data, base + 5).map(|raw| raw as f64 * 0.01),
            });
        }
        Some(Self {
            pgn: 129540,
            sid: data[0],
            sats_in_view,
            satellites,
        })
    }
}

impl fmt::Display for GnssSatsInView {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "      Satellites in view: {:?}", self.sats_in_view)?;
        for sat in &self.satellites {
            write!(f, " [PRN {} SNR {:?}]", sat.prn, sat.snr)?;
        }
        Ok(())
    }
}
