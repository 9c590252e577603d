use std::sync::Arc;

use crate::channel::Channel;
use crate::config::FusionConfig;
use crate::priority::Priority;
use crate::units::Unit;

/// Identity of an NMEA2000 device reading: bus address plus the PGN's instance field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId {
    pub address: u8,
    pub instance: u8,
}

/// A proposed value for a channel, consumed once by the arbiter.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub channel: Channel,
    pub priority: Priority,
    pub value: f64,
    pub unit: Unit,
    pub source: Option<SourceId>,
}

impl Candidate {
    /// A candidate in the channel's canonical unit.
    pub fn new(channel: Channel, priority: impl Into<Priority>, value: f64) -> Self {
        Self::with_unit(channel, priority, value, channel.canonical_unit())
    }

    pub fn with_unit(channel: Channel, priority: impl Into<Priority>, value: f64, unit: Unit) -> Self {
        Self {
            channel,
            priority: priority.into(),
            value,
            unit,
            source: None,
        }
    }

    pub fn from_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Satellite {
    pub prn: u32,
    pub elevation: Option<f64>, // degrees
    pub azimuth: Option<f64>,   // degrees true
    pub snr: Option<f64>,       // dB
}

/// Up to four satellites, the way GSV pages them.
#[derive(Debug, Clone, PartialEq)]
pub struct SatellitePage {
    /// 1-based
    pub page: u32,
    pub page_count: u32,
    pub in_view: u32,
    pub satellites: Vec<Satellite>,
    pub priority: Priority,
}

pub const SATELLITES_PER_PAGE: usize = 4;

/// Splits a full satellite list into GSV-style pages.
pub fn paginate_satellites(satellites: Vec<Satellite>, in_view: u32, priority: Priority) -> Vec<SatellitePage> {
    let page_count = satellites.len().div_ceil(SATELLITES_PER_PAGE).max(1) as u32;
    if satellites.is_empty() {
        return vec![SatellitePage {
            page: 1,
            page_count,
            in_view,
            satellites,
            priority,
        }];
    }
    satellites
        .chunks(SATELLITES_PER_PAGE)
        .enumerate()
        .map(|(index, chunk)| SatellitePage {
            page: index as u32 + 1,
            page_count,
            in_view,
            satellites: chunk.to_vec(),
            priority,
        })
        .collect()
}

/// Everything one inbound message produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Decoded {
    pub candidates: Vec<Candidate>,
    pub satellites: Vec<SatellitePage>,
}

impl Decoded {
    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.satellites.is_empty()
    }

    /// `None` when nothing usable came out of the message.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// State decoders may consult: configuration and the currently resolved variation.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    pub config: Arc<FusionConfig>,
    /// Degrees, east positive.
    pub variation: Option<f64>,
}

impl DecodeContext {
    pub fn new(config: Arc<FusionConfig>) -> Self {
        Self { config, variation: None }
    }

    /// Converts a magnetic bearing to true, if variation is known.
    pub fn magnetic_to_true(&self, magnetic_deg: f64) -> Option<f64> {
        self.variation
            .map(|variation| crate::utilities::normalize0_360(magnetic_deg + variation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sat(prn: u32) -> Satellite {
        Satellite {
            prn,
            elevation: None,
            azimuth: None,
            snr: None,
        }
    }

    #[test]
    fn test_paginate_satellites() {
        let pages = paginate_satellites((1..=9).map(sat).collect(), 9, Priority::new(2));
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[2].page_count, 3);
        assert_eq!(pages[2].satellites.len(), 1);
        assert_eq!(pages[2].satellites[0].prn, 9);
    }

    #[test]
    fn test_paginate_no_satellites() {
        let pages = paginate_satellites(Vec::new(), 0, Priority::new(1));
        assert_eq!(pages.len(), 1);
        assert!(pages[0].satellites.is_empty());
    }

    #[test]
    fn test_magnetic_to_true() {
        let mut ctx = DecodeContext::new(Arc::new(FusionConfig::default()));
        assert_eq!(ctx.magnetic_to_true(10.0), None);
        ctx.variation = Some(-15.0);
        assert_eq!(ctx.magnetic_to_true(10.0), Some(355.0));
    }
}
