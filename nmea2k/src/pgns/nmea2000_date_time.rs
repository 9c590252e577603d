use chrono::{DateTime, Utc};

use super::fields::{u16_at, u32_at};

#[derive(Debug, Clone, Copy)]
pub struct N2kDateTime {
    pub date: u16, // days since 1970-01-01
    pub time: u32, // units of 0.0001 s since midnight
}

impl N2kDateTime {
    /// Read the date (2 bytes) and time (4 bytes) pair starting at `offset`.
    pub fn read(data: &[u8], offset: usize) -> Option<Self> {
        Some(Self {
            date: u16_at(data, offset)?,
            time: u32_at(data, offset + 2)?,
        })
    }

    /// Convert NMEA2000 date/time to Unix timestamp (seconds since epoch)
    pub fn to_unix_timestamp(&self) -> i64 {
        self.date as i64 * 86400 + (self.time / 10_000) as i64
    }

    /// Seconds since the epoch with sub-second precision.
    pub fn to_unix_seconds(&self) -> f64 {
        self.date as f64 * 86400.0 + self.time as f64 * 0.0001
    }

    /// Get milliseconds component
    pub fn milliseconds(&self) -> u32 {
        (self.time % 10_000) / 10
    }

    pub fn to_date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.to_unix_timestamp(), self.milliseconds() * 1_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_time_conversion() {
        // 2024-01-01 = day 19723, 12:30:15.250
        let dt = N2kDateTime { date: 19723, time: (12 * 3600 + 30 * 60 + 15) * 10_000 + 2500 };
        assert_eq!(dt.to_unix_timestamp(), 1_704_112_215);
        assert_eq!(dt.milliseconds(), 250);
        let chrono_dt = dt.to_date_time().unwrap();
        assert_eq!(chrono_dt.to_rfc3339(), "2024-01-01T12:30:15.250+00:00");
    }
}
