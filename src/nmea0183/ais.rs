//! Own-ship position out of `!AIVDO` position reports.

/// 6-bit armoured AIS payload unpacked into a bit vector.
struct Bits(Vec<bool>);

impl Bits {
    fn unarmor(payload: &str, fill_bits: usize) -> Option<Self> {
        let mut bits = Vec::with_capacity(payload.len() * 6);
        for c in payload.bytes() {
            let mut value = match c {
                b'0'..=b'W' | b'`'..=b'w' => c - 48,
                _ => return None,
            };
            if value > 40 {
                value -= 8;
            }
            bits.extend((0..6).rev().map(|shift| (value >> shift) & 1 == 1));
        }
        bits.truncate(bits.len().saturating_sub(fill_bits));
        Some(Bits(bits))
    }

    fn unsigned(&self, start: usize, len: usize) -> Option<u32> {
        let slice = self.0.get(start..start + len)?;
        Some(slice.iter().fold(0u32, |acc, bit| (acc << 1) | u32::from(*bit)))
    }

    fn signed(&self, start: usize, len: usize) -> Option<i32> {
        let raw = self.unsigned(start, len)?;
        let shift = 32 - len as u32;
        Some(((raw << shift) as i32) >> shift)
    }
}

const LONGITUDE_NOT_AVAILABLE: i32 = 181 * 600_000;
const LATITUDE_NOT_AVAILABLE: i32 = 91 * 600_000;

/// Latitude and longitude in degrees from a class A (types 1-3) or class B
/// (type 18) position report; `None` for other types and unavailable positions.
pub fn own_position(payload: &str, fill_bits: usize) -> Option<(f64, f64)> {
    let bits = Bits::unarmor(payload, fill_bits)?;
    let (lon_start, lat_start) = match bits.unsigned(0, 6)? {
        1..=3 => (61, 89),
        18 => (57, 85),
        _ => return None,
    };
    let lon = bits.signed(lon_start, 28)?;
    let lat = bits.signed(lat_start, 27)?;
    if lon == LONGITUDE_NOT_AVAILABLE || lat == LATITUDE_NOT_AVAILABLE {
        return None;
    }
    let (lat, lon) = (lat as f64 / 600_000.0, lon as f64 / 600_000.0);
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some((lat, lon))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Packs `(value, width)` fields into an armoured payload.
    pub(crate) fn armor(fields: &[(i64, usize)]) -> String {
        let mut bits = Vec::new();
        for (value, width) in fields {
            bits.extend((0..*width).rev().map(|shift| (value >> shift) & 1 == 1));
        }
        while bits.len() % 6 != 0 {
            bits.push(false);
        }
        bits.chunks(6)
            .map(|chunk| {
                let value = chunk.iter().fold(0u8, |acc, bit| (acc << 1) | u8::from(*bit));
                let c = if value < 40 { value + 48 } else { value + 56 };
                c as char
            })
            .collect()
    }

    pub(crate) fn class_a_report(lat: f64, lon: f64) -> String {
        armor(&[
            (1, 6),
            (0, 2),
            (247_000_000, 30),
            (0, 4),
            (0, 8),
            (52, 10),
            (1, 1),
            ((lon * 600_000.0).round() as i64, 28),
            ((lat * 600_000.0).round() as i64, 27),
            (0, 52),
        ])
    }

    #[test]
    fn test_class_a_position() {
        let payload = class_a_report(43.6, 10.3);
        assert_eq!(payload.len(), 28);
        let (lat, lon) = own_position(&payload, 0).unwrap();
        assert_abs_diff_eq!(lat, 43.6, epsilon = 1e-6);
        assert_abs_diff_eq!(lon, 10.3, epsilon = 1e-6);
    }

    #[test]
    fn test_class_b_position_southwest() {
        let payload = armor(&[
            (18, 6),
            (0, 2),
            (247_000_001, 30),
            (0, 8),
            (12, 10),
            (0, 1),
            ((-58.25f64 * 600_000.0) as i64, 28),
            ((-34.5f64 * 600_000.0) as i64, 27),
            (0, 56),
        ]);
        let (lat, lon) = own_position(&payload, 0).unwrap();
        assert_abs_diff_eq!(lat, -34.5, epsilon = 1e-6);
        assert_abs_diff_eq!(lon, -58.25, epsilon = 1e-6);
    }

    #[test]
    fn test_unavailable_and_other_types() {
        assert!(own_position(&class_a_report(91.0, 181.0), 0).is_none());
        let static_data = armor(&[(5, 6), (0, 162)]);
        assert!(own_position(&static_data, 0).is_none());
        assert!(own_position("1{}", 0).is_none());
    }
}
