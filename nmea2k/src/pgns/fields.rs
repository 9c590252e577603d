//! Little-endian field readers honouring the NMEA2000 "data not available" convention.
//!
//! The top three codes of every field are reserved: all-ones means "not available",
//! the two below it "out of range" and "reserved". Signed fields use the same codes
//! counted down from the maximum positive value. Every reader returns `None` for
//! those codes and for payloads too short to contain the field.

pub fn u8_at(data: &[u8], offset: usize) -> Option<u8> {
    let raw = *data.get(offset)?;
    (raw < u8::MAX - 2).then_some(raw)
}

pub fn u16_at(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    let raw = u16::from_le_bytes([bytes[0], bytes[1]]);
    (raw < u16::MAX - 2).then_some(raw)
}

pub fn i16_at(data: &[u8], offset: usize) -> Option<i16> {
    let bytes = data.get(offset..offset + 2)?;
    let raw = i16::from_le_bytes([bytes[0], bytes[1]]);
    (raw < i16::MAX - 2).then_some(raw)
}

pub fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    (raw < u32::MAX - 2).then_some(raw)
}

pub fn i32_at(data: &[u8], offset: usize) -> Option<i32> {
    let bytes = data.get(offset..offset + 4)?;
    let raw = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    (raw < i32::MAX - 2).then_some(raw)
}

pub fn i64_at(data: &[u8], offset: usize) -> Option<i64> {
    let bytes = data.get(offset..offset + 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    let raw = i64::from_le_bytes(raw);
    (raw < i64::MAX - 2).then_some(raw)
}
