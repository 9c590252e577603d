use crate::N2kFrame;

/// Consumer of reassembled NMEA2000 messages.
///
/// Implementations receive every frame and pick out the PGNs they understand,
/// so the read loop does not need to know who cares about what.
pub trait MessageHandler {
    fn handle_message(&mut self, frame_and_message: &N2kFrame, timestamp: std::time::Instant);
}
