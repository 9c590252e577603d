use socketcan::{CanSocket, EmbeddedFrame, ExtendedId, Frame, Socket};
use std::{error::Error, time::Duration};
use tracing::{info, warn};

/// Opens a CAN socket, retrying every 10 seconds until the interface comes up
pub fn open_can_socket_with_retry(interface: &str) -> CanSocket {
    loop {
        match CanSocket::open(interface) {
            Ok(socket) => {
                info!("Successfully opened CAN interface: {}", interface);
                return socket;
            }
            Err(e) => {
                warn!("Failed to open CAN interface '{}': {}", interface, e);
                warn!("Retrying in 10 seconds...");
                std::thread::sleep(Duration::from_secs(10));
            }
        }
    }
}

/// Sets the read timeout so the caller's loop keeps ticking with no bus activity
pub fn configure_nmea2k_socket(socket: &mut CanSocket, read_timeout: Duration) -> Result<(), Box<dyn Error>> {
    socket.set_read_timeout(read_timeout)?;
    Ok(())
}

/// Reads a CAN frame and converts it to NMEA2000 extended ID format
pub fn read_nmea2k_frame(socket: &CanSocket) -> Result<(ExtendedId, Vec<u8>), std::io::Error> {
    let frame = socket.read_frame()?;

    // NMEA2000 uses 29-bit extended CAN identifiers
    let can_id = frame.can_id();
    let extended_id = ExtendedId::new(can_id.as_raw()).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "Invalid CAN ID for NMEA2000")
    })?;

    Ok((extended_id, frame.data().to_vec()))
}

/// True when the error is just the read timeout expiring
pub fn is_timeout(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}
