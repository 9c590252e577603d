//! NMEA2000 transport and PGN decoding.
//!
//! - SocketCAN helpers to open and read an interface
//! - [`N2kStreamReader`] with fast-packet reassembly
//! - PGN decoders for navigation, engine, tank, battery and environment data,
//!   honouring the "data not available" sentinels
//! - [`MessageHandler`] for components consuming decoded messages
//!
//! ```no_run
//! use std::time::Duration;
//! use nmea2k::{CanBus, N2kStreamReader};
//!
//! let mut socket = CanBus::open_can_socket_with_retry("can0");
//! CanBus::configure_nmea2k_socket(&mut socket, Duration::from_millis(500)).unwrap();
//! let mut reader = N2kStreamReader::new();
//!
//! loop {
//!     match CanBus::read_nmea2k_frame(&socket) {
//!         Ok((id, data)) => {
//!             if let Some(frame) = reader.process_frame(id, &data) {
//!                 println!("PGN: {}", frame.identifier.pgn());
//!             }
//!         }
//!         Err(e) if CanBus::is_timeout(&e) => continue,
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

pub mod canbus;
pub mod message_handler;
pub mod pgns;
pub mod stream_reader;

// Re-export commonly used types
pub use canbus as CanBus;
pub use message_handler::MessageHandler;
pub use pgns::N2kMessage;
pub use stream_reader::{N2kFrame, N2kStreamReader};

// Re-export external types for convenience
pub use nmea2000::{FastPacket, Identifier};
pub use socketcan::ExtendedId;
