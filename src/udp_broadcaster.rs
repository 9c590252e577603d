use std::net::UdpSocket;
use tracing::{debug, error, warn};
use serde::Serialize;

use crate::candidate::SatellitePage;
use crate::channel::Channel;
use crate::publisher::ChannelListener;
use crate::units::Unit;

/// Wire form of one publication
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChannelMessage {
    Update {
        channel: String,
        value: f64,
        unit: &'static str,
    },
    Invalid {
        channel: String,
        valid: bool,
    },
    Satellites {
        satellites: SatellitesMessage,
    },
}

#[derive(Debug, Serialize)]
struct SatellitesMessage {
    page: u32,
    page_count: u32,
    in_view: u32,
    list: Vec<SatelliteEntry>,
}

#[derive(Debug, Serialize)]
struct SatelliteEntry {
    prn: u32,
    elevation: Option<f64>,
    azimuth: Option<f64>,
    snr: Option<f64>,
}

/// UDP broadcaster for resolved channel values
///
/// Serializes every publication to one JSON datagram and sends it
/// to a configured destination address.
pub struct UdpBroadcaster {
    socket: Option<UdpSocket>,
    destination: String,
    error_count: u64,
    message_count: u64,
}

impl UdpBroadcaster {
    /// Create a new UDP broadcaster
    ///
    /// # Arguments
    /// * `destination` - UDP destination address (e.g., "192.168.1.255:10120")
    /// * `enabled` - Whether UDP broadcasting is enabled
    pub fn new(destination: String, enabled: bool) -> Self {
        let socket = if enabled {
            match Self::create_socket(&destination) {
                Ok(sock) => {
                    debug!("UDP broadcaster initialized: {}", destination);
                    Some(sock)
                }
                Err(e) => {
                    error!("Failed to create UDP socket: {}. Broadcasting disabled.", e);
                    None
                }
            }
        } else {
            debug!("UDP broadcaster disabled in configuration");
            None
        };

        Self {
            socket,
            destination,
            error_count: 0,
            message_count: 0,
        }
    }

    /// Create and configure a UDP socket
    fn create_socket(destination: &str) -> Result<UdpSocket, std::io::Error> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;

        // Enable broadcast if destination is a broadcast address
        if destination.contains(".255") {
            socket.set_broadcast(true)?;
        }

        // Set non-blocking mode to prevent blocking the main loop
        socket.set_nonblocking(true)?;

        Ok(socket)
    }

    pub fn is_active(&self) -> bool {
        self.socket.is_some()
    }

    /// (sent, errors)
    pub fn stats(&self) -> (u64, u64) {
        (self.message_count, self.error_count)
    }

    fn broadcast(&mut self, message: &ChannelMessage) {
        let Some(socket) = &self.socket else {
            return;
        };

        let json = match serde_json::to_string(message) {
            Ok(j) => j,
            Err(e) => {
                if self.error_count < 10 {
                    warn!("Failed to convert message to JSON: {}", e);
                }
                self.error_count += 1;
                return;
            }
        };

        match socket.send_to(json.as_bytes(), &self.destination) {
            Ok(_) => {
                self.message_count += 1;
                if self.message_count % 1000 == 0 {
                    debug!("Broadcasted {} messages via UDP", self.message_count);
                }
            }
            Err(e) => {
                if self.error_count < 10 {
                    warn!("Failed to send UDP packet: {}", e);
                }
                self.error_count += 1;
            }
        }
    }
}

impl ChannelListener for UdpBroadcaster {
    fn on_channel_update(&mut self, channel: Channel, value: f64, unit: Unit) {
        self.broadcast(&ChannelMessage::Update {
            channel: channel.to_string(),
            value,
            unit: unit.symbol(),
        });
    }

    fn on_channel_invalidated(&mut self, channel: Channel) {
        self.broadcast(&ChannelMessage::Invalid {
            channel: channel.to_string(),
            valid: false,
        });
    }

    fn on_satellites(&mut self, page: &SatellitePage) {
        self.broadcast(&satellites_message(page));
    }
}

fn satellites_message(page: &SatellitePage) -> ChannelMessage {
    ChannelMessage::Satellites {
        satellites: SatellitesMessage {
            page: page.page,
            page_count: page.page_count,
            in_view: page.in_view,
            list: page
                .satellites
                .iter()
                .map(|sat| SatelliteEntry {
                    prn: sat.prn,
                    elevation: sat.elevation,
                    azimuth: sat.azimuth,
                    snr: sat.snr,
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Satellite;
    use crate::priority::Priority;
    use std::time::Duration;

    #[test]
    fn test_create_disabled_broadcaster() {
        let mut broadcaster = UdpBroadcaster::new("127.0.0.1:10120".to_string(), false);
        assert!(!broadcaster.is_active());
        broadcaster.on_channel_invalidated(Channel::Depth);
        assert_eq!(broadcaster.stats(), (0, 0));
    }

    #[test]
    fn test_update_json_shape() {
        let json = serde_json::to_value(ChannelMessage::Update {
            channel: Channel::Depth.to_string(),
            value: 4.5,
            unit: Unit::Meters.symbol(),
        })
        .unwrap();
        assert_eq!(json["channel"], Channel::Depth.to_string());
        assert_eq!(json["value"], 4.5);
        assert_eq!(json["unit"], Unit::Meters.symbol());

        let json = serde_json::to_value(ChannelMessage::Invalid {
            channel: Channel::Depth.to_string(),
            valid: false,
        })
        .unwrap();
        assert_eq!(json["valid"], false);
        assert!(json.get("value").is_none());
    }

    #[test]
    fn test_satellites_json_shape() {
        let page = SatellitePage {
            page: 1,
            page_count: 2,
            in_view: 5,
            satellites: vec![Satellite {
                prn: 7,
                elevation: Some(45.0),
                azimuth: None,
                snr: Some(38.0),
            }],
            priority: Priority::new(1),
        };
        let json = serde_json::to_value(satellites_message(&page)).unwrap();
        assert_eq!(json["satellites"]["in_view"], 5);
        assert_eq!(json["satellites"]["list"][0]["prn"], 7);
        assert!(json["satellites"]["list"][0]["azimuth"].is_null());
    }

    #[test]
    fn test_sends_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let destination = receiver.local_addr().unwrap().to_string();

        let mut broadcaster = UdpBroadcaster::new(destination, true);
        assert!(broadcaster.is_active());
        broadcaster.on_channel_update(Channel::SpeedOverGround, 6.2, Unit::Knots);

        let mut buf = [0u8; 512];
        let len = receiver.recv(&mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(json["value"], 6.2);
        assert_eq!(broadcaster.stats(), (1, 0));
    }
}
