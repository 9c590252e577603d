use nmea2k::Identifier;
use crate::config::Config;

/// Filters NMEA2000 frames based on application configuration using only the Identifier
/// Use this filter early in the processing pipeline before fast-packet assembly.
/// # Arguments
/// * `config` - Application configuration containing filter rules
/// * `id` - The NMEA2000 Identifier to filter
/// # Returns
/// true if frame should be processed, false if it should be skipped
pub fn should_process_frame_by_id(config: &Config, id: Identifier) -> bool {
    config.source_filter.should_accept(id.pgn(), id.source())
}

#[cfg(test)]
mod tests {
    use super::*;

    use nmea2k::ExtendedId;

    fn identifier(pgn: u32, source: u8) -> Identifier {
        Identifier::from_can_id(ExtendedId::new((2 << 26) | (pgn << 8) | source as u32).unwrap())
    }

    #[test]
    fn test_unfiltered_pgn_passes() {
        let config = Config::default();
        assert!(should_process_frame_by_id(&config, identifier(127245, 17)));
    }

    #[test]
    fn test_filtered_pgn_requires_source() {
        let mut config = Config::default();
        config.source_filter.pgn_source_map.insert(127245, 17);
        assert!(should_process_frame_by_id(&config, identifier(127245, 17)));
        assert!(!should_process_frame_by_id(&config, identifier(127245, 18)));
    }
}
