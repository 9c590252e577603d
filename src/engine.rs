//! The single-threaded façade: every input is decoded, arbitrated, derived and
//! published before the next one is looked at.

use std::sync::Arc;
use std::time::Instant;

use nmea2k::{MessageHandler, N2kFrame, N2kMessage};
use tracing::{debug, info, trace};

use crate::app_metrics::AppMetrics;
use crate::arbiter::ChannelArbiter;
use crate::candidate::{Candidate, DecodeContext, Decoded};
use crate::channel::Channel;
use crate::config::FusionConfig;
use crate::derived::DerivedQuantityEngine;
use crate::n2k_decoder::PgnDecoder;
use crate::nmea0183::{Sentence, SentenceDecoder};
use crate::publisher::{ChannelListener, Publisher};
use crate::signalk::SignalKDecoder;
use crate::watchdog::{WatchdogPolicy, WatchdogScheduler};

pub struct NavigationEngine {
    config: Arc<FusionConfig>,
    arbiter: ChannelArbiter,
    watchdog: WatchdogScheduler,
    derived: DerivedQuantityEngine,
    publisher: Publisher,
    sentences: SentenceDecoder,
    signalk: SignalKDecoder,
    pgns: PgnDecoder,
    metrics: AppMetrics,
}

impl NavigationEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self {
            arbiter: ChannelArbiter::new(WatchdogPolicy::from_config(&config)),
            watchdog: WatchdogScheduler::new(),
            derived: DerivedQuantityEngine::new(&config),
            publisher: Publisher::new(config.units.clone()),
            sentences: SentenceDecoder::new(),
            signalk: SignalKDecoder::new(),
            pgns: PgnDecoder::new(),
            metrics: AppMetrics::new(),
            config: Arc::new(config),
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn ChannelListener>) {
        self.publisher.add_listener(listener);
    }

    /// Replaces the configuration; resolved values, locks and countdowns survive.
    pub fn apply_config(&mut self, config: FusionConfig) {
        info!(
            "Applying configuration: dual engine {}, true wind over ground {}, depth offset {} m",
            config.dual_engine, config.true_wind_over_ground, config.depth_offset
        );
        self.arbiter.set_policy(WatchdogPolicy::from_config(&config));
        self.derived.apply_config(&config);
        self.publisher.set_preferences(config.units.clone());
        self.config = Arc::new(config);
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn value(&self, channel: Channel) -> Option<f64> {
        self.arbiter.value(channel)
    }

    pub fn arbiter(&self) -> &ChannelArbiter {
        &self.arbiter
    }

    pub fn metrics_mut(&mut self) -> &mut AppMetrics {
        &mut self.metrics
    }

    /// Feeds raw NMEA0183 text; complete lines are handled as they appear.
    pub fn push_nmea0183(&mut self, text: &str) {
        self.sentences.push(text);
        while let Some(line) = self.sentences.next_sentence() {
            let Some(sentence) = Sentence::parse(&line) else {
                trace!("Dropping malformed sentence {:?}", line);
                self.metrics.sentences_dropped += 1;
                continue;
            };
            self.metrics.sentences_accepted += 1;
            let ctx = self.context();
            if let Some(decoded) = self.sentences.decode(&sentence, &ctx) {
                self.process(decoded);
            }
        }
    }

    pub fn handle_pgn(&mut self, source: u8, message: &N2kMessage) {
        let ctx = self.context();
        if let Some(decoded) = self.pgns.decode(source, message, &ctx) {
            self.process(decoded);
        }
    }

    /// One SignalK JSON message (delta or hello).
    pub fn handle_signalk(&mut self, text: &str) {
        let ctx = self.context();
        match self.signalk.decode(text, &ctx) {
            Some(decoded) => {
                self.metrics.signalk_accepted += 1;
                self.process(decoded);
            }
            None => self.metrics.signalk_ignored += 1,
        }
    }

    /// The 1 Hz heartbeat: expires quiet channels and publishes the invalidations.
    pub fn tick(&mut self) {
        let expired = self.watchdog.tick(&mut self.arbiter);
        if !expired.is_empty() {
            debug!("{} channel(s) expired on tick {}", expired.len(), self.watchdog.ticks());
        }
        self.metrics.invalidations += expired.len() as u64;
        self.publish_pending();
    }

    fn context(&self) -> DecodeContext {
        DecodeContext {
            config: Arc::clone(&self.config),
            variation: self.arbiter.value(Channel::Variation),
        }
    }

    /// Offers every candidate; returns the channels that took one.
    fn submit(&mut self, candidates: &[Candidate]) -> Vec<Channel> {
        let mut accepted = Vec::new();
        for candidate in candidates {
            if self.arbiter.attempt_update(candidate) {
                self.metrics.candidates_accepted += 1;
                accepted.push(candidate.channel);
            } else {
                self.metrics.candidates_rejected += 1;
            }
        }
        accepted
    }

    fn process(&mut self, decoded: Decoded) {
        let accepted = self.submit(&decoded.candidates);

        let measured = self.arbiter.drain_events();
        let derived = self.derived.derive(&measured, &self.arbiter, &self.config);
        self.submit(&derived);

        for event in measured.into_iter().chain(self.arbiter.drain_events()) {
            let event = self.derived.smooth(event);
            self.publisher.publish(&event);
        }

        // pages follow their own in-view count, so a locked-out device stays silent
        let counted = decoded.candidates.iter().any(|candidate| candidate.channel == Channel::SatellitesInView);
        let in_view_rank = self.arbiter.winning_priority(Channel::SatellitesInView);
        for page in &decoded.satellites {
            let forward = if counted {
                accepted.contains(&Channel::SatellitesInView)
            } else {
                page.priority <= in_view_rank
            };
            if forward {
                self.publisher.publish_satellites(page);
            }
        }
    }

    fn publish_pending(&mut self) {
        for event in self.arbiter.drain_events() {
            let event = self.derived.smooth(event);
            self.publisher.publish(&event);
        }
    }
}

impl MessageHandler for NavigationEngine {
    fn handle_message(&mut self, frame: &N2kFrame, _timestamp: Instant) {
        self.metrics.n2k_messages += 1;
        self.handle_pgn(frame.identifier.source(), &frame.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{EngineAttribute, EngineId};
    use crate::nmea0183::sentence::with_checksum;
    use crate::publisher::tests::{Published, RecordingListener};
    use crate::units::Unit;
    use approx::assert_abs_diff_eq;

    fn engine_with(config: FusionConfig) -> (NavigationEngine, RecordingListener) {
        let mut engine = NavigationEngine::new(config);
        let recorder = RecordingListener::default();
        engine.add_listener(Box::new(recorder.clone()));
        (engine, recorder)
    }

    fn nmea(engine: &mut NavigationEngine, body: &str) {
        engine.push_nmea0183(&format!("{}\r\n", with_checksum('$', body)));
    }

    fn rudder(degrees_e4: i16) -> N2kMessage {
        let mut data = vec![0x02, 0xFF, 0xFF, 0x7F];
        data.extend_from_slice(&degrees_e4.to_le_bytes());
        data.extend_from_slice(&[0xFF, 0xFF]);
        N2kMessage::from_pgn(127245, &data)
    }

    #[test]
    fn test_xdr_engine_zero_follows_dual_engine() {
        let (mut single, _) = engine_with(FusionConfig::default());
        nmea(&mut single, "IIXDR,T,1800,R,ENGINE#0");
        assert_eq!(single.value(Channel::Engine(EngineId::Main, EngineAttribute::Rpm)), Some(1800.0));
        assert_eq!(single.value(Channel::Engine(EngineId::Port, EngineAttribute::Rpm)), None);

        let (mut dual, recorder) = engine_with(FusionConfig {
            dual_engine: true,
            ..FusionConfig::default()
        });
        nmea(&mut dual, "IIXDR,T,1800,R,ENGINE#0");
        assert_eq!(dual.value(Channel::Engine(EngineId::Port, EngineAttribute::Rpm)), Some(1800.0));
        assert_eq!(
            recorder.last_value(Channel::Engine(EngineId::Port, EngineAttribute::Rpm)),
            Some((1800.0, Unit::Rpm))
        );
    }

    #[test]
    fn test_rudder_sticks_to_first_device_until_watchdog() {
        let (mut engine, recorder) = engine_with(FusionConfig::default());
        engine.handle_pgn(10, &rudder(1745));
        engine.handle_pgn(11, &rudder(-1745));
        assert_abs_diff_eq!(engine.value(Channel::RudderAngle).unwrap(), 10.0, epsilon = 0.01);
        assert_eq!(engine.metrics_mut().candidates_rejected, 1);

        // the locked device keeps refreshing, so the other one stays out
        for _ in 0..5 {
            engine.tick();
            engine.handle_pgn(10, &rudder(1745));
            engine.handle_pgn(11, &rudder(-1745));
        }
        assert_abs_diff_eq!(engine.value(Channel::RudderAngle).unwrap(), 10.0, epsilon = 0.01);

        for _ in 0..6 {
            engine.tick();
        }
        assert_eq!(engine.value(Channel::RudderAngle), None);
        assert_eq!(recorder.take().last(), Some(&Published::Invalid(Channel::RudderAngle)));

        engine.handle_pgn(11, &rudder(-1745));
        assert_abs_diff_eq!(engine.value(Channel::RudderAngle).unwrap(), -10.0, epsilon = 0.01);
    }

    #[test]
    fn test_true_wind_from_apparent_over_ground() {
        let (mut engine, recorder) = engine_with(FusionConfig {
            true_wind_over_ground: true,
            ..FusionConfig::default()
        });
        nmea(&mut engine, "GPRMC,123519,A,4807.038,N,01131.000,E,5.0,0.0,230394,003.1,W");
        nmea(&mut engine, "IIHDT,0.0,T");
        nmea(&mut engine, "IIMWV,0.0,R,10.0,N,A");

        let (tws, unit) = recorder.last_value(Channel::TrueWindSpeed).unwrap();
        assert_eq!(unit, Unit::Knots);
        assert_abs_diff_eq!(tws, 5.0, epsilon = 1e-9);
        let (twa, _) = recorder.last_value(Channel::TrueWindAngle).unwrap();
        assert_abs_diff_eq!(twa, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(engine.value(Channel::TrueWindDirection).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_malformed_sentences_are_counted() {
        let (mut engine, recorder) = engine_with(FusionConfig::default());
        engine.push_nmea0183("$IIDBT,10.0,f,3.0,M,1.6,F*00\r\n");
        engine.push_nmea0183("$GPGLL,4916.45,N,12311.12,W,225444,A*31\r\n");
        let metrics = engine.metrics_mut().clone();
        assert_eq!(metrics.sentences_dropped, 1);
        assert_eq!(metrics.sentences_accepted, 1);
        assert_eq!(engine.value(Channel::Depth), None);
        assert!(recorder.last_value(Channel::Latitude).is_some());
    }

    #[test]
    fn test_sentence_split_across_reads() {
        let (mut engine, _) = engine_with(FusionConfig::default());
        let line = format!("{}\r\n", with_checksum('$', "IIHDT,123.4,T"));
        let (head, tail) = line.split_at(9);
        engine.push_nmea0183(head);
        assert_eq!(engine.value(Channel::HeadingTrue), None);
        engine.push_nmea0183(tail);
        assert_eq!(engine.value(Channel::HeadingTrue), Some(123.4));
    }

    #[test]
    fn test_apply_config_keeps_values_and_changes_units() {
        let (mut engine, recorder) = engine_with(FusionConfig::default());
        nmea(&mut engine, "IIDPT,3.048,0.0");
        assert_eq!(recorder.last_value(Channel::Depth).map(|(_, unit)| unit), Some(Unit::Meters));

        let mut config = FusionConfig::default();
        config.units.depth = Unit::Feet;
        engine.apply_config(config);
        assert_abs_diff_eq!(engine.value(Channel::Depth).unwrap(), 3.048, epsilon = 1e-9);

        nmea(&mut engine, "IIDPT,3.048,0.0");
        let (depth, unit) = recorder.last_value(Channel::Depth).unwrap();
        assert_eq!(unit, Unit::Feet);
        assert_abs_diff_eq!(depth, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_satellite_pages_follow_in_view_winner() {
        let (mut engine, recorder) = engine_with(FusionConfig::default());
        nmea(&mut engine, "GPGSV,1,1,02,07,45,120,38,12,10,300,");
        assert!(recorder.take().contains(&Published::Satellites(1, 2)));

        engine.handle_signalk(r#"{"updates":[{"values":[{"path":"navigation.gnss.satellitesInView","value":{"count":9}}]}]}"#);
        recorder.take();
        nmea(&mut engine, "GPGSV,1,1,02,07,45,120,38,12,10,300,");
        assert!(
            !recorder
                .take()
                .iter()
                .any(|entry| matches!(entry, Published::Satellites(..)))
        );
    }

    fn sats_in_view(prns: &[u8]) -> N2kMessage {
        let mut data = vec![0x01, 0xFF, prns.len() as u8];
        for prn in prns {
            data.push(*prn);
            data.extend_from_slice(&5236i16.to_le_bytes());
            data.extend_from_slice(&15708u16.to_le_bytes());
            data.extend_from_slice(&4000u16.to_le_bytes());
            data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0x7F, 0xF2]);
        }
        N2kMessage::from_pgn(129540, &data)
    }

    #[test]
    fn test_satellite_pages_follow_locked_device() {
        let (mut engine, recorder) = engine_with(FusionConfig::default());
        engine.handle_pgn(10, &sats_in_view(&[7]));
        assert_eq!(engine.value(Channel::SatellitesInView), Some(1.0));
        assert!(recorder.take().contains(&Published::Satellites(1, 1)));

        engine.handle_pgn(11, &sats_in_view(&[22, 23]));
        assert_eq!(engine.value(Channel::SatellitesInView), Some(1.0));
        assert!(
            !recorder
                .take()
                .iter()
                .any(|entry| matches!(entry, Published::Satellites(..)))
        );

        engine.handle_pgn(10, &sats_in_view(&[7, 9]));
        assert!(recorder.take().contains(&Published::Satellites(1, 2)));
    }

    #[test]
    fn test_satellite_pages_without_count_are_dropped() {
        let (mut engine, recorder) = engine_with(FusionConfig::default());
        engine.handle_pgn(10, &N2kMessage::from_pgn(129540, &[0x01, 0xFF, 0xFF]));
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_signalk_other_vessel_ignored() {
        let (mut engine, _) = engine_with(FusionConfig::default());
        engine.handle_signalk(
            r#"{"context":"vessels.urn:mrn:imo:mmsi:230099999","updates":[{"values":[{"path":"navigation.speedOverGround","value":3.0}]}]}"#,
        );
        engine.handle_signalk("not json");
        engine.handle_signalk(
            r#"{"context":"vessels.self","updates":[{"values":[{"path":"navigation.speedOverGround","value":3.0}]}]}"#,
        );
        let metrics = engine.metrics_mut().clone();
        assert_eq!(metrics.signalk_ignored, 2);
        assert_eq!(metrics.signalk_accepted, 1);
        assert_abs_diff_eq!(engine.value(Channel::SpeedOverGround).unwrap(), 3.0 * 3600.0 / 1852.0, epsilon = 1e-6);
    }

    #[test]
    fn test_motion_damping_applies_to_published_values() {
        let (mut engine, recorder) = engine_with(FusionConfig {
            sog_damping_seconds: 1.0,
            cog_damping_seconds: 1.0,
            ..FusionConfig::default()
        });
        nmea(&mut engine, "GPRMC,123519,A,4807.038,N,01131.000,E,0.0,0.0,230394,003.1,W");
        nmea(&mut engine, "GPRMC,123520,A,4807.038,N,01131.000,E,10.0,90.0,230394,003.1,W");

        let (sog, _) = recorder.last_value(Channel::SpeedOverGround).unwrap();
        assert_abs_diff_eq!(sog, 5.0, epsilon = 1e-9);
        let (cog, _) = recorder.last_value(Channel::CourseOverGround).unwrap();
        assert_abs_diff_eq!(cog, 45.0, epsilon = 1e-9);
        // the arbiter keeps the raw reading
        assert_eq!(engine.value(Channel::SpeedOverGround), Some(10.0));
        assert_eq!(engine.value(Channel::CourseOverGround), Some(90.0));
    }

    #[test]
    fn test_watchdog_expiry_is_published_once() {
        let (mut engine, recorder) = engine_with(FusionConfig::default());
        nmea(&mut engine, "IIHDT,10.0,T");
        recorder.take();
        for _ in 0..20 {
            engine.tick();
        }
        assert_eq!(recorder.take(), vec![Published::Invalid(Channel::HeadingTrue)]);
        assert_eq!(engine.metrics_mut().invalidations, 1);
    }
}
