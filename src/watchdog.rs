use tracing::debug;

use crate::arbiter::ChannelArbiter;
use crate::channel::{Channel, WatchdogClass};
use crate::config::FusionConfig;

/// Countdown lengths, in ticks, per watchdog class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogPolicy {
    pub navigation_ticks: u32,
    pub ambient_ticks: u32,
}

impl Default for WatchdogPolicy {
    fn default() -> Self {
        Self {
            navigation_ticks: 6,
            ambient_ticks: 20,
        }
    }
}

impl WatchdogPolicy {
    pub fn from_config(config: &FusionConfig) -> Self {
        Self {
            navigation_ticks: config.navigation_timeout_ticks,
            ambient_ticks: config.ambient_timeout_ticks,
        }
    }

    pub fn timeout_for(&self, channel: Channel) -> u32 {
        match channel.watchdog_class() {
            WatchdogClass::Navigation => self.navigation_ticks,
            WatchdogClass::Ambient => self.ambient_ticks,
        }
    }
}

/// Driven once per second; expires channels whose sources went quiet.
#[derive(Debug, Default)]
pub struct WatchdogScheduler {
    ticks: u64,
}

impl WatchdogScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts down every held channel and invalidates those reaching zero.
    /// Channels holding no value neither count down nor get re-announced.
    pub fn tick(&mut self, arbiter: &mut ChannelArbiter) -> Vec<Channel> {
        self.ticks += 1;
        let mut expired = Vec::new();
        for (channel, state) in arbiter.states_mut() {
            if !state.is_held() {
                continue;
            }
            state.watchdog_ticks_remaining = state.watchdog_ticks_remaining.saturating_sub(1);
            if state.watchdog_ticks_remaining == 0 {
                expired.push(*channel);
            }
        }
        expired.sort();
        for channel in &expired {
            debug!("Watchdog expired for {} after {} ticks", channel, arbiter.policy().timeout_for(*channel));
            arbiter.invalidate(*channel);
        }
        expired
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::ChannelEvent;
    use crate::candidate::{Candidate, SourceId};
    use crate::priority::{AttitudePriority, DepthPriority, Priority, RudderPriority};

    #[test]
    fn test_channel_expires_after_timeout() {
        let mut arbiter = ChannelArbiter::new(WatchdogPolicy::default());
        let mut watchdog = WatchdogScheduler::new();
        arbiter.attempt_update(&Candidate::new(Channel::Depth, DepthPriority::Dpt, 12.0));
        arbiter.drain_events();

        for _ in 0..5 {
            assert!(watchdog.tick(&mut arbiter).is_empty());
        }
        assert_eq!(arbiter.value(Channel::Depth), Some(12.0));

        assert_eq!(watchdog.tick(&mut arbiter), vec![Channel::Depth]);
        let state = arbiter.state(Channel::Depth).unwrap();
        assert!(state.value.is_nan());
        assert_eq!(state.winning_priority, Priority::NONE);
        assert_eq!(state.locked_source, None);
        assert_eq!(state.watchdog_ticks_remaining, 6);
        assert_eq!(arbiter.drain_events(), vec![ChannelEvent::Invalidated(Channel::Depth)]);
    }

    #[test]
    fn test_idle_channels_not_reannounced() {
        let mut arbiter = ChannelArbiter::new(WatchdogPolicy::default());
        let mut watchdog = WatchdogScheduler::new();
        for _ in 0..50 {
            assert!(watchdog.tick(&mut arbiter).is_empty());
        }
        assert!(arbiter.drain_events().is_empty());
        assert_eq!(watchdog.ticks(), 50);
    }

    #[test]
    fn test_ambient_timeout() {
        let mut arbiter = ChannelArbiter::new(WatchdogPolicy::default());
        let mut watchdog = WatchdogScheduler::new();
        arbiter.attempt_update(&Candidate::new(Channel::Humidity, Priority::new(3), 60.0));
        for _ in 0..19 {
            watchdog.tick(&mut arbiter);
        }
        assert_eq!(arbiter.value(Channel::Humidity), Some(60.0));
        assert_eq!(watchdog.tick(&mut arbiter), vec![Channel::Humidity]);
    }

    #[test]
    fn test_expired_winner_lets_lower_rank_in() {
        let mut arbiter = ChannelArbiter::new(WatchdogPolicy::default());
        let mut watchdog = WatchdogScheduler::new();
        assert!(arbiter.attempt_update(&Candidate::new(Channel::Depth, DepthPriority::Dpt, 12.0)));
        assert!(!arbiter.attempt_update(&Candidate::new(Channel::Depth, DepthPriority::Dbt, 11.0)));
        for _ in 0..6 {
            watchdog.tick(&mut arbiter);
        }
        assert!(arbiter.attempt_update(&Candidate::new(Channel::Depth, DepthPriority::Dbt, 11.0)));
        assert_eq!(arbiter.value(Channel::Depth), Some(11.0));
    }

    #[test]
    fn test_device_lock_released_on_expiry() {
        let mut arbiter = ChannelArbiter::new(WatchdogPolicy::default());
        let mut watchdog = WatchdogScheduler::new();
        let first = SourceId { address: 10, instance: 0 };
        let second = SourceId { address: 20, instance: 0 };
        let rudder = |value, source| Candidate::new(Channel::RudderAngle, RudderPriority::Nmea2000, value).from_source(source);

        assert!(arbiter.attempt_update(&rudder(5.0, first)));
        for _ in 0..5 {
            watchdog.tick(&mut arbiter);
            assert!(!arbiter.attempt_update(&rudder(-2.0, second)));
        }
        watchdog.tick(&mut arbiter);
        assert!(arbiter.attempt_update(&rudder(-2.0, second)));
        assert_eq!(arbiter.state(Channel::RudderAngle).unwrap().locked_source, Some(second));
    }

    #[test]
    fn test_group_expires_together() {
        let mut arbiter = ChannelArbiter::new(WatchdogPolicy::default());
        let mut watchdog = WatchdogScheduler::new();
        arbiter.attempt_update(&Candidate::new(Channel::Pitch, AttitudePriority::Xdr, 2.0));
        watchdog.tick(&mut arbiter);
        watchdog.tick(&mut arbiter);
        arbiter.attempt_update(&Candidate::new(Channel::Heel, AttitudePriority::Xdr, -4.0));
        // heel's acceptance refreshed pitch's countdown as well
        for _ in 0..5 {
            assert!(watchdog.tick(&mut arbiter).is_empty());
        }
        assert_eq!(watchdog.tick(&mut arbiter), vec![Channel::Pitch, Channel::Heel]);
    }

    #[test]
    fn test_policy_from_config() {
        let config = FusionConfig {
            navigation_timeout_ticks: 3,
            ambient_timeout_ticks: 9,
            ..FusionConfig::default()
        };
        let policy = WatchdogPolicy::from_config(&config);
        assert_eq!(policy.timeout_for(Channel::HeadingTrue), 3);
        assert_eq!(policy.timeout_for(Channel::AirTemperature), 9);
    }
}
