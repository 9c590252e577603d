use tracing::debug;

use crate::arbiter::ChannelEvent;
use crate::candidate::SatellitePage;
use crate::channel::{Channel, EngineAttribute};
use crate::units::{Unit, UnitPreferences};

/// Consumer of resolved channel values, e.g. a display or a network feed.
pub trait ChannelListener {
    /// `value` is already in the preferred display unit.
    fn on_channel_update(&mut self, channel: Channel, value: f64, unit: Unit);

    fn on_channel_invalidated(&mut self, channel: Channel);

    fn on_satellites(&mut self, _page: &SatellitePage) {}
}

/// Converts published values to display units and fans them out.
pub struct Publisher {
    listeners: Vec<Box<dyn ChannelListener>>,
    preferences: UnitPreferences,
}

impl Publisher {
    pub fn new(preferences: UnitPreferences) -> Self {
        Self {
            listeners: Vec::new(),
            preferences,
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn ChannelListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn set_preferences(&mut self, preferences: UnitPreferences) {
        self.preferences = preferences;
    }

    /// The unit `channel` is shown in, given the unit it is stored in.
    pub fn display_unit(&self, channel: Channel, stored: Unit) -> Unit {
        let prefs = &self.preferences;
        match channel {
            Channel::SpeedOverGround | Channel::SpeedThroughWater => prefs.boat_speed,
            Channel::ApparentWindSpeed | Channel::TrueWindSpeed => prefs.wind_speed,
            Channel::Depth => prefs.depth,
            Channel::Log | Channel::TripLog => prefs.distance,
            Channel::Altitude => prefs.altitude,
            Channel::AirTemperature
            | Channel::WaterTemperature
            | Channel::Engine(_, EngineAttribute::WaterTemperature)
            | Channel::Engine(_, EngineAttribute::ExhaustTemperature) => prefs.temperature,
            Channel::Pressure => prefs.air_pressure,
            Channel::Engine(_, EngineAttribute::OilPressure) => prefs.oil_pressure,
            _ => stored,
        }
    }

    pub fn publish(&mut self, event: &ChannelEvent) {
        match *event {
            ChannelEvent::Updated { channel, value, unit, .. } => {
                let target = self.display_unit(channel, unit);
                let (value, unit) = match unit.convert(value, target) {
                    Some(converted) => (converted, target),
                    None => (value, unit),
                };
                for listener in self.listeners.iter_mut() {
                    listener.on_channel_update(channel, value, unit);
                }
            }
            ChannelEvent::Invalidated(channel) => {
                for listener in self.listeners.iter_mut() {
                    listener.on_channel_invalidated(channel);
                }
            }
        }
    }

    pub fn publish_satellites(&mut self, page: &SatellitePage) {
        for listener in self.listeners.iter_mut() {
            listener.on_satellites(page);
        }
    }
}

/// Traces every publication.
#[derive(Debug, Default)]
pub struct LogListener;

impl ChannelListener for LogListener {
    fn on_channel_update(&mut self, channel: Channel, value: f64, unit: Unit) {
        debug!("{} = {:.3} {}", channel, value, unit);
    }

    fn on_channel_invalidated(&mut self, channel: Channel) {
        debug!("{} invalid", channel);
    }

    fn on_satellites(&mut self, page: &SatellitePage) {
        debug!(
            "Satellites page {}/{}: {} in view, {} listed",
            page.page,
            page.page_count,
            page.in_view,
            page.satellites.len()
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::priority::Priority;
    use approx::assert_abs_diff_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Published {
        Update(Channel, f64, Unit),
        Invalid(Channel),
        Satellites(u32, usize),
    }

    /// Records publications into a shared log the test keeps a handle to.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingListener {
        pub(crate) log: Rc<RefCell<Vec<Published>>>,
    }

    impl RecordingListener {
        pub(crate) fn take(&self) -> Vec<Published> {
            std::mem::take(&mut *self.log.borrow_mut())
        }

        pub(crate) fn last_value(&self, channel: Channel) -> Option<(f64, Unit)> {
            self.log.borrow().iter().rev().find_map(|entry| match entry {
                Published::Update(c, value, unit) if *c == channel => Some((*value, *unit)),
                _ => None,
            })
        }
    }

    impl ChannelListener for RecordingListener {
        fn on_channel_update(&mut self, channel: Channel, value: f64, unit: Unit) {
            self.log.borrow_mut().push(Published::Update(channel, value, unit));
        }

        fn on_channel_invalidated(&mut self, channel: Channel) {
            self.log.borrow_mut().push(Published::Invalid(channel));
        }

        fn on_satellites(&mut self, page: &SatellitePage) {
            self.log.borrow_mut().push(Published::Satellites(page.page, page.satellites.len()));
        }
    }

    fn update(channel: Channel, value: f64) -> ChannelEvent {
        ChannelEvent::Updated {
            channel,
            value,
            unit: channel.canonical_unit(),
            priority: Priority::new(1),
        }
    }

    #[test]
    fn test_display_unit_conversion() {
        let prefs = UnitPreferences {
            depth: Unit::Feet,
            temperature: Unit::Fahrenheit,
            ..UnitPreferences::default()
        };
        let mut publisher = Publisher::new(prefs);
        let recorder = RecordingListener::default();
        publisher.add_listener(Box::new(recorder.clone()));

        publisher.publish(&update(Channel::Depth, 3.048));
        publisher.publish(&update(Channel::WaterTemperature, 100.0));
        publisher.publish(&update(Channel::HeadingTrue, 12.0));

        let (depth, unit) = recorder.last_value(Channel::Depth).unwrap();
        assert_eq!(unit, Unit::Feet);
        assert_abs_diff_eq!(depth, 10.0, epsilon = 1e-9);
        let (temperature, _) = recorder.last_value(Channel::WaterTemperature).unwrap();
        assert_abs_diff_eq!(temperature, 212.0, epsilon = 1e-9);
        assert_eq!(recorder.last_value(Channel::HeadingTrue), Some((12.0, Unit::DegreesTrue)));
    }

    #[test]
    fn test_fan_out_and_invalidation() {
        let mut publisher = Publisher::new(UnitPreferences::default());
        let first = RecordingListener::default();
        let second = RecordingListener::default();
        publisher.add_listener(Box::new(first.clone()));
        publisher.add_listener(Box::new(second.clone()));
        publisher.add_listener(Box::new(LogListener));
        assert_eq!(publisher.listener_count(), 3);

        publisher.publish(&ChannelEvent::Invalidated(Channel::Depth));
        assert_eq!(first.take(), vec![Published::Invalid(Channel::Depth)]);
        assert_eq!(second.take(), vec![Published::Invalid(Channel::Depth)]);
    }

    #[test]
    fn test_wind_angle_side_preserved() {
        let mut publisher = Publisher::new(UnitPreferences::default());
        let recorder = RecordingListener::default();
        publisher.add_listener(Box::new(recorder.clone()));
        publisher.publish(&ChannelEvent::Updated {
            channel: Channel::ApparentWindAngle,
            value: 40.0,
            unit: Unit::DegreesLeft,
            priority: Priority::new(3),
        });
        assert_eq!(recorder.last_value(Channel::ApparentWindAngle), Some((40.0, Unit::DegreesLeft)));
    }
}
