//! Quantities computed from other channels, fed back to the arbiter at the
//! "calculated" ranks, plus the SOG/COG smoothing applied at publication.

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::arbiter::{ChannelArbiter, ChannelEvent};
use crate::candidate::Candidate;
use crate::channel::Channel;
use crate::config::FusionConfig;
use crate::priority::{
    HeadingMagneticPriority, HeadingTruePriority, Priority, TrueWindAnglePriority,
    TrueWindDirectionPriority, TrueWindSpeedPriority, VariationPriority, is_calculated,
};
use crate::units::{from_sided_angle, to_sided_angle};
use crate::utilities::{get_variation_deg, normalize0_360};

/// Boat motion inputs for the true wind triangle; NaN marks an unknown value.
#[derive(Debug, Clone, Copy)]
pub struct BoatMotion {
    pub sog: f64,
    pub cog: f64,
    pub heading_true: f64,
    pub stw: f64,
    pub over_ground: bool,
}

impl BoatMotion {
    /// Boat velocity in the boat frame (x forward, y starboard), knots.
    fn velocity(&self) -> (f64, f64) {
        if self.over_ground {
            if self.sog.is_nan() || self.cog.is_nan() || self.heading_true.is_nan() {
                return (0.0, 0.0);
            }
            let drift = (self.cog - self.heading_true).to_radians();
            (self.sog * drift.cos(), self.sog * drift.sin())
        } else if self.stw.is_nan() {
            (0.0, 0.0)
        } else {
            (self.stw, 0.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrueWind {
    pub speed: f64,
    /// Relative to the bow, positive to starboard, (-180, 180]
    pub angle: f64,
    /// Degrees true, when heading is known
    pub direction: Option<f64>,
}

/// Subtracts the boat's velocity from the apparent wind vector.
pub fn calculate_true_wind_from_apparent(aws_kn: f64, awa_deg: f64, motion: &BoatMotion) -> TrueWind {
    let awa = awa_deg.to_radians();
    let (boat_x, boat_y) = motion.velocity();
    let tw_x = aws_kn * awa.cos() - boat_x;
    let tw_y = aws_kn * awa.sin() - boat_y;

    let speed = tw_x.hypot(tw_y);
    let angle = tw_y.atan2(tw_x).to_degrees();
    let direction = (!motion.heading_true.is_nan()).then(|| normalize0_360(motion.heading_true + angle));
    TrueWind { speed, angle, direction }
}

/// First-order IIR low pass; alpha 1 passes samples through.
#[derive(Debug, Clone)]
pub struct IirFilter {
    alpha: f64,
    state: Option<f64>,
}

impl IirFilter {
    pub fn new(damping_seconds: f64) -> Self {
        Self {
            alpha: alpha_for(damping_seconds),
            state: None,
        }
    }

    pub fn set_damping(&mut self, damping_seconds: f64) {
        self.alpha = alpha_for(damping_seconds);
    }

    pub fn apply(&mut self, sample: f64) -> f64 {
        let next = match self.state {
            Some(previous) => previous + self.alpha * (sample - previous),
            None => sample,
        };
        self.state = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

fn alpha_for(damping_seconds: f64) -> f64 {
    1.0 / (1.0 + damping_seconds.max(0.0))
}

/// Smooths a bearing on the unit circle so 359° and 1° average to 0°.
#[derive(Debug, Clone)]
pub struct CourseFilter {
    sin: IirFilter,
    cos: IirFilter,
}

impl CourseFilter {
    pub fn new(damping_seconds: f64) -> Self {
        Self {
            sin: IirFilter::new(damping_seconds),
            cos: IirFilter::new(damping_seconds),
        }
    }

    pub fn set_damping(&mut self, damping_seconds: f64) {
        self.sin.set_damping(damping_seconds);
        self.cos.set_damping(damping_seconds);
    }

    pub fn apply(&mut self, bearing_deg: f64) -> f64 {
        let radians = bearing_deg.to_radians();
        let sin = self.sin.apply(radians.sin());
        let cos = self.cos.apply(radians.cos());
        normalize0_360(sin.atan2(cos).to_degrees())
    }

    pub fn reset(&mut self) {
        self.sin.reset();
        self.cos.reset();
    }
}

pub struct DerivedQuantityEngine {
    sog_filter: IirFilter,
    cog_filter: CourseFilter,
}

impl DerivedQuantityEngine {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            sog_filter: IirFilter::new(config.sog_damping_seconds),
            cog_filter: CourseFilter::new(config.cog_damping_seconds),
        }
    }

    pub fn apply_config(&mut self, config: &FusionConfig) {
        self.sog_filter.set_damping(config.sog_damping_seconds);
        self.cog_filter.set_damping(config.cog_damping_seconds);
    }

    /// One derivation pass over the updates a single message produced.
    pub fn derive(&self, events: &[ChannelEvent], arbiter: &ChannelArbiter, config: &FusionConfig) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let measured = |channel: Channel| -> Option<Priority> {
            events.iter().rev().find_map(|event| match event {
                ChannelEvent::Updated { channel: updated, priority, .. }
                    if *updated == channel && !is_calculated(channel, *priority) =>
                {
                    Some(*priority)
                }
                _ => None,
            })
        };

        if measured(Channel::HeadingMagnetic).is_some() {
            if let (Some(hdm), Some(variation)) =
                (arbiter.value(Channel::HeadingMagnetic), arbiter.value(Channel::Variation))
            {
                candidates.push(Candidate::new(
                    Channel::HeadingTrue,
                    HeadingTruePriority::Calculated,
                    normalize0_360(hdm + variation),
                ));
            }
        }
        if measured(Channel::HeadingTrue).is_some() {
            if let (Some(hdt), Some(variation)) =
                (arbiter.value(Channel::HeadingTrue), arbiter.value(Channel::Variation))
            {
                candidates.push(Candidate::new(
                    Channel::HeadingMagnetic,
                    HeadingMagneticPriority::Calculated,
                    normalize0_360(hdt - variation),
                ));
            }
        }

        if measured(Channel::ApparentWindAngle).is_some() || measured(Channel::ApparentWindSpeed).is_some() {
            candidates.extend(self.true_wind_from_apparent(arbiter, config));
        }

        if let Some(priority) = measured(Channel::TrueWindAngle) {
            if let (Some(twa), Some(hdt)) = (signed_wind_angle(arbiter, Channel::TrueWindAngle), arbiter.value(Channel::HeadingTrue)) {
                let rank = if priority <= Priority::from(TrueWindAnglePriority::SignalK) {
                    TrueWindDirectionPriority::BusAngleHeading
                } else {
                    TrueWindDirectionPriority::Nmea0183AngleHeading
                };
                candidates.push(Candidate::new(Channel::TrueWindDirection, rank, normalize0_360(hdt + twa)));
            }
        }

        if measured(Channel::Latitude).is_some() || measured(Channel::Longitude).is_some() {
            candidates.extend(self.model_variation(arbiter));
        }

        candidates
    }

    fn true_wind_from_apparent(&self, arbiter: &ChannelArbiter, config: &FusionConfig) -> Vec<Candidate> {
        let (Some(aws), Some(awa)) = (
            arbiter.value(Channel::ApparentWindSpeed),
            signed_wind_angle(arbiter, Channel::ApparentWindAngle),
        ) else {
            return Vec::new();
        };
        let known = |channel| arbiter.value(channel).unwrap_or(f64::NAN);
        let motion = BoatMotion {
            sog: known(Channel::SpeedOverGround),
            cog: known(Channel::CourseOverGround),
            heading_true: known(Channel::HeadingTrue),
            stw: known(Channel::SpeedThroughWater),
            over_ground: config.true_wind_over_ground,
        };
        let true_wind = calculate_true_wind_from_apparent(aws, awa, &motion);
        let (angle, side) = to_sided_angle(true_wind.angle);

        let mut candidates = vec![
            Candidate::with_unit(Channel::TrueWindAngle, TrueWindAnglePriority::Calculated, angle, side),
            Candidate::new(Channel::TrueWindSpeed, TrueWindSpeedPriority::Calculated, true_wind.speed),
        ];
        if let Some(direction) = true_wind.direction {
            candidates.push(Candidate::new(
                Channel::TrueWindDirection,
                TrueWindDirectionPriority::Calculated,
                direction,
            ));
        }
        candidates
    }

    /// Declination from the magnetic model while nothing better holds Variation.
    fn model_variation(&self, arbiter: &ChannelArbiter) -> Option<Candidate> {
        let model_rank: Priority = Priority::from(VariationPriority::WorldMagneticModel);
        if arbiter.winning_priority(Channel::Variation) < model_rank {
            return None;
        }
        let latitude = arbiter.value(Channel::Latitude)?;
        let longitude = arbiter.value(Channel::Longitude)?;
        let when = arbiter
            .value(Channel::DateTime)
            .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds.floor() as i64, 0))
            .unwrap_or_else(Utc::now);
        match get_variation_deg(latitude, longitude, when) {
            Ok(variation) => Some(Candidate::new(Channel::Variation, model_rank, variation)),
            Err(e) => {
                trace!("No model variation at {:.3},{:.3}: {:?}", latitude, longitude, e);
                None
            }
        }
    }

    /// SOG/COG smoothing; invalidation resets the filter.
    pub fn smooth(&mut self, event: ChannelEvent) -> ChannelEvent {
        match event {
            ChannelEvent::Updated { channel: Channel::SpeedOverGround, value, unit, priority } => ChannelEvent::Updated {
                channel: Channel::SpeedOverGround,
                value: self.sog_filter.apply(value),
                unit,
                priority,
            },
            ChannelEvent::Updated { channel: Channel::CourseOverGround, value, unit, priority } => ChannelEvent::Updated {
                channel: Channel::CourseOverGround,
                value: self.cog_filter.apply(value),
                unit,
                priority,
            },
            ChannelEvent::Invalidated(Channel::SpeedOverGround) => {
                self.sog_filter.reset();
                event
            }
            ChannelEvent::Invalidated(Channel::CourseOverGround) => {
                self.cog_filter.reset();
                event
            }
            other => other,
        }
    }
}

/// Resolved wind angle as a signed value, port negative.
fn signed_wind_angle(arbiter: &ChannelArbiter, channel: Channel) -> Option<f64> {
    let state = arbiter.state(channel)?;
    arbiter.value(channel).map(|value| from_sided_angle(value, state.unit))
}
