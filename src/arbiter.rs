//! Priority arbitration with a sticky device lock.
//!
//! A channel accepts a candidate when:
//! - its priority is strictly better than the winning one, or
//! - it comes from the locked source (the incumbent may always refresh), or
//! - its priority equals the winning one and no source holds the lock.
//!
//! Once a device wins at a given rank, other devices at that rank are shut out
//! until the watchdog reopens the channel.

use std::collections::HashMap;

use tracing::debug;

use crate::candidate::{Candidate, SourceId};
use crate::channel::Channel;
use crate::priority::Priority;
use crate::units::Unit;
use crate::watchdog::WatchdogPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    /// NaN while unknown
    pub value: f64,
    pub unit: Unit,
    pub winning_priority: Priority,
    pub locked_source: Option<SourceId>,
    pub watchdog_ticks_remaining: u32,
}

impl ChannelState {
    fn vacant(channel: Channel, policy: &WatchdogPolicy) -> Self {
        Self {
            value: f64::NAN,
            unit: channel.canonical_unit(),
            winning_priority: Priority::NONE,
            locked_source: None,
            watchdog_ticks_remaining: policy.timeout_for(channel),
        }
    }

    pub fn is_held(&self) -> bool {
        !self.winning_priority.is_none()
    }

    fn accepts(&self, candidate: &Candidate) -> bool {
        if candidate.priority < self.winning_priority {
            return true;
        }
        if candidate.source.is_some() && candidate.source == self.locked_source {
            return true;
        }
        candidate.priority == self.winning_priority && self.locked_source.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Updated {
        channel: Channel,
        value: f64,
        unit: Unit,
        priority: Priority,
    },
    Invalidated(Channel),
}

impl ChannelEvent {
    pub fn channel(&self) -> Channel {
        match self {
            ChannelEvent::Updated { channel, .. } => *channel,
            ChannelEvent::Invalidated(channel) => *channel,
        }
    }
}

/// Owns the channel state table and the queue of pending publications.
pub struct ChannelArbiter {
    states: HashMap<Channel, ChannelState>,
    policy: WatchdogPolicy,
    outbox: Vec<ChannelEvent>,
}

impl ChannelArbiter {
    pub fn new(policy: WatchdogPolicy) -> Self {
        let states = Channel::all()
            .into_iter()
            .map(|channel| (channel, ChannelState::vacant(channel, &policy)))
            .collect();
        Self {
            states,
            policy,
            outbox: Vec::new(),
        }
    }

    /// Offers a candidate; on acceptance the state, lock and group watchdog are updated
    /// together and an update event is queued.
    pub fn attempt_update(&mut self, candidate: &Candidate) -> bool {
        if !candidate.value.is_finite() {
            return false;
        }
        let Some(state) = self.states.get_mut(&candidate.channel) else {
            return false;
        };
        if !state.accepts(candidate) {
            return false;
        }

        if state.winning_priority != candidate.priority || state.locked_source != candidate.source {
            debug!(
                "{} now held at priority {} by {:?}",
                candidate.channel, candidate.priority, candidate.source
            );
        }
        state.value = candidate.value;
        state.unit = candidate.unit;
        state.winning_priority = candidate.priority;
        state.locked_source = candidate.source;

        for member in candidate.channel.watchdog_group().members() {
            if let Some(state) = self.states.get_mut(&member) {
                state.watchdog_ticks_remaining = self.policy.timeout_for(member);
            }
        }

        self.outbox.push(ChannelEvent::Updated {
            channel: candidate.channel,
            value: candidate.value,
            unit: candidate.unit,
            priority: candidate.priority,
        });
        true
    }

    /// Reopens a channel: NaN, priority 99, no lock, countdown back to its default.
    pub(crate) fn invalidate(&mut self, channel: Channel) {
        if let Some(state) = self.states.get_mut(&channel) {
            *state = ChannelState::vacant(channel, &self.policy);
            self.outbox.push(ChannelEvent::Invalidated(channel));
        }
    }

    pub(crate) fn states_mut(&mut self) -> impl Iterator<Item = (&Channel, &mut ChannelState)> {
        self.states.iter_mut()
    }

    pub fn drain_events(&mut self) -> Vec<ChannelEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn state(&self, channel: Channel) -> Option<&ChannelState> {
        self.states.get(&channel)
    }

    /// The resolved value, `None` while unknown.
    pub fn value(&self, channel: Channel) -> Option<f64> {
        self.states
            .get(&channel)
            .map(|state| state.value)
            .filter(|value| !value.is_nan())
    }

    pub fn winning_priority(&self, channel: Channel) -> Priority {
        self.states
            .get(&channel)
            .map(|state| state.winning_priority)
            .unwrap_or(Priority::NONE)
    }

    pub fn policy(&self) -> WatchdogPolicy {
        self.policy
    }

    /// New timeouts apply from the next reset; running countdowns are clamped.
    pub fn set_policy(&mut self, policy: WatchdogPolicy) {
        self.policy = policy;
        for (channel, state) in self.states.iter_mut() {
            state.watchdog_ticks_remaining = state.watchdog_ticks_remaining.min(policy.timeout_for(*channel));
        }
    }
}
