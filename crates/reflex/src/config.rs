//! Game configuration.
//!
//! Default timings: a go delay of 1 to 5 whole seconds, a one second
//! response window and a 500 ms receive timeout.

use std::time::Duration;

use rtk::indicator::MAX_INDICATORS;
use thiserror::Error;

use crate::event::UserId;
use crate::score::{MAX_USERS, ROSTER};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Mapping from trigger bits to game roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerMap {
    /// Bit that arms the game.
    pub start: u32,
    /// One response bit per player.
    pub users: [(UserId, u32); MAX_USERS],
}

impl TriggerMap {
    /// Bits the Input Dispatcher waits on.
    pub fn wait_mask(&self) -> u32 {
        self.users
            .iter()
            .fold(self.start, |mask, &(_, bit)| mask | bit)
    }

    /// Response bit of `user`.
    pub fn bit_for(&self, user: UserId) -> Option<u32> {
        self.users
            .iter()
            .find(|&&(candidate, _)| candidate == user)
            .map(|&(_, bit)| bit)
    }

    /// Players whose response bit is set in `bits`, in roster order.
    pub fn users_in(&self, bits: u32) -> impl Iterator<Item = UserId> + '_ {
        self.users
            .iter()
            .filter(move |&&(_, bit)| bits & bit != 0)
            .map(|&(user, _)| user)
    }
}

impl Default for TriggerMap {
    fn default() -> Self {
        Self {
            start: 1 << 0,
            users: [(ROSTER[0], 1 << 1), (ROSTER[1], 1 << 2)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("go delay range is inverted: min {min:?} > max {max:?}")]
    InvertedDelay { min: Duration, max: Duration },

    #[error("`{0}` must be non-zero")]
    ZeroDuration(&'static str),

    #[error("go delay range {span:?} is not a multiple of the granularity {granularity:?}")]
    UnalignedDelay { span: Duration, granularity: Duration },

    #[error("go delay range {span:?} has too many steps of {granularity:?}")]
    TooManyDelaySteps { span: Duration, granularity: Duration },

    #[error("trigger for {role} has no bits")]
    EmptyTrigger { role: &'static str },

    #[error("trigger bits overlap: {0:#x}")]
    OverlappingTriggers(u32),

    #[error("indicator {index} is out of range for a bank of {count}")]
    IndicatorOutOfRange { index: u8, count: u8 },

    #[error("armed indicator {0} is also a feedback lane")]
    ArmedIndicatorIsLane(u8),
}

/// Timing and wiring of one game instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Shortest wait before the go signal.
    pub min_delay: Duration,
    /// Longest wait before the go signal.
    pub max_delay: Duration,
    /// Go delays are whole multiples of this above `min_delay`.
    pub delay_granularity: Duration,
    /// Time players get to respond after the go signal.
    pub response_window: Duration,
    /// Bounded wait of the Score Collector's receive.
    pub receive_timeout: Duration,
    /// Period of one Feedback Sink animation step.
    pub animation_step: Duration,
    pub triggers: TriggerMap,
    /// Indicators `0..feedback_lanes` are animated by the Feedback Sink.
    pub feedback_lanes: u8,
    /// Indicator toggled when the game is armed.
    pub armed_indicator: u8,
    /// Size of the indicator bank.
    pub indicator_count: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            delay_granularity: Duration::from_secs(1),
            response_window: Duration::from_secs(1),
            receive_timeout: Duration::from_millis(500),
            animation_step: Duration::from_millis(100),
            triggers: TriggerMap::default(),
            feedback_lanes: 4,
            armed_indicator: 4,
            indicator_count: 5,
        }
    }
}

impl GameConfig {
    pub fn builder() -> GameConfigBuilder {
        GameConfigBuilder::default()
    }

    /// Every timing divided by `factor`. Used by the simulator's fast mode.
    pub fn scaled_down(&self, factor: u32) -> Self {
        let factor = factor.max(1);
        Self {
            min_delay: self.min_delay / factor,
            max_delay: self.max_delay / factor,
            delay_granularity: self.delay_granularity / factor,
            response_window: self.response_window / factor,
            receive_timeout: self.receive_timeout / factor,
            animation_step: self.animation_step / factor,
            ..self.clone()
        }
    }

    /// Number of distinct go delays, `1` for a fixed delay. `None` when the
    /// count does not fit a `u64`.
    pub fn delay_steps(&self) -> Option<u64> {
        let span = self.max_delay.saturating_sub(self.min_delay);
        if self.delay_granularity.is_zero() {
            return Some(1);
        }
        u64::try_from(span.as_nanos() / self.delay_granularity.as_nanos())
            .ok()?
            .checked_add(1)
    }

    /// Go delay of step `step`, clamped to `max_delay`.
    pub fn delay_at(&self, step: u64) -> Duration {
        let offset = self.delay_granularity.as_nanos() * u128::from(step);
        let span = self.max_delay.saturating_sub(self.min_delay);
        if offset >= span.as_nanos() {
            return self.min_delay + span;
        }
        // `offset` is below `span`, so the seconds fit a u64.
        let secs = (offset / NANOS_PER_SEC) as u64;
        let nanos = (offset % NANOS_PER_SEC) as u32;
        self.min_delay + Duration::new(secs, nanos)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_delay > self.max_delay {
            return Err(ConfigError::InvertedDelay {
                min: self.min_delay,
                max: self.max_delay,
            });
        }
        for (name, value) in [
            ("delay_granularity", self.delay_granularity),
            ("receive_timeout", self.receive_timeout),
            ("animation_step", self.animation_step),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        let span = self.max_delay - self.min_delay;
        if span.as_nanos() % self.delay_granularity.as_nanos() != 0 {
            return Err(ConfigError::UnalignedDelay {
                span,
                granularity: self.delay_granularity,
            });
        }
        if self.delay_steps().is_none() {
            return Err(ConfigError::TooManyDelaySteps {
                span,
                granularity: self.delay_granularity,
            });
        }

        self.validate_triggers()?;
        self.validate_indicators()
    }

    fn validate_triggers(&self) -> Result<(), ConfigError> {
        let roles = core::iter::once(("start", self.triggers.start)).chain(
            self.triggers
                .users
                .iter()
                .zip(["user 1", "user 2"])
                .map(|(&(_, bit), role)| (role, bit)),
        );

        let mut seen = 0u32;
        for (role, bits) in roles {
            if bits == 0 {
                return Err(ConfigError::EmptyTrigger { role });
            }
            if seen & bits != 0 {
                return Err(ConfigError::OverlappingTriggers(seen & bits));
            }
            seen |= bits;
        }
        Ok(())
    }

    fn validate_indicators(&self) -> Result<(), ConfigError> {
        if self.indicator_count > MAX_INDICATORS {
            return Err(ConfigError::IndicatorOutOfRange {
                index: self.indicator_count,
                count: MAX_INDICATORS,
            });
        }
        if self.feedback_lanes > self.indicator_count {
            return Err(ConfigError::IndicatorOutOfRange {
                index: self.feedback_lanes.saturating_sub(1),
                count: self.indicator_count,
            });
        }
        if self.armed_indicator >= self.indicator_count {
            return Err(ConfigError::IndicatorOutOfRange {
                index: self.armed_indicator,
                count: self.indicator_count,
            });
        }
        if self.armed_indicator < self.feedback_lanes {
            return Err(ConfigError::ArmedIndicatorIsLane(self.armed_indicator));
        }
        Ok(())
    }
}

/// Builder for [`GameConfig`].
#[derive(Debug, Clone, Default)]
pub struct GameConfigBuilder {
    config: GameConfig,
}

impl GameConfigBuilder {
    /// Sets the go delay range.
    pub fn delay_range(mut self, min: Duration, max: Duration) -> Self {
        self.config.min_delay = min;
        self.config.max_delay = max;
        self
    }

    pub fn delay_granularity(mut self, granularity: Duration) -> Self {
        self.config.delay_granularity = granularity;
        self
    }

    pub fn response_window(mut self, window: Duration) -> Self {
        self.config.response_window = window;
        self
    }

    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.config.receive_timeout = timeout;
        self
    }

    pub fn animation_step(mut self, step: Duration) -> Self {
        self.config.animation_step = step;
        self
    }

    pub fn triggers(mut self, triggers: TriggerMap) -> Self {
        self.config.triggers = triggers;
        self
    }

    /// Sets the indicator layout.
    pub fn indicators(mut self, count: u8, feedback_lanes: u8, armed_indicator: u8) -> Self {
        self.config.indicator_count = count;
        self.config.feedback_lanes = feedback_lanes;
        self.config.armed_indicator = armed_indicator;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<GameConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
