//! State shared by the game tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;
use rtk::{EventBits, IndicatorSink, TaskGate, TickSource};

use crate::config::{GameConfig, TriggerMap};

/// The "game armed" flag.
///
/// Only the Input Dispatcher arms it and only the Score Collector disarms
/// it.
#[derive(Debug, Default)]
pub struct GameFlag {
    armed: AtomicBool,
}

impl GameFlag {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Arm the game. Returns `false` if it was already armed.
    pub fn try_arm(&self) -> bool {
        self.armed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }
}

/// Suspend/resume control of the Feedback Sink.
///
/// Suspending waits for an in-progress animation step and then blanks the
/// feedback lanes.
pub struct FeedbackControl {
    gate: TaskGate,
    indicators: Arc<dyn IndicatorSink>,
    lanes: u8,
}

impl FeedbackControl {
    pub fn new(indicators: Arc<dyn IndicatorSink>, lanes: u8) -> Self {
        Self {
            gate: TaskGate::suspended("feedback_sink"),
            indicators,
            lanes,
        }
    }

    pub fn suspend(&self) {
        self.gate.suspend();
        for lane in 0..self.lanes {
            self.indicators.set(lane, false);
        }
    }

    pub fn resume(&self) {
        self.gate.resume();
    }

    pub fn is_suspended(&self) -> bool {
        self.gate.is_suspended()
    }

    pub fn lanes(&self) -> u8 {
        self.lanes
    }

    pub(crate) fn gate(&self) -> &TaskGate {
        &self.gate
    }
}

/// Everything the four tasks share, held behind an `Arc`.
pub struct GameContext {
    config: GameConfig,
    clock: Arc<dyn TickSource>,
    indicators: Arc<dyn IndicatorSink>,
    triggers: Arc<EventBits>,
    flag: GameFlag,
    driver_gate: TaskGate,
    feedback: FeedbackControl,
}

impl GameContext {
    /// Build the shared state. The Round Driver and Feedback Sink start
    /// suspended and the game starts disarmed.
    pub fn new(
        config: GameConfig,
        clock: Arc<dyn TickSource>,
        indicators: Arc<dyn IndicatorSink>,
        triggers: Arc<EventBits>,
    ) -> Self {
        debug!(
            "game context: {} feedback lanes, armed indicator {}, trigger mask {:#x}",
            config.feedback_lanes,
            config.armed_indicator,
            config.triggers.wait_mask()
        );
        let feedback = FeedbackControl::new(indicators.clone(), config.feedback_lanes);
        Self {
            config,
            clock,
            indicators,
            triggers,
            flag: GameFlag::new(),
            driver_gate: TaskGate::suspended("round_driver"),
            feedback,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn trigger_map(&self) -> &TriggerMap {
        &self.config.triggers
    }

    pub fn clock(&self) -> &dyn TickSource {
        self.clock.as_ref()
    }

    pub fn indicators(&self) -> &dyn IndicatorSink {
        self.indicators.as_ref()
    }

    /// Trigger input of the Input Dispatcher.
    pub fn triggers(&self) -> &EventBits {
        &self.triggers
    }

    pub fn flag(&self) -> &GameFlag {
        &self.flag
    }

    pub fn driver_gate(&self) -> &TaskGate {
        &self.driver_gate
    }

    pub fn feedback(&self) -> &FeedbackControl {
        &self.feedback
    }
}
