//! Feedback Sink task: a one-hot chase over the feedback lanes.

use std::sync::Arc;

use rtk::task::delay;

use crate::context::GameContext;

pub struct FeedbackSink {
    ctx: Arc<GameContext>,
    position: u8,
}

impl FeedbackSink {
    pub fn new(ctx: Arc<GameContext>) -> Self {
        Self { ctx, position: 0 }
    }

    /// Lane lit by the next step.
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Wait until resumed, then advance the chase by one lane.
    pub fn step(&mut self) {
        let feedback = self.ctx.feedback();
        let lanes = feedback.lanes();
        if lanes == 0 {
            feedback.gate().wait_resumed();
            return;
        }
        let indicators = self.ctx.indicators();
        let position = self.position;
        feedback.gate().run_resumed(|| {
            for lane in 0..lanes {
                indicators.set(lane, lane == position);
            }
        });
        self.position = (position + 1) % lanes;
    }

    /// Task body.
    pub fn run(mut self) -> ! {
        let period = self.ctx.config().animation_step;
        loop {
            self.step();
            delay(period);
        }
    }
}
