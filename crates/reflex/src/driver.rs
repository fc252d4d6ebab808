//! Round Driver task.
//!
//! Issues the go signal of each round after a random delay and ends the
//! game after [`MAX_ROUNDS`] rounds. The driver starts parked; the Input
//! Dispatcher resumes it when a game is armed.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rtk::task::delay;

use crate::context::GameContext;
use crate::event::{Event, EventSender};
use crate::score::MAX_ROUNDS;

/// Outcome of one driver iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStep {
    /// A round was played. `delivered` is `false` if the go signal found the
    /// channel full.
    RoundIssued {
        round: usize,
        delay: Duration,
        delivered: bool,
    },
    /// `GameOver` was sent; the driver is parked until the next game.
    GameOverSent,
    /// `GameOver` found the channel full; it is retried on the next
    /// iteration.
    GameOverDeferred,
}

pub struct RoundDriver {
    ctx: Arc<GameContext>,
    tx: EventSender,
    rng: SmallRng,
    rounds_issued: usize,
}

impl RoundDriver {
    /// Create a driver whose random delays are seeded from the current tick.
    pub fn new(ctx: Arc<GameContext>, tx: EventSender) -> Self {
        let seed = ctx.clock().now().raw();
        Self::with_seed(ctx, tx, seed)
    }

    pub fn with_seed(ctx: Arc<GameContext>, tx: EventSender, seed: u64) -> Self {
        debug!("round driver seeded with {seed}");
        Self {
            ctx,
            tx,
            rng: SmallRng::seed_from_u64(seed),
            rounds_issued: 0,
        }
    }

    /// Rounds issued in the current game.
    pub fn rounds_issued(&self) -> usize {
        self.rounds_issued
    }

    /// Draw the next go delay, uniform over the configured steps.
    pub fn next_delay(&mut self) -> Duration {
        let config = self.ctx.config();
        // Validated configs always have a step count.
        let steps = config.delay_steps().unwrap_or(1);
        config.delay_at(self.rng.gen_range(0..steps))
    }

    /// Run one iteration. The caller must have waited for the driver gate.
    pub fn step(&mut self) -> DriverStep {
        if self.rounds_issued >= MAX_ROUNDS {
            return self.finish_game();
        }

        self.rounds_issued += 1;
        let round = self.rounds_issued;
        let go_delay = self.next_delay();
        info!(
            "round {round}/{MAX_ROUNDS}: tick {}, go in {} ms",
            self.ctx.clock().now(),
            go_delay.as_millis()
        );

        let feedback = self.ctx.feedback();
        feedback.suspend();
        delay(go_delay);

        let delivered = match self.tx.try_send(Event::GameStart) {
            Ok(()) => true,
            Err(err) => {
                warn!("could not send {} to the queue: {err}", err.0);
                false
            }
        };

        feedback.resume();
        delay(self.ctx.config().response_window);

        DriverStep::RoundIssued {
            round,
            delay: go_delay,
            delivered,
        }
    }

    fn finish_game(&mut self) -> DriverStep {
        info!("**** THE GAME IS OVER ****");
        let gate = self.ctx.driver_gate();
        // Park before sending so a fast settlement and re-arm cannot be lost.
        gate.suspend();
        match self.tx.try_send(Event::GameOver) {
            Ok(()) => {
                self.rounds_issued = 0;
                DriverStep::GameOverSent
            }
            Err(err) => {
                warn!("could not send {} to the queue: {err}", err.0);
                gate.resume();
                delay(self.ctx.config().receive_timeout);
                DriverStep::GameOverDeferred
            }
        }
    }

    /// Task body.
    pub fn run(mut self) -> ! {
        loop {
            self.ctx.driver_gate().wait_resumed();
            self.step();
        }
    }
}
