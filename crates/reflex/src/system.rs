//! Wiring of the four tasks onto an [`rtk::Kernel`].

use std::sync::Arc;

use log::{error, info};
use rtk::{
    channel, EventBits, IndicatorBank, IndicatorSink, Kernel, KernelConfig, KernelError,
    SystemClock, TaskSpec, TickSource,
};
use thiserror::Error;

use crate::collector::{ScoreCollector, SettlementHook};
use crate::config::{ConfigError, GameConfig};
use crate::context::GameContext;
use crate::dispatcher::InputDispatcher;
use crate::driver::RoundDriver;
use crate::event::{Event, UserId, CHANNEL_CAPACITY};
use crate::feedback::FeedbackSink;

pub const INPUT_DISPATCHER: TaskSpec = TaskSpec::new("input_dispatcher", 0, 512);
pub const SCORE_COLLECTOR: TaskSpec = TaskSpec::new("score_collector", 0, 1000);
pub const ROUND_DRIVER: TaskSpec = TaskSpec::new("round_driver", 1, 512);
pub const FEEDBACK_SINK: TaskSpec = TaskSpec::new("feedback_sink", 1, 1000);

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Builder for a running [`ReactionGame`].
#[derive(Default)]
pub struct GameBuilder {
    config: GameConfig,
    kernel_config: KernelConfig,
    clock: Option<Arc<dyn TickSource>>,
    indicators: Option<Arc<dyn IndicatorSink>>,
    triggers: Option<Arc<EventBits>>,
    hook: Option<SettlementHook>,
    seed: Option<u64>,
}

impl GameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn kernel_config(mut self, config: KernelConfig) -> Self {
        self.kernel_config = config;
        self
    }

    /// Tick source; the host monotonic clock by default.
    pub fn clock(mut self, clock: Arc<dyn TickSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Indicator outputs; an in-memory bank by default.
    pub fn indicators(mut self, indicators: Arc<dyn IndicatorSink>) -> Self {
        self.indicators = Some(indicators);
        self
    }

    /// Trigger source shared with button handlers.
    pub fn triggers(mut self, triggers: Arc<EventBits>) -> Self {
        self.triggers = Some(triggers);
        self
    }

    pub fn on_settlement(mut self, hook: SettlementHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Fix the Round Driver seed instead of reading the tick counter.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Create the channel and start every task.
    pub fn start(self) -> Result<ReactionGame, GameError> {
        self.config.validate()?;

        let indicators: Arc<dyn IndicatorSink> = match self.indicators {
            Some(indicators) => indicators,
            None => Arc::new(IndicatorBank::new(self.config.indicator_count)),
        };
        let clock: Arc<dyn TickSource> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock::new()),
        };
        let triggers = self.triggers.unwrap_or_default();
        let ctx = Arc::new(GameContext::new(self.config, clock, indicators, triggers));

        let (tx, rx) = channel::<Event, CHANNEL_CAPACITY>();
        let dispatcher = InputDispatcher::new(ctx.clone(), tx.clone());
        let mut collector = ScoreCollector::new(ctx.clone(), rx);
        if let Some(hook) = self.hook {
            collector = collector.with_hook(hook);
        }
        let driver = match self.seed {
            Some(seed) => RoundDriver::with_seed(ctx.clone(), tx, seed),
            None => RoundDriver::new(ctx.clone(), tx),
        };
        let feedback = FeedbackSink::new(ctx.clone());

        // Tasks stay held until all four exist, so a failed start runs none.
        let kernel = Kernel::held(self.kernel_config);
        let spawned = kernel
            .spawn(INPUT_DISPATCHER, move || dispatcher.run())
            .and_then(|()| kernel.spawn(SCORE_COLLECTOR, move || collector.run()))
            .and_then(|()| kernel.spawn(ROUND_DRIVER, move || driver.run()))
            .and_then(|()| kernel.spawn(FEEDBACK_SINK, move || feedback.run()));
        if let Err(err) = spawned {
            kernel.abort();
            error!("could not start the game: {err}");
            return Err(err.into());
        }
        kernel.release();

        info!("{}: {} tasks running", kernel.config().name, kernel.tasks().len());
        Ok(ReactionGame { ctx, kernel })
    }
}

/// A started game. Tasks run for the life of the process.
pub struct ReactionGame {
    ctx: Arc<GameContext>,
    kernel: Kernel,
}

impl ReactionGame {
    pub fn builder() -> GameBuilder {
        GameBuilder::new()
    }

    pub fn context(&self) -> &Arc<GameContext> {
        &self.ctx
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Raise the start trigger.
    pub fn press_start(&self) {
        self.ctx.triggers().set(self.ctx.trigger_map().start);
    }

    /// Raise `user`'s response trigger. Returns `false` for an unknown user.
    pub fn press(&self, user: UserId) -> bool {
        match self.ctx.trigger_map().bit_for(user) {
            Some(bit) => {
                self.ctx.triggers().set(bit);
                true
            }
            None => false,
        }
    }

    /// Bitmask of lit indicators.
    pub fn indicators(&self) -> u32 {
        self.ctx.indicators().snapshot()
    }
}
