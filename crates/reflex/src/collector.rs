//! Score Collector task.
//!
//! The sole consumer of the event channel. It timestamps events on
//! receipt, keeps the scoreboard and settles the game on `GameOver`.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, trace, warn};
use rtk::RecvError;

use crate::context::GameContext;
use crate::event::{Event, EventReceiver, UserId};
use crate::score::{ResponseOutcome, RoundState, Settlement, MAX_ROUNDS, ROSTER};

/// Observer called with every settlement, after the game was reset.
pub type SettlementHook = Arc<dyn Fn(&Settlement) + Send + Sync>;

pub struct ScoreCollector {
    ctx: Arc<GameContext>,
    rx: EventReceiver,
    state: RoundState,
    hook: Option<SettlementHook>,
}

impl ScoreCollector {
    pub fn new(ctx: Arc<GameContext>, rx: EventReceiver) -> Self {
        Self {
            ctx,
            rx,
            state: RoundState::new(),
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: SettlementHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Wait up to the receive timeout for one event and handle it.
    pub fn poll(&mut self) -> Option<Settlement> {
        match self.rx.recv_timeout(self.ctx.config().receive_timeout) {
            Ok(event) => self.handle(event),
            Err(RecvError::Timeout(waited)) => {
                trace!("no event within {waited:?}");
                None
            }
        }
    }

    /// Apply `event` at the current tick. Returns the settlement when the
    /// event ended the game.
    pub fn handle(&mut self, event: Event) -> Option<Settlement> {
        let Some(signal) = event.signal() else {
            warn!("ignoring {event}: no signal code");
            return None;
        };
        trace!("received {event} (signal {signal})");

        match event {
            Event::GameStart => {
                self.state.begin_round(self.ctx.clock().now());
                info!("Go!");
                None
            }
            Event::UserResponse(user) => {
                self.record(user);
                None
            }
            Event::GameOver => Some(self.settle()),
        }
    }

    fn record(&mut self, user: UserId) {
        let now = self.ctx.clock().now();
        match self.state.record_response(user, now) {
            ResponseOutcome::Recorded(entry) => info!(
                "TIME SPEND: {} ms ({user}, round {}/{MAX_ROUNDS})",
                entry.elapsed_ms,
                self.state.round_index()
            ),
            ResponseOutcome::NotArmed => debug!("ignoring {user}: no round is live"),
            ResponseOutcome::BoardFull(entry) => {
                warn!("scoreboard full, dropping {} ms from {user}", entry.elapsed_ms)
            }
        }
    }

    fn settle(&mut self) -> Settlement {
        info!("Settlement");
        self.ctx.driver_gate().suspend();

        let settlement = self.state.begin_settlement(&ROSTER);
        for score in settlement.scores() {
            info!("{} Score is {}", score.user, score.average());
        }
        info!("{}", Verdict(settlement.winner()));

        self.ctx.feedback().suspend();
        self.ctx.indicators().all_off();
        self.state.finish_settlement();
        // Last, so a restart can only arm a fully reset game.
        self.ctx.flag().disarm();

        if let Some(hook) = &self.hook {
            hook(&settlement);
        }
        settlement
    }

    /// Task body.
    pub fn run(mut self) -> ! {
        loop {
            self.poll();
        }
    }
}

struct Verdict(Option<UserId>);

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(user) => write!(f, "The Winner is {user}"),
            None => write!(f, "No one wins this game"),
        }
    }
}
