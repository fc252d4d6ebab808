//! # reflex
//!
//! A reaction-time game for two players built from four cooperating tasks:
//!
//! - [`driver`]     – Round Driver: random "go" delay, `GameStart`, response
//!   window, `GameOver` after [`MAX_ROUNDS`] rounds.
//! - [`collector`]  – Score Collector: sole consumer of the event channel,
//!   measures reaction times and settles the game.
//! - [`dispatcher`] – Input Dispatcher: turns trigger bits into game arming
//!   and `UserResponse` events.
//! - [`feedback`]   – Feedback Sink: indicator animation while a round is
//!   live.
//!
//! The tasks share a [`GameContext`] and a single-slot event channel.
//! [`ReactionGame`] wires everything up on an [`rtk::Kernel`].

pub mod collector;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod driver;
pub mod event;
pub mod feedback;
pub mod score;
pub mod system;

pub use collector::{ScoreCollector, SettlementHook};
pub use config::{ConfigError, GameConfig, GameConfigBuilder, TriggerMap};
pub use context::{FeedbackControl, GameContext, GameFlag};
pub use dispatcher::{DispatchReport, InputDispatcher};
pub use driver::{DriverStep, RoundDriver};
pub use event::{Event, EventReceiver, EventSender, UserId, CHANNEL_CAPACITY};
pub use feedback::FeedbackSink;
pub use score::{
    Average, Phase, ResponseOutcome, RoundState, ScoreEntry, Scoreboard, Settlement, UserScore,
    MAX_ROUNDS, MAX_USERS, ROSTER,
};
pub use system::{GameBuilder, GameError, ReactionGame};

#[cfg(test)]
mod tests;
