//! Scoreboard, round state and settlement.
//!
//! [`RoundState`] is owned by the Score Collector and is the only place
//! reaction times are stored. Everything here is plain data; the collector
//! drives it from channel events.

use core::fmt;

use heapless::Vec;
use rtk::Tick;

use crate::event::UserId;

/// Rounds per game. Fixed; not configurable.
pub const MAX_ROUNDS: usize = 10;

/// Number of players.
pub const MAX_USERS: usize = 2;

/// Players taking part in every game.
pub const ROSTER: [UserId; MAX_USERS] = [UserId::ONE, UserId::TWO];

/// One recorded reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEntry {
    pub user: UserId,
    pub elapsed_ms: u64,
}

impl ScoreEntry {
    pub const fn new(user: UserId, elapsed_ms: u64) -> Self {
        Self { user, elapsed_ms }
    }
}

/// Fixed-capacity, round-ordered list of reactions.
#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    entries: Vec<ScoreEntry, MAX_ROUNDS>,
}

impl Scoreboard {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry. A full board rejects the entry and hands it back.
    pub fn push(&mut self, entry: ScoreEntry) -> Result<(), ScoreEntry> {
        self.entries.push(entry)
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Totals for `user` across the board.
    pub fn score_for(&self, user: UserId) -> UserScore {
        self.entries
            .iter()
            .filter(|entry| entry.user == user)
            .fold(UserScore::empty(user), |mut score, entry| {
                score.total_ms += entry.elapsed_ms;
                score.responses += 1;
                score
            })
    }
}

/// Mean reaction time of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Average {
    /// The player has no recorded reactions.
    NoData,
    /// Mean in whole milliseconds, rounded down.
    Mean(u64),
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Average::NoData => write!(f, "no data"),
            Average::Mean(ms) => write!(f, "{ms} ms"),
        }
    }
}

/// Per-player totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserScore {
    pub user: UserId,
    pub total_ms: u64,
    pub responses: u32,
}

impl UserScore {
    pub const fn empty(user: UserId) -> Self {
        Self {
            user,
            total_ms: 0,
            responses: 0,
        }
    }

    pub fn average(&self) -> Average {
        if self.responses == 0 {
            Average::NoData
        } else {
            Average::Mean(self.total_ms / u64::from(self.responses))
        }
    }

    /// Exact comparison of means, `None` if either side has no data.
    fn cmp_mean(&self, other: &UserScore) -> Option<core::cmp::Ordering> {
        if self.responses == 0 || other.responses == 0 {
            return None;
        }
        let lhs = u128::from(self.total_ms) * u128::from(other.responses);
        let rhs = u128::from(other.total_ms) * u128::from(self.responses);
        Some(lhs.cmp(&rhs))
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    scores: Vec<UserScore, MAX_USERS>,
    winner: Option<UserId>,
    rounds_recorded: usize,
}

impl Settlement {
    /// Score `board` for every player in `roster`.
    ///
    /// The winner is the player with the strictly lowest mean. Players
    /// without data cannot win; a tie for the lowest mean has no winner.
    pub fn from_board(board: &Scoreboard, roster: &[UserId]) -> Self {
        let scores: Vec<UserScore, MAX_USERS> = roster
            .iter()
            .take(MAX_USERS)
            .map(|&user| board.score_for(user))
            .collect();

        let mut best: Option<&UserScore> = None;
        let mut tied = false;
        for score in scores.iter().filter(|score| score.responses > 0) {
            match best.and_then(|current| score.cmp_mean(current)) {
                None => best = Some(score),
                Some(core::cmp::Ordering::Less) => {
                    best = Some(score);
                    tied = false;
                }
                Some(core::cmp::Ordering::Equal) => tied = true,
                Some(core::cmp::Ordering::Greater) => {}
            }
        }
        let winner = if tied { None } else { best.map(|score| score.user) };

        Self {
            scores,
            winner,
            rounds_recorded: board.len(),
        }
    }

    pub fn scores(&self) -> &[UserScore] {
        &self.scores
    }

    pub fn score(&self, user: UserId) -> Option<&UserScore> {
        self.scores.iter().find(|score| score.user == user)
    }

    pub fn average(&self, user: UserId) -> Average {
        self.score(user)
            .map(UserScore::average)
            .unwrap_or(Average::NoData)
    }

    pub fn winner(&self) -> Option<UserId> {
        self.winner
    }

    pub fn rounds_recorded(&self) -> usize {
        self.rounds_recorded
    }
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for score in &self.scores {
            write!(f, "{}: {} ({} rounds), ", score.user, score.average(), score.responses)?;
        }
        match self.winner {
            Some(user) => write!(f, "winner {user}"),
            None => write!(f, "no winner"),
        }
    }
}

/// Collector state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForEvent,
    Armed { round_start: Tick },
    Settling,
}

/// What happened to a `UserResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Stored as the reaction for the current round.
    Recorded(ScoreEntry),
    /// No round was live: pressed before the go signal, or after another
    /// player already took the round.
    NotArmed,
    /// The scoreboard is full; the entry was dropped.
    BoardFull(ScoreEntry),
}

/// Round bookkeeping owned by the Score Collector.
#[derive(Debug, Clone)]
pub struct RoundState {
    phase: Phase,
    round_index: usize,
    board: Scoreboard,
}

impl RoundState {
    pub const fn new() -> Self {
        Self {
            phase: Phase::WaitingForEvent,
            round_index: 0,
            board: Scoreboard::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Rounds recorded so far; never exceeds [`MAX_ROUNDS`].
    pub fn round_index(&self) -> usize {
        self.round_index
    }

    pub fn board(&self) -> &Scoreboard {
        &self.board
    }

    /// Mark the start of a round at `now`.
    pub fn begin_round(&mut self, now: Tick) {
        self.phase = Phase::Armed { round_start: now };
    }

    /// Record `user`'s reaction at `now`.
    pub fn record_response(&mut self, user: UserId, now: Tick) -> ResponseOutcome {
        let Phase::Armed { round_start } = self.phase else {
            return ResponseOutcome::NotArmed;
        };
        self.phase = Phase::WaitingForEvent;

        let entry = ScoreEntry::new(user, now.millis_since(round_start));
        match self.board.push(entry) {
            Ok(()) => {
                self.round_index += 1;
                ResponseOutcome::Recorded(entry)
            }
            Err(entry) => ResponseOutcome::BoardFull(entry),
        }
    }

    /// Enter settlement and score the board.
    pub fn begin_settlement(&mut self, roster: &[UserId]) -> Settlement {
        self.phase = Phase::Settling;
        Settlement::from_board(&self.board, roster)
    }

    /// Clear everything and wait for the next game.
    pub fn finish_settlement(&mut self) {
        self.board.clear();
        self.round_index = 0;
        self.phase = Phase::WaitingForEvent;
    }
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}
