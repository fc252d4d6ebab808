//! Events carried by the game channel.
//!
//! Events carry no timestamp. The Score Collector reads the tick counter
//! when an event arrives and measures it against the round start.

use core::fmt;

/// The channel holds one in-flight event; producers must not assume
/// buffering.
pub const CHANNEL_CAPACITY: usize = 1;

pub type EventSender = rtk::Sender<Event, CHANNEL_CAPACITY>;
pub type EventReceiver = rtk::Receiver<Event, CHANNEL_CAPACITY>;

/// Player identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub u8);

impl UserId {
    pub const ONE: UserId = UserId(1);
    pub const TWO: UserId = UserId(2);

    pub const fn new(id: u8) -> Self {
        UserId(id)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The "go" signal of a round.
    GameStart,
    /// All rounds were played; settle the game.
    GameOver,
    /// A player pressed their button.
    UserResponse(UserId),
}

impl Event {
    /// Wire code of the event: users keep their id, `GameOver` is 3 and
    /// `GameStart` is 4. `None` for user ids that collide with those codes.
    pub fn signal(&self) -> Option<u8> {
        match self {
            Event::UserResponse(UserId(id @ 1..=2)) => Some(*id),
            Event::UserResponse(_) => None,
            Event::GameOver => Some(3),
            Event::GameStart => Some(4),
        }
    }

    pub fn from_signal(signal: u8) -> Option<Event> {
        match signal {
            1 | 2 => Some(Event::UserResponse(UserId(signal))),
            3 => Some(Event::GameOver),
            4 => Some(Event::GameStart),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::GameStart => write!(f, "GameStart"),
            Event::GameOver => write!(f, "GameOver"),
            Event::UserResponse(user) => write!(f, "UserResponse({user})"),
        }
    }
}
