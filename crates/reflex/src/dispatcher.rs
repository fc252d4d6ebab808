//! Input Dispatcher task.
//!
//! Turns trigger bits into game actions: the start bit arms an idle game and
//! wakes the Round Driver, response bits become `UserResponse` events while
//! the game is armed.

use std::sync::Arc;

use heapless::Vec;
use log::{debug, info, warn};

use crate::context::GameContext;
use crate::event::{Event, EventSender, UserId};
use crate::score::MAX_USERS;

/// What one batch of trigger bits did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// The batch armed the game.
    pub armed: bool,
    /// Responses placed on the channel.
    pub forwarded: Vec<UserId, MAX_USERS>,
    /// Responses rejected by a full channel.
    pub dropped: Vec<UserId, MAX_USERS>,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        !self.armed && self.forwarded.is_empty() && self.dropped.is_empty()
    }
}

pub struct InputDispatcher {
    ctx: Arc<GameContext>,
    tx: EventSender,
}

impl InputDispatcher {
    pub fn new(ctx: Arc<GameContext>, tx: EventSender) -> Self {
        Self { ctx, tx }
    }

    /// Act on a batch of trigger bits taken from the trigger source.
    ///
    /// Responses in the same batch as an arming start bit are not forwarded;
    /// a round cannot be live yet.
    pub fn handle(&self, bits: u32) -> DispatchReport {
        let map = *self.ctx.trigger_map();
        let was_armed = self.ctx.flag().is_armed();
        let mut report = DispatchReport::default();

        if bits & map.start != 0 {
            if !was_armed && self.ctx.flag().try_arm() {
                self.ctx
                    .indicators()
                    .toggle(self.ctx.config().armed_indicator);
                self.ctx.driver_gate().resume();
                info!("game armed");
                report.armed = true;
            } else {
                debug!("start trigger ignored, game already armed");
            }
        }

        if was_armed {
            for user in map.users_in(bits) {
                match self.tx.try_send(Event::UserResponse(user)) {
                    Ok(()) => {
                        let _ = report.forwarded.push(user);
                    }
                    Err(err) => {
                        warn!("could not send {} to the queue: {err}", err.0);
                        let _ = report.dropped.push(user);
                    }
                }
            }
        } else if map.users_in(bits).next().is_some() {
            debug!("response trigger {bits:#x} ignored, game not armed");
        }

        if bits & !map.wait_mask() != 0 {
            debug!("unmapped trigger bits {:#x}", bits & !map.wait_mask());
        }
        report
    }

    /// Task body.
    pub fn run(self) -> ! {
        let mask = self.ctx.trigger_map().wait_mask();
        loop {
            let bits = self.ctx.triggers().wait_any(mask, None);
            if bits != 0 {
                self.handle(bits);
            }
        }
    }
}
