//! Simulated players.
//!
//! A bot watches the feedback lanes. When the chase lights up it waits its
//! reaction time and presses its button, once per lit phase.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use reflex::{GameContext, UserId};

const POLL_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
pub struct BotProfile {
    pub user: UserId,
    /// Mean reaction time.
    pub mean: Duration,
    /// Reaction times are uniform in `mean ± jitter`.
    pub jitter: Duration,
}

impl BotProfile {
    fn reaction(&self, rng: &mut SmallRng) -> Duration {
        let low = self.mean.saturating_sub(self.jitter);
        let high = self.mean + self.jitter;
        if low == high {
            return low;
        }
        Duration::from_micros(rng.gen_range(low.as_micros() as u64..=high.as_micros() as u64))
    }
}

/// Start a bot thread for `profile`. It runs until `stop` is set.
pub fn spawn(
    ctx: Arc<GameContext>,
    profile: BotProfile,
    seed: u64,
    stop: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("bot-{}", profile.user))
        .spawn(move || run(&ctx, profile, seed, &stop))
}

fn run(ctx: &GameContext, profile: BotProfile, seed: u64, stop: &AtomicBool) {
    let Some(bit) = ctx.trigger_map().bit_for(profile.user) else {
        warn!("{} has no trigger bit, bot not started", profile.user);
        return;
    };
    let lanes = (1u32 << ctx.feedback().lanes()) - 1;
    let mut rng = SmallRng::seed_from_u64(seed ^ u64::from(profile.user.raw()));
    let mut pressed = false;

    while !stop.load(Ordering::Relaxed) {
        let lit = ctx.indicators().snapshot() & lanes != 0;
        if lit && !pressed {
            let reaction = profile.reaction(&mut rng);
            thread::sleep(reaction);
            debug!("{} presses after {} ms", profile.user, reaction.as_millis());
            ctx.triggers().set(bit);
            pressed = true;
        } else if !lit {
            pressed = false;
        }
        thread::sleep(POLL_PERIOD);
    }
}
