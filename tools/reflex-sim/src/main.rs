use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, trace};
use reflex::{GameConfig, ReactionGame, Settlement, ROSTER};
use rtk::KernelConfig;

mod bots;
mod display;
mod keyboard;
mod logger;

use bots::BotProfile;
use display::Tally;
use keyboard::KeyCommand;

/// Poll period of the main thread while the game runs.
const IDLE_POLL: Duration = Duration::from_millis(20);

#[derive(Parser, Debug)]
#[command(author, version, about = "Host simulator for the reflex reaction-time game")]
struct Opts {
    /// Seed for the round delays (default: tick count at start).
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Run every timing ten times faster.
    #[arg(long)]
    fast: bool,

    /// Play from the keyboard instead of with bots.
    #[arg(long, conflicts_with = "players")]
    interactive: bool,

    /// Number of bot players.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=2))]
    players: u8,

    /// Mean reaction time of User1's bot in milliseconds.
    #[arg(long, default_value_t = 250, value_name = "MS")]
    user1_ms: u64,

    /// Mean reaction time of User2's bot in milliseconds.
    #[arg(long, default_value_t = 280, value_name = "MS")]
    user2_ms: u64,

    /// Bot reaction jitter in milliseconds.
    #[arg(long, default_value_t = 60, value_name = "MS")]
    jitter_ms: u64,

    /// Games to play with bots.
    #[arg(long, default_value_t = 1)]
    games: u32,

    /// Draw the indicator strip on every change.
    #[arg(long)]
    show_leds: bool,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Opts {
    fn game_config(&self) -> GameConfig {
        let config = GameConfig::default();
        if self.fast {
            config.scaled_down(10)
        } else {
            config
        }
    }

    fn bot_profiles(&self) -> Vec<BotProfile> {
        let scale = if self.fast { 10 } else { 1 };
        let jitter = Duration::from_millis(self.jitter_ms) / scale;
        ROSTER
            .iter()
            .zip([self.user1_ms, self.user2_ms])
            .take(usize::from(self.players))
            .map(|(&user, mean)| BotProfile {
                user,
                mean: Duration::from_millis(mean) / scale,
                jitter,
            })
            .collect()
    }
}

fn enter_low_power() {
    trace!("idle");
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    logger::init(logger::level_for(opts.verbose)).context("installing the console logger")?;
    rtk::fault::install_panic_trap();

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = quit.clone();
        ctrlc::set_handler(move || quit.store(true, Ordering::Relaxed))
            .context("installing the Ctrl-C handler")?;
    }

    let (settled_tx, settled_rx) = mpsc::channel();
    let mut builder = ReactionGame::builder()
        .config(opts.game_config())
        .kernel_config(
            KernelConfig::builder()
                .name("reflex-sim")
                .idle_callback(enter_low_power)
                .build(),
        )
        .on_settlement(Arc::new(move |settlement: &Settlement| {
            let _ = settled_tx.send(settlement.clone());
        }));
    if let Some(seed) = opts.seed {
        builder = builder.seed(seed);
    }
    let game = builder.start().context("starting the game")?;

    if opts.show_leds {
        display::spawn(game.context().clone(), quit.clone())
            .context("starting the indicator display")?;
    }

    let tally = if opts.interactive {
        run_interactive(&game, &settled_rx, &quit)
    } else {
        run_bots(&opts, &game, &settled_rx, &quit)?
    };

    quit.store(true, Ordering::Relaxed);
    if tally.games() > 0 {
        display::print_tally(&tally);
    }
    Ok(())
}

/// Wait for the next settlement, idling the kernel meanwhile.
fn await_settlement(
    game: &ReactionGame,
    settlements: &Receiver<Settlement>,
    quit: &AtomicBool,
) -> Option<Settlement> {
    while !quit.load(Ordering::Relaxed) {
        match settlements.recv_timeout(IDLE_POLL) {
            Ok(settlement) => return Some(settlement),
            Err(RecvTimeoutError::Timeout) => game.kernel().idle(),
            Err(RecvTimeoutError::Disconnected) => return None,
        }
    }
    None
}

fn run_bots(
    opts: &Opts,
    game: &ReactionGame,
    settlements: &Receiver<Settlement>,
    quit: &AtomicBool,
) -> Result<Tally> {
    let seed = opts.seed.unwrap_or_else(|| u64::from(std::process::id()));
    let stop = Arc::new(AtomicBool::new(false));
    for profile in opts.bot_profiles() {
        info!(
            "{} bot: {} ms ± {} ms",
            profile.user,
            profile.mean.as_millis(),
            profile.jitter.as_millis()
        );
        bots::spawn(game.context().clone(), profile, seed, stop.clone())
            .with_context(|| format!("starting the bot for {}", profile.user))?;
    }

    let mut tally = Tally::default();
    for round in 1..=opts.games {
        info!("starting game {round}/{}", opts.games);
        game.press_start();
        let Some(settlement) = await_settlement(game, settlements, quit) else {
            break;
        };
        display::print_settlement(round, &settlement);
        tally.record(&settlement);
    }

    stop.store(true, Ordering::Relaxed);
    Ok(tally)
}

fn run_interactive(
    game: &ReactionGame,
    settlements: &Receiver<Settlement>,
    quit: &AtomicBool,
) -> Tally {
    let keys = keyboard::start_keyboard_listener();
    keyboard::display_help();

    let mut tally = Tally::default();
    while !quit.load(Ordering::Relaxed) {
        match keys.try_recv() {
            Ok(KeyCommand::Start) => game.press_start(),
            Ok(KeyCommand::Press(user)) => {
                game.press(user);
            }
            Ok(KeyCommand::Help) => keyboard::display_help(),
            Ok(KeyCommand::Exit) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        match settlements.recv_timeout(IDLE_POLL) {
            Ok(settlement) => {
                tally.record(&settlement);
                display::print_settlement(tally.games(), &settlement);
                print!("Press <Space> for another game\r\n");
            }
            Err(_) => game.kernel().idle(),
        }
    }
    // The listener may still hold raw mode when we leave first.
    let _ = crossterm::terminal::disable_raw_mode();
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflex::UserId;

    #[test]
    fn fast_mode_scales_game_and_bots() {
        let opts = Opts::parse_from(["reflex-sim", "--fast", "--players", "1"]);

        assert_eq!(opts.game_config().max_delay, Duration::from_millis(500));
        let bots = opts.bot_profiles();
        assert_eq!(bots.len(), 1);
        assert_eq!(bots[0].user, UserId::ONE);
        assert_eq!(bots[0].mean, Duration::from_millis(25));
    }

    #[test]
    fn interactive_conflicts_with_bots() {
        let result = Opts::try_parse_from(["reflex-sim", "--interactive", "--players", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbosity_is_counted() {
        let opts = Opts::parse_from(["reflex-sim", "-vv"]);
        assert_eq!(logger::level_for(opts.verbose), log::LevelFilter::Trace);
    }
}
