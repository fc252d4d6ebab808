//! Indicator strip rendering.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use colored::Colorize;
use reflex::{GameContext, Settlement, UserId};

const REFRESH: Duration = Duration::from_millis(5);

/// Render `snapshot` as one glyph per indicator, the armed indicator apart.
pub fn render_strip(snapshot: u32, lanes: u8, armed: u8) -> String {
    let mut strip = String::new();
    for lane in 0..lanes {
        if snapshot & (1 << lane) != 0 {
            strip.push_str(&"●".bright_yellow().to_string());
        } else {
            strip.push('○');
        }
    }
    strip.push_str("  ");
    if snapshot & (1 << armed) != 0 {
        strip.push_str(&"●".bright_green().to_string());
    } else {
        strip.push('○');
    }
    strip
}

/// Redraw the strip whenever the indicators change, until `stop` is set.
pub fn spawn(ctx: Arc<GameContext>, stop: Arc<AtomicBool>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("display".into()).spawn(move || {
        let lanes = ctx.feedback().lanes();
        let armed = ctx.config().armed_indicator;
        let mut last = None;
        while !stop.load(Ordering::Relaxed) {
            let snapshot = ctx.indicators().snapshot();
            if last != Some(snapshot) {
                let mut out = io::stdout().lock();
                let _ = write!(out, "\r\n  LEDs {}\r\n", render_strip(snapshot, lanes, armed));
                let _ = out.flush();
                last = Some(snapshot);
            }
            thread::sleep(REFRESH);
        }
    })
}

/// Running tally over several games.
#[derive(Debug, Default)]
pub struct Tally {
    games: u32,
    wins: [u32; 2],
    draws: u32,
}

impl Tally {
    pub fn record(&mut self, settlement: &Settlement) {
        self.games += 1;
        match settlement.winner() {
            Some(UserId(id @ 1..=2)) => self.wins[usize::from(id) - 1] += 1,
            _ => self.draws += 1,
        }
    }

    pub fn games(&self) -> u32 {
        self.games
    }
}

pub fn print_settlement(game: u32, settlement: &Settlement) {
    let verdict = match settlement.winner() {
        Some(user) => format!("{user} wins").as_str().bright_green().bold(),
        None => "no winner".yellow().bold(),
    };
    print!("\r\nGame {game}: {verdict}\r\n");
    for score in settlement.scores() {
        print!(
            "  {:<6} {:>10}  over {} rounds\r\n",
            score.user.to_string(),
            score.average().to_string(),
            score.responses
        );
    }
}

pub fn print_tally(tally: &Tally) {
    let rule = "=".repeat(40);
    print!("\r\n{rule}\r\n");
    print!("{} games played\r\n", tally.games);
    print!("  User1 wins: {}\r\n", tally.wins[0]);
    print!("  User2 wins: {}\r\n", tally.wins[1]);
    print!("  No winner:  {}\r\n", tally.draws);
    print!("{rule}\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_marks_lit_indicators() {
        colored::control::set_override(false);

        assert_eq!(render_strip(0, 4, 4), "○○○○  ○");
        assert_eq!(render_strip(0b1_0010, 4, 4), "○●○○  ●");
    }
}
