//! Keyboard Input Handler
//!
//! Interactive play: one key arms the game, one key per player.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use reflex::{Event as GameEvent, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Arm a new game
    Start,
    /// A player's button
    Press(UserId),
    Help,
    Exit,
}

/// Start keyboard listener thread
pub fn start_keyboard_listener() -> Receiver<KeyCommand> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        if let Err(e) = keyboard_thread(tx) {
            log::error!("keyboard thread error: {e}");
        }
    });

    rx
}

fn keyboard_thread(tx: Sender<KeyCommand>) -> io::Result<()> {
    terminal::enable_raw_mode()?;

    let result = loop {
        match poll_command() {
            Ok(Some(cmd)) => {
                if tx.send(cmd).is_err() || cmd == KeyCommand::Exit {
                    break Ok(());
                }
            }
            Ok(None) => {}
            Err(err) => break Err(err),
        }
    };

    terminal::disable_raw_mode()?;
    result
}

fn poll_command() -> io::Result<Option<KeyCommand>> {
    if !event::poll(Duration::from_millis(100))? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => Ok(map_key_to_command(key)),
        _ => Ok(None),
    }
}

fn map_key_to_command(key: KeyEvent) -> Option<KeyCommand> {
    match key.code {
        // Raw mode swallows SIGINT.
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyCommand::Exit)
        }
        KeyCode::Esc | KeyCode::Char('x') | KeyCode::Char('X') => Some(KeyCommand::Exit),
        KeyCode::Char(' ') => Some(KeyCommand::Start),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(KeyCommand::Press(UserId::ONE)),
        KeyCode::Char('l') | KeyCode::Char('L') => Some(KeyCommand::Press(UserId::TWO)),
        KeyCode::Char('h') | KeyCode::Char('?') => Some(KeyCommand::Help),
        KeyCode::Char(digit @ '0'..='9') => command_for_signal(digit),
        _ => None,
    }
}

/// Digit keys send the event with that signal code. Only the game ends it.
fn command_for_signal(digit: char) -> Option<KeyCommand> {
    let code = u8::try_from(digit.to_digit(10)?).ok()?;
    match GameEvent::from_signal(code)? {
        GameEvent::UserResponse(user) => Some(KeyCommand::Press(user)),
        GameEvent::GameStart => Some(KeyCommand::Start),
        GameEvent::GameOver => None,
    }
}

/// Display keyboard help
pub fn display_help() {
    let rule = "=".repeat(50);
    print!("\r\n{rule}\r\n");
    print!("Reflex Keyboard Shortcuts:\r\n");
    print!("{rule}\r\n");
    print!("<Space> / 4    Arm a new game\r\n");
    print!("a / 1          User1 button\r\n");
    print!("l / 2          User2 button\r\n");
    print!("h / ?          This help\r\n");
    print!("<Esc> / x      Exit\r\n");
    print!("{rule}\r\n\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_players() {
        assert_eq!(map_key_to_command(key(KeyCode::Char(' '))), Some(KeyCommand::Start));
        assert_eq!(
            map_key_to_command(key(KeyCode::Char('a'))),
            Some(KeyCommand::Press(UserId::ONE))
        );
        assert_eq!(
            map_key_to_command(key(KeyCode::Char('2'))),
            Some(KeyCommand::Press(UserId::TWO))
        );
        assert_eq!(map_key_to_command(key(KeyCode::Esc)), Some(KeyCommand::Exit));
        assert_eq!(map_key_to_command(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn digits_follow_signal_codes() {
        assert_eq!(
            map_key_to_command(key(KeyCode::Char('1'))),
            Some(KeyCommand::Press(UserId::ONE))
        );
        assert_eq!(map_key_to_command(key(KeyCode::Char('4'))), Some(KeyCommand::Start));
        assert_eq!(map_key_to_command(key(KeyCode::Char('3'))), None);
        assert_eq!(map_key_to_command(key(KeyCode::Char('0'))), None);
        assert_eq!(map_key_to_command(key(KeyCode::Char('9'))), None);
    }

    #[test]
    fn ctrl_c_exits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key_to_command(ctrl_c), Some(KeyCommand::Exit));
        assert_eq!(map_key_to_command(key(KeyCode::Char('c'))), None);
    }
}
