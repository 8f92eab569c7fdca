//! Key bindings: arrows and vim-style keys.

use crate::controller::Action;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Game(Action),
    Quit,
}

/// Map a key event to a command; `None` for unbound keys.
pub fn key_to_command(key: KeyEvent) -> Option<Command> {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return None;
    }
    let action = match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => return Some(Command::Quit),
        KeyCode::Left | KeyCode::Char('h') => Action::Left,
        KeyCode::Right | KeyCode::Char('l') => Action::Right,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        KeyCode::Up | KeyCode::Char('k' | ' ') => Action::Rotate,
        KeyCode::Char('p' | 'P') => Action::PauseResume,
        KeyCode::Enter | KeyCode::Char('r' | 'R') => Action::Reset,
        KeyCode::Char('m' | 'M') => Action::ReturnToMenu,
        _ => return None,
    };
    Some(Command::Game(action))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_arrows_and_vim_keys_agree() {
        let pairs = [
            (KeyCode::Left, KeyCode::Char('h')),
            (KeyCode::Right, KeyCode::Char('l')),
            (KeyCode::Down, KeyCode::Char('j')),
            (KeyCode::Up, KeyCode::Char('k')),
        ];
        for (arrow, vim) in pairs {
            assert!(key_to_command(press(arrow)).is_some());
            assert_eq!(key_to_command(press(arrow)), key_to_command(press(vim)));
        }
    }

    #[test]
    fn test_space_rotates() {
        assert_eq!(
            key_to_command(press(KeyCode::Char(' '))),
            Some(Command::Game(Action::Rotate))
        );
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(key_to_command(press(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(
            key_to_command(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
    }

    #[test]
    fn test_shifted_letters_map_like_lowercase() {
        for (lower, upper) in [('p', 'P'), ('r', 'R'), ('m', 'M'), ('q', 'Q')] {
            let shifted = KeyEvent::new(KeyCode::Char(upper), KeyModifiers::SHIFT);
            assert!(key_to_command(shifted).is_some());
            assert_eq!(
                key_to_command(shifted),
                key_to_command(press(KeyCode::Char(lower)))
            );
            assert_eq!(
                key_to_command(press(KeyCode::Char(upper))),
                key_to_command(press(KeyCode::Char(lower)))
            );
        }
    }

    #[test]
    fn test_modified_keys_are_unbound() {
        assert_eq!(
            key_to_command(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::ALT)),
            None
        );
        assert_eq!(key_to_command(press(KeyCode::Char('x'))), None);
    }
}
