//! Key bindings: arrows and vim-style hjkl.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    Swap,
    Raise,
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both arrows and vim keys (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Swap,
        KeyCode::Char('x') => Action::Raise,
        KeyCode::Char('r' | 'R') => Action::Restart,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Action {
        key_to_action(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_arrows_and_vim_keys_agree() {
        let none = KeyModifiers::NONE;
        assert_eq!(press(KeyCode::Left, none), press(KeyCode::Char('h'), none));
        assert_eq!(press(KeyCode::Right, none), press(KeyCode::Char('l'), none));
        assert_eq!(press(KeyCode::Up, none), press(KeyCode::Char('k'), none));
        assert_eq!(press(KeyCode::Down, none), press(KeyCode::Char('j'), none));
    }

    #[test]
    fn test_swap_and_quit() {
        assert_eq!(press(KeyCode::Char(' '), KeyModifiers::NONE), Action::Swap);
        assert_eq!(press(KeyCode::Enter, KeyModifiers::NONE), Action::Swap);
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit);
        assert_eq!(press(KeyCode::Char('R'), KeyModifiers::SHIFT), Action::Restart);
    }

    #[test]
    fn test_alt_combos_are_ignored() {
        assert_eq!(press(KeyCode::Char('h'), KeyModifiers::ALT), Action::None);
    }
}
