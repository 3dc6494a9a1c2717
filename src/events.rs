use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, EXPORT_PATH};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Ignore release and repeat reports on terminals that send them
    if key.kind != KeyEventKind::Press {
        return;
    }

    // Ctrl-C always quits, raw mode swallows SIGINT
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Refresh both sources now
        KeyCode::Char('r') => app.refresh_now(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_PATH);
            match app.export_state(&export_path) {
                Ok(()) => {
                    tracing::info!(path = %export_path.display(), "exported dashboard state");
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    tracing::error!("export failed: {}", e);
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_keys() {
        for key in [
            press(KeyCode::Char('q')),
            press(KeyCode::Esc),
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            let mut app = test_app();
            handle_key_event(&mut app, key);
            assert!(!app.running, "{:?} should quit", key);
        }
    }

    #[test]
    fn test_plain_c_does_not_quit() {
        let mut app = test_app();
        handle_key_event(&mut app, press(KeyCode::Char('c')));
        assert!(app.running);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut app = test_app();
        handle_key_event(&mut app, press(KeyCode::Char('?')));
        assert!(app.show_help);

        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut app = test_app();
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key_event(&mut app, release);
        assert!(app.running);
    }

    #[test]
    fn test_refresh_sets_status_message() {
        let mut app = test_app();
        handle_key_event(&mut app, press(KeyCode::Char('r')));
        assert_eq!(app.get_status_message(), Some("Refreshing..."));
    }
}
