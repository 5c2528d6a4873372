//! Keyboard input handling for the TUI.
//!
//! Keys edit the focused form field or move focus. Buttons only queue an
//! action; the main loop draws the pending state and then runs it.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{Action, App, AppState, Field};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter) {
            app.state = AppState::Normal;
        }
        return false;
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return true;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('e') => app.request(Action::ListSteps),
            KeyCode::Char('s') => app.request(Action::ListSpaces),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::F(1) => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Down | KeyCode::Tab => app.focus_next(),
        KeyCode::Up | KeyCode::BackTab => app.focus_prev(),
        KeyCode::Enter => match app.focus {
            Field::Connect => app.request(Action::Connect),
            Field::CreatePat => app.request(Action::CreatePat),
            // Text fields: move on
            _ => app.focus_next(),
        },
        KeyCode::Backspace => app.pop_char(),
        KeyCode::Char(c) => app.push_char(c),
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use dsconnect_core::testing::FakeServer;
    use dsconnect_core::{Config, Environment};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    async fn app() -> App {
        let env = Environment {
            stored_token: String::new(),
            pat_file: std::path::PathBuf::from("unused.txt"),
            connector: Some(Arc::new(FakeServer::new())),
        };
        let mut app = App::new(env, Config::default()).await.unwrap();
        app.config_path = None;
        app
    }

    #[tokio::test]
    async fn test_typing_edits_focused_field() {
        let mut app = app().await;
        app.connection_form.url.clear();
        for c in "https://x".chars() {
            handle_input(&mut app, key(KeyCode::Char(c)));
        }
        handle_input(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.connection_form.url, "https://");

        handle_input(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, Field::Token);
        handle_input(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.focus, Field::Url);
    }

    #[tokio::test]
    async fn test_enter_on_button_queues_action() {
        let mut app = app().await;
        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.focus, Field::Token);
        assert_eq!(app.pending, None);

        app.focus = Field::Connect;
        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.pending, Some(Action::Connect));
    }

    #[tokio::test]
    async fn test_ctrl_shortcuts_queue_queries() {
        let mut app = app().await;
        handle_input(&mut app, ctrl('e'));
        assert_eq!(app.pending, Some(Action::ListSteps));
        handle_input(&mut app, ctrl('s'));
        assert_eq!(app.pending, Some(Action::ListSpaces));
        // Not typed into the field
        assert!(!app.connection_form.url.ends_with('s'));
    }

    #[tokio::test]
    async fn test_quit_confirmation() {
        let mut app = app().await;
        assert!(!handle_input(&mut app, key(KeyCode::Esc)));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!handle_input(&mut app, key(KeyCode::Char('n'))));
        assert_eq!(app.state, AppState::Normal);

        handle_input(&mut app, key(KeyCode::Esc));
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_help_overlay_swallows_keys() {
        let mut app = app().await;
        handle_input(&mut app, key(KeyCode::F(1)));
        assert_eq!(app.state, AppState::ShowingHelp);
        let before = app.connection_form.url.clone();
        handle_input(&mut app, key(KeyCode::Char('z')));
        assert_eq!(app.connection_form.url, before);
        handle_input(&mut app, key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Normal);
    }
}
