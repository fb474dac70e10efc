use std::io::Write;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::prelude::Backend;

use crate::app::{App, AppMode};
use crate::protocol::ClientFrame;

pub mod browser;
pub mod connected;
pub mod directory;

pub use browser::handle_browser_key;
pub use connected::handle_connected_key;
pub use directory::{handle_confirm_delete_key, handle_directory_key, handle_form_key};

/// Result of handling a key or paste event
pub enum KeyFlow {
    Continue,
    Quit,
}

/// Top-level key dispatch: popup dismissal first, then by view and overlay.
pub async fn handle_key_event<B: Backend + Write>(app: &mut App<B>, key: KeyEvent) -> KeyFlow {
    // Only handle actual key presses (ignore repeats/releases)
    if key.kind != KeyEventKind::Press {
        return KeyFlow::Continue;
    }

    // A visible error popup blocks everything until dismissed.
    if app.error.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.error = None;
        }
        return KeyFlow::Continue;
    }
    if app.info.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.info = None;
        }
        return KeyFlow::Continue;
    }

    match app.mode {
        AppMode::Directory => {
            if app.confirm_delete.is_some() {
                handle_confirm_delete_key(app, key).await
            } else if app.form.is_some() {
                handle_form_key(app, key).await
            } else {
                handle_directory_key(app, key).await
            }
        }
        AppMode::Session => {
            let browser_open = app
                .manager
                .active_session()
                .is_some_and(|s| s.browser.visible);
            if browser_open {
                handle_browser_key(app, key).await
            } else {
                handle_connected_key(app, key).await
            }
        }
    }
}

/// Paste event handler; dispatches by view and overlay.
pub async fn handle_paste_event<B: Backend + Write>(app: &mut App<B>, data: &str) {
    match app.mode {
        AppMode::Directory => {
            if let Some(form) = app.form.as_mut() {
                form.focused_textarea_mut().insert_str(data);
            }
        }
        AppMode::Session => {
            let Some(session) = app.manager.active_session_mut() else {
                return;
            };
            if session.browser.visible {
                use crate::navigator::BrowserFocus;
                match session.browser.focus {
                    BrowserFocus::PathEdit => {
                        session.browser.path_input.insert_str(data);
                    }
                    BrowserFocus::UploadPrompt => {
                        session.browser.upload_input.insert_str(data);
                    }
                    BrowserFocus::List => {}
                }
                return;
            }
            session.terminal.scroll_to_bottom();
            session.send(ClientFrame::Data {
                payload: data.to_string(),
            });
        }
    }
}
