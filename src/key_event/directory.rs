use std::io::Write;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::Backend;

use super::KeyFlow;
use crate::app::{App, AppMode};
use crate::ui::ConnectionForm;

pub async fn handle_directory_key<B: Backend + Write>(app: &mut App<B>, key: KeyEvent) -> KeyFlow {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            if app.selected > 0 {
                app.selected -= 1;
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.selected + 1 < app.profiles.len() {
                app.selected += 1;
            }
        }
        KeyCode::Enter => app.connect_selected(),
        KeyCode::Char('n') => app.form = Some(ConnectionForm::new()),
        KeyCode::Char('d') => {
            app.confirm_delete = app.profiles.get(app.selected).cloned();
        }
        KeyCode::Char('r') => app.spawn_load_connections(),
        KeyCode::Esc => {
            // Back to the tabs when any exist; otherwise stay.
            if !app.manager.is_empty() {
                app.mode = AppMode::Session;
            }
        }
        KeyCode::Char('q') => return KeyFlow::Quit,
        _ => {}
    }
    KeyFlow::Continue
}

pub async fn handle_form_key<B: Backend + Write>(app: &mut App<B>, key: KeyEvent) -> KeyFlow {
    let Some(form) = app.form.as_mut() else {
        return KeyFlow::Continue;
    };
    match key.code {
        KeyCode::Esc => app.form = None,
        KeyCode::Tab => form.next(),
        KeyCode::BackTab => form.prev(),
        KeyCode::Enter => {
            let connection = form.to_new_connection();
            if let Err(e) = connection.validate() {
                app.set_error(e);
                return KeyFlow::Continue;
            }
            app.form = None;
            app.spawn_create_connection(connection);
        }
        _ => {
            form.focused_textarea_mut().input(key);
        }
    }
    KeyFlow::Continue
}

pub async fn handle_confirm_delete_key<B: Backend + Write>(
    app: &mut App<B>,
    key: KeyEvent,
) -> KeyFlow {
    match key.code {
        KeyCode::Enter | KeyCode::Char('y') => {
            if let Some(profile) = app.confirm_delete.take() {
                app.spawn_delete_connection(profile.id);
            }
        }
        KeyCode::Esc | KeyCode::Char('n') => app.confirm_delete = None,
        _ => {}
    }
    KeyFlow::Continue
}
