use std::io::Write;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::Backend;

use super::KeyFlow;
use crate::app::App;
use crate::navigator::BrowserFocus;

pub async fn handle_browser_key<B: Backend + Write>(app: &mut App<B>, key: KeyEvent) -> KeyFlow {
    let features = app.features;
    let Some(session) = app.manager.active_session_mut() else {
        return KeyFlow::Continue;
    };

    match session.browser.focus {
        BrowserFocus::List => match key.code {
            KeyCode::Esc => session.browser.close(),
            KeyCode::Up | KeyCode::Char('k') => session.browser.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => session.browser.select_next(),
            KeyCode::Enter => {
                let target = session
                    .browser
                    .selected_entry()
                    .filter(|entry| entry.is_dir)
                    .map(|entry| session.browser.child_path(&entry.name));
                if let Some(path) = target {
                    let frame = session.browser.navigate(path);
                    session.send(frame);
                }
            }
            KeyCode::Left | KeyCode::Backspace => {
                if let Some(frame) = session.browser.go_up() {
                    session.send(frame);
                }
            }
            KeyCode::Char('r') => {
                let frame = session.browser.refresh();
                session.send(frame);
            }
            KeyCode::Char('/') => session.browser.focus = BrowserFocus::PathEdit,
            KeyCode::Char('d') => {
                if features.download
                    && let Some(entry) = session.browser.selected_entry()
                {
                    let path = session.browser.child_path(&entry.name);
                    let frame = session.browser.download_request(path);
                    session.send(frame);
                    session.write_notice("\r\n\x1b[33mRequesting download...\x1b[0m\r\n");
                }
            }
            KeyCode::Char('u') => {
                if features.file_browser {
                    session.browser.upload_input.select_all();
                    session.browser.upload_input.cut();
                    session.browser.focus = BrowserFocus::UploadPrompt;
                }
            }
            _ => {}
        },
        BrowserFocus::PathEdit => match key.code {
            KeyCode::Esc => session.browser.focus = BrowserFocus::List,
            KeyCode::Enter => {
                let path = session.browser.path_input.lines().join("");
                let frame = session.browser.navigate(path.trim().to_string());
                session.send(frame);
                session.browser.focus = BrowserFocus::List;
            }
            _ => {
                session.browser.path_input.input(key);
            }
        },
        BrowserFocus::UploadPrompt => match key.code {
            KeyCode::Esc => session.browser.focus = BrowserFocus::List,
            KeyCode::Enter => {
                let local = session.browser.upload_input.lines().join("");
                session.browser.focus = BrowserFocus::List;
                upload_local_file(app, local.trim()).await;
            }
            _ => {
                session.browser.upload_input.input(key);
            }
        },
    }
    KeyFlow::Continue
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Read a local file and ship it to the browser's current directory. Read
/// failures stay local: a terminal notice, no frame sent.
async fn upload_local_file<B: Backend + Write>(app: &mut App<B>, local: &str) {
    if local.is_empty() {
        return;
    }
    let local = expand_tilde(local);
    let filename = match local.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => {
            if let Some(session) = app.manager.active_session_mut() {
                session.write_notice("\r\n\x1b[31mInvalid upload path.\x1b[0m\r\n");
            }
            return;
        }
    };

    let read_result = tokio::fs::read(&local).await;
    let Some(session) = app.manager.active_session_mut() else {
        return;
    };
    match read_result {
        Ok(bytes) => {
            let frame = session.browser.upload_request(filename.clone(), &bytes);
            session.send(frame);
            session.write_notice(&format!("\r\n\x1b[33mUploading {filename}...\x1b[0m\r\n"));
        }
        Err(e) => {
            tracing::error!(%e, path = %local.display(), "upload read failed");
            session.write_notice(&format!(
                "\r\n\x1b[31mError reading file: {}\x1b[0m\r\n",
                local.display()
            ));
        }
    }
}
