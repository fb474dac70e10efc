use std::io::Write;
use std::path::Path;

use ratatui::Terminal;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::Backend;
use ratatui::style::Color;
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::directory::{ConnectionProfile, DirectoryClient, Features, NewConnection};
use crate::error::{AppError, Result};
use crate::events::{AppEvent, DirectoryEvent, SocketEvent};
use crate::manager::{SessionId, SessionManager};
use crate::protocol::{ClientFrame, FileDownload};
use crate::session::{RouterAction, SocketState};
use crate::socket::spawn_link;
use crate::ui::{
    ConnectionForm, draw_connection_form_popup, draw_connection_list,
    draw_delete_confirmation_popup, draw_error_popup, draw_file_browser, draw_info_popup,
    draw_tab_bar, draw_terminal,
};

/// Which top-level view owns the screen. Tabs keep running while the
/// directory is shown; they are just not in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Directory,
    Session,
}

/// App is the main application
pub struct App<B: Backend + Write> {
    pub mode: AppMode,
    pub manager: SessionManager,
    pub directory: DirectoryClient,
    pub profiles: Vec<ConnectionProfile>,
    pub features: Features,
    pub selected: usize,
    pub form: Option<ConnectionForm>,
    pub confirm_delete: Option<ConnectionProfile>,
    pub error: Option<AppError>,
    pub info: Option<String>,
    pub settings: Settings,
    terminal: Terminal<B>,
    needs_redraw: bool,
    event_tx: mpsc::Sender<AppEvent>,
}

impl<B: Backend + Write> Drop for App<B> {
    fn drop(&mut self) {
        use crossterm::event::DisableBracketedPaste;
        use crossterm::execute;
        use crossterm::terminal::{LeaveAlternateScreen, disable_raw_mode};

        disable_raw_mode().ok();
        #[cfg(target_os = "windows")]
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen).ok();
        #[cfg(not(target_os = "windows"))]
        execute!(
            self.terminal.backend_mut(),
            DisableBracketedPaste,
            LeaveAlternateScreen,
        )
        .ok();
    }
}

impl<B: Backend + Write> App<B> {
    pub fn new(
        terminal: Terminal<B>,
        settings: Settings,
        directory: DirectoryClient,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            mode: AppMode::Directory,
            manager: SessionManager::new(),
            directory,
            profiles: Vec::new(),
            features: Features::default(),
            selected: 0,
            form: None,
            confirm_delete: None,
            error: None,
            info: None,
            settings,
            terminal,
            needs_redraw: true,
            event_tx,
        }
    }

    pub fn init_terminal(&mut self) -> Result<()> {
        use crossterm::ExecutableCommand;
        use crossterm::terminal::{EnterAlternateScreen, enable_raw_mode};

        enable_raw_mode().inspect_err(|e| tracing::error!("Error enabling raw mode: {}", e))?;
        self.terminal
            .backend_mut()
            .execute(EnterAlternateScreen)
            .inspect_err(|e| tracing::error!("Error entering alternate screen: {}", e))?;

        #[cfg(not(target_os = "windows"))]
        self.terminal
            .backend_mut()
            .execute(crossterm::event::EnableBracketedPaste)
            .inspect_err(|e| tracing::error!("Error enabling bracketed paste: {}", e))?;

        Ok(())
    }

    /// Mark that UI needs redrawing
    pub fn mark_redraw(&mut self) {
        self.needs_redraw = true;
    }

    fn should_redraw(&mut self) -> bool {
        let should = self.needs_redraw;
        self.needs_redraw = false;
        should
    }

    pub fn set_error(&mut self, error: AppError) {
        self.error = Some(error);
        self.needs_redraw = true;
    }

    /// Set info and mark for redraw
    #[allow(dead_code)]
    pub fn set_info(&mut self, info: String) {
        self.info = Some(info);
        self.needs_redraw = true;
    }

    // --- directory-service requests, completing through the event channel ---

    pub fn spawn_load_features(&self) {
        let client = self.directory.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match client.features().await {
                Ok(features) => DirectoryEvent::Features(features),
                Err(e) => DirectoryEvent::Error(e.to_string()),
            };
            let _ = tx.send(AppEvent::Directory(event)).await;
        });
    }

    pub fn spawn_load_connections(&self) {
        let client = self.directory.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match client.connections().await {
                Ok(profiles) => DirectoryEvent::Connections(profiles),
                Err(e) => DirectoryEvent::Error(e.to_string()),
            };
            let _ = tx.send(AppEvent::Directory(event)).await;
        });
    }

    pub fn spawn_create_connection(&self, connection: NewConnection) {
        let client = self.directory.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match client.create_connection(&connection).await {
                Ok(()) => DirectoryEvent::Changed,
                Err(e) => DirectoryEvent::Error(e.to_string()),
            };
            let _ = tx.send(AppEvent::Directory(event)).await;
        });
    }

    pub fn spawn_delete_connection(&self, id: i64) {
        let client = self.directory.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match client.delete_connection(id).await {
                Ok(()) => DirectoryEvent::Changed,
                Err(e) => DirectoryEvent::Error(e.to_string()),
            };
            let _ = tx.send(AppEvent::Directory(event)).await;
        });
    }

    // --- session lifecycle ---

    /// Open a tab for the profile under the cursor and bring it to the
    /// foreground.
    pub fn connect_selected(&mut self) {
        let Some(profile) = self.profiles.get(self.selected).cloned() else {
            return;
        };
        let url = self.directory.ws_url(profile.id);
        let scrollback = self.settings.terminal_scrollback_lines;
        let session = self.manager.create(profile, scrollback);
        spawn_link(url, session.id, self.event_tx.clone(), session.cancel_token());
        self.mode = AppMode::Session;
        self.mark_redraw();
    }

    pub fn close_active_session(&mut self) {
        if let Some(id) = self.manager.active_id() {
            self.manager.close(id);
        }
        if self.manager.is_empty() {
            self.mode = AppMode::Directory;
        }
        self.mark_redraw();
    }

    pub fn toggle_file_browser(&mut self) {
        if !self.features.file_browser {
            return;
        }
        let Some(session) = self.manager.active_session_mut() else {
            return;
        };
        if session.browser.visible {
            session.browser.close();
        } else {
            let frame = session.browser.open();
            session.send(frame);
        }
        self.mark_redraw();
    }

    // --- event handling ---

    async fn handle_socket_event(&mut self, session_id: SessionId, event: SocketEvent) {
        // Events for a tab the user already closed are dropped here.
        let Some(session) = self.manager.get_mut(session_id) else {
            return;
        };
        match event {
            SocketEvent::Opened(writer) => {
                session.attach_writer(writer);
                // First fit: tell the remote PTY the widget's current size.
                let (rows, cols) = session.terminal.parser.screen().size();
                session.send(ClientFrame::Resize { cols, rows });
            }
            SocketEvent::Frame(frame) => match session.route_frame(frame) {
                Some(RouterAction::SaveDownload(download)) => {
                    self.save_download(session_id, download).await;
                }
                Some(RouterAction::SurfaceError(message)) => {
                    self.set_error(AppError::ServerError(message));
                }
                None => {}
            },
            SocketEvent::Closed => session.mark_closed(),
            SocketEvent::Failed(reason) => session.mark_failed(&reason),
        }
        self.mark_redraw();
    }

    /// Write a downloaded file into the local downloads directory and report
    /// the outcome in the owning session's terminal.
    async fn save_download(&mut self, session_id: SessionId, download: FileDownload) {
        let bytes = match download.decode_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%e, "download payload not decodable");
                if let Some(session) = self.manager.get_mut(session_id) {
                    session
                        .write_notice("\r\n\x1b[31mDownload payload was not valid base64.\x1b[0m\r\n");
                }
                return;
            }
        };

        let dir = self.settings.effective_downloads_dir();
        // Keep only the final component; the server controls the string.
        let filename = Path::new(&download.filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("download")
            .to_string();
        let target = dir.join(&filename);

        let written = async {
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(&target, &bytes).await
        }
        .await;

        let Some(session) = self.manager.get_mut(session_id) else {
            return;
        };
        match written {
            Ok(()) => session.write_notice(&format!(
                "\r\n\x1b[32mSaved '{}' to {}\x1b[0m\r\n",
                filename,
                dir.display()
            )),
            Err(e) => {
                tracing::error!(%e, target = %target.display(), "download write failed");
                session.write_notice(&format!(
                    "\r\n\x1b[31mFailed to save '{filename}': {e}\x1b[0m\r\n"
                ));
            }
        }
    }

    fn handle_directory_event(&mut self, event: DirectoryEvent) {
        match event {
            DirectoryEvent::Features(features) => self.features = features,
            DirectoryEvent::Connections(profiles) => {
                self.profiles = profiles;
                if self.selected >= self.profiles.len() {
                    self.selected = self.profiles.len().saturating_sub(1);
                }
            }
            DirectoryEvent::Changed => self.spawn_load_connections(),
            DirectoryEvent::Error(message) => self.set_error(AppError::DirectoryError(message)),
        }
        self.mark_redraw();
    }

    // --- rendering ---

    fn draw(&mut self) -> Result<()> {
        self.terminal.draw(|f| {
            let size = f.area();
            match self.mode {
                AppMode::Directory => {
                    draw_connection_list(size, &self.profiles, self.selected, f);

                    if let Some(form) = &mut self.form {
                        draw_connection_form_popup(size, form, f);
                    }
                    if let Some(profile) = &self.confirm_delete {
                        draw_delete_confirmation_popup(size, &profile.name, f);
                    }
                }
                AppMode::Session => {
                    let chunks = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([Constraint::Length(1), Constraint::Min(1)])
                        .split(size);
                    draw_tab_bar(chunks[0], &self.manager, f);

                    if let Some(session) = self.manager.active_session_mut() {
                        let (suffix, color) = match session.socket_state {
                            SocketState::Connecting => (" (connecting)", Color::Yellow),
                            SocketState::Open => ("", Color::Cyan),
                            SocketState::Closed => (" (closed)", Color::Red),
                            SocketState::Failed => (" (error)", Color::Red),
                        };
                        let title = format!("Connected to {}{}", session.profile.label(), suffix);
                        draw_terminal(chunks[1], &mut session.terminal, &title, color, f);

                        if session.browser.visible {
                            draw_file_browser(size, &mut session.browser, self.features, f);
                        }
                    }
                }
            }

            // Overlay info popup if any
            if let Some(msg) = &self.info {
                draw_info_popup(size, msg, f);
            }

            // Overlay error popup if any (always on top)
            if let Some(err) = &self.error {
                draw_error_popup(size, &err.to_string(), f);
            }
        })?;
        Ok(())
    }

    pub async fn run(&mut self, rx: &mut mpsc::Receiver<AppEvent>) -> Result<()> {
        loop {
            // A terminal laid out while hidden reports stale dimensions, so
            // the fit for a newly foregrounded tab happens here, one loop
            // iteration after the switch made it visible.
            let mut size_changed = false;
            let mut has_terminal_updates = false;
            if self.mode == AppMode::Session {
                let size = self.terminal.size()?;
                // One row of tab bar, one row of terminal title border.
                let rows = size.height.saturating_sub(2);
                let cols = size.width;
                if let Some(session) = self.manager.active_session_mut() {
                    if session.terminal.parser.screen().size() != (rows, cols) {
                        session.resize(rows, cols);
                        size_changed = true;
                    }
                    if session.terminal.last_change.elapsed().as_millis() < 100 {
                        has_terminal_updates = true;
                    }
                }
            }

            if self.should_redraw() || size_changed || has_terminal_updates {
                self.draw()?;
            }

            let Some(event) = rx.recv().await else {
                tracing::warn!("App event channel closed");
                break;
            };

            match event {
                AppEvent::Tick => {}
                AppEvent::Input(input) => {
                    use crossterm::event::Event;

                    self.mark_redraw();
                    match input {
                        Event::Key(key) => {
                            match crate::key_event::handle_key_event(self, key).await {
                                crate::key_event::KeyFlow::Continue => {}
                                crate::key_event::KeyFlow::Quit => {
                                    self.manager.close_all();
                                    return Ok(());
                                }
                            }
                        }
                        Event::Paste(data) => {
                            crate::key_event::handle_paste_event(self, &data).await;
                        }
                        Event::Resize(_, _) => {}
                        _ => {}
                    }
                }
                AppEvent::Socket { session, event } => {
                    self.handle_socket_event(session, event).await;
                }
                AppEvent::Directory(event) => self.handle_directory_event(event),
            }
        }
        Ok(())
    }
}
