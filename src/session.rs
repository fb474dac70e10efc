//! One tab: a socket, a terminal widget, and a file browser context.
//!
//! The session is the router for its socket: every decoded inbound frame
//! lands in [`Session::route_frame`] and goes to exactly one place — the
//! terminal, the browser, or back to the caller as a [`RouterAction`] when
//! the side effect (saving a download, surfacing an error) does not belong
//! to the session itself.

use tokio_util::sync::CancellationToken;

use crate::directory::ConnectionProfile;
use crate::manager::SessionId;
use crate::navigator::FileBrowser;
use crate::protocol::{ClientFrame, FileDownload, ServerFrame};
use crate::socket::FrameSender;
use crate::ui::TerminalState;

const CLOSED_NOTICE: &str = "\r\n\x1b[31mConnection closed.\x1b[0m\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Connecting,
    Open,
    Closed,
    Failed,
}

/// Side effects the router cannot perform itself (local I/O, modal UI).
#[derive(Debug)]
pub enum RouterAction {
    SaveDownload(FileDownload),
    SurfaceError(String),
}

pub struct Session {
    pub id: SessionId,
    pub profile: ConnectionProfile,
    pub socket_state: SocketState,
    pub terminal: TerminalState,
    pub browser: FileBrowser,
    writer: Option<FrameSender>,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(id: SessionId, profile: ConnectionProfile, scrollback: usize) -> Self {
        Self {
            id,
            profile,
            socket_state: SocketState::Connecting,
            terminal: TerminalState::new_with_scrollback(30, 100, scrollback),
            browser: FileBrowser::default(),
            writer: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Token the socket link observes; cancelled exactly once at teardown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_open(&self) -> bool {
        self.socket_state == SocketState::Open
    }

    /// The link came up: frames can flow.
    pub fn attach_writer(&mut self, writer: FrameSender) {
        self.writer = Some(writer);
        self.socket_state = SocketState::Open;
    }

    /// Send a frame if the socket is open; otherwise drop it silently.
    /// There is no outbound buffering across a disconnect.
    pub fn send(&self, frame: ClientFrame) {
        if !self.is_open() {
            tracing::debug!(session = self.id, "dropping frame, socket not open");
            return;
        }
        if let Some(writer) = &self.writer
            && !writer.send(frame)
        {
            tracing::debug!(session = self.id, "dropping frame, link gone");
        }
    }

    /// Resize the local widget and notify the remote PTY.
    pub fn resize(&mut self, rows: u16, cols: u16) {
        self.terminal.resize(rows, cols);
        self.send(ClientFrame::Resize { cols, rows });
    }

    /// Dispatch one inbound frame. Frames arrive and are processed in
    /// receipt order; nothing here suspends.
    pub fn route_frame(&mut self, frame: ServerFrame) -> Option<RouterAction> {
        match frame {
            ServerFrame::Stdout(payload) => {
                self.terminal.process_bytes(payload.as_bytes());
                None
            }
            ServerFrame::Status(payload) => {
                self.terminal.process_bytes(payload.as_bytes());
                // A status marks the end of a server-side action (e.g. an
                // upload). Keep an open browser in sync with its side
                // effects, then re-prompt the shell.
                if self.browser.visible {
                    let refresh = self.browser.refresh();
                    self.send(refresh);
                }
                self.send(ClientFrame::Data {
                    payload: "\r".to_string(),
                });
                None
            }
            ServerFrame::Listing(listing) => {
                self.browser.apply_listing(listing);
                None
            }
            ServerFrame::Download(download) => Some(RouterAction::SaveDownload(download)),
            ServerFrame::Error(message) => {
                self.terminal.process_bytes(
                    format!("\r\n\x1b[31mSERVER ERROR: {message}\x1b[0m\r\n").as_bytes(),
                );
                Some(RouterAction::SurfaceError(message))
            }
            ServerFrame::Unknown { kind, payload } => {
                tracing::warn!(
                    session = self.id,
                    %kind,
                    "unrecognized frame type, writing payload as-is"
                );
                self.terminal.process_bytes(payload.as_bytes());
                None
            }
            ServerFrame::Raw(text) => {
                self.terminal.process_bytes(text.as_bytes());
                None
            }
        }
    }

    /// The server closed the connection. The tab stays; sends drop from now
    /// on.
    pub fn mark_closed(&mut self) {
        if matches!(self.socket_state, SocketState::Closed | SocketState::Failed) {
            return;
        }
        self.socket_state = SocketState::Closed;
        self.writer = None;
        self.terminal.process_bytes(CLOSED_NOTICE.as_bytes());
    }

    /// The connection failed (at dial time or mid-stream).
    pub fn mark_failed(&mut self, reason: &str) {
        if matches!(self.socket_state, SocketState::Closed | SocketState::Failed) {
            return;
        }
        self.socket_state = SocketState::Failed;
        self.writer = None;
        self.terminal
            .process_bytes(format!("\r\n\x1b[31mConnection error: {reason}\x1b[0m\r\n").as_bytes());
    }

    pub fn write_notice(&mut self, notice: &str) {
        self.terminal.process_bytes(notice.as_bytes());
    }

    /// Release everything the tab holds: the socket (closed once via the
    /// token), the outbound subscription (writer drop), and the terminal
    /// widget (dropped with the session value). Safe to call twice.
    pub fn shutdown(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.writer = None;
        self.socket_state = SocketState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FileEntry, FileListing};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn profile() -> ConnectionProfile {
        ConnectionProfile {
            id: 1,
            name: "box".to_string(),
            host: "127.0.0.1".to_string(),
            user: "root".to_string(),
        }
    }

    fn open_session() -> (Session, UnboundedReceiver<ClientFrame>) {
        let mut session = Session::new(1, profile(), 100);
        let (writer, rx) = FrameSender::test_pair();
        session.attach_writer(writer);
        (session, rx)
    }

    #[test]
    fn test_send_before_open_is_dropped() {
        let session = Session::new(1, profile(), 100);
        // Must not panic and must not queue anything for later.
        session.send(ClientFrame::Data {
            payload: "x".to_string(),
        });
        assert_eq!(session.socket_state, SocketState::Connecting);
    }

    #[test]
    fn test_send_after_close_is_dropped() {
        let (mut session, mut rx) = open_session();
        session.mark_closed();
        session.send(ClientFrame::Data {
            payload: "x".to_string(),
        });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stdout_reaches_terminal() {
        let (mut session, _rx) = open_session();
        session.route_frame(ServerFrame::Stdout("hello".to_string()));
        assert!(session.terminal.parser.screen().contents().contains("hello"));
    }

    #[test]
    fn test_status_reprompts_and_refreshes_open_browser() {
        let (mut session, mut rx) = open_session();
        session.browser.open();
        session.browser.apply_listing(FileListing {
            path: "/srv".to_string(),
            files: vec![],
        });
        session.route_frame(ServerFrame::Status("uploaded".to_string()));

        assert_eq!(
            rx.try_recv().unwrap(),
            ClientFrame::List {
                path: "/srv".to_string()
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientFrame::Data {
                payload: "\r".to_string()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_status_without_browser_only_reprompts() {
        let (mut session, mut rx) = open_session();
        session.route_frame(ServerFrame::Status("done".to_string()));
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientFrame::Data {
                payload: "\r".to_string()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_listing_updates_browser() {
        let (mut session, _rx) = open_session();
        session.browser.open();
        session.route_frame(ServerFrame::Listing(FileListing {
            path: "/etc".to_string(),
            files: vec![FileEntry {
                name: "hosts".to_string(),
                is_dir: false,
                size: 10,
            }],
        }));
        assert_eq!(session.browser.current_path, "/etc");
        assert_eq!(session.browser.entries.len(), 1);
    }

    #[test]
    fn test_error_frame_surfaces_and_keeps_session() {
        let (mut session, _rx) = open_session();
        let action = session.route_frame(ServerFrame::Error("denied".to_string()));
        assert!(matches!(action, Some(RouterAction::SurfaceError(msg)) if msg == "denied"));
        assert!(
            session
                .terminal
                .parser
                .screen()
                .contents()
                .contains("SERVER ERROR: denied")
        );
        assert!(session.is_open());
    }

    #[test]
    fn test_raw_fallback_writes_verbatim() {
        let (mut session, _rx) = open_session();
        session.route_frame(ServerFrame::Raw("not json".to_string()));
        assert!(
            session
                .terminal
                .parser
                .screen()
                .contents()
                .contains("not json")
        );
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (mut session, _rx) = open_session();
        session.shutdown();
        assert!(session.cancel_token().is_cancelled());
        assert_eq!(session.socket_state, SocketState::Closed);
        // Second shutdown observes the same state and does nothing.
        session.shutdown();
        assert_eq!(session.socket_state, SocketState::Closed);
    }

    #[test]
    fn test_close_notice_written_once() {
        let (mut session, _rx) = open_session();
        session.mark_closed();
        session.mark_closed();
        let contents = session.terminal.parser.screen().contents();
        assert_eq!(contents.matches("Connection closed.").count(), 1);
    }
}
