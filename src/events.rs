use crossterm::event::Event;

use crate::directory::{ConnectionProfile, Features};
use crate::manager::SessionId;
use crate::protocol::ServerFrame;
use crate::socket::FrameSender;

/// Events consumed by the main application loop. All state mutation happens
/// while handling one of these, one at a time.
#[derive(Debug)]
pub enum AppEvent {
    Input(Event),
    Tick,
    /// Something happened on one session's socket.
    Socket {
        session: SessionId,
        event: SocketEvent,
    },
    /// A directory-service request completed.
    Directory(DirectoryEvent),
}

/// Per-session socket lifecycle and traffic, forwarded by the socket tasks.
#[derive(Debug)]
pub enum SocketEvent {
    /// The connection is established; frames can be sent through the handle.
    Opened(FrameSender),
    /// One decoded inbound frame, in receipt order.
    Frame(ServerFrame),
    /// The server closed the connection.
    Closed,
    /// The connection failed (dial error or mid-stream transport error).
    Failed(String),
}

#[derive(Debug)]
pub enum DirectoryEvent {
    Features(Features),
    Connections(Vec<ConnectionProfile>),
    /// A create or delete completed; the connection list should be reloaded.
    Changed,
    Error(String),
}
