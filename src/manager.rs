//! Ordered collection of sessions and the single active pointer.
//!
//! The manager is the only place with cross-session state. It never touches
//! sockets directly: the caller opens the link for a freshly created session
//! and `Session::shutdown` releases it on close.

use crate::directory::ConnectionProfile;
use crate::session::Session;

pub type SessionId = u64;

pub struct SessionManager {
    sessions: Vec<Session>,
    active: Option<SessionId>,
    next_id: SessionId,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            active: None,
            next_id: 1,
        }
    }

    /// Create a session for `profile` and make it active. Ids are unique for
    /// the process lifetime and never reused.
    pub fn create(&mut self, profile: ConnectionProfile, scrollback: usize) -> &mut Session {
        let id = self.next_id;
        self.next_id += 1;
        self.sessions.push(Session::new(id, profile, scrollback));
        self.active = Some(id);
        self.sessions.last_mut().expect("session just pushed")
    }

    /// Make `id` the active session. Unknown ids are a no-op, not an error.
    pub fn switch_to(&mut self, id: SessionId) -> bool {
        if self.sessions.iter().any(|s| s.id == id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn switch_next(&mut self) {
        self.switch_by(1);
    }

    pub fn switch_prev(&mut self) {
        self.switch_by(-1);
    }

    fn switch_by(&mut self, step: isize) {
        let Some(active) = self.active else { return };
        let Some(idx) = self.sessions.iter().position(|s| s.id == active) else {
            return;
        };
        let len = self.sessions.len() as isize;
        let next = (idx as isize + step).rem_euclid(len) as usize;
        self.active = Some(self.sessions[next].id);
    }

    /// Nth session (tab order), for direct tab hotkeys.
    pub fn id_at(&self, index: usize) -> Option<SessionId> {
        self.sessions.get(index).map(|s| s.id)
    }

    /// Close a session: shut its resources down and remove it. When the
    /// closed session was active, promote the one that slid into its slot,
    /// else the previous one, else the first remaining. Closing an unknown
    /// id (including a second close of the same id) is a no-op.
    pub fn close(&mut self, id: SessionId) -> bool {
        let Some(idx) = self.sessions.iter().position(|s| s.id == id) else {
            return false;
        };
        let mut session = self.sessions.remove(idx);
        session.shutdown();

        if self.active == Some(id) {
            self.active = self
                .sessions
                .get(idx)
                .or_else(|| idx.checked_sub(1).and_then(|prev| self.sessions.get(prev)))
                .or_else(|| self.sessions.first())
                .map(|s| s.id);
        }
        true
    }

    /// Shut down every session (process exit).
    pub fn close_all(&mut self) {
        for session in &mut self.sessions {
            session.shutdown();
        }
        self.sessions.clear();
        self.active = None;
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.active
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active
            .and_then(|id| self.sessions.iter().find(|s| s.id == id))
    }

    pub fn active_session_mut(&mut self) -> Option<&mut Session> {
        let active = self.active?;
        self.sessions.iter_mut().find(|s| s.id == active)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: i64) -> ConnectionProfile {
        ConnectionProfile {
            id,
            name: format!("conn-{id}"),
            host: "127.0.0.1".to_string(),
            user: "root".to_string(),
        }
    }

    fn manager_with(count: usize) -> SessionManager {
        let mut manager = SessionManager::new();
        for i in 0..count {
            manager.create(profile(i as i64), 100);
        }
        manager
    }

    #[test]
    fn test_create_activates_and_ids_increase() {
        let mut manager = SessionManager::new();
        let first = manager.create(profile(1), 100).id;
        let second = manager.create(profile(2), 100).id;
        assert!(second > first);
        assert_eq!(manager.active_id(), Some(second));
    }

    #[test]
    fn test_ids_never_reused() {
        let mut manager = manager_with(2);
        let closed = manager.id_at(1).unwrap();
        manager.close(closed);
        let fresh = manager.create(profile(9), 100).id;
        assert!(fresh > closed);
    }

    #[test]
    fn test_switch_to_unknown_is_noop() {
        let mut manager = manager_with(2);
        let active = manager.active_id();
        assert!(!manager.switch_to(999));
        assert_eq!(manager.active_id(), active);
    }

    #[test]
    fn test_close_active_promotes_same_index() {
        let mut manager = manager_with(3);
        let (a, b, c) = (
            manager.id_at(0).unwrap(),
            manager.id_at(1).unwrap(),
            manager.id_at(2).unwrap(),
        );
        manager.switch_to(b);
        manager.close(b);
        // c slid into b's slot and takes over.
        assert_eq!(manager.active_id(), Some(c));
        assert_eq!(manager.id_at(0), Some(a));
    }

    #[test]
    fn test_close_last_active_promotes_previous() {
        let mut manager = manager_with(2);
        let (a, b) = (manager.id_at(0).unwrap(), manager.id_at(1).unwrap());
        manager.switch_to(b);
        manager.close(b);
        assert_eq!(manager.active_id(), Some(a));
    }

    #[test]
    fn test_close_inactive_keeps_active() {
        let mut manager = manager_with(3);
        let (a, c) = (manager.id_at(0).unwrap(), manager.id_at(2).unwrap());
        manager.switch_to(c);
        manager.close(a);
        assert_eq!(manager.active_id(), Some(c));
    }

    #[test]
    fn test_active_is_none_iff_empty() {
        let mut manager = SessionManager::new();
        assert!(manager.active_id().is_none());

        let id = manager.create(profile(1), 100).id;
        assert!(manager.active_id().is_some());

        manager.close(id);
        assert!(manager.is_empty());
        assert!(manager.active_id().is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut manager = manager_with(2);
        let b = manager.id_at(1).unwrap();
        assert!(manager.close(b));
        let active_after = manager.active_id();
        let len_after = manager.len();

        assert!(!manager.close(b));
        assert_eq!(manager.active_id(), active_after);
        assert_eq!(manager.len(), len_after);
    }

    #[test]
    fn test_interleaved_sequences_keep_one_active() {
        let mut manager = SessionManager::new();
        for i in 0..5 {
            manager.create(profile(i), 100);
        }
        for id in [3u64, 1, 5, 2, 4, 4] {
            manager.close(id);
            let empty = manager.is_empty();
            assert_eq!(manager.active_id().is_none(), empty);
            if let Some(active) = manager.active_id() {
                assert!(manager.sessions().iter().any(|s| s.id == active));
            }
        }
        assert!(manager.is_empty());
    }

    #[test]
    fn test_switch_cycling_wraps() {
        let mut manager = manager_with(3);
        let (a, b, c) = (
            manager.id_at(0).unwrap(),
            manager.id_at(1).unwrap(),
            manager.id_at(2).unwrap(),
        );
        manager.switch_to(c);
        manager.switch_next();
        assert_eq!(manager.active_id(), Some(a));
        manager.switch_prev();
        assert_eq!(manager.active_id(), Some(c));
        manager.switch_prev();
        assert_eq!(manager.active_id(), Some(b));
    }
}
