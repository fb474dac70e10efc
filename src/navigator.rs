//! Remote file browser state machine.
//!
//! One `FileBrowser` is scoped to each session. It owns the "current remote
//! path" and the last listing, and turns user navigation into outbound
//! protocol frames. The path is updated optimistically when a request is
//! issued and reconciled by the path echoed in the listing reply; superseded
//! requests are never cancelled, so a stale reply is applied as if current.

use tui_textarea::TextArea;

use crate::protocol::{ClientFrame, FileEntry, FileListing, encode_base64};

/// Which part of the browser popup receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserFocus {
    #[default]
    List,
    PathEdit,
    UploadPrompt,
}

pub struct FileBrowser {
    pub current_path: String,
    pub entries: Vec<FileEntry>,
    pub visible: bool,
    pub selected: usize,
    pub focus: BrowserFocus,
    pub path_input: TextArea<'static>,
    pub upload_input: TextArea<'static>,
}

impl Default for FileBrowser {
    fn default() -> Self {
        Self {
            current_path: String::new(),
            entries: Vec::new(),
            visible: false,
            selected: 0,
            focus: BrowserFocus::List,
            path_input: create_input("Remote path"),
            upload_input: create_input("Local file to upload"),
        }
    }
}

fn create_input(placeholder: &str) -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_placeholder_text(placeholder);
    textarea.set_cursor_line_style(ratatui::style::Style::default());
    textarea
}

impl FileBrowser {
    /// Show the browser and request the server-chosen home listing.
    /// An empty path means "wherever the remote shell's working directory is".
    pub fn open(&mut self) -> ClientFrame {
        self.visible = true;
        self.entries.clear();
        self.selected = 0;
        self.focus = BrowserFocus::List;
        self.set_path(String::new());
        ClientFrame::List {
            path: String::new(),
        }
    }

    /// Hide the browser and drop its state. Nothing survives until the next
    /// `open`.
    pub fn close(&mut self) {
        self.visible = false;
        self.entries.clear();
        self.selected = 0;
        self.focus = BrowserFocus::List;
        self.set_path(String::new());
    }

    /// Request a listing for `path`, updating the displayed path immediately.
    /// The reply's echoed path wins once it arrives.
    pub fn navigate(&mut self, path: String) -> ClientFrame {
        self.set_path(path.clone());
        self.selected = 0;
        ClientFrame::List { path }
    }

    /// Move to the parent directory. At root (or before the first listing
    /// arrived) this is a no-op and no request is produced.
    pub fn go_up(&mut self) -> Option<ClientFrame> {
        parent_path(&self.current_path).map(|parent| self.navigate(parent))
    }

    /// Re-request the current path.
    pub fn refresh(&self) -> ClientFrame {
        ClientFrame::List {
            path: self.current_path.clone(),
        }
    }

    /// Apply a listing reply: replace all entries (directories first, then
    /// case-insensitive by name) and adopt the authoritative path.
    pub fn apply_listing(&mut self, listing: FileListing) {
        let FileListing { path, mut files } = listing;
        files.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.name.cmp(&b.name))
        });
        self.entries = files;
        self.set_path(path);
        if self.selected >= self.entries.len() {
            self.selected = self.entries.len().saturating_sub(1);
        }
    }

    /// Absolute path of a child of the current directory.
    pub fn child_path(&self, name: &str) -> String {
        join_path(&self.current_path, name)
    }

    pub fn selected_entry(&self) -> Option<&FileEntry> {
        self.entries.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.entries.is_empty() {
            self.selected = (self.selected + 1) % self.entries.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.entries.is_empty() {
            self.selected = if self.selected == 0 {
                self.entries.len() - 1
            } else {
                self.selected - 1
            };
        }
    }

    pub fn download_request(&self, path: String) -> ClientFrame {
        ClientFrame::Download { path }
    }

    /// Build an upload frame targeting the current directory. The file bytes
    /// travel base64-encoded in the envelope.
    pub fn upload_request(&self, filename: String, bytes: &[u8]) -> ClientFrame {
        ClientFrame::Upload {
            filename,
            payload: encode_base64(bytes),
            path: self.current_path.clone(),
        }
    }

    fn set_path(&mut self, path: String) {
        self.path_input = create_input("Remote path");
        self.path_input.insert_str(&path);
        self.current_path = path;
    }
}

/// Parent of an absolute path, or `None` when there is nowhere to go
/// (root, or no path yet).
pub fn parent_path(path: &str) -> Option<String> {
    if path.is_empty() || path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

/// Join a directory path and a child name without doubling the separator at
/// root.
pub fn join_path(parent: &str, child: &str) -> String {
    if parent == "/" {
        format!("/{child}")
    } else {
        format!("{parent}/{child}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, is_dir: bool) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            is_dir,
            size: if is_dir { 0 } else { 10 },
        }
    }

    #[test]
    fn test_parent_path_arithmetic() {
        assert_eq!(parent_path("/a/b/c").as_deref(), Some("/a/b"));
        assert_eq!(parent_path("/a").as_deref(), Some("/"));
        assert_eq!(parent_path("/"), None);
        assert_eq!(parent_path(""), None);
    }

    #[test]
    fn test_join_path_handles_root() {
        assert_eq!(join_path("/", "file.txt"), "/file.txt");
        assert_eq!(join_path("/a/b", "c"), "/a/b/c");
    }

    #[test]
    fn test_go_up_at_root_sends_nothing() {
        let mut browser = FileBrowser::default();
        browser.open();
        browser.apply_listing(FileListing {
            path: "/".to_string(),
            files: vec![],
        });
        assert!(browser.go_up().is_none());
    }

    #[test]
    fn test_go_up_requests_parent() {
        let mut browser = FileBrowser::default();
        browser.open();
        browser.apply_listing(FileListing {
            path: "/a/b/c".to_string(),
            files: vec![],
        });
        assert_eq!(
            browser.go_up(),
            Some(ClientFrame::List {
                path: "/a/b".to_string()
            })
        );
        assert_eq!(browser.current_path, "/a/b");
    }

    #[test]
    fn test_listing_sorts_directories_first() {
        let mut browser = FileBrowser::default();
        browser.apply_listing(FileListing {
            path: "/".to_string(),
            files: vec![entry("b", true), entry("a", false), entry("a", true)],
        });
        let order: Vec<(&str, bool)> = browser
            .entries
            .iter()
            .map(|e| (e.name.as_str(), e.is_dir))
            .collect();
        assert_eq!(order, vec![("a", true), ("b", true), ("a", false)]);
    }

    #[test]
    fn test_optimistic_path_then_reconciled() {
        let mut browser = FileBrowser::default();
        let frame = browser.open();
        assert_eq!(
            frame,
            ClientFrame::List {
                path: String::new()
            }
        );
        // Path reflects the request before any reply arrives.
        assert_eq!(browser.current_path, "");

        // The server resolves the empty path to the actual home directory.
        browser.apply_listing(FileListing {
            path: "/home/user".to_string(),
            files: vec![],
        });
        assert_eq!(browser.current_path, "/home/user");
    }

    #[test]
    fn test_stale_reply_is_applied_as_if_current() {
        let mut browser = FileBrowser::default();
        browser.open();
        browser.navigate("/first".to_string());
        browser.navigate("/second".to_string());
        assert_eq!(browser.current_path, "/second");

        // The reply to the superseded request lands late and still wins;
        // there is no in-flight cancellation.
        browser.apply_listing(FileListing {
            path: "/first".to_string(),
            files: vec![entry("x", false)],
        });
        assert_eq!(browser.current_path, "/first");
        assert_eq!(browser.entries.len(), 1);
    }

    #[test]
    fn test_root_to_home_navigation_scenario() {
        let mut browser = FileBrowser::default();
        browser.open();
        browser.apply_listing(FileListing {
            path: "/".to_string(),
            files: vec![entry("home", true)],
        });

        let target = browser.child_path(&browser.entries[0].name.clone());
        assert_eq!(target, "/home");
        assert_eq!(
            browser.navigate(target),
            ClientFrame::List {
                path: "/home".to_string()
            }
        );

        browser.apply_listing(FileListing {
            path: "/home".to_string(),
            files: vec![entry("user", true)],
        });
        assert_eq!(browser.current_path, "/home");
    }

    #[test]
    fn test_close_clears_state() {
        let mut browser = FileBrowser::default();
        browser.open();
        browser.apply_listing(FileListing {
            path: "/tmp".to_string(),
            files: vec![entry("f", false)],
        });
        browser.close();
        assert!(!browser.visible);
        assert!(browser.entries.is_empty());
        assert_eq!(browser.current_path, "");
    }

    #[test]
    fn test_upload_targets_current_directory() {
        let mut browser = FileBrowser::default();
        browser.open();
        browser.apply_listing(FileListing {
            path: "/srv".to_string(),
            files: vec![],
        });
        match browser.upload_request("a.bin".to_string(), &[1, 2, 3]) {
            ClientFrame::Upload {
                filename,
                payload,
                path,
            } => {
                assert_eq!(filename, "a.bin");
                assert_eq!(path, "/srv");
                assert_eq!(crate::protocol::decode_base64(&payload).unwrap(), vec![1, 2, 3]);
            }
            other => panic!("expected upload frame, got {other:?}"),
        }
    }
}
