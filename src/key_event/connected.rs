use std::io::Write;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::Backend;

use super::KeyFlow;
use crate::app::{App, AppMode};
use crate::protocol::ClientFrame;

/// Encode a key event to the byte sequence a terminal would produce
fn encode_key_event_to_ansi(app_cursor: bool, key: &KeyEvent) -> Option<Vec<u8>> {
    match key.code {
        KeyCode::Esc => Some(vec![0x1b]),
        KeyCode::Enter => Some(b"\r".to_vec()),
        KeyCode::Backspace => Some(vec![0x7f]),
        KeyCode::Tab => Some(b"\t".to_vec()),
        KeyCode::Left => Some(if app_cursor {
            b"\x1bOD".to_vec()
        } else {
            b"\x1b[D".to_vec()
        }),
        KeyCode::Right => Some(if app_cursor {
            b"\x1bOC".to_vec()
        } else {
            b"\x1b[C".to_vec()
        }),
        KeyCode::Up => Some(if app_cursor {
            b"\x1bOA".to_vec()
        } else {
            b"\x1b[A".to_vec()
        }),
        KeyCode::Down => Some(if app_cursor {
            b"\x1bOB".to_vec()
        } else {
            b"\x1b[B".to_vec()
        }),
        KeyCode::Home => Some(if app_cursor {
            b"\x1bOH".to_vec()
        } else {
            b"\x1b[H".to_vec()
        }),
        KeyCode::End => Some(if app_cursor {
            b"\x1bOF".to_vec()
        } else {
            b"\x1b[F".to_vec()
        }),
        KeyCode::Delete => Some(vec![0x1b, 0x5b, 0x33, 0x7e]), // CSI 3~
        KeyCode::PageUp => Some(vec![0x1b, 0x5b, 0x35, 0x7e]), // CSI 5~
        KeyCode::PageDown => Some(vec![0x1b, 0x5b, 0x36, 0x7e]), // CSI 6~
        KeyCode::F(n) => {
            // Basic xterm mappings
            let bytes = match n {
                1 => b"\x1bOP".to_vec(),
                2 => b"\x1bOQ".to_vec(),
                3 => b"\x1bOR".to_vec(),
                4 => b"\x1bOS".to_vec(),
                5 => b"\x1b[15~".to_vec(),
                6 => b"\x1b[17~".to_vec(),
                7 => b"\x1b[18~".to_vec(),
                8 => b"\x1b[19~".to_vec(),
                9 => b"\x1b[20~".to_vec(),
                10 => b"\x1b[21~".to_vec(),
                11 => b"\x1b[23~".to_vec(),
                12 => b"\x1b[24~".to_vec(),
                _ => return None,
            };
            Some(bytes)
        }
        KeyCode::Char(ch) => {
            // CTRL combinations for ASCII letters map to 0x01..0x1A
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                let lower = ch.to_ascii_lowercase();
                if lower.is_ascii_lowercase() {
                    let code = (lower as u8) - b'a' + 1;
                    return Some(vec![code]);
                }
            }
            // ALT/META prefixes ESC
            if key.modifiers.contains(KeyModifiers::ALT) {
                let mut tmp = [0u8; 4];
                let s = ch.encode_utf8(&mut tmp);
                let mut out = Vec::with_capacity(1 + s.len());
                out.push(0x1b);
                out.extend_from_slice(s.as_bytes());
                return Some(out);
            }
            // Plain UTF-8 char
            let mut tmp = [0u8; 4];
            let s = ch.encode_utf8(&mut tmp);
            Some(s.as_bytes().to_vec())
        }
        _ => None,
    }
}

pub async fn handle_connected_key<B: Backend + Write>(app: &mut App<B>, key: KeyEvent) -> KeyFlow {
    // Tab-management chords are the client's own; everything else belongs to
    // the remote shell.
    if key.modifiers.contains(KeyModifiers::ALT) {
        match key.code {
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '1' as usize;
                if let Some(id) = app.manager.id_at(index) {
                    app.manager.switch_to(id);
                }
                return KeyFlow::Continue;
            }
            KeyCode::Char('n') => {
                app.mode = AppMode::Directory;
                return KeyFlow::Continue;
            }
            KeyCode::Char('w') => {
                app.close_active_session();
                return KeyFlow::Continue;
            }
            KeyCode::Char('f') => {
                app.toggle_file_browser();
                return KeyFlow::Continue;
            }
            KeyCode::Left => {
                app.manager.switch_prev();
                return KeyFlow::Continue;
            }
            KeyCode::Right => {
                app.manager.switch_next();
                return KeyFlow::Continue;
            }
            _ => {}
        }
    }

    let Some(session) = app.manager.active_session_mut() else {
        return KeyFlow::Continue;
    };

    let screen = session.terminal.parser.screen();
    let (in_alt, app_cursor) = (screen.alternate_screen(), screen.application_cursor());
    let interactive = in_alt || app_cursor;

    if !interactive {
        // Local scrollback controls only make sense for the plain shell view.
        match key.code {
            KeyCode::PageUp => {
                let rows = session.terminal.parser.screen().size().0;
                session.terminal.scroll_by((rows.saturating_sub(1)) as i32);
                return KeyFlow::Continue;
            }
            KeyCode::PageDown => {
                let rows = session.terminal.parser.screen().size().0;
                session.terminal.scroll_by(-((rows.saturating_sub(1)) as i32));
                return KeyFlow::Continue;
            }
            _ => {}
        }
    }

    if let Some(seq) = encode_key_event_to_ansi(app_cursor, &key) {
        session.terminal.scroll_to_bottom();
        session.send(ClientFrame::Data {
            payload: String::from_utf8_lossy(&seq).into_owned(),
        });
    }
    KeyFlow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_chars_pass_through() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(encode_key_event_to_ansi(false, &key), Some(b"a".to_vec()));
    }

    #[test]
    fn test_ctrl_letters_map_to_control_bytes() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(encode_key_event_to_ansi(false, &key), Some(vec![0x03]));
    }

    #[test]
    fn test_application_cursor_switches_arrow_encoding() {
        let key = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(
            encode_key_event_to_ansi(false, &key),
            Some(b"\x1b[A".to_vec())
        );
        assert_eq!(
            encode_key_event_to_ansi(true, &key),
            Some(b"\x1bOA".to_vec())
        );
    }
}
