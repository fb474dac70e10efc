//! Wire codec for the gateway socket protocol.
//!
//! Every message in either direction is a JSON envelope with a `type` field.
//! The inbound set is closed but forward-compatible: unknown types decode to
//! [`ServerFrame::Unknown`], and anything that is not valid JSON degrades to
//! [`ServerFrame::Raw`] so the channel still behaves as a dumb pipe.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Frames sent from the client to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Raw terminal input (keystrokes, pastes).
    Data { payload: String },
    /// The terminal widget changed size.
    Resize { cols: u16, rows: u16 },
    /// Request a directory listing. An empty path means the server-side
    /// working directory (home).
    List { path: String },
    /// Request a file download.
    Download { path: String },
    /// Upload a file into `path`; `payload` is the base64-encoded content.
    Upload {
        filename: String,
        payload: String,
        path: String,
    },
}

impl ClientFrame {
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::ProtocolError(format!("Failed to encode frame: {e}")))
    }
}

/// One entry of a remote directory listing. Rebuilt wholesale on every
/// listing reply; never diffed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "isDir", default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size: u64,
}

/// Payload of a `list` reply. The `path` is authoritative: the server may
/// have substituted its working directory for an empty request path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileListing {
    #[serde(default)]
    pub path: String,
    // An empty remote directory arrives as `"files": null`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<FileEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let files = Option::<Vec<FileEntry>>::deserialize(deserializer)?;
    Ok(files.unwrap_or_default())
}

/// Payload of a `download` reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileDownload {
    pub filename: String,
    pub payload: String,
}

impl FileDownload {
    /// Decode the base64 content back into bytes.
    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        decode_base64(&self.payload)
    }
}

/// Frames received from the gateway, after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// Shell output, written verbatim to the terminal.
    Stdout(String),
    /// A server-side status notice (e.g. upload finished). Written to the
    /// terminal and followed by a listing refresh + prompt re-echo.
    Status(String),
    /// A directory listing reply.
    Listing(FileListing),
    /// A file download reply.
    Download(FileDownload),
    /// A server-reported error. Non-fatal for the session.
    Error(String),
    /// A type this client does not know. The payload is still shown.
    Unknown { kind: String, payload: String },
    /// The frame was not valid JSON; the raw text is treated as terminal
    /// output.
    Raw(String),
}

/// Decode one inbound text frame.
///
/// Returns `None` for frames that parse as JSON but lack `type` or `payload`;
/// those are dropped (the caller has nothing sensible to do with them).
pub fn decode_frame(text: &str) -> Option<ServerFrame> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return Some(ServerFrame::Raw(text.to_string())),
    };

    let Some(kind) = value.get("type").and_then(|t| t.as_str()).map(String::from) else {
        tracing::debug!("dropping inbound frame without a type field");
        return None;
    };
    let Some(payload_value) = value.get("payload") else {
        tracing::debug!(%kind, "dropping inbound frame without a payload");
        return None;
    };
    let payload = match payload_value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let frame = match kind.as_str() {
        "stdout" => ServerFrame::Stdout(payload),
        "status" => ServerFrame::Status(payload),
        // list/download carry a JSON document nested inside the payload
        // string. A malformed inner document falls back to the dumb pipe,
        // same as a malformed outer envelope.
        "list" => match serde_json::from_str::<FileListing>(&payload) {
            Ok(listing) => ServerFrame::Listing(listing),
            Err(_) => ServerFrame::Raw(text.to_string()),
        },
        "download" => match serde_json::from_str::<FileDownload>(&payload) {
            Ok(download) => ServerFrame::Download(download),
            Err(_) => ServerFrame::Raw(text.to_string()),
        },
        "error" => ServerFrame::Error(payload),
        _ => ServerFrame::Unknown { kind, payload },
    };
    Some(frame)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(text)
        .map_err(|_| AppError::ProtocolError("Invalid base64 payload".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stdout() {
        let frame = decode_frame(r#"{"type":"stdout","payload":"hello\r\n"}"#).unwrap();
        assert_eq!(frame, ServerFrame::Stdout("hello\r\n".to_string()));
    }

    #[test]
    fn test_decode_status_and_error() {
        assert_eq!(
            decode_frame(r#"{"type":"status","payload":"done"}"#).unwrap(),
            ServerFrame::Status("done".to_string())
        );
        assert_eq!(
            decode_frame(r#"{"type":"error","payload":"boom"}"#).unwrap(),
            ServerFrame::Error("boom".to_string())
        );
    }

    #[test]
    fn test_decode_listing_with_nested_payload() {
        let text = r#"{"type":"list","payload":"{\"path\":\"/home\",\"files\":[{\"name\":\"a\",\"isDir\":true,\"size\":0},{\"name\":\"b.txt\",\"isDir\":false,\"size\":42}]}"}"#;
        let frame = decode_frame(text).unwrap();
        match frame {
            ServerFrame::Listing(listing) => {
                assert_eq!(listing.path, "/home");
                assert_eq!(listing.files.len(), 2);
                assert!(listing.files[0].is_dir);
                assert_eq!(listing.files[1].size, 42);
            }
            other => panic!("expected listing, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_download() {
        let text = r#"{"type":"download","payload":"{\"filename\":\"x.bin\",\"payload\":\"AQID\"}"}"#;
        match decode_frame(text).unwrap() {
            ServerFrame::Download(download) => {
                assert_eq!(download.filename, "x.bin");
                assert_eq!(download.decode_bytes().unwrap(), vec![1, 2, 3]);
            }
            other => panic!("expected download, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_directory_listing_has_null_files() {
        let text = r#"{"type":"list","payload":"{\"path\":\"/empty\",\"files\":null}"}"#;
        match decode_frame(text).unwrap() {
            ServerFrame::Listing(listing) => {
                assert_eq!(listing.path, "/empty");
                assert!(listing.files.is_empty());
            }
            other => panic!("expected listing, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_degrades_to_raw() {
        let frame = decode_frame("plain shell banner, not json").unwrap();
        assert_eq!(
            frame,
            ServerFrame::Raw("plain shell banner, not json".to_string())
        );
    }

    #[test]
    fn test_malformed_nested_payload_degrades_to_raw() {
        let text = r#"{"type":"list","payload":"not a listing"}"#;
        assert_eq!(decode_frame(text).unwrap(), ServerFrame::Raw(text.to_string()));
    }

    #[test]
    fn test_missing_type_or_payload_is_dropped() {
        assert!(decode_frame(r#"{"payload":"x"}"#).is_none());
        assert!(decode_frame(r#"{"type":"stdout"}"#).is_none());
        assert!(decode_frame(r#"{}"#).is_none());
    }

    #[test]
    fn test_unknown_type_keeps_payload() {
        match decode_frame(r#"{"type":"telemetry","payload":"ignored"}"#).unwrap() {
            ServerFrame::Unknown { kind, payload } => {
                assert_eq!(kind, "telemetry");
                assert_eq!(payload, "ignored");
            }
            other => panic!("expected unknown, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_envelope_shapes() {
        let data = ClientFrame::Data {
            payload: "ls\r".to_string(),
        };
        assert_eq!(data.encode().unwrap(), r#"{"type":"data","payload":"ls\r"}"#);

        let resize = ClientFrame::Resize { cols: 120, rows: 40 };
        assert_eq!(
            resize.encode().unwrap(),
            r#"{"type":"resize","cols":120,"rows":40}"#
        );

        let upload = ClientFrame::Upload {
            filename: "notes.txt".to_string(),
            payload: encode_base64(b"hi"),
            path: "/tmp".to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&upload.encode().unwrap()).unwrap();
        assert_eq!(value["type"], "upload");
        assert_eq!(value["filename"], "notes.txt");
        assert_eq!(value["path"], "/tmp");
    }

    #[test]
    fn test_base64_round_trip() {
        use rand::RngCore;

        for len in [0usize, 1, 4096] {
            let mut bytes = vec![0u8; len];
            rand::thread_rng().fill_bytes(&mut bytes);
            let encoded = encode_base64(&bytes);
            assert_eq!(decode_base64(&encoded).unwrap(), bytes);
        }
    }
}
