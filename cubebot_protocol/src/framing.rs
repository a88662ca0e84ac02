// Length-delimited message framing over TCP.
//
// Wire format: a 4-byte big-endian length prefix followed by the payload.
// `write_message` / `read_message` move raw bytes; `write_json` /
// `read_json` wrap them with serde_json for the `message.rs` types and
// report failures as a single `FrameError`.
//
// `MAX_MESSAGE_SIZE` (1 MB) protects against unbounded allocation from
// malformed or malicious length prefixes. A `LevelStart` carrying a level
// config is the largest expected message.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Maximum allowed message size (1 MB).
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

impl FrameError {
    /// The peer closed the connection (cleanly or mid-frame).
    pub fn is_disconnect(&self) -> bool {
        matches!(self, FrameError::Io(e) if matches!(
            e.kind(),
            io::ErrorKind::UnexpectedEof
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
        ))
    }
}

/// Write a length-delimited message: 4-byte big-endian length, then payload.
pub fn write_message<W: Write>(writer: &mut W, msg: &[u8]) -> io::Result<()> {
    let len = msg.len();
    if len > MAX_MESSAGE_SIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("message too large: {len} bytes (max {MAX_MESSAGE_SIZE})"),
        ));
    }
    #[expect(clippy::cast_possible_truncation)]
    let len_bytes = (len as u32).to_be_bytes();
    writer.write_all(&len_bytes)?;
    writer.write_all(msg)?;
    writer.flush()?;
    Ok(())
}

/// Read a length-delimited message: 4-byte big-endian length, then payload.
///
/// Returns `UnexpectedEof` if the stream closes before or during a message,
/// `InvalidData` if the length exceeds `MAX_MESSAGE_SIZE`.
pub fn read_message<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("message too large: {len} bytes (max {MAX_MESSAGE_SIZE})"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Serialize `msg` as JSON and write it as one frame.
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> Result<(), FrameError> {
    let json = serde_json::to_vec(msg)?;
    write_message(writer, &json)?;
    Ok(())
}

/// Read one frame and deserialize it from JSON.
pub fn read_json<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, FrameError> {
    let bytes = read_message(reader)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_message_is_just_a_prefix() {
        let mut buf = Vec::new();
        write_message(&mut buf, b"").unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0]);
        let mut cursor = Cursor::new(&buf);
        assert!(read_message(&mut cursor).unwrap().is_empty());
    }

    #[test]
    fn rejects_oversized_write() {
        let big = vec![0u8; MAX_MESSAGE_SIZE as usize + 1];
        let mut buf = Vec::new();
        let err = write_message(&mut buf, &big).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(buf.is_empty());
    }

    #[test]
    fn rejects_oversized_read() {
        let fake_len = (MAX_MESSAGE_SIZE + 1).to_be_bytes();
        let mut cursor = Cursor::new(fake_len.to_vec());
        let err = read_message(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn truncated_frame_is_a_disconnect() {
        // Length says 10 bytes, only 3 follow.
        let mut wire = 10u32.to_be_bytes().to_vec();
        wire.extend_from_slice(b"abc");
        let mut cursor = Cursor::new(wire);
        let err = read_json::<_, serde_json::Value>(&mut cursor).unwrap_err();
        assert!(err.is_disconnect());
    }

    #[test]
    fn bad_json_is_not_a_disconnect() {
        let mut wire = Vec::new();
        write_message(&mut wire, b"{oops").unwrap();
        let mut cursor = Cursor::new(wire);
        let err = read_json::<_, serde_json::Value>(&mut cursor).unwrap_err();
        assert!(matches!(err, FrameError::Json(_)));
        assert!(!err.is_disconnect());
    }

    #[test]
    fn frames_stay_separate_in_one_stream() {
        let mut buf = Vec::new();
        for word in ["first", "second", "third"] {
            write_json(&mut buf, &word).unwrap();
        }
        let mut cursor = Cursor::new(&buf);
        for expected in ["first", "second", "third"] {
            let got: String = read_json(&mut cursor).unwrap();
            assert_eq!(got, expected);
        }
    }
}
