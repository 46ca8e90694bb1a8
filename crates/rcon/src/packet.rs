//! RCON packet framing
//!
//! ```text
//! | length: i32 LE | request id: i32 LE | type: i32 LE | payload | 0x00 0x00 |
//! ```
//!
//! `length` counts every byte after itself, so an empty payload gives 10.

use crate::error::{Error, Result};
use std::io::{Read, Write};

/// Client login request
pub const LOGIN: i32 = 3;
/// Client command request; also the type of the server's auth response
pub const COMMAND: i32 = 2;
/// Server reply carrying command output
pub const RESPONSE_VALUE: i32 = 0;

/// Smallest valid length field (empty payload)
pub const MIN_LENGTH: usize = 10;
/// Largest length field accepted from a server
pub const MAX_LENGTH: usize = 65_536;

/// One RCON packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub request_id: i32,
    pub kind: i32,
    pub payload: String,
}

impl Packet {
    pub fn new(request_id: i32, kind: i32, payload: impl Into<String>) -> Self {
        Self {
            request_id,
            kind,
            payload: payload.into(),
        }
    }

    /// Serialize to wire format
    pub fn encode(&self) -> Vec<u8> {
        let payload = self.payload.as_bytes();
        let length = payload.len() + MIN_LENGTH;

        let mut buf = Vec::with_capacity(length + 4);
        // Callers bound payloads far below i32::MAX
        buf.extend_from_slice(&(length as i32).to_le_bytes());
        buf.extend_from_slice(&self.request_id.to_le_bytes());
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.extend_from_slice(payload);
        buf.extend_from_slice(&[0, 0]);
        buf
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode())?;
        writer.flush()?;
        Ok(())
    }

    /// Read one packet, rejecting length fields outside `MIN_LENGTH..=MAX_LENGTH`
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let length = i32::from_le_bytes(read_array(reader)?);
        let length = usize::try_from(length)
            .ok()
            .filter(|l| (MIN_LENGTH..=MAX_LENGTH).contains(l))
            .ok_or_else(|| Error::Protocol(format!("packet length {length} out of range")))?;

        let mut body = vec![0u8; length];
        reader.read_exact(&mut body)?;

        let request_id = i32::from_le_bytes([body[0], body[1], body[2], body[3]]);
        let kind = i32::from_le_bytes([body[4], body[5], body[6], body[7]]);
        if body[length - 2..] != [0, 0] {
            return Err(Error::Protocol("packet is missing its null terminator".into()));
        }
        let payload = String::from_utf8_lossy(&body[8..length - 2]).into_owned();

        Ok(Self {
            request_id,
            kind,
            payload,
        })
    }
}

fn read_array<R: Read>(reader: &mut R) -> Result<[u8; 4]> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
