// src/proto/parser.rs
use std::collections::HashSet;
use std::fmt::Write;

use thiserror::Error;
use tracing::{debug, trace};

use super::command::{
    CMD_READ_ADVANCE, CMD_READ_AUTO_POWER, CMD_READ_FIRMWARE, CommandKind, ErrorCode, SOF_IN,
};
use crate::frame::xor_checksum;

/// SOF + LEN(2) + CMD + device id.
const HEADER_LEN: usize = 5;
/// 64H footer: `[status][count(4)][error(2)][checksum]`.
const ADVANCE_FOOTER_LEN: usize = 8;
/// `[error(2)][checksum]` at the end of every single-shot response.
const SHORT_FOOTER_LEN: usize = 3;
/// EPC starts after SOF, LEN, CMD, ID, ANT, PWR and a 2-byte RSSI.
const EPC_OFFSET: usize = 9;
/// A 61H response only carries an EPC when it is longer than this.
const AUTO_POWER_EPC_MIN_LEN: usize = EPC_OFFSET + SHORT_FOOTER_LEN;

pub const STATUS_TAG: u8 = 0x00;
pub const STATUS_END: u8 = 0x01;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame of {0} bytes has no command header")]
    MissingHeader(usize),
    #[error("{len}-byte frame for command 0x{command:02X} is shorter than {min} bytes")]
    TooShort {
        command: u8,
        len: usize,
        min: usize,
    },
}

/// One complete response frame, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    pub command: u8,
    pub device_id: u8,
    /// 64H only: 0x00 tag report, 0x01 end of inventory.
    pub status: Option<u8>,
    pub record_count: Option<u32>,
    pub error_code: Option<ErrorCode>,
    pub epc: Option<String>,
    pub firmware_version: Option<String>,
    /// Whether the trailing byte matched the XOR of the rest of the frame.
    pub checksum_ok: bool,
    pub raw: Vec<u8>,
}

impl DecodedPacket {
    fn new(frame: &[u8]) -> Self {
        let n = frame.len();
        Self {
            command: frame[3],
            device_id: frame[4],
            status: None,
            record_count: None,
            error_code: None,
            epc: None,
            firmware_version: None,
            checksum_ok: xor_checksum(&frame[..n - 1]) == frame[n - 1],
            raw: frame.to_vec(),
        }
    }

    /// True when this packet ends an attempt for `kind`.
    pub fn is_terminal(&self, kind: CommandKind) -> bool {
        if self.command != kind.code() {
            return false;
        }
        match kind {
            CommandKind::ReadAdvance => self.status == Some(STATUS_END),
            CommandKind::ReadAutoPower | CommandKind::ReadFirmware => true,
        }
    }
}

/// Raw frames already acted upon during one attempt.
///
/// Scans always start from the beginning of the receive buffer, so the same
/// frame comes back on every poll until the buffer is reset.
#[derive(Debug, Default)]
pub struct SeenFrames(HashSet<Vec<u8>>);

impl SeenFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a given raw frame is offered.
    pub fn first_sighting(&mut self, packet: &DecodedPacket) -> bool {
        if self.0.contains(&packet.raw) {
            return false;
        }
        self.0.insert(packet.raw.clone());
        true
    }
}

/// Find and decode every complete response frame in `buf`, in buffer order.
///
/// A trailing partial frame is left alone; it will be picked up by a later
/// scan once more bytes have arrived. Complete frames that cannot be decoded
/// are skipped one byte at a time so a stray marker inside data does not hide
/// the frames that follow it.
pub fn scan(buf: &[u8]) -> Vec<DecodedPacket> {
    let mut found = Vec::new();
    let mut i = 0;
    while i < buf.len() {
        if buf[i] != SOF_IN || i + 3 > buf.len() {
            i += 1;
            continue;
        }
        let len = u16::from_be_bytes([buf[i + 1], buf[i + 2]]) as usize;
        let end = i + len + 3;
        if end > buf.len() {
            i += 1;
            continue;
        }
        match decode_frame(&buf[i..end]) {
            Ok(packet) => {
                trace!(offset = i, len = end - i, command = packet.command, "frame");
                found.push(packet);
                i = end;
            }
            Err(e) => {
                debug!(offset = i, "skipping candidate frame: {}", e);
                i += 1;
            }
        }
    }
    found
}

/// Decode one complete frame, `SOF` through checksum inclusive.
pub fn decode_frame(frame: &[u8]) -> Result<DecodedPacket, DecodeError> {
    let n = frame.len();
    if n < HEADER_LEN {
        return Err(DecodeError::MissingHeader(n));
    }
    let command = frame[3];
    let min = match command {
        CMD_READ_ADVANCE => HEADER_LEN + ADVANCE_FOOTER_LEN,
        _ => HEADER_LEN + SHORT_FOOTER_LEN,
    };
    if n < min {
        return Err(DecodeError::TooShort { command, len: n, min });
    }

    let mut p = DecodedPacket::new(frame);
    match command {
        CMD_READ_ADVANCE => {
            let footer = n - ADVANCE_FOOTER_LEN;
            let status = frame[footer];
            p.status = Some(status);
            match status {
                STATUS_END => {
                    p.record_count = Some(u32::from_be_bytes([
                        frame[footer + 1],
                        frame[footer + 2],
                        frame[footer + 3],
                        frame[footer + 4],
                    ]));
                    p.error_code = Some(trailing_error_code(frame));
                }
                STATUS_TAG if footer > EPC_OFFSET => {
                    p.epc = Some(hex_compact(&frame[EPC_OFFSET..footer]));
                }
                _ => {}
            }
        }
        CMD_READ_AUTO_POWER => {
            p.error_code = Some(trailing_error_code(frame));
            if n > AUTO_POWER_EPC_MIN_LEN {
                p.epc = Some(hex_compact(&frame[EPC_OFFSET..n - SHORT_FOOTER_LEN]));
            }
        }
        CMD_READ_FIRMWARE => {
            p.error_code = Some(trailing_error_code(frame));
            let text = String::from_utf8_lossy(&frame[HEADER_LEN..n - SHORT_FOOTER_LEN]);
            p.firmware_version = Some(
                text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
                    .to_string(),
            );
        }
        _ => {
            p.error_code = Some(trailing_error_code(frame));
        }
    }
    Ok(p)
}

/// The two bytes immediately before the checksum.
fn trailing_error_code(frame: &[u8]) -> ErrorCode {
    let n = frame.len();
    ErrorCode::from_be_bytes([frame[n - 3], frame[n - 2]])
}

fn hex_compact(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{:02X}", b);
    }
    s
}

/* ---------- tests ---------- */
