use std::fmt::Write;

use crate::proto::command::{CommandKind, SOF_OUT};

/// Value sent in the 64H record-limit field when no limit is requested.
pub const UNBOUNDED_RECORDS: u32 = 0xFFFF_FFFF;

/// Everything the reader needs to know to build one request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParams {
    pub kind: CommandKind,
    pub device_id: u8,
    pub antenna: u8,
    pub power: i16,
    pub timeout_ms: u32,
    /// 0 means no limit.
    pub max_records: u32,
}

/// XOR of every byte.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Space separated uppercase hex, e.g. `80 00 03 35 01 B7`.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        let _ = write!(s, "{:02X}", b);
    }
    s
}

/// Build a request frame: `SOF | LEN(2) | CMD | payload | XOR`.
///
/// LEN counts the command byte, the payload and the checksum.
pub fn build_frame(p: &FrameParams) -> Vec<u8> {
    let mut payload = Vec::with_capacity(12);
    match p.kind {
        CommandKind::ReadAdvance => {
            let records = if p.max_records == 0 {
                UNBOUNDED_RECORDS
            } else {
                p.max_records
            };
            payload.push(p.device_id);
            payload.push(p.antenna);
            payload.extend_from_slice(&p.power.to_be_bytes());
            payload.extend_from_slice(&p.timeout_ms.to_be_bytes());
            payload.extend_from_slice(&records.to_be_bytes());
        }
        CommandKind::ReadAutoPower => {
            payload.push(p.device_id);
            payload.push(p.antenna);
        }
        CommandKind::ReadFirmware => payload.push(p.device_id),
    }

    let len = (payload.len() + 2) as u16;
    let mut out = Vec::with_capacity(payload.len() + 5);
    out.push(SOF_OUT);
    out.extend_from_slice(&len.to_be_bytes());
    out.push(p.kind.code());
    out.extend_from_slice(&payload);
    out.push(xor_checksum(&out));
    out
}
