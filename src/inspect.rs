use anyhow::Result;

use crate::cli::{FrameOpts, ScanOpts, parse_hex};
use crate::frame::{build_frame, to_hex};
use crate::proto::command::CommandKind;
use crate::proto::parser::scan as scan_frames;

pub fn encode(opts: FrameOpts) -> Result<()> {
    let frame = build_frame(&opts.params());
    println!("{}", to_hex(&frame));
    Ok(())
}

pub fn scan(opts: ScanOpts) -> Result<()> {
    let buf = parse_hex(&opts.hex)?;
    let packets = scan_frames(&buf);
    if packets.is_empty() {
        eprintln!("no complete frames in {} bytes", buf.len());
    }
    for p in packets {
        let name = CommandKind::from_code(p.command)
            .map(|k| k.to_string())
            .unwrap_or_else(|| "unknown".into());
        let mut line = format!("cmd=0x{:02X}({}) id={}", p.command, name, p.device_id);
        if let Some(s) = p.status {
            line.push_str(&format!(" status={:02X}", s));
        }
        if let Some(n) = p.record_count {
            line.push_str(&format!(" count={}", n));
        }
        if let Some(c) = p.error_code {
            line.push_str(&format!(" code={}", c));
            if let Some(d) = c.description() {
                line.push_str(&format!(" ({})", d));
            }
        }
        if let Some(epc) = &p.epc {
            line.push_str(&format!(" epc={}", epc));
        }
        if let Some(v) = &p.firmware_version {
            line.push_str(&format!(" fw=\"{}\"", v));
        }
        if !p.checksum_ok {
            line.push_str(" BAD-CHECKSUM");
        }
        println!("{}", line);
        println!("  raw={}", to_hex(&p.raw));
    }
    Ok(())
}
