use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use crate::frame::FrameParams;
use crate::proto::command::CommandKind;
use crate::test::test_config::{TestConfig, Timing};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rfid-hammer",
    about = "RFID reader stability tester: repeated inventory reads over a serial link"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Send a command repeatedly and report per-cycle results
    Run(RunOpts),
    /// Print the request frame for a command without touching a device
    Encode(FrameOpts),
    /// Decode every complete response frame in a hex dump
    Scan(ScanOpts),
}

#[derive(Args, Debug, Clone)]
pub struct SerialOpts {
    /// Serial device path
    #[arg(long, default_value = "/dev/ttyUSB0")]
    pub dev: String,
    /// Baud rate
    #[arg(long, default_value_t = 38_400)]
    pub baud: u32,
    /// Enable RTS/CTS
    #[arg(long, default_value_t = false)]
    pub rtscts: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FrameOpts {
    /// advance (64H), auto-power (61H) or firmware (35H)
    #[arg(long = "cmd", default_value = "advance")]
    pub kind: CommandKind,
    /// Reader device id
    #[arg(long, default_value_t = 1)]
    pub id: u8,
    /// Antenna channel
    #[arg(long, default_value_t = 0)]
    pub antenna: u8,
    /// Transmit power (64H only)
    #[arg(long, default_value_t = 33, allow_negative_numbers = true)]
    pub power: i16,
    /// Device-side search window per attempt, ms
    #[arg(long, default_value_t = 5000, value_parser = clap::value_parser!(u32).range(100..))]
    pub timeout_ms: u32,
    /// Maximum records per attempt, 0 for no limit (64H only)
    #[arg(long, default_value_t = 10)]
    pub max_records: u32,
}

#[derive(Args, Debug, Clone)]
pub struct RunOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    #[command(flatten)]
    pub frame: FrameOpts,
    /// Number of attempts
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub cycles: u32,
    /// Pause between attempts, ms
    #[arg(long, default_value_t = 500)]
    pub interval_ms: u64,
    /// Keep cycling after a failed or timed out attempt
    #[arg(long, default_value_t = false)]
    pub keep_going: bool,
    /// Extra host-side wait on top of --timeout-ms, ms (1000..=2000)
    #[arg(long, default_value_t = 2000)]
    pub grace_ms: u64,
    /// Receive buffer poll period, ms (50..=100)
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct ScanOpts {
    /// Received bytes as hex, separators allowed (e.g. "08 00 0E 64 ...")
    #[arg(long)]
    pub hex: String,
}

impl FrameOpts {
    pub fn params(&self) -> FrameParams {
        FrameParams {
            kind: self.kind,
            device_id: self.id,
            antenna: self.antenna,
            power: self.power,
            timeout_ms: self.timeout_ms,
            max_records: self.max_records,
        }
    }
}

impl RunOpts {
    pub fn config(&self) -> TestConfig {
        TestConfig {
            kind: self.frame.kind,
            cycles: self.cycles,
            timeout_ms: self.frame.timeout_ms,
            interval_ms: self.interval_ms,
            max_records: self.frame.max_records,
            device_id: self.frame.id,
            antenna: self.frame.antenna,
            power: self.frame.power,
            stop_on_error: !self.keep_going,
            timing: Timing {
                grace: Duration::from_millis(self.grace_ms),
                poll_period: Duration::from_millis(self.poll_ms),
            },
        }
    }
}

/// Parse a hex dump, ignoring spaces, colons, dashes and an optional `0x`
/// prefix on each group.
pub fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let digits: String = s
        .split(|c: char| c.is_whitespace() || c == ':' || c == '-' || c == ',')
        .map(|g| g.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();
    if !digits.is_ascii() {
        bail!("non-hex characters in input");
    }
    if digits.len() % 2 != 0 {
        bail!("odd hex length");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("bad hex at offset {}", i))
        })
        .collect()
}
