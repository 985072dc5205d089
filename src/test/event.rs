use tokio::sync::{mpsc, watch};

use crate::proto::command::ErrorCode;

/// Everything the core reports while a run is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Sent { cycle: u32, frame: Vec<u8> },
    RawChunk(Vec<u8>),
    Tag { cycle: u32, epc: String },
    Firmware { cycle: u32, version: String },
    Terminal {
        cycle: u32,
        record_count: Option<u32>,
        error_code: Option<ErrorCode>,
        raw: Vec<u8>,
    },
    System(String),
    Error(String),
}

/// Sending half of the log-event stream. Events are dropped once the
/// receiving side has gone away.
#[derive(Debug, Clone)]
pub struct EventSink(mpsc::UnboundedSender<LogEvent>);

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LogEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    pub fn emit(&self, event: LogEvent) {
        let _ = self.0.send(event);
    }
}

/// Which cycle is running, out of how many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub cycle: u32,
    pub total: u32,
}

pub fn progress_channel() -> (watch::Sender<Progress>, watch::Receiver<Progress>) {
    watch::channel(Progress::default())
}
