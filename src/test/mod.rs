use std::collections::BTreeSet;
use std::fmt;
use std::time::SystemTime;

use crate::proto::command::{CommandKind, ErrorCode};

pub mod event;

use test_config::TestConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Success,
    Failure,
    Timeout,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TestStatus::Success => "Success",
            TestStatus::Failure => "Failure",
            TestStatus::Timeout => "Timeout",
        })
    }
}

/// Outcome of one attempt.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub cycle: u32,
    pub status: TestStatus,
    /// None when no terminal packet arrived.
    pub error_code: Option<ErrorCode>,
    pub error_message: String,
    pub raw_tx: Vec<u8>,
    /// Everything received during the attempt, terminal frame included.
    pub raw_rx: Vec<u8>,
    pub records_found: u32,
    pub epcs: BTreeSet<String>,
    pub firmware_version: Option<String>,
    pub timestamp: SystemTime,
}

/// One exported row per attempt. Formatting is left to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub cycle: u32,
    pub command: CommandKind,
    pub status: TestStatus,
    pub error_code: Option<ErrorCode>,
    pub records_found: u32,
    pub raw_tx: Vec<u8>,
    pub raw_rx: Vec<u8>,
    pub power: i16,
    pub timeout_ms: u32,
    pub max_records: u32,
    pub timestamp: SystemTime,
}

impl ReportRow {
    pub fn new(config: &TestConfig, res: &TestResult) -> Self {
        Self {
            cycle: res.cycle,
            command: config.kind,
            status: res.status,
            error_code: res.error_code,
            records_found: res.records_found,
            raw_tx: res.raw_tx.clone(),
            raw_rx: res.raw_rx.clone(),
            power: config.power,
            timeout_ms: config.timeout_ms,
            max_records: config.max_records,
            timestamp: res.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_row_carries_run_parameters() {
        let config = TestConfig {
            kind: CommandKind::ReadAutoPower,
            power: -7,
            timeout_ms: 1500,
            max_records: 0,
            ..TestConfig::default()
        };
        let res = TestResult {
            cycle: 4,
            status: TestStatus::Failure,
            error_code: Some(ErrorCode(0x0101)),
            error_message: "command operation failed".into(),
            raw_tx: vec![0x80, 0x00, 0x04, 0x61],
            raw_rx: vec![0x08, 0x00],
            records_found: 2,
            epcs: BTreeSet::new(),
            firmware_version: None,
            timestamp: SystemTime::UNIX_EPOCH,
        };

        let row = ReportRow::new(&config, &res);
        assert_eq!(row.cycle, 4);
        assert_eq!(row.command, CommandKind::ReadAutoPower);
        assert_eq!(row.status, TestStatus::Failure);
        assert_eq!(row.error_code, Some(ErrorCode(0x0101)));
        assert_eq!(row.records_found, 2);
        assert_eq!(row.raw_tx, res.raw_tx);
        assert_eq!(row.raw_rx, res.raw_rx);
        assert_eq!(row.power, -7);
        assert_eq!(row.timeout_ms, 1500);
        assert_eq!(row.max_records, 0);
        assert_eq!(row.timestamp, SystemTime::UNIX_EPOCH);
    }
}
