use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::accumulator::receive_into;
use crate::cli::RunOpts;
use crate::frame::to_hex;
use crate::port::SerialTransport;
use crate::stats::Summary;
use crate::test::context::SessionContext;
use crate::test::event::{EventSink, LogEvent};
use crate::test::runner::Orchestrator;
use crate::test::test_config::TestConfig;
use crate::test::{ReportRow, TestResult};

pub async fn run(opts: RunOpts) -> Result<()> {
    let config = opts.config();
    config.validate().context("invalid test configuration")?;
    info!(
        dev = %opts.ser.dev,
        baud = opts.ser.baud,
        cmd = %config.kind,
        cycles = config.cycles,
        timeout_ms = config.timeout_ms,
        stop_on_error = config.stop_on_error,
        "starting run"
    );

    let ctx = SessionContext::new();
    let mut transport = SerialTransport::new(opts.ser.clone(), ctx.stop.clone());
    let chunks = transport
        .open()
        .with_context(|| format!("opening {}", opts.ser.dev))?;

    let (events, log) = EventSink::channel();
    let printer = tokio::spawn(log_events(log));
    let receiver = tokio::spawn(receive_into(
        chunks,
        ctx.buffer.clone(),
        ctx.stop.clone(),
        events.clone(),
    ));

    let stop = ctx.stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing current poll");
            stop.raise();
        }
    });

    let mut orch = Orchestrator::new(transport, config.clone(), ctx.clone(), events)?;
    let mut progress = orch.progress();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = *progress.borrow();
            debug!("cycle {}/{}", p.cycle, p.total);
        }
    });

    let report = orch.run(|res| log_result(&config, res)).await;

    // Tear down: the reader thread sees the flag and drops its sender, then
    // the receiver and printer tasks drain out behind it.
    ctx.stop.raise();
    orch.into_transport().close();
    let _ = receiver.await;
    let _ = printer.await;

    if report.cancelled {
        warn!("run cancelled after {} cycles", report.results.len());
    } else if report.stopped_on_error {
        warn!("run stopped on first error (use --keep-going to continue past errors)");
    }
    Summary::from_results(&report.results).log();
    if let Some(e) = report.aborted {
        return Err(e).context("run aborted");
    }
    Ok(())
}

fn log_result(config: &TestConfig, res: &TestResult) {
    let row = ReportRow::new(config, res);
    let code = row
        .error_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "N/A".into());
    let at_ms = row
        .timestamp
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    info!(
        at_ms,
        cycle = row.cycle,
        cmd = %row.command,
        status = %row.status,
        code = %code,
        records = row.records_found,
        power = row.power,
        timeout_ms = row.timeout_ms,
        max_records = row.max_records,
        tx = %to_hex(&row.raw_tx),
        rx = %to_hex(&row.raw_rx),
        "result: {}",
        res.error_message
    );
    if !res.epcs.is_empty() {
        info!(cycle = res.cycle, count = res.epcs.len(), epcs = ?res.epcs, "distinct tags");
    }
    if let Some(v) = &res.firmware_version {
        info!(cycle = res.cycle, "firmware {}", v);
    }
}

async fn log_events(mut rx: mpsc::UnboundedReceiver<LogEvent>) {
    while let Some(ev) = rx.recv().await {
        match ev {
            LogEvent::Sent { cycle, frame } => info!("[tx] cycle={} {}", cycle, to_hex(&frame)),
            LogEvent::RawChunk(chunk) => debug!("[rx] {}", to_hex(&chunk)),
            LogEvent::Tag { cycle, epc } => info!("[tag] cycle={} epc={}", cycle, epc),
            LogEvent::Firmware { cycle, version } => {
                info!("[fw] cycle={} version={}", cycle, version)
            }
            LogEvent::Terminal {
                cycle,
                record_count,
                error_code,
                raw,
            } => info!(
                "[end] cycle={} records={} code={} raw={}",
                cycle,
                record_count.map_or_else(|| "-".into(), |n| n.to_string()),
                error_code.map_or_else(|| "-".into(), |c| c.to_string()),
                to_hex(&raw)
            ),
            LogEvent::System(msg) => info!("[sys] {}", msg),
            LogEvent::Error(msg) => error!("[err] {}", msg),
        }
    }
}
