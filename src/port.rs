use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cli::SerialOpts;
use crate::test::context::StopFlag;
use crate::transport::{Transport, TransportError};

const READ_TIMEOUT: Duration = Duration::from_millis(100);
const CHUNK_QUEUE: usize = 256;

pub fn open_port(opts: &SerialOpts) -> Result<Box<dyn SerialPort>, TransportError> {
    serialport::new(&opts.dev, opts.baud)
        .timeout(READ_TIMEOUT)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(if opts.rtscts {
            FlowControl::Hardware
        } else {
            FlowControl::None
        })
        .open()
        .map_err(|source| TransportError::Open {
            dev: opts.dev.clone(),
            source,
        })
}

/// Serial link to the reader: 8N1, optional RTS/CTS.
pub struct SerialTransport {
    opts: SerialOpts,
    port: Option<Box<dyn SerialPort>>,
    stop: StopFlag,
    closed: StopFlag,
}

impl SerialTransport {
    pub fn new(opts: SerialOpts, stop: StopFlag) -> Self {
        Self {
            opts,
            port: None,
            stop,
            closed: StopFlag::new(),
        }
    }

    /// Open the port and start the reader thread. The returned stream ends
    /// when the port fails, the transport is closed or `stop` is raised.
    pub fn open(&mut self) -> Result<mpsc::Receiver<Vec<u8>>, TransportError> {
        if self.port.is_some() {
            return Err(TransportError::AlreadyOpen);
        }
        let port = open_port(&self.opts)?;
        let reader = port.try_clone().map_err(|source| TransportError::Open {
            dev: self.opts.dev.clone(),
            source,
        })?;
        let (tx, rx) = mpsc::channel(CHUNK_QUEUE);
        self.closed = StopFlag::new();
        let (stop, closed) = (self.stop.clone(), self.closed.clone());
        thread::spawn(move || read_loop(reader, tx, stop, closed));
        self.port = Some(port);
        debug!(dev = %self.opts.dev, baud = self.opts.baud, "port open");
        Ok(rx)
    }

    pub fn close(&mut self) {
        if self.port.take().is_some() {
            self.closed.raise();
            debug!(dev = %self.opts.dev, "port closed");
        }
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }
}

fn read_loop(
    mut port: Box<dyn SerialPort>,
    tx: mpsc::Sender<Vec<u8>>,
    stop: StopFlag,
    closed: StopFlag,
) {
    let mut buf = [0u8; 256];
    while !stop.is_raised() && !closed.is_raised() && !tx.is_closed() {
        match port.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => {
                if tx.blocking_send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::Interrupted => {
                continue;
            }
            Err(e) => {
                warn!("serial read: {}", e);
                break;
            }
        }
    }
    debug!("reader thread exiting");
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}
