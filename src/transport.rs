use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is not open")]
    NotOpen,
    #[error("transport is already open")]
    AlreadyOpen,
    #[error("open {dev}: {source}")]
    Open {
        dev: String,
        #[source]
        source: serialport::Error,
    },
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Outbound half of the link to the reader. Inbound bytes arrive separately
/// as a stream of chunks handed out when the transport is opened.
pub trait Transport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}
