use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::debug;

use crate::test::context::StopFlag;
use crate::test::event::{EventSink, LogEvent};

/// Receive buffer for one attempt. Only ever grows until `reset`.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    buf: Mutex<Vec<u8>>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // Poisoning is harmless: no chunk is ever half-appended.
        self.buf.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn append(&self, chunk: &[u8]) {
        self.lock().extend_from_slice(chunk);
    }

    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Run `f` over the current contents without copying them.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.lock().clone()
    }
}

/// Background receive loop: append every delivered chunk to `acc` until the
/// transport's chunk stream ends or `stop` is raised.
pub async fn receive_into(
    mut chunks: mpsc::Receiver<Vec<u8>>,
    acc: Arc<StreamAccumulator>,
    stop: StopFlag,
    events: EventSink,
) {
    while !stop.is_raised() {
        let Some(chunk) = chunks.recv().await else {
            debug!("chunk stream closed");
            events.emit(LogEvent::System("transport disconnected".into()));
            return;
        };
        if chunk.is_empty() {
            continue;
        }
        acc.append(&chunk);
        events.emit(LogEvent::RawChunk(chunk));
    }
    debug!("receiver stopped");
}
