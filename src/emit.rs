//! Newline-delimited JSON event output.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::event::TrapEvent;

type Sink = Box<dyn Write + Send>;

/// Writes one JSON object per line to a shared sink.
///
/// Each line is serialized up front, then written and flushed while holding
/// the lock, so concurrent workers never interleave partial lines.
pub struct EventEmitter {
    sink: Mutex<Sink>,
}

impl EventEmitter {
    /// Emit to an arbitrary writer.
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Emit to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Serialize an event to its output line, including the trailing newline.
    pub fn to_line(event: &TrapEvent) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(event).map_err(|e| Error::OutputWrite {
            source: io::Error::other(e),
        })?;
        line.push(b'\n');
        Ok(line)
    }

    /// Write and flush one event.
    pub fn emit(&self, event: &TrapEvent) -> Result<()> {
        let line = Self::to_line(event)?;

        // Poisoning only means another worker panicked; the sink is intact
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(&line)
            .and_then(|()| sink.flush())
            .map_err(|source| Error::OutputWrite { source })
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::stdout()
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter").finish_non_exhaustive()
    }
}
