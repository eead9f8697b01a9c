//! Capture session
//!
//! A single-threaded pull loop: read a byte, decode it, repeat. Reads are
//! sliced into short polls so a cancellation request is noticed quickly even
//! while the bus is silent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::decoder::{Decoder, DecoderStats};
use crate::protocol::{ByteSource, ProtocolError, POLL_INTERVAL_MS};
use crate::trace::TraceSink;

/// Reads from a [`ByteSource`] and writes decoded frames to a [`TraceSink`]
pub struct Sniffer<B, S> {
    source: B,
    sink: S,
    decoder: Decoder,
    timeout: Duration,
    poll_interval: Duration,
    cancel: Arc<AtomicBool>,
    started: Instant,
}

impl<B: ByteSource, S: TraceSink> Sniffer<B, S> {
    /// Build a session; `timeout` is the idle window before a resync
    pub fn new(
        source: B,
        sink: S,
        decoder: Decoder,
        timeout: Duration,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            sink,
            decoder,
            timeout,
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            cancel,
            started: Instant::now(),
        }
    }

    /// Override how long a single read may block
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Decoder state, including running totals
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Release the source and sink
    pub fn into_parts(self) -> (B, S) {
        (self.source, self.sink)
    }

    /// Run until cancelled or until the source or sink fails
    pub fn run(&mut self) -> Result<DecoderStats, ProtocolError> {
        tracing::info!(
            started = %chrono::Local::now().to_rfc3339(),
            timeout_ms = self.timeout.as_millis() as u64,
            filter = ?self.decoder.filter().unit(),
            "capture started"
        );

        let result = self.pump();

        // Partial frames are never rendered
        self.decoder.reset();
        let flushed = self.sink.flush().map_err(ProtocolError::from);

        let stats = self.decoder.stats();
        tracing::info!(?stats, "capture stopped");
        result.and(flushed).map(|_| stats)
    }

    fn pump(&mut self) -> Result<(), ProtocolError> {
        let mut idle = Duration::ZERO;

        while !self.cancel.load(Ordering::SeqCst) {
            let wait = self
                .poll_interval
                .min(self.timeout.saturating_sub(idle))
                .max(Duration::from_millis(1));

            match self.source.read_byte(wait)? {
                Some(byte) => {
                    idle = Duration::ZERO;
                    self.decoder
                        .feed(byte, self.started.elapsed(), &mut self.sink)?;
                }
                None => {
                    idle += wait;
                    if idle >= self.timeout {
                        idle = Duration::ZERO;
                        self.decoder.timeout(self.started.elapsed(), &mut self.sink)?;
                    }
                }
            }
        }

        tracing::debug!("cancellation requested");
        Ok(())
    }
}
