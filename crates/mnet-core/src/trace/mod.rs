//! Trace output
//!
//! Rendered text goes to a [`TraceSink`]. The capture binary uses
//! [`TraceLog`], which appends to a log file and optionally echoes to stdout.

pub mod render;

use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

pub use render::{
    format_elapsed, format_hex, render_bad_checksum, render_frame, render_heartbeat,
    BAD_CHECKSUM_MARKER, OVERFLOW_MARKER, UNRECOGNIZED_MARKER,
};

/// Append-only destination for trace text
pub trait TraceSink {
    /// Append `text` verbatim
    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Push buffered text to its destination
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TraceSink for String {
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.push_str(text);
        Ok(())
    }
}

impl<S: TraceSink + ?Sized> TraceSink for &mut S {
    fn write(&mut self, text: &str) -> io::Result<()> {
        (**self).write(text)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Trace file opened in append mode, with optional echo to stdout
pub struct TraceLog {
    path: PathBuf,
    file: LineWriter<File>,
    echo: bool,
}

impl TraceLog {
    /// Open (or create) `path` for appending
    pub fn open<P: AsRef<Path>>(path: P, echo: bool) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!(path = %path.display(), "appending trace");
        Ok(Self {
            path,
            file: LineWriter::new(file),
            echo,
        })
    }

    /// File being appended to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TraceSink for TraceLog {
    fn write(&mut self, text: &str) -> io::Result<()> {
        if self.echo {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
        self.file.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Drop for TraceLog {
    fn drop(&mut self) {
        if let Err(e) = self.file.flush() {
            tracing::warn!(path = %self.path.display(), "failed to flush trace: {e}");
        }
    }
}
