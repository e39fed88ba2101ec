// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Newline framing over any async byte stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::{timeout, Duration};
use tracing::warn;

use crate::{LineSink, LineSource, TransportError, TransportFuture};

/// How long one receive attempt waits for the rest of a line.
const READ_WINDOW: Duration = Duration::from_millis(2);

/// Upper bound on a single write, so a wedged port cannot stall the caller.
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

const MAX_LINE_LEN: usize = 1024;

/// Reads newline-terminated lines.
///
/// Bytes of an unfinished line stay in an internal buffer between calls, so
/// a receive attempt that runs out of time loses nothing.
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    eof: bool,
}

impl<R: AsyncRead + Unpin + Send> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            buf: Vec::new(),
            eof: false,
        }
    }

    /// Next non-blank line, `Ok(None)` if none completed within the window.
    pub async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            if self.eof {
                return Err(TransportError::Closed);
            }

            match timeout(READ_WINDOW, self.inner.read_until(b'\n', &mut self.buf)).await {
                Err(_) => {
                    if self.buf.len() > MAX_LINE_LEN {
                        warn!(
                            "Discarding {} bytes without a line terminator",
                            self.buf.len()
                        );
                        self.buf.clear();
                    }
                    return Ok(None);
                }
                Ok(Err(e)) => {
                    self.eof = true;
                    return Err(e.into());
                }
                Ok(Ok(_)) => {
                    // Without a trailing newline the stream has ended.
                    if self.buf.last() != Some(&b'\n') {
                        self.eof = true;
                    }
                    if let Some(line) = self.take_line() {
                        return Ok(Some(line));
                    }
                }
            }
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

impl<R: AsyncRead + Unpin + Send> LineSource for LineReader<R> {
    fn try_receive_line<'a>(&'a mut self) -> TransportFuture<'a, Option<String>> {
        Box::pin(self.next_line())
    }
}

/// Writes lines and flushes after each one.
///
/// A write that fails or times out may have left part of a line on the
/// wire, so the writer refuses every later write with `Closed`.
pub struct LineWriter<W> {
    inner: W,
    closed: bool,
}

impl<W: AsyncWrite + Unpin + Send> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    pub async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let write = async {
            self.inner.write_all(line.as_bytes()).await?;
            if !line.ends_with('\n') {
                self.inner.write_all(b"\n").await?;
            }
            self.inner.flush().await
        };
        let result = match timeout(WRITE_TIMEOUT, write).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => TransportError::from(e),
            Err(_) => TransportError::Timeout(WRITE_TIMEOUT),
        };
        self.closed = true;
        Err(result)
    }

    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.shutdown().await?;
        Ok(())
    }
}

impl<W: AsyncWrite + Unpin + Send> LineSink for LineWriter<W> {
    fn send_line<'a>(&'a mut self, line: &'a str) -> TransportFuture<'a, ()> {
        Box::pin(self.write_line(line))
    }

    fn close<'a>(&'a mut self) -> TransportFuture<'a, ()> {
        Box::pin(self.shutdown())
    }
}
