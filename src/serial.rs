//! Serial line transport.
//!
//! The BME680 sketch prints one labelled value per line. [`SerialLink`] owns
//! the open port; [`SerialSession`] reads lines from any buffered reader and
//! feeds them through the decoder and dispatcher until told to stop.

use serialport::SerialPort;
use std::io::{self, BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::protocol::Decoder;
use crate::session::{SessionEnd, SessionSummary};

/// Longest line kept while waiting for its line break.
pub const MAX_LINE_LEN: usize = 4096;

/// An open serial port. The port is released when the link is dropped.
pub struct SerialLink {
    port_name: String,
    reader: BufReader<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Open the configured port.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serial` if the port cannot be opened.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.timeout)
            .open()?;

        info!(
            "Connected to serial port {} at {} baud, waiting for data...",
            config.port, config.baud_rate
        );

        Ok(Self {
            port_name: config.port.clone(),
            reader: BufReader::new(port),
        })
    }

    /// The port identifier.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl BufRead for SerialLink {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt)
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        info!("Serial port {} closed", self.port_name);
    }
}

/// Reads lines until the run flag clears, the stream ends, or a read fails.
pub struct SerialSession<R> {
    reader: R,
    decoder: Decoder,
    dispatcher: Dispatcher,
}

impl<R: BufRead> SerialSession<R> {
    /// Create a session over a line source.
    pub fn new(reader: R, decoder: Decoder, dispatcher: Dispatcher) -> Self {
        Self {
            reader,
            decoder,
            dispatcher,
        }
    }

    /// Run until `running` is cleared or the reader ends or fails.
    ///
    /// The flag is checked before every read, so with a read timeout the loop
    /// notices a stop request within one timeout. Bytes received before a
    /// timeout are kept and completed by the next read, up to
    /// [`MAX_LINE_LEN`] bytes; a longer run without a line break is discarded.
    /// The reader is dropped before this returns, whatever the outcome.
    pub fn run(self, running: &AtomicBool) -> Result<SessionSummary> {
        let Self {
            mut reader,
            decoder,
            mut dispatcher,
        } = self;

        let mut summary = SessionSummary::default();
        let mut line = Vec::new();

        let result = loop {
            if !running.load(Ordering::SeqCst) {
                info!("Stopping serial session");
                summary.end = SessionEnd::Shutdown;
                break Ok(());
            }

            let room = (MAX_LINE_LEN - line.len()) as u64;
            match reader.by_ref().take(room).read_until(b'\n', &mut line) {
                Ok(0) if line.is_empty() => {
                    debug!("Serial stream ended");
                    summary.end = SessionEnd::StreamClosed;
                    break Ok(());
                }
                Ok(_) if line.len() >= MAX_LINE_LEN && !line.ends_with(b"\n") => {
                    warn!("Discarding {} bytes received without a line break", line.len());
                    summary.received += 1;
                    summary.dropped += 1;
                    line.clear();
                }
                Ok(_) => {
                    let outcome = handle_line(&line, &decoder, &mut dispatcher, &mut summary);
                    line.clear();
                    if let Err(e) = outcome {
                        break Err(e);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    continue;
                }
                Err(e) => {
                    warn!("Serial read failed: {}", e);
                    break Err(Error::Io(e));
                }
            }
        };

        drop(reader);

        info!(
            "Serial session ended ({:?}): {} received, {} decoded, {} dropped",
            summary.end, summary.received, summary.decoded, summary.dropped
        );

        result.map(|()| summary)
    }
}

fn handle_line(
    line: &[u8],
    decoder: &Decoder,
    dispatcher: &mut Dispatcher,
    summary: &mut SessionSummary,
) -> Result<()> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(_) => {
            debug!("Dropping non UTF-8 line: {:02X?}", line);
            summary.received += 1;
            summary.dropped += 1;
            return Ok(());
        }
    };

    if text.is_empty() {
        return Ok(());
    }

    debug!("Received: {}", text);
    summary.handle_payload(decoder, dispatcher, text.as_bytes())
}
