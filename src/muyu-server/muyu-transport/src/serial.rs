// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt};
use tracing::debug;

use crate::framing::{LineReader, LineWriter};
use crate::{Link, TransportError};

/// Open the controller board's USB serial port.
pub(crate) fn open(path: &str, baud: u32) -> Result<Link, TransportError> {
    let label = format!("serial {} @ {} baud", path, baud);
    let port = tokio_serial::new(path, baud)
        .open_native_async()
        .map_err(|e| TransportError::open(&label, e))?;
    // Drop boot chatter buffered before we attached.
    if let Err(e) = port.clear(ClearBuffer::Input) {
        debug!("Could not clear input buffer of {}: {}", path, e);
    }
    let (reader, writer) = tokio::io::split(port);
    Ok(Link::new(label, LineReader::new(reader), LineWriter::new(writer)))
}
