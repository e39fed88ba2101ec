// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};

use crate::framing::{LineReader, LineWriter};
use crate::{Link, TransportError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Connect to a serial-over-TCP bridge in front of the board.
pub(crate) async fn connect(addr: &str) -> Result<Link, TransportError> {
    let label = format!("tcp {}", addr);
    let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
        .await
        .map_err(|_| TransportError::open(&label, "connect timed out"))?
        .map_err(|e| TransportError::open(&label, e))?;
    stream
        .set_nodelay(true)
        .map_err(|e| TransportError::open(&label, e))?;
    let (reader, writer) = stream.into_split();
    Ok(Link::new(label, LineReader::new(reader), LineWriter::new(writer)))
}
