//! Line forwarder feeding the parser channel
//!
//! Wraps each line read from an async source (piped `ptp4l -m` output in the
//! binary) in a [`Message`] tagged with the configured link name and process.

use crate::Result;
use ptp_common::{Message, ProcessType};
use std::borrow::Cow;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Forward lines until EOF or until the receiving side is dropped.
///
/// Returns the number of messages sent. Blank lines are skipped. Bytes that
/// are not valid UTF-8 are replaced rather than ending the stream.
pub async fn forward_lines<R>(
    mut reader: R,
    name: &str,
    process: ProcessType,
    sender: mpsc::Sender<Message>,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut forwarded = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let raw = String::from_utf8_lossy(&buf);
        if let Cow::Owned(_) = raw {
            warn!("Invalid UTF-8 in {} input for {}", process, name);
        }

        let line = raw.trim_end();
        if line.is_empty() {
            continue;
        }

        if sender
            .send(Message::new(name, process.clone(), line))
            .await
            .is_err()
        {
            warn!("Parser channel closed, dropping remaining {} input", process);
            return Ok(forwarded);
        }
        forwarded += 1;
    }

    debug!("End of {} input for {} after {} lines", process, name, forwarded);
    Ok(forwarded)
}
