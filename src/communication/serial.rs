//! Command sources: serial device or any async byte stream, split into lines.
use serial2_tokio::SerialPort;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::Sender;

pub fn open_serial(path: &str, baud: u32) -> std::io::Result<SerialPort> {
    let port = SerialPort::open(path, baud)?;
    tracing::info!("Listening for commands on {} @ {} baud", path, baud);
    Ok(port)
}

/// Forwards every line of `reader` to `tx` until EOF or the receiver hangs up.
/// Returns the number of lines forwarded.
pub async fn forward_lines<R>(reader: R, tx: Sender<String>) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut forwarded = 0;
    while let Some(line) = lines.next_line().await? {
        if tx.send(line).await.is_err() {
            tracing::debug!("Command receiver closed, stopping reader");
            break;
        }
        forwarded += 1;
    }
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn forwards_lines_in_order() {
        let reader = tokio_test::io::Builder::new()
            .read(b"it10a5b")
            .read(b"-3\nd\n")
            .build();
        let (tx, mut rx) = mpsc::channel(8);
        let count = forward_lines(reader, tx).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(rx.recv().await.as_deref(), Some("it10a5b-3"));
        assert_eq!(rx.recv().await.as_deref(), Some("d"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn stops_when_receiver_is_gone() {
        let reader = tokio_test::io::Builder::new().read(b"d\nd\n").build();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert_eq!(forward_lines(reader, tx).await.unwrap(), 0);
    }
}
