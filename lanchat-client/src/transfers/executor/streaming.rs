//! Chunked copying with timeouts, cancellation and progress tracking

use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use super::{BUFFER_SIZE, IO_TIMEOUT};
use crate::transfers::{Transfer, TransferError};

/// Copy exactly `transfer.size()` bytes from `reader` to `writer`
///
/// Each chunk feeds the transfer's progress counters and throughput meter.
/// Every read and write is bounded by [`IO_TIMEOUT`] and raced against the
/// transfer's cancellation.
pub(super) async fn stream<R, W>(
    reader: &mut R,
    writer: &mut W,
    transfer: &Transfer,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let expected = transfer.size();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total: u64 = 0;
    let mut last_chunk = Instant::now();

    while total < expected {
        let to_read = (expected - total).min(BUFFER_SIZE as u64) as usize;

        let bytes_read = tokio::select! {
            biased;
            _ = transfer.cancelled() => return Err(TransferError::Cancelled),
            result = timeout(IO_TIMEOUT, reader.read(&mut buffer[..to_read])) => match result {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(TransferError::Io(e.to_string())),
                Err(_) => return Err(TransferError::Timeout),
            },
        };

        if bytes_read == 0 {
            return Err(TransferError::ShortStream {
                expected,
                received: total,
            });
        }

        tokio::select! {
            biased;
            _ = transfer.cancelled() => return Err(TransferError::Cancelled),
            result = timeout(IO_TIMEOUT, writer.write_all(&buffer[..bytes_read])) => match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(TransferError::Io(e.to_string())),
                Err(_) => return Err(TransferError::Timeout),
            },
        }

        total += bytes_read as u64;

        let now = Instant::now();
        let elapsed_ms = now.duration_since(last_chunk).as_millis() as u64;
        transfer.record_progress(bytes_read as u64, elapsed_ms);
        last_chunk = now;
    }

    match timeout(IO_TIMEOUT, writer.flush()).await {
        Ok(Ok(())) => Ok(total),
        Ok(Err(e)) => Err(TransferError::Io(e.to_string())),
        Err(_) => Err(TransferError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn transfer(size: u64) -> Transfer {
        Transfer::incoming(1, PathBuf::from("/tmp/x"), "x".to_string(), 1, size)
    }

    #[tokio::test]
    async fn test_copies_declared_size_only() {
        let transfer = transfer(20_000);
        let input = vec![7u8; 30_000];
        let mut reader = &input[..];
        let mut output = Vec::new();

        let copied = stream(&mut reader, &mut output, &transfer).await.unwrap();

        assert_eq!(copied, 20_000);
        assert_eq!(output.len(), 20_000);
        assert_eq!(transfer.transferred(), 20_000);
    }

    #[tokio::test]
    async fn test_short_input() {
        let transfer = transfer(100);
        let input = vec![7u8; 40];
        let mut reader = &input[..];
        let mut output = Vec::new();

        let result = stream(&mut reader, &mut output, &transfer).await;

        assert_eq!(
            result,
            Err(TransferError::ShortStream {
                expected: 100,
                received: 40
            })
        );
    }

    #[tokio::test]
    async fn test_empty_file() {
        let transfer = transfer(0);
        let mut reader: &[u8] = &[];
        let mut output = Vec::new();
        assert_eq!(stream(&mut reader, &mut output, &transfer).await, Ok(0));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let transfer = transfer(100);
        transfer.cancel().unwrap();
        let input = vec![7u8; 100];
        let mut reader = &input[..];
        let mut output = Vec::new();

        assert_eq!(
            stream(&mut reader, &mut output, &transfer).await,
            Err(TransferError::Cancelled)
        );
    }
}
