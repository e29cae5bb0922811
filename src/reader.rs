//! Background reader task for pty output

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::decode::Utf8Decoder;
use crate::result::ExpectError;

/// Bytes requested per blocking read.
const READ_CHUNK_SIZE: usize = 65536;

/// One queue item handed from the reader task to the session.
#[derive(Debug)]
pub(crate) enum Chunk {
    /// Decoded output. May be empty while the decoder holds a split
    /// character.
    Text(String),
    /// Terminal condition. Nothing follows it; the queue closes once the
    /// task exits.
    Fault(Fault),
}

/// Why the reader stopped.
#[derive(Debug)]
pub(crate) enum Fault {
    /// The child closed its side of the pty.
    Eof,
    /// A read failed.
    Io(std::io::Error),
}

impl From<Fault> for ExpectError {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Eof => ExpectError::Eof,
            Fault::Io(e) => ExpectError::IoError(e),
        }
    }
}

/// Spawn the blocking read loop for a session.
///
/// Reads the pty master until end-of-stream or a read error, pushing decoded
/// output into the queue as it arrives. The final item is always a
/// [`Chunk::Fault`]; the task never raises failures itself, the session
/// re-raises them when it dequeues the fault. The `stop` flag marks
/// teardown-induced read failures as expected so they are not logged as
/// problems.
pub(crate) fn spawn_reader(
    mut reader: Box<dyn Read + Send>,
    chunks: UnboundedSender<Chunk>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut read_buffer = [0u8; READ_CHUNK_SIZE];
        let mut decoder = Utf8Decoder::new();

        loop {
            match reader.read(&mut read_buffer) {
                Ok(0) => {
                    debug!("pty output reached end of stream");
                    let leftover = decoder.finish();
                    if !leftover.is_empty() {
                        let _ = chunks.send(Chunk::Text(leftover));
                    }
                    let _ = chunks.send(Chunk::Fault(Fault::Eof));
                    break;
                }
                Ok(n) => {
                    trace!(bytes = n, "pty read");
                    let _ = chunks.send(Chunk::Text(decoder.decode(&read_buffer[..n])));
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    if stop.load(Ordering::SeqCst) || is_shutdown_errno(&e) {
                        debug!("pty read ended during teardown: {e}");
                    } else {
                        warn!("pty read failed: {e}");
                    }
                    let leftover = decoder.finish();
                    if !leftover.is_empty() {
                        let _ = chunks.send(Chunk::Text(leftover));
                    }
                    let _ = chunks.send(Chunk::Fault(Fault::Io(e)));
                    break;
                }
            }
        }
    })
}

/// Read failures expected when the pty is being torn down.
///
/// Linux reports EIO on the master once the slave side is gone; a close
/// racing the read surfaces as EBADF.
#[cfg(unix)]
fn is_shutdown_errno(e: &std::io::Error) -> bool {
    matches!(e.raw_os_error(), Some(libc::EIO) | Some(libc::EBADF))
}

#[cfg(not(unix))]
fn is_shutdown_errno(_e: &std::io::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    /// Replays a fixed sequence of read results.
    struct ScriptedReader {
        parts: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedReader {
        fn new(parts: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                parts: parts.into(),
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.parts.pop_front() {
                Some(Ok(data)) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn stop_flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[tokio::test]
    async fn test_forwards_text_then_eof() {
        let (tx, mut rx) = unbounded_channel();
        let reader = ScriptedReader::new(vec![Ok(b"hello".to_vec())]);
        let handle = spawn_reader(Box::new(reader), tx, stop_flag());

        match rx.recv().await {
            Some(Chunk::Text(text)) => assert_eq!(text, "hello"),
            other => panic!("expected text chunk, got {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(Chunk::Fault(Fault::Eof))));
        assert!(rx.recv().await.is_none());
        handle.await.expect("reader task panicked");
    }

    #[tokio::test]
    async fn test_split_character_across_reads() {
        let (tx, mut rx) = unbounded_channel();
        let reader = ScriptedReader::new(vec![Ok(b"caf\xc3".to_vec()), Ok(b"\xa9".to_vec())]);
        let handle = spawn_reader(Box::new(reader), tx, stop_flag());

        match rx.recv().await {
            Some(Chunk::Text(text)) => assert_eq!(text, "caf"),
            other => panic!("expected text chunk, got {other:?}"),
        }
        match rx.recv().await {
            Some(Chunk::Text(text)) => assert_eq!(text, "é"),
            other => panic!("expected text chunk, got {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(Chunk::Fault(Fault::Eof))));
        handle.await.expect("reader task panicked");
    }

    #[tokio::test]
    async fn test_leftover_escaped_at_eof() {
        let (tx, mut rx) = unbounded_channel();
        let reader = ScriptedReader::new(vec![Ok(b"ok\xc3".to_vec())]);
        let handle = spawn_reader(Box::new(reader), tx, stop_flag());

        match rx.recv().await {
            Some(Chunk::Text(text)) => assert_eq!(text, "ok"),
            other => panic!("expected text chunk, got {other:?}"),
        }
        match rx.recv().await {
            Some(Chunk::Text(text)) => assert_eq!(text, "\\xc3"),
            other => panic!("expected escaped leftover, got {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(Chunk::Fault(Fault::Eof))));
        handle.await.expect("reader task panicked");
    }

    #[tokio::test]
    async fn test_read_error_becomes_fault() {
        let (tx, mut rx) = unbounded_channel();
        let reader = ScriptedReader::new(vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::other("pty gone")),
        ]);
        let handle = spawn_reader(Box::new(reader), tx, stop_flag());

        match rx.recv().await {
            Some(Chunk::Text(text)) => assert_eq!(text, "partial"),
            other => panic!("expected text chunk, got {other:?}"),
        }
        match rx.recv().await {
            Some(Chunk::Fault(Fault::Io(e))) => {
                assert_eq!(e.to_string(), "pty gone");
            }
            other => panic!("expected io fault, got {other:?}"),
        }
        assert!(rx.recv().await.is_none());
        handle.await.expect("reader task panicked");
    }
}
