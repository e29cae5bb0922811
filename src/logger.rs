//! Logging adapter for mirroring session output

use std::io;

/// Destination for mirrored session output.
///
/// The session asks nothing else of its log destination: append some text,
/// flush it. Mirroring is best effort; a sink that cannot keep up or fails
/// internally must swallow the problem rather than surface it, so neither
/// method returns a result.
pub trait LogSink: Send {
    /// Append `text` to the log.
    fn write(&mut self, text: &str);

    /// Flush buffered log data.
    fn flush(&mut self);
}

/// Bridges any [`io::Write`] into a [`LogSink`].
///
/// Write errors are discarded; losing mirror output must not disturb the
/// session being mirrored.
///
/// # Examples
///
/// ```
/// use ptyexpect::WriterSink;
///
/// let stderr_sink = WriterSink::new(std::io::stderr());
/// let capture_sink = WriterSink::new(Vec::new());
/// ```
pub struct WriterSink<W> {
    inner: W,
}

impl<W: io::Write + Send> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap back into the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write + Send> LogSink for WriterSink<W> {
    fn write(&mut self, text: &str) {
        let _ = self.inner.write_all(text.as_bytes());
    }

    fn flush(&mut self) {
        let _ = self.inner.flush();
    }
}

/// Prefixing adapter between a session and its log sink.
///
/// Installed at most once per session. Writes the prefix immediately so the
/// log opens indented, then re-applies it after every newline that passes
/// through, producing the familiar transcript layout where each output line
/// of the session carries the same indent.
pub struct SessionLogger {
    sink: Box<dyn LogSink>,
    prefix: String,
}

impl SessionLogger {
    pub(crate) fn new(sink: Box<dyn LogSink>, prefix: impl Into<String>) -> Self {
        let mut logger = Self {
            sink,
            prefix: prefix.into(),
        };
        let opening = logger.prefix.clone();
        logger.write(&opening);
        logger
    }

    /// Prefix applied to every mirrored line.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Mirror `text`, re-indenting after each newline. Empty text is a no-op.
    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.prefix.is_empty() {
            self.sink.write(text);
        } else {
            let indent = format!("\n{}", self.prefix);
            self.sink.write(&text.replace('\n', &indent));
        }
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) {
        self.sink.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<String>>);

    impl SharedSink {
        fn contents(&self) -> String {
            self.0.lock().unwrap().clone()
        }
    }

    impl LogSink for SharedSink {
        fn write(&mut self, text: &str) {
            self.0.lock().unwrap().push_str(text);
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn test_prefix_written_at_construction() {
        let sink = SharedSink::default();
        let _logger = SessionLogger::new(Box::new(sink.clone()), "    ");

        assert_eq!(sink.contents(), "    ");
    }

    #[test]
    fn test_write_reindents_newlines() {
        let sink = SharedSink::default();
        let mut logger = SessionLogger::new(Box::new(sink.clone()), "  | ");

        logger.write("one\ntwo\nthree");
        assert_eq!(sink.contents(), "  | one\n  | two\n  | three");
    }

    #[test]
    fn test_empty_write_is_noop() {
        let sink = SharedSink::default();
        let mut logger = SessionLogger::new(Box::new(sink.clone()), "> ");

        logger.write("");
        assert_eq!(sink.contents(), "> ");
    }

    #[test]
    fn test_empty_prefix_passes_through() {
        let sink = SharedSink::default();
        let mut logger = SessionLogger::new(Box::new(sink.clone()), "");

        logger.write("a\nb");
        assert_eq!(sink.contents(), "a\nb");
    }

    #[test]
    fn test_writer_sink_accumulates() {
        let mut sink = WriterSink::new(Vec::new());
        sink.write("hello ");
        sink.write("world");
        sink.flush();

        assert_eq!(sink.into_inner(), b"hello world");
    }
}
