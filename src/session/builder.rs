//! Session builder for configuration

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::buffer::OutputBuffer;
use crate::logger::{LogSink, SessionLogger};
use crate::reader;
use crate::result::ExpectError;
use crate::session::Session;

/// Default timeout for expect operations (in seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default PTY rows
const DEFAULT_PTY_ROWS: u16 = 24;

/// Default PTY columns
const DEFAULT_PTY_COLS: u16 = 80;

/// Builder for configuring and spawning sessions.
///
/// Provides a fluent interface for configuring session options before
/// spawning a process. Timeout and line terminator stay adjustable on the
/// live session afterwards; the pty size and logger are fixed at spawn.
///
/// # Defaults
///
/// - Timeout: 30 seconds
/// - Line terminator for `send`: empty (nothing appended)
/// - PTY size: 24 rows x 80 columns
/// - Logger: none
///
/// # Examples
///
/// ```no_run
/// use ptyexpect::Session;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::builder()
///     .timeout(Duration::from_secs(10))
///     .eol("\r")
///     .pty_size(40, 120)
///     .spawn(["bash", "--noediting"])?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    timeout: Option<Duration>,
    eol: String,
    pty_size: PtySize,
    logger: Option<(Box<dyn LogSink>, String)>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Create a builder with the defaults listed on [`SessionBuilder`].
    pub fn new() -> Self {
        Self {
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            eol: String::new(),
            pty_size: PtySize {
                rows: DEFAULT_PTY_ROWS,
                cols: DEFAULT_PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            },
            logger: None,
        }
    }

    /// Set the default timeout for expect and read operations.
    ///
    /// A pattern not matched within this budget makes `expect()` return
    /// [`ExpectError::Timeout`]. Individual calls can override the budget
    /// via `expect_for`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the default timeout.
    ///
    /// `expect()` then waits until the pattern matches or the process goes
    /// away. It still wakes periodically internally, so closing the session
    /// from a timeout elsewhere is not delayed.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the line terminator appended by `send`.
    ///
    /// Defaults to nothing; interactive shells driven through a pty usually
    /// want `"\r"`.
    pub fn eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = eol.into();
        self
    }

    /// Set the terminal dimensions reported to the spawned process.
    ///
    /// Programs that draw to the terminal wrap and paginate based on these;
    /// the default is 24 rows by 80 columns.
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.pty_size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        self
    }

    /// Mirror session output into `sink`, prefixing every line.
    ///
    /// The prefix is written as soon as the session spawns; see
    /// [`SessionLogger`] for the mirroring rules.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptyexpect::{Session, WriterSink};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::builder()
    ///     .logger(WriterSink::new(std::io::stderr()), "    ")
    ///     .spawn(["bash"])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn logger(mut self, sink: impl LogSink + 'static, prefix: impl Into<String>) -> Self {
        self.logger = Some((Box::new(sink), prefix.into()));
        self
    }

    /// Spawn a command and return a configured session.
    ///
    /// Allocates the pty, attaches the child to its slave side, and starts
    /// the background reader. Must be called from within a tokio runtime;
    /// the reader runs on the runtime's blocking pool.
    ///
    /// # Arguments
    ///
    /// * `argv` - Program and arguments, e.g. `["bash", "--noediting"]`
    ///
    /// # Errors
    ///
    /// Fails when `argv` is empty, the pty cannot be allocated, or the
    /// process cannot be started.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptyexpect::Session;
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .spawn(["python3", "-i"])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn<I, S>(self, argv: I) -> Result<Session, ExpectError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let argv: Vec<String> = argv.into_iter().map(|s| s.as_ref().to_string()).collect();
        let Some((program, args)) = argv.split_first() else {
            return Err(ExpectError::SpawnError("empty argv".to_string()));
        };

        let pty_system = native_pty_system();
        let pty_pair = pty_system
            .openpty(self.pty_size)
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let mut cmd = CommandBuilder::new(program);
        for arg in args {
            cmd.arg(arg);
        }

        let child = pty_pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| ExpectError::SpawnError(e.to_string()))?;

        // The parent keeps only the master half. Holding the slave open here
        // would stop the master from ever reporting end of stream.
        drop(pty_pair.slave);

        let child_pid = child.process_id();

        let reader = pty_pair
            .master
            .try_clone_reader()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        // take_writer() consumes ownership; grab it before storing the master
        let writer = pty_pair
            .master
            .take_writer()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let stop = Arc::new(AtomicBool::new(false));
        let (chunk_tx, chunk_rx) = tokio::sync::mpsc::unbounded_channel();
        let reader_task = reader::spawn_reader(reader, chunk_tx, Arc::clone(&stop));

        debug!(pid = ?child_pid, command = %argv.join(" "), "session spawned");

        Ok(Session {
            child: Some(child),
            child_pid,
            master: Some(pty_pair.master),
            writer: Some(Arc::new(Mutex::new(writer))),
            chunks: chunk_rx,
            reader_task: Some(reader_task),
            stop,
            closed: false,
            pending_fault: None,
            buffer: OutputBuffer::new(),
            timeout: self.timeout,
            eol: self.eol,
            logger: self
                .logger
                .map(|(sink, prefix)| SessionLogger::new(sink, prefix)),
        })
    }
}
