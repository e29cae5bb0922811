//! Session management for PTY-based process automation

mod builder;
mod spawn;

pub use builder::SessionBuilder;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use portable_pty::{Child, ExitStatus, MasterPty};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::buffer::OutputBuffer;
use crate::logger::{LogSink, SessionLogger};
use crate::pattern::Pattern;
use crate::reader::{Chunk, Fault};
use crate::result::{ExpectError, MatchResult};

/// Ceiling for a single queue wait inside `expect`.
///
/// Waiting in short slices keeps the deadline accounting fine-grained and
/// bounds how stale the remaining-budget arithmetic can get, without busy
/// polling. Requests with no budget at all poll at the same cadence.
const POLL_SLICE: Duration = Duration::from_millis(100);

/// Spawn `argv` through a pty with default configuration.
///
/// Shorthand for `Session::builder().spawn(argv)`; use the builder when the
/// session needs a timeout, line terminator, pty size, or logger up front.
///
/// # Errors
///
/// Returns an error if `argv` is empty, the pty cannot be allocated, or the
/// process cannot be spawned.
///
/// # Examples
///
/// ```no_run
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = ptyexpect::spawn(["cat"])?;
/// # Ok(())
/// # }
/// ```
pub fn spawn<I, S>(argv: I) -> Result<Session, ExpectError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    SessionBuilder::new().spawn(argv)
}

/// Interactive session with a process running behind a pseudo-terminal.
///
/// A `Session` owns the child process, the pty master, and a background
/// reader that keeps draining the terminal so the child never blocks on a
/// full output pipe. Callers script the process with [`send`](Session::send)
/// and [`expect`](Session::expect): send input, then block (with a budget)
/// until the output matches a pattern.
///
/// Output that arrives between calls is retained, so an `expect` can match
/// immediately without reading. Dropping the session force-closes it; call
/// [`close`](Session::close) explicitly to choose between hard and soft
/// termination.
///
/// # Examples
///
/// ```no_run
/// use ptyexpect::{Pattern, Session};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = Session::builder()
///     .timeout(Duration::from_secs(10))
///     .eol("\r")
///     .spawn(["bash", "--noediting"])?;
///
/// let prompt = Pattern::regex(r"[#\$] ")?;
/// session.expect(&prompt).await?;
///
/// session.send("echo hello").await?;
/// let result = session.expect(&prompt).await?;
/// assert!(result.before.contains("hello"));
///
/// session.close(true)?;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    child: Option<Box<dyn Child + Send>>,
    child_pid: Option<u32>,
    master: Option<Box<dyn MasterPty + Send>>,
    writer: Option<Arc<Mutex<Box<dyn Write + Send>>>>,
    chunks: UnboundedReceiver<Chunk>,
    reader_task: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    closed: bool,
    /// Fault drained while collecting already-queued text; re-raised by the
    /// next read instead of being lost.
    pending_fault: Option<Fault>,
    buffer: OutputBuffer,
    timeout: Option<Duration>,
    eol: String,
    logger: Option<SessionLogger>,
}

impl Session {
    /// Create a new session builder.
    ///
    /// This is the recommended way to create a session as it allows
    /// configuring the timeout, line terminator, pty size, and logger.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptyexpect::Session;
    /// use std::time::Duration;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::builder()
    ///     .timeout(Duration::from_secs(60))
    ///     .eol("\r")
    ///     .spawn(["bash", "--noediting"])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Spawn `argv` with default configuration (convenience method).
    ///
    /// Shorthand for `Session::builder().spawn(argv)`.
    ///
    /// # Errors
    ///
    /// Returns an error if `argv` is empty, the pty cannot be allocated, or
    /// the process cannot be spawned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptyexpect::Session;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::spawn(["echo", "hello"])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn<I, S>(argv: I) -> Result<Self, ExpectError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SessionBuilder::new().spawn(argv)
    }

    /// Wait for `pattern` in the output, within the session's default budget.
    ///
    /// The retained buffer is searched before anything is read, so output
    /// that already arrived matches without waiting. On a match the buffer
    /// is consumed through the end of the match: text before it and the
    /// match itself move into the returned [`MatchResult`], the rest stays
    /// for the next call.
    ///
    /// On timeout the whole retained buffer is cleared (a snapshot travels
    /// in the error) so the next `expect` starts clean.
    ///
    /// # Errors
    ///
    /// - [`ExpectError::Timeout`] if the budget runs out first
    /// - [`ExpectError::Eof`] if the process closes its output
    /// - [`ExpectError::Closed`] if the session was closed
    /// - [`ExpectError::IoError`] for reader faults
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptyexpect::{Pattern, Session};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut session = Session::spawn(["bash", "--noediting"])?;
    /// let prompt = Pattern::regex(r"[#\$] ")?;
    /// let result = session.expect(&prompt).await?;
    /// println!("output so far: {}", result.before);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn expect(&mut self, pattern: &Pattern) -> Result<MatchResult, ExpectError> {
        self.expect_for(pattern, None).await
    }

    /// Wait for `pattern` with an explicit time budget.
    ///
    /// `None` falls back to the session default; if that is also absent the
    /// wait is unbounded (it still polls internally, see
    /// [`expect`](Session::expect) for the rest of the semantics).
    pub async fn expect_for(
        &mut self,
        pattern: &Pattern,
        timeout: Option<Duration>,
    ) -> Result<MatchResult, ExpectError> {
        match self.expect_inner(pattern, timeout, false).await? {
            Some(result) => Ok(result),
            // Non-probe runs finalize into an error instead of None.
            None => unreachable!("non-probe expect returned without a match"),
        }
    }

    /// Probe for `pattern` without committing to it.
    ///
    /// Behaves like [`expect_for`](Session::expect_for) on a match. On
    /// timeout it returns `Ok(None)` and leaves the session untouched: the
    /// retained buffer keeps its contents and nothing is mirrored to the
    /// logger, so a failed probe is invisible to later calls.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptyexpect::{Pattern, Session};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut session = Session::spawn(["bash"])?;
    /// let banner = Pattern::literal("unexpected warning")?;
    /// if let Some(m) = session
    ///     .try_expect(&banner, Some(Duration::from_millis(50)))
    ///     .await?
    /// {
    ///     eprintln!("saw: {}", m.after);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn try_expect(
        &mut self,
        pattern: &Pattern,
        timeout: Option<Duration>,
    ) -> Result<Option<MatchResult>, ExpectError> {
        self.expect_inner(pattern, timeout, true).await
    }

    async fn expect_inner(
        &mut self,
        pattern: &Pattern,
        timeout: Option<Duration>,
        probe: bool,
    ) -> Result<Option<MatchResult>, ExpectError> {
        self.ensure_open()?;

        let budget = timeout.or(self.timeout);
        let limit = budget.map(|budget| (budget, Instant::now() + budget));

        loop {
            if !self.buffer.is_empty() {
                if let Some(found) = pattern.find(self.buffer.as_str()) {
                    if let Some(logger) = &mut self.logger {
                        logger.write(self.buffer.unmirrored_to(found.end));
                    }
                    let (before, after) = self.buffer.consume_match(found.start, found.end);
                    trace!(pattern = %pattern, "matched");
                    return Ok(Some(MatchResult {
                        before,
                        after,
                        captures: found.captures,
                    }));
                }
                if !probe {
                    if let Some(logger) = &mut self.logger {
                        logger.write(self.buffer.unmirrored());
                        self.buffer.mark_all_mirrored();
                    }
                }
            }

            let remaining = match limit {
                Some((_, deadline)) => deadline.saturating_duration_since(Instant::now()),
                None => POLL_SLICE,
            };

            match self.read_chunk(remaining.min(POLL_SLICE)).await {
                Ok(data) => self.buffer.push(&data),
                Err(ExpectError::ReadTimeout { .. }) => {
                    if let Some((budget, deadline)) = limit {
                        if Instant::now() >= deadline {
                            if probe {
                                return Ok(None);
                            }
                            if let Some(logger) = &mut self.logger {
                                logger.write(&format!("{}\n", self.buffer.unmirrored()));
                                logger.flush();
                            }
                            let buffer = self.buffer.take_all();
                            debug!(pattern = %pattern, ?budget, "expect timed out");
                            return Err(ExpectError::Timeout {
                                pattern: pattern.as_str().to_string(),
                                timeout: budget,
                                buffer,
                            });
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Read the next run of output, waiting up to `timeout`.
    ///
    /// Returns as soon as any output arrives; it does not wait for the
    /// budget to fill up. Output consumed here bypasses the retained buffer
    /// used by `expect`, matching the low-level role of this method: use it
    /// for free-form draining, not interleaved with pattern waits.
    ///
    /// # Errors
    ///
    /// - [`ExpectError::ReadTimeout`] if nothing arrives in time
    /// - [`ExpectError::Eof`] / [`ExpectError::IoError`] for reader faults
    /// - [`ExpectError::Closed`] if the session was closed
    pub async fn read(&mut self, timeout: Duration) -> Result<String, ExpectError> {
        self.ensure_open()?;
        self.read_chunk(timeout).await
    }

    /// Like [`read`](Session::read), but a timeout yields `Ok("")`.
    pub async fn try_read(&mut self, timeout: Duration) -> Result<String, ExpectError> {
        self.ensure_open()?;
        match self.read_chunk(timeout).await {
            Err(ExpectError::ReadTimeout { .. }) => Ok(String::new()),
            other => other,
        }
    }

    /// Dequeue chunks until some text accumulates or the budget runs out.
    ///
    /// Empty chunks (the decoder withholding a split character) keep the
    /// wait going. Once text arrives, anything else already sitting in the
    /// queue is collected without waiting again. A dequeued fault is
    /// converted and raised here, in the caller's context; a fault found
    /// while collecting is held back for the next call so the text before
    /// it is not lost. A closed queue means the reader is gone and its
    /// fault was already consumed; the remaining budget is waited out so a
    /// dead reader behaves like a silent one.
    async fn read_chunk(&mut self, timeout: Duration) -> Result<String, ExpectError> {
        if let Some(fault) = self.pending_fault.take() {
            return Err(fault.into());
        }

        let mut data = String::new();
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, self.chunks.recv()).await {
                Ok(Some(Chunk::Text(text))) => {
                    data.push_str(&text);
                    if data.is_empty() {
                        continue;
                    }
                    while let Ok(chunk) = self.chunks.try_recv() {
                        match chunk {
                            Chunk::Text(text) => data.push_str(&text),
                            Chunk::Fault(fault) => {
                                self.pending_fault = Some(fault);
                                break;
                            }
                        }
                    }
                    return Ok(data);
                }
                Ok(Some(Chunk::Fault(fault))) => return Err(fault.into()),
                Ok(None) => {
                    tokio::time::sleep(remaining).await;
                    return Err(ExpectError::ReadTimeout { timeout });
                }
                Err(_) => return Err(ExpectError::ReadTimeout { timeout }),
            }
        }
    }

    /// Write `text` to the process as-is.
    ///
    /// The write happens on the blocking pool and is flushed before this
    /// returns, so the process sees it immediately. Returns the number of
    /// bytes written.
    ///
    /// Control characters are ordinary text here: `session.write("\x03")`
    /// delivers Ctrl-C.
    ///
    /// # Errors
    ///
    /// [`ExpectError::Closed`] after close; [`ExpectError::IoError`] if the
    /// pty rejects the write.
    pub async fn write(&mut self, text: &str) -> Result<usize, ExpectError> {
        self.ensure_open()?;
        let writer = Arc::clone(self.writer.as_ref().ok_or(ExpectError::Closed)?);
        let data = text.to_string();

        let written = tokio::task::spawn_blocking(move || -> std::io::Result<usize> {
            let mut writer = writer.blocking_lock();
            writer.write_all(data.as_bytes())?;
            writer.flush()?;
            Ok(data.len())
        })
        .await
        .map_err(|e| ExpectError::IoError(std::io::Error::other(e)))??;

        Ok(written)
    }

    /// Send `text` followed by the session's line terminator.
    ///
    /// The terminator defaults to nothing; configure it with
    /// [`SessionBuilder::eol`] or [`set_eol`](Session::set_eol) (interactive
    /// shells usually want `"\r"`). Returns the number of bytes written.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptyexpect::Session;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut session = Session::spawn(["bash", "--noediting"])?;
    /// session.set_eol("\r");
    /// session.send("echo ready").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send(&mut self, text: &str) -> Result<usize, ExpectError> {
        self.send_with(text, None, None).await
    }

    /// Send `text` with a per-call line terminator and input throttle.
    ///
    /// `eol` overrides the session terminator for this call only. `delay`
    /// sleeps before writing, for programs that drop input arriving too
    /// fast after a prompt.
    pub async fn send_with(
        &mut self,
        text: &str,
        eol: Option<&str>,
        delay: Option<Duration>,
    ) -> Result<usize, ExpectError> {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let line = match eol {
            Some(eol) => format!("{text}{eol}"),
            None => format!("{text}{}", self.eol),
        };
        self.write(&line).await
    }

    /// Close the session, tearing down the process and the pty.
    ///
    /// Signals the child's whole process group, then terminates the child
    /// itself: hard when `force` is set, gracefully otherwise. Closing the
    /// descriptors unblocks the background reader, which exits on its own.
    /// A trailing newline is mirrored to the logger and the logger flushed,
    /// so a transcript ends cleanly even mid-line.
    ///
    /// Idempotent: later calls are no-ops. After the first call every I/O
    /// method fails with [`ExpectError::Closed`].
    pub fn close(&mut self, force: bool) -> Result<(), ExpectError> {
        if self.closed {
            return Ok(());
        }
        debug!(force, pid = ?self.child_pid, "closing session");

        self.stop.store(true, Ordering::SeqCst);
        if let Some(child) = &mut self.child {
            spawn::terminate_tree(child, self.child_pid, force);
        }

        // Dropping the descriptors fails the reader's pending read; the
        // task exits through its fault path.
        self.writer = None;
        self.master = None;
        self.reader_task = None;

        if let Some(logger) = &mut self.logger {
            logger.write("\n");
            logger.flush();
        }
        self.closed = true;
        Ok(())
    }

    /// Check if the process is still alive.
    ///
    /// Returns `true` if the process is still running, `false` if it has
    /// exited.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is closed or the process handle was
    /// consumed by a previous call to [`wait`](Session::wait).
    pub fn is_alive(&mut self) -> Result<bool, ExpectError> {
        self.ensure_open()?;
        match &mut self.child {
            Some(child) => spawn::is_alive(child),
            None => Err(ExpectError::ProcessExited),
        }
    }

    /// Wait for the process to exit and return its exit status.
    ///
    /// Consumes the child handle; afterwards [`is_alive`](Session::is_alive)
    /// and another `wait` fail with [`ExpectError::ProcessExited`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptyexpect::Session;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut session = Session::spawn(["true"])?;
    /// let status = session.wait().await?;
    /// assert!(status.success());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn wait(&mut self) -> Result<ExitStatus, ExpectError> {
        self.ensure_open()?;
        let mut child = self.child.take().ok_or(ExpectError::ProcessExited)?;

        let status = tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(|e| ExpectError::IoError(std::io::Error::other(e)))??;

        debug!(?status, "process exited");
        Ok(status)
    }

    /// Default time budget for `expect` and related waits.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Change the default time budget. `None` disables it.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Line terminator appended by [`send`](Session::send).
    pub fn eol(&self) -> &str {
        &self.eol
    }

    /// Change the line terminator appended by [`send`](Session::send).
    pub fn set_eol(&mut self, eol: impl Into<String>) {
        self.eol = eol.into();
    }

    /// The installed logger, if any.
    pub fn logger(&self) -> Option<&SessionLogger> {
        self.logger.as_ref()
    }

    /// Mutable access to the installed logger, e.g. to write annotations
    /// into the transcript between expects.
    pub fn logger_mut(&mut self) -> Option<&mut SessionLogger> {
        self.logger.as_mut()
    }

    /// Install a logger, if none is installed yet.
    ///
    /// Mirroring state is tracked per logger, so a session logger is
    /// installed at most once; returns `false` (and ignores `sink`) when
    /// one is already present. Usable regardless of the closed state.
    pub fn set_logger(&mut self, sink: impl LogSink + 'static, prefix: impl Into<String>) -> bool {
        if self.logger.is_some() {
            return false;
        }
        self.logger = Some(SessionLogger::new(Box::new(sink), prefix));
        true
    }

    fn ensure_open(&self) -> Result<(), ExpectError> {
        if self.closed {
            Err(ExpectError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Drop for Session {
    /// Force-close on drop so every exit path tears the process down.
    fn drop(&mut self) {
        let _ = self.close(true);
    }
}
