//! Error types for ptyexpect

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while driving a session.
///
/// Most methods return `Result<T, ExpectError>`. Timeouts are ordinary
/// outcomes when scripting interactive programs, so [`ExpectError::Timeout`]
/// carries enough context (pattern, budget, buffered output) to produce a
/// useful failure message without any extra bookkeeping on the caller's side.
///
/// # Examples
///
/// ```no_run
/// use ptyexpect::{ExpectError, Pattern, Session};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = Session::builder()
///     .timeout(Duration::from_secs(5))
///     .spawn(["some-command"])?;
///
/// match session.expect(&Pattern::literal("done")?).await {
///     Ok(result) => println!("Matched: {}", result.after),
///     Err(ExpectError::Timeout { pattern, timeout, .. }) => {
///         eprintln!("{pattern} not seen within {timeout:?}");
///     }
///     Err(ExpectError::Eof) => {
///         eprintln!("Process exited unexpectedly");
///     }
///     Err(e) => return Err(e.into()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum ExpectError {
    /// Pattern not matched within the time budget.
    ///
    /// Returned by `expect`/`expect_for` when the budget runs out. The
    /// retained output is cleared at that point; `buffer` holds the snapshot
    /// taken just before clearing, so the failure message can show what the
    /// process actually printed.
    #[error("pattern {pattern} not matched within {timeout:?}")]
    Timeout {
        /// Source text of the pattern that was being waited for.
        pattern: String,
        /// Budget that was exhausted.
        timeout: Duration,
        /// Output that had accumulated when the budget ran out.
        buffer: String,
    },

    /// No output arrived within the time budget.
    ///
    /// Returned by `read` when the queue stays empty for the whole wait.
    /// `try_read` converts this case into an empty string instead.
    #[error("no output within {timeout:?}")]
    ReadTimeout {
        /// Budget that was exhausted.
        timeout: Duration,
    },

    /// The process closed its output stream.
    ///
    /// Returned when end-of-stream was reached before the requested output
    /// arrived. Usually means the process exited.
    #[error("end of stream reached")]
    Eof,

    /// The session has been closed.
    ///
    /// Returned when I/O is attempted after `close` (or after the session
    /// began tearing down). Closing is one-way; a new session must be
    /// spawned to continue.
    #[error("session is closed")]
    Closed,

    /// Invalid pattern.
    ///
    /// Returned when `Pattern::regex()` is given invalid regex syntax.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// I/O error.
    ///
    /// Returned when an underlying I/O operation fails (reading from the
    /// pty, writing to the pty), including failures forwarded from the
    /// background reader.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// PTY error.
    ///
    /// Returned when pty allocation or manipulation fails.
    #[error("PTY error: {0}")]
    PtyError(String),

    /// Process spawning error.
    ///
    /// Returned when the command cannot be spawned (empty argv, command not
    /// found, permission denied).
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// Process already waited on.
    ///
    /// Returned when a process operation needs the child handle after
    /// `Session::wait()` consumed it.
    #[error("process has already exited")]
    ProcessExited,
}
