//! ptyexpect: scripted interaction with terminal programs
//!
//! ptyexpect drives an interactive child process through a pseudo-terminal,
//! in the style of the Unix `expect` utility: send input, then block with a
//! time budget until the output matches a pattern. It is built for scripting
//! interactive command-line sessions in tests, where a synchronous-feeling
//! send/expect flow keeps scenarios readable.
//!
//! # Features
//!
//! - **Send/expect scripting**: regex patterns over retained output, with
//!   before/after/captures on every match
//! - **Background reader**: a blocking task keeps draining the pty so the
//!   child never stalls on a full terminal buffer
//! - **Precise budgets**: waits are sliced internally, so timeouts stay
//!   accurate even while output trickles in
//! - **Probing**: `try_expect` peeks for a pattern without consuming output
//!   or logging anything on a miss
//! - **Transcripts**: optional per-session logger mirrors everything the
//!   process printed, each line prefixed
//! - **Clean teardown**: closing (or dropping) a session signals the child's
//!   whole process group
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ptyexpect::{Pattern, Session};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::builder()
//!         .timeout(Duration::from_secs(10))
//!         .eol("\r")
//!         .spawn(["bash", "--noediting"])?;
//!
//!     let prompt = Pattern::regex(r"[#\$] ")?;
//!     session.expect(&prompt).await?;
//!
//!     session.send("echo hello").await?;
//!     let result = session.expect(&prompt).await?;
//!     println!("output: {}", result.before);
//!
//!     session.close(true)?;
//!     Ok(())
//! }
//! ```
//!
//! # Probing
//!
//! A probe looks for a pattern but commits to nothing on a miss: the
//! retained output stays put and nothing reaches the transcript. Useful for
//! "did it also print X?" checks with a tiny budget:
//!
//! ```rust,no_run
//! use ptyexpect::{Pattern, Session};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let mut session = Session::spawn(["bash"])?;
//! let warning = Pattern::literal("WARNING")?;
//! let seen = session
//!     .try_expect(&warning, Some(Duration::from_millis(100)))
//!     .await?;
//! if seen.is_none() {
//!     println!("no warning, continuing");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Transcripts
//!
//! Install a logger to mirror the session into any [`std::io::Write`]; each
//! output line is prefixed so transcripts nest under the test that produced
//! them. Matched output is mirrored exactly once, as it is consumed:
//!
//! ```rust,no_run
//! use ptyexpect::{Session, WriterSink};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::builder()
//!     .logger(WriterSink::new(std::io::stderr()), "    ")
//!     .spawn(["bash", "--noediting"])?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod buffer;
mod decode;
mod logger;
mod pattern;
mod reader;
mod result;
mod session;

// Public API exports
pub use logger::{LogSink, SessionLogger, WriterSink};
pub use pattern::Pattern;
pub use result::{ExpectError, MatchResult};
pub use session::{spawn, Session, SessionBuilder};

// Re-export commonly used types
pub use portable_pty::ExitStatus;
