//! Result types for expect operations

mod error;

pub use error::ExpectError;

/// Result of a successful pattern match.
///
/// Splits the session's retained output around the match: everything before
/// the match, the matched text itself, and any regex capture groups. The
/// output after the match stays in the session and is available to the next
/// `expect`.
///
/// # Examples
///
/// ```no_run
/// use ptyexpect::{Pattern, Session};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let mut session = Session::spawn(["bash"])?;
/// let prompt = Pattern::regex(r"[#\$] ")?;
///
/// session.send("uname -s").await?;
/// let result = session.expect(&prompt).await?;
///
/// // result.before holds the command echo and its output,
/// // result.after holds the prompt that matched.
/// println!("{}", result.before);
/// # Ok(())
/// # }
/// ```
///
/// # Regex captures
///
/// For regex patterns with capture groups, `captures[0]` is the full match
/// and `captures[1..]` are the groups (empty string for a group that did not
/// participate):
///
/// ```no_run
/// use ptyexpect::{Pattern, Session};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let mut session = Session::spawn(["bash"])?;
/// let pattern = Pattern::regex(r"(\w+)@(\w+)")?;
/// let result = session.expect(&pattern).await?;
///
/// println!("user: {}", result.captures[1]);
/// println!("host: {}", result.captures[2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Output that preceded the match.
    ///
    /// Often the most useful part: after sending a command and expecting the
    /// next prompt, `before` holds the command's output.
    pub before: String,

    /// The matched text.
    pub after: String,

    /// Captured groups.
    ///
    /// Index 0 is the full match, indexes 1+ are the capture groups. A group
    /// that did not participate in the match yields an empty string.
    pub captures: Vec<String>,
}
