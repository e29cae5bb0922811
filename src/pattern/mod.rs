//! Pattern matching for expect operations

use regex::Regex;

use crate::result::ExpectError;

/// A compiled pattern to wait for in process output.
///
/// Patterns are regular expressions; [`Pattern::literal`] escapes its input
/// first so the text matches verbatim. Compile once and reuse across calls:
/// scripting an interactive program usually means expecting the same prompt
/// pattern for the whole session.
///
/// # Examples
///
/// ```
/// use ptyexpect::Pattern;
///
/// // Shell prompt
/// let prompt = Pattern::regex(r"[#\$] ").unwrap();
///
/// // Verbatim text; `$` is not an anchor here
/// let price = Pattern::literal("$15.00").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    source: String,
}

impl Pattern {
    /// Compile a regular expression pattern.
    ///
    /// Supports full regex syntax including capture groups; the groups end
    /// up in [`MatchResult::captures`](crate::MatchResult::captures).
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Pattern`] if the regex is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use ptyexpect::Pattern;
    ///
    /// let digits = Pattern::regex(r"\d+").unwrap();
    /// let login = Pattern::regex(r"(?i)login: ").unwrap();
    /// ```
    pub fn regex(pattern: &str) -> Result<Self, ExpectError> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            source: pattern.to_string(),
        })
    }

    /// Compile a pattern that matches `text` verbatim.
    ///
    /// Regex metacharacters in `text` are escaped before compilation, so
    /// this cannot fail for any ordinary string and never interprets the
    /// input.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Pattern`] if the escaped text still fails to
    /// compile (practically unreachable).
    pub fn literal(text: &str) -> Result<Self, ExpectError> {
        Ok(Self {
            regex: Regex::new(&regex::escape(text))?,
            source: text.to_string(),
        })
    }

    /// Source text the pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// First match in `haystack`, with byte span and capture texts.
    pub(crate) fn find(&self, haystack: &str) -> Option<PatternMatch> {
        let caps = self.regex.captures(haystack)?;
        let whole = caps.get(0)?;
        Some(PatternMatch {
            start: whole.start(),
            end: whole.end(),
            captures: caps
                .iter()
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect(),
        })
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Byte span and capture texts of a successful match.
#[derive(Debug)]
pub(crate) struct PatternMatch {
    pub start: usize,
    pub end: usize,
    pub captures: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_pattern() {
        let pattern = Pattern::regex(r"\d+").unwrap();
        let found = pattern.find("test 123 end").unwrap();

        assert_eq!(found.start, 5);
        assert_eq!(found.end, 8);
        assert_eq!(found.captures[0], "123");
    }

    #[test]
    fn test_regex_pattern_with_captures() {
        let pattern = Pattern::regex(r"(\w+)@(\w+)").unwrap();
        let found = pattern.find("mail user@host now").unwrap();

        assert_eq!(found.captures.len(), 3);
        assert_eq!(found.captures[0], "user@host");
        assert_eq!(found.captures[1], "user");
        assert_eq!(found.captures[2], "host");
    }

    #[test]
    fn test_regex_pattern_optional_group() {
        let pattern = Pattern::regex(r"(a)(b)?").unwrap();
        let found = pattern.find("a").unwrap();

        assert_eq!(found.captures[1], "a");
        assert_eq!(found.captures[2], "");
    }

    #[test]
    fn test_literal_pattern_escapes_metacharacters() {
        let pattern = Pattern::literal("[#$] ").unwrap();

        assert!(pattern.find("x").is_none());
        let found = pattern.find("before [#$] after").unwrap();
        assert_eq!(found.start, 7);
    }

    #[test]
    fn test_pattern_not_found() {
        let pattern = Pattern::regex("missing").unwrap();

        assert!(pattern.find("this text does not contain it").is_none());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let result = Pattern::regex(r"(unclosed");

        assert!(matches!(result, Err(ExpectError::Pattern(_))));
    }

    #[test]
    fn test_pattern_source_round_trip() {
        let pattern = Pattern::regex(r"[#\$] ").unwrap();

        assert_eq!(pattern.as_str(), r"[#\$] ");
        assert_eq!(pattern.to_string(), r"[#\$] ");
    }

    #[test]
    fn test_utf8_haystack() {
        let pattern = Pattern::literal("Gręât").unwrap();
        let found = pattern.find("Gãńdåłf_Thê_Gręât").unwrap();

        assert_eq!(&"Gãńdåłf_Thê_Gręât"[found.start..found.end], "Gręât");
    }
}
