//! Buffer management for retained process output

/// Retained decoded output plus the logger mirror cursor.
///
/// Output accumulates here between matches. The `mirrored` cursor tracks how
/// much of the buffer has already been written to the session logger, so
/// each byte of output is mirrored exactly once no matter how many expect
/// rounds observe it. Consuming a matched prefix resets the cursor: whatever
/// remains in the buffer has, from the logger's point of view, not been seen
/// yet.
#[derive(Debug, Default)]
pub(crate) struct OutputBuffer {
    text: String,
    /// Byte offset into `text` already mirrored. Never exceeds `text.len()`.
    mirrored: usize,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded output.
    pub fn push(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[cfg(test)]
    pub fn mirrored(&self) -> usize {
        self.mirrored
    }

    /// Slice not yet mirrored to the logger.
    pub fn unmirrored(&self) -> &str {
        &self.text[self.mirrored..]
    }

    /// Unmirrored slice up to `end`.
    ///
    /// A match can sit entirely inside the already-mirrored region (the
    /// cursor advances to the end of the buffer on every miss); the slice is
    /// empty in that case rather than reversed.
    pub fn unmirrored_to(&self, end: usize) -> &str {
        &self.text[self.mirrored.min(end)..end]
    }

    /// Mark everything currently buffered as mirrored.
    pub fn mark_all_mirrored(&mut self) {
        self.mirrored = self.text.len();
    }

    /// Consume the buffer through a match at `start..end`.
    ///
    /// Returns the text before the match and the matched text; the suffix
    /// after `end` stays buffered and the mirror cursor resets to zero.
    pub fn consume_match(&mut self, start: usize, end: usize) -> (String, String) {
        let before = self.text[..start].to_string();
        let after = self.text[start..end].to_string();
        self.text.drain(..end);
        self.mirrored = 0;
        (before, after)
    }

    /// Take the entire buffer, leaving it empty with the cursor reset.
    pub fn take_all(&mut self) -> String {
        self.mirrored = 0;
        std::mem::take(&mut self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer() {
        let buffer = OutputBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.mirrored(), 0);
    }

    #[test]
    fn test_push() {
        let mut buffer = OutputBuffer::new();
        buffer.push("Hello ");
        buffer.push("World");
        assert_eq!(buffer.as_str(), "Hello World");
    }

    #[test]
    fn test_unmirrored_tracking() {
        let mut buffer = OutputBuffer::new();
        buffer.push("Hello World");

        assert_eq!(buffer.unmirrored(), "Hello World");
        buffer.mark_all_mirrored();
        assert_eq!(buffer.unmirrored(), "");

        buffer.push("!!");
        assert_eq!(buffer.unmirrored(), "!!");
    }

    #[test]
    fn test_unmirrored_to() {
        let mut buffer = OutputBuffer::new();
        buffer.push("Hello World");

        assert_eq!(buffer.unmirrored_to(5), "Hello");
        buffer.mark_all_mirrored();
        assert_eq!(buffer.unmirrored_to(5), "");
    }

    #[test]
    fn test_unmirrored_to_inside_mirrored_region() {
        let mut buffer = OutputBuffer::new();
        buffer.push("abcdef");
        buffer.mark_all_mirrored();
        buffer.push("gh");

        // Match ends before the cursor; nothing new to mirror.
        assert_eq!(buffer.unmirrored_to(4), "");
    }

    #[test]
    fn test_consume_match() {
        let mut buffer = OutputBuffer::new();
        buffer.push("out foo prompt rest");
        buffer.mark_all_mirrored();

        let (before, after) = buffer.consume_match(8, 14);
        assert_eq!(before, "out foo ");
        assert_eq!(after, "prompt");
        assert_eq!(buffer.as_str(), " rest");
        assert_eq!(buffer.mirrored(), 0);
    }

    #[test]
    fn test_consume_match_at_start() {
        let mut buffer = OutputBuffer::new();
        buffer.push("prompt rest");

        let (before, after) = buffer.consume_match(0, 6);
        assert_eq!(before, "");
        assert_eq!(after, "prompt");
        assert_eq!(buffer.as_str(), " rest");
    }

    #[test]
    fn test_take_all() {
        let mut buffer = OutputBuffer::new();
        buffer.push("leftover");
        buffer.mark_all_mirrored();

        let taken = buffer.take_all();
        assert_eq!(taken, "leftover");
        assert!(buffer.is_empty());
        assert_eq!(buffer.mirrored(), 0);
        assert_eq!(buffer.unmirrored(), "");
    }

    #[test]
    fn test_utf8_match_boundaries() {
        let mut buffer = OutputBuffer::new();
        buffer.push("Gãńdåłf_Thê_Gręât\r\n");

        let start = buffer.as_str().find("Thê").unwrap();
        let (before, after) = buffer.consume_match(start, start + "Thê".len());
        assert_eq!(before, "Gãńdåłf_");
        assert_eq!(after, "Thê");
        assert_eq!(buffer.as_str(), "_Gręât\r\n");
    }
}
