//! Incremental UTF-8 decoding for pty output

use bytes::BytesMut;

/// Streaming UTF-8 decoder.
///
/// Pty reads split the byte stream at arbitrary points, so a multi-byte
/// character can straddle two reads. Each [`decode`](Utf8Decoder::decode)
/// call emits the longest decodable prefix and carries an incomplete
/// trailing sequence over to the next call. Bytes that can never form a
/// valid character are emitted as `\xHH` escapes instead of being dropped,
/// keeping the output matchable and loggable.
#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
    carry: BytesMut,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next read, prepending bytes carried from the previous one.
    ///
    /// Returns the decoded text, which is empty when the input only extends
    /// a still-incomplete sequence.
    pub fn decode(&mut self, input: &[u8]) -> String {
        self.carry.extend_from_slice(input);

        let mut out = String::with_capacity(self.carry.len());
        let mut i = 0;
        // Start of an incomplete trailing sequence; everything before it is
        // consumed below.
        let mut pending = self.carry.len();

        while i < self.carry.len() {
            match std::str::from_utf8(&self.carry[i..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    if valid_up_to > 0 {
                        // from_utf8 already vetted this prefix
                        out.push_str(unsafe {
                            std::str::from_utf8_unchecked(&self.carry[i..i + valid_up_to])
                        });
                    }
                    i += valid_up_to;

                    match e.error_len() {
                        Some(error_len) => {
                            for byte in &self.carry[i..i + error_len] {
                                out.push_str(&format!("\\x{byte:02x}"));
                            }
                            i += error_len;
                        }
                        None => {
                            pending = i;
                            break;
                        }
                    }
                }
            }
        }

        let _ = self.carry.split_to(pending);
        out
    }

    /// Escape whatever is still carried.
    ///
    /// Called when the stream ends: a sequence the decoder was still waiting
    /// to complete can no longer be completed, so its bytes surface as
    /// `\xHH` escapes. Returns an empty string when nothing was carried.
    pub fn finish(&mut self) -> String {
        let mut out = String::with_capacity(self.carry.len() * 4);
        for byte in self.carry.split() {
            out.push_str(&format!("\\x{byte:02x}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ascii() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"hello world"), "hello world");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decode_multibyte_intact() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(
            decoder.decode("Gãńdåłf_Thê_Gręât".as_bytes()),
            "Gãńdåłf_Thê_Gręât"
        );
    }

    #[test]
    fn test_decode_split_sequence() {
        // "é" is 0xc3 0xa9; split between the two reads.
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"caf\xc3"), "caf");
        assert_eq!(decoder.decode(b"\xa9!"), "é!");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decode_split_four_byte_sequence() {
        let crab = "🦀".as_bytes();
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&crab[..1]), "");
        assert_eq!(decoder.decode(&crab[1..3]), "");
        assert_eq!(decoder.decode(&crab[3..]), "🦀");
    }

    #[test]
    fn test_decode_invalid_bytes_escaped() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\\xffb");
    }

    #[test]
    fn test_decode_lone_continuation_byte() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"\x80ok"), "\\x80ok");
    }

    #[test]
    fn test_decode_invalid_run() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"x\xfe\xfey"), "x\\xfe\\xfey");
    }

    #[test]
    fn test_finish_escapes_carried_bytes() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"ok\xc3"), "ok");
        assert_eq!(decoder.finish(), "\\xc3");
        // Carry is gone after finish.
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decode_empty_input() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b""), "");
    }

    #[test]
    fn test_carried_bytes_resume_across_empty_read() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"\xc3"), "");
        assert_eq!(decoder.decode(b""), "");
        assert_eq!(decoder.decode(b"\xa9"), "é");
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn decode_is_split_invariant(s in ".{0,64}", split in 0usize..256) {
            let bytes = s.as_bytes();
            let split = split % (bytes.len() + 1);

            let mut decoder = Utf8Decoder::new();
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            out.push_str(&decoder.finish());

            prop_assert_eq!(out, s);
        }

        #[test]
        fn decode_never_panics_on_byte_soup(bytes in proptest::collection::vec(any::<u8>(), 0..128), split in 0usize..256) {
            let split = split % (bytes.len() + 1);

            let mut decoder = Utf8Decoder::new();
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            out.push_str(&decoder.finish());

            // Every input byte is represented, verbatim or as a 4-char escape.
            prop_assert!(out.len() >= bytes.len());
        }
    }
}
