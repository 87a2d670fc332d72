//! Draining byte streams into UTF-8 text.
//!
//! Network bodies and files arrive as byte chunks whose boundaries ignore
//! character boundaries. [`Utf8Decoder`] keeps the incomplete suffix of one
//! chunk until the next arrives and replaces invalid sequences with U+FFFD so
//! decoding always makes forward progress.

use std::io::{self, Read};

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    text: String,
    // incomplete UTF-8 suffix of the previous chunk, at most 3 bytes
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut bytes: &[u8]) {
        while !self.carry.is_empty() && !bytes.is_empty() {
            let expected = utf8_seq_len(self.carry[0]);
            let needed = expected.saturating_sub(self.carry.len());
            let take = needed.min(bytes.len());

            let mut head = std::mem::take(&mut self.carry);
            head.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];

            if expected != 0 && head.len() < expected {
                self.carry = head;
                return;
            }
            decode_bytes(&mut self.text, &mut self.carry, &head);
        }

        if self.carry.is_empty() && !bytes.is_empty() {
            decode_bytes(&mut self.text, &mut self.carry, bytes);
        }
    }

    /// Text decoded so far, excluding any carried partial sequence.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Flushes the carried suffix lossily so the stream is never truncated.
    pub fn finish(mut self) -> String {
        if !self.carry.is_empty() {
            self.text.push_str(&String::from_utf8_lossy(&self.carry));
        }
        self.text
    }
}

/// Reads `reader` to the end and decodes it as (lossy) UTF-8.
pub fn read_utf8<R: Read>(mut reader: R) -> io::Result<String> {
    let mut decoder = Utf8Decoder::new();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        decoder.push(&buf[..n]);
    }
    Ok(decoder.finish())
}

fn utf8_seq_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn decode_bytes(text: &mut String, carry: &mut Vec<u8>, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                text.push_str(s);
                return;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                if let Ok(valid) = std::str::from_utf8(valid) {
                    text.push_str(valid);
                }
                match e.error_len() {
                    Some(len) => {
                        text.push('\u{FFFD}');
                        bytes = &rest[len..];
                    }
                    None => {
                        carry.extend_from_slice(rest);
                        return;
                    }
                }
            }
        }
    }
}
