pub mod utf8;

pub use utf8::{Utf8Decoder, read_utf8};
