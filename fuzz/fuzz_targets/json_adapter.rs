#![no_main]

use formats::{Format, JsonTreeBuilder};
use html::{Element, TreeBuilder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let _ = JsonTreeBuilder::parse_root(text);

    let context = Element::new("value");
    let mut builder = JsonTreeBuilder::new();
    // with a context element every well-formed document converts
    assert!(builder.parse_fragment(text, Some(&context), "").is_ok());

    let wrapped = format!("<json>{text}</json>");
    let _ = formats::parse(Format::Json, &wrapped, "");
});
