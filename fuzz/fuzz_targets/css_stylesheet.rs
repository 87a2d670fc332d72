#![no_main]

use html::TreeBuilder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(sheet) = css::parse_stylesheet(text, Some("https://fuzz.test/a/b.css")) {
        for rule in sheet.style_rules() {
            assert!(!rule.selector_text.is_empty());
            assert!(!rule.selector_text.starts_with(char::is_whitespace));
            for declaration in &rule.declarations {
                assert!(!declaration.name.is_empty());
            }
        }
    }
    let _ = css::parse_selectors(text);

    // the adapter never fails on CSS input
    let mut builder = formats::CssTreeBuilder::new("");
    let _ = builder.parse_standalone(text);
    assert!(
        builder
            .parse_fragment(text, None, "https://fuzz.test/")
            .is_ok()
    );
});
