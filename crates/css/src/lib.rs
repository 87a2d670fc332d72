pub mod syntax;

// Re-exports so other crates can just use `css::...` nicely.
pub use syntax::{
    AtRule, CssError, CssResult, Declaration, Rule, StyleRule, Stylesheet, parse_declarations,
    parse_selectors, parse_stylesheet,
};
