//! Inline-style handling.
//!
//! The engine does not run a CSS cascade: element styling that matters to
//! email clients must be inline anyway, and full stylesheet inlining is
//! delegated to the conversion service. What the DOM keeps is each
//! element's `style` attribute parsed into a declaration list, plus a
//! resolver that answers "what value does this typography property take
//! here?" from inline declarations (own, then inherited from ancestors)
//! with user-agent defaults as the fallback.

use cssparser::{Delimiter, ParseError, Parser, ParserInput};

use crate::CanvasDocument;

/// A single `property: value` pair from a `style` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

/// The typography properties inlined onto an element when an edit session
/// commits, so exported markup keeps the look it had during editing.
pub const TYPOGRAPHY_PROPERTIES: [&str; 9] = [
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "color",
    "line-height",
    "letter-spacing",
    "text-align",
    "text-decoration",
];

/// Parse the contents of a `style` attribute into a declaration list.
///
/// Values are kept as raw strings; nested blocks and url() tokens are
/// respected, so a semicolon inside `url(data:image/png;base64,...)` does
/// not split the declaration. Malformed segments are skipped.
pub fn parse_declarations(css: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut declarations: Vec<Declaration> = Vec::new();

    while !parser.is_exhausted() {
        let _ = parser.parse_until_after(Delimiter::Semicolon, |p| {
            let property = p.expect_ident()?.to_string();
            p.expect_colon()?;
            p.skip_whitespace();
            let start = p.position();
            while p.next_including_whitespace().is_ok() {}
            let value = p.slice_from(start).trim().to_string();
            if !value.is_empty() {
                declarations.push(Declaration { property, value });
            }
            Ok::<(), ParseError<'_, ()>>(())
        });
    }

    declarations
}

/// Write a declaration list back into `style` attribute form.
pub fn serialize_declarations(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|decl| format!("{}: {}", decl.property, decl.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Whether a property inherits down the tree. Of the typography set only
/// text-decoration does not.
pub fn is_inherited(property: &str) -> bool {
    !matches!(property, "text-decoration")
}

/// User-agent default for a (tag, property) pair. Mirrors the CSS2
/// defaults a mail client's rendering engine would apply.
pub fn ua_default(tag: &str, property: &str) -> &'static str {
    match property {
        "font-family" => "Arial, Helvetica, sans-serif",
        "font-size" => match tag {
            "h1" => "32px",
            "h2" => "24px",
            "h3" => "18.72px",
            "h4" => "16px",
            "h5" => "13.28px",
            "h6" => "10.72px",
            "small" => "13px",
            _ => "16px",
        },
        "font-weight" => match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "b" | "strong" | "th" => "700",
            _ => "400",
        },
        "font-style" => match tag {
            "i" | "em" | "cite" | "var" => "italic",
            _ => "normal",
        },
        "color" => match tag {
            "a" => "rgb(0, 0, 238)",
            _ => "rgb(0, 0, 0)",
        },
        "line-height" => "normal",
        "letter-spacing" => "normal",
        "text-align" => match tag {
            "th" | "center" => "center",
            _ => "left",
        },
        "text-decoration" => match tag {
            "a" => "underline",
            _ => "none",
        },
        _ => "",
    }
}

/// Resolve the value a property takes on a node: its own inline
/// declaration, else the nearest ancestor's (for inherited properties),
/// else the user-agent default for the node's tag.
pub fn resolved_style(doc: &CanvasDocument, node_id: usize, property: &str) -> String {
    let Some(node) = doc.get_node(node_id) else {
        return String::new();
    };

    if let Some(el) = node.element_data() {
        if let Some(value) = el.style_property(property) {
            return value.to_string();
        }
    }

    if is_inherited(property) {
        let mut current = node.parent;
        while let Some(id) = current {
            let Some(ancestor) = doc.get_node(id) else {
                break;
            };
            if let Some(el) = ancestor.element_data() {
                if let Some(value) = el.style_property(property) {
                    return value.to_string();
                }
            }
            current = ancestor.parent;
        }
    }

    let tag = node.tag_name().map(|local| local.as_ref()).unwrap_or("");
    ua_default(tag, property).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_declarations() {
        let decls = parse_declarations("color: red; font-size: 14px");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "color");
        assert_eq!(decls[0].value, "red");
        assert_eq!(decls[1].value, "14px");
    }

    #[test]
    fn url_values_survive_embedded_semicolons() {
        let decls =
            parse_declarations("background-image: url(data:image/png;base64,iVBORw0KGgo=)");
        assert_eq!(decls.len(), 1);
        assert_eq!(
            decls[0].value,
            "url(data:image/png;base64,iVBORw0KGgo=)"
        );
    }

    #[test]
    fn malformed_segments_are_skipped() {
        let decls = parse_declarations("color: red;; not-a-decl ;font-weight: 700");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[1].property, "font-weight");
    }

    #[test]
    fn declarations_round_trip() {
        let css = "color: red; font-size: 14px";
        assert_eq!(serialize_declarations(&parse_declarations(css)), css);
    }

    #[test]
    fn heading_defaults() {
        assert_eq!(ua_default("h1", "font-size"), "32px");
        assert_eq!(ua_default("h1", "font-weight"), "700");
        assert_eq!(ua_default("p", "font-weight"), "400");
        assert_eq!(ua_default("a", "text-decoration"), "underline");
    }
}
