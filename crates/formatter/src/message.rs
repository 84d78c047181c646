//! Message template rendering (`"User {UserId} signed in"`)
//!
//! Message templates are event data, not configuration: anything that does
//! not parse as a hole is emitted as text.

use serde_json::Value;
use std::collections::BTreeMap;

use contracts::FormatProvider;

use crate::template::ValueStyle;

enum Piece<'a> {
    Text(&'a str),
    Char(char),
    Hole { name: &'a str, raw: &'a str },
}

/// Split a message template into text and holes
fn pieces(template: &str) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let mut rest = template;

    while !rest.is_empty() {
        let Some(idx) = rest.find(['{', '}']) else {
            out.push(Piece::Text(rest));
            break;
        };
        if idx > 0 {
            out.push(Piece::Text(&rest[..idx]));
        }
        let tail = &rest[idx..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push(Piece::Char(if tail.starts_with('{') { '{' } else { '}' }));
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push(Piece::Text("}"));
            rest = &tail[1..];
            continue;
        }

        match tail.find('}') {
            Some(end) => {
                let raw = &tail[..=end];
                match hole_name(&tail[1..end]) {
                    Some(name) => out.push(Piece::Hole { name, raw }),
                    None => out.push(Piece::Text(raw)),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push(Piece::Text(tail));
                break;
            }
        }
    }

    out
}

/// `@Name,5:fmt` -> `Name`
fn hole_name(body: &str) -> Option<&str> {
    let body = body.strip_prefix(['@', '$']).unwrap_or(body);
    let end = body.find([',', ':']).unwrap_or(body.len());
    let name = body[..end].trim();
    let valid = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then_some(name)
}

/// Property names referenced by holes in `template`
pub(crate) fn referenced_names(template: &str) -> Vec<&str> {
    pieces(template)
        .into_iter()
        .filter_map(|p| match p {
            Piece::Hole { name, .. } => Some(name),
            _ => None,
        })
        .collect()
}

/// Render `template`, filling holes from `properties`; unknown holes stay verbatim
pub(crate) fn render_message(
    template: &str,
    properties: &BTreeMap<String, Value>,
    style: ValueStyle,
    provider: &FormatProvider,
    out: &mut String,
) {
    for piece in pieces(template) {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Char(c) => out.push(c),
            Piece::Hole { name, raw } => match properties.get(name) {
                Some(value) => render_value(value, style, provider, out),
                None => out.push_str(raw),
            },
        }
    }
}

/// Render one property value
pub(crate) fn render_value(
    value: &Value,
    style: ValueStyle,
    provider: &FormatProvider,
    out: &mut String,
) {
    match value {
        Value::String(s) if style.literal => out.push_str(s),
        Value::Number(n) if n.is_f64() => {
            let text = n.to_string();
            if provider.decimal_separator == '.' {
                out.push_str(&text);
            } else {
                out.extend(text.chars().map(|c| {
                    if c == '.' {
                        provider.decimal_separator
                    } else {
                        c
                    }
                }));
            }
        }
        // Strings (quoted), structures and scalars render as JSON
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props() -> BTreeMap<String, Value> {
        let mut p = BTreeMap::new();
        p.insert("User".to_string(), json!("alice"));
        p.insert("Load".to_string(), json!(0.75));
        p.insert("Tags".to_string(), json!(["a", "b"]));
        p
    }

    fn render(template: &str, literal: bool, provider: &FormatProvider) -> String {
        let mut out = String::new();
        render_message(template, &props(), ValueStyle { literal }, provider, &mut out);
        out
    }

    #[test]
    fn test_literal_strings() {
        let p = FormatProvider::invariant();
        assert_eq!(render("hi {User}", true, &p), "hi alice");
        assert_eq!(render("hi {User}", false, &p), "hi \"alice\"");
    }

    #[test]
    fn test_structures_render_as_json() {
        let p = FormatProvider::invariant();
        assert_eq!(render("{@Tags}", true, &p), "[\"a\",\"b\"]");
    }

    #[test]
    fn test_decimal_separator() {
        let p = FormatProvider {
            decimal_separator: ',',
            utc_offset_minutes: None,
        };
        assert_eq!(render("load={Load}", true, &p), "load=0,75");
    }

    #[test]
    fn test_missing_and_malformed_holes_stay_verbatim() {
        let p = FormatProvider::invariant();
        assert_eq!(render("{Nope} {not valid} {{x}} {User", true, &p), "{Nope} {not valid} {x} {User");
    }

    #[test]
    fn test_referenced_names() {
        assert_eq!(referenced_names("{@User} did {Action:l} {{Esc}}"), vec!["User", "Action"]);
    }
}
