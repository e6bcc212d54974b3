//! `{column}` placeholder templates.
//!
//! A template such as `"{price} * {qty}"` is scanned into text and
//! placeholder segments; each placeholder becomes a column reference node and
//! never re-enters the text that gets tokenized. Braces inside quoted string
//! literals are left alone.

use tracing::debug;

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::parse::parse_segments;
use crate::types::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Expression text between placeholders.
    Text { text: &'a str, offset: usize },
    /// A `{name}` placeholder; `offset` points at the opening brace.
    Placeholder { name: &'a str, offset: usize },
}

fn malformed(position: usize, reason: impl Into<String>) -> Error {
    Error::MalformedPlaceholder {
        position,
        reason: reason.into(),
    }
}

/// Split a template into text and placeholder segments.
///
/// Placeholder names are letters, digits and underscores. Empty or unmatched
/// braces outside string literals fail with [`Error::MalformedPlaceholder`].
pub fn scan_placeholders(template: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut quote: Option<char> = None;
    let mut chars = template.char_indices();

    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '{' => {
                let body = &template[i + 1..];
                let end = body
                    .find('}')
                    .ok_or_else(|| malformed(i, "unmatched '{'"))?;
                let name = &body[..end];
                if name.is_empty() {
                    return Err(malformed(i, "empty placeholder '{}'"));
                }
                if let Some(bad) = name.chars().find(|ch| !(ch.is_alphanumeric() || *ch == '_')) {
                    return Err(malformed(
                        i,
                        format!("invalid character {bad:?} in placeholder '{{{name}}}'"),
                    ));
                }
                if text_start < i {
                    segments.push(Segment::Text {
                        text: &template[text_start..i],
                        offset: text_start,
                    });
                }
                segments.push(Segment::Placeholder { name, offset: i });
                for _ in 0..=name.chars().count() {
                    chars.next();
                }
                text_start = i + end + 2;
            }
            '}' => return Err(malformed(i, "unmatched '}'")),
            _ => {}
        }
    }

    if text_start < template.len() {
        segments.push(Segment::Text {
            text: &template[text_start..],
            offset: text_start,
        });
    }
    Ok(segments)
}

/// Compile a template into an (unbound) expression tree.
pub fn compile_template(template: &str) -> Result<Expr> {
    let segments = scan_placeholders(template)?;
    parse_segments(&segments)
}

/// Evaluate `template` over `table` and return a copy of the table with the
/// result stored under `output_name`.
///
/// An existing column of that name is replaced in place; otherwise the new
/// column is appended. The input table is not modified.
pub fn apply_template_expression(table: &Table, output_name: &str, template: &str) -> Result<Table> {
    if output_name.is_empty() {
        return Err(Error::Config("output column name must not be empty".into()));
    }
    let expr = compile_template(template)?;
    let bound = expr.bind(&table.column_names())?;
    debug!(
        output = output_name,
        columns = ?expr.columns(),
        rows = table.num_rows(),
        "applying template expression"
    );
    let column = bound.evaluate_column(table, output_name)?;
    Ok(table.clone().with_column(column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_text_and_placeholders() {
        let segs = scan_placeholders("{a} + {b_2}").unwrap();
        assert_eq!(
            segs,
            vec![
                Segment::Placeholder { name: "a", offset: 0 },
                Segment::Text { text: " + ", offset: 3 },
                Segment::Placeholder { name: "b_2", offset: 6 },
            ]
        );
    }

    #[test]
    fn braces_in_strings_are_text() {
        let segs = scan_placeholders("concat({a}, '{not a column}')").unwrap();
        let names: Vec<_> = segs
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder { name, .. } => Some(*name),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn malformed_placeholders() {
        for (template, pos) in [("{a", 0), ("{}", 0), ("1 + {a b}", 4), ("a}", 1), ("{a-b}", 0)] {
            match scan_placeholders(template) {
                Err(Error::MalformedPlaceholder { position, .. }) => assert_eq!(position, pos, "{template}"),
                other => panic!("{template}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn no_placeholders_is_one_text_segment() {
        assert_eq!(
            scan_placeholders("1 + 2").unwrap(),
            vec![Segment::Text { text: "1 + 2", offset: 0 }]
        );
        assert!(scan_placeholders("").unwrap().is_empty());
    }
}
