//! `{placeholder}` substitution for command templates
//!
//! `{name}` is replaced by the value of `name`; `{{` and `}}` produce literal
//! braces. Only bare names are accepted inside a placeholder.

use crate::error::{Error, Result};

/// Substitute every `{name}` in `template` using `lookup`.
///
/// Fails on unknown names, unbalanced braces and non-name field syntax.
pub fn substitute<'a, F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let fail = |reason: String| Error::Substitution {
        template: template.to_string(),
        reason,
    };

    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, c)| c == '{').is_some() {
                    out.push('{');
                    continue;
                }
                let start = pos + 1;
                let end = loop {
                    match chars.next() {
                        Some((end, '}')) => break end,
                        Some((_, '{')) | None => {
                            return Err(fail(format!("unmatched '{{' at offset {pos}")));
                        }
                        Some(_) => {}
                    }
                };
                let name = &template[start..end];
                if !is_placeholder_name(name) {
                    return Err(fail(format!("invalid placeholder '{{{name}}}'")));
                }
                let value = lookup(name)
                    .ok_or_else(|| fail(format!("unknown placeholder '{{{name}}}'")))?;
                out.push_str(value);
            }
            '}' => {
                if chars.next_if(|&(_, c)| c == '}').is_none() {
                    return Err(fail(format!("single '}}' at offset {pos}")));
                }
                out.push('}');
            }
            c => out.push(c),
        }
    }

    Ok(out)
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
