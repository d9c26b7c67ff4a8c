//! Rewrite `:name` / `?` markers into numbered `$n` placeholders.

use crate::binding::Marker;

/// Number the markers in `sql` for drivers that only understand `$n`.
///
/// Returns the rewritten SQL and, for each `$n`, the marker it came from
/// (`slots[n - 1]`). A named marker used twice maps to a single slot.
/// String literals, quoted identifiers, comments and `::` casts are copied
/// through unchanged.
pub(crate) fn number_markers(sql: &str) -> (String, Vec<Marker>) {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut slots: Vec<Marker> = Vec::new();
    let mut positional = 0usize;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push(c);
                for (_, d) in chars.by_ref() {
                    out.push(d);
                    if d == c {
                        break;
                    }
                }
            }
            '-' if sql[i..].starts_with("--") => {
                out.push(c);
                for (_, d) in chars.by_ref() {
                    out.push(d);
                    if d == '\n' {
                        break;
                    }
                }
            }
            ':' if chars.peek().is_some_and(|&(_, d)| d == ':') => {
                out.push_str("::");
                chars.next();
            }
            ':' if chars
                .peek()
                .is_some_and(|&(_, d)| d.is_ascii_alphabetic() || d == '_') =>
            {
                let start = i;
                let mut end = i + 1;
                while let Some(&(j, d)) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        end = j + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let marker = Marker::Named(sql[start..end].to_string());
                let slot = match slots.iter().position(|m| *m == marker) {
                    Some(existing) => existing + 1,
                    None => {
                        slots.push(marker);
                        slots.len()
                    }
                };
                out.push('$');
                out.push_str(&slot.to_string());
            }
            '?' => {
                positional += 1;
                slots.push(Marker::Positional(positional));
                out.push('$');
                out.push_str(&slots.len().to_string());
            }
            _ => out.push(c),
        }
    }

    (out, slots)
}
