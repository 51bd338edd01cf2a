//! Single-line quoted-CSV tokenizer and field quoting.
//!
//! Field values (ticket lists, multi-choice results, contest names) may
//! contain commas, so data rows are never split naively. Rules:
//! - `,` separates fields outside quotes;
//! - a `"` opens a quoted run; inside it `""` is a literal quote and `,` is data;
//! - text after a closing quote up to the next `,` is kept as-is (lenient);
//! - an unterminated quote runs to end of line.
//!
//! No trimming happens here; cells keep their surrounding spaces.

/// Split one data line into fields.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    cur.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => cur.push(c),
            }
        } else {
            match c {
                ',' => fields.push(std::mem::take(&mut cur)),
                '"' => in_quotes = true,
                _ => cur.push(c),
            }
        }
    }
    fields.push(cur);
    fields
}

/// Quote a field when it would not survive line normalization + `tokenize`.
pub fn quote_field(field: &str) -> String {
    let edge = |c: char| c.is_whitespace() || c == '#';
    let needs_quotes = field.contains(|c: char| c == ',' || c == '"')
        || field.starts_with(edge)
        || field.ends_with(edge);
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Join fields into one line with `quote_field` applied to each.
pub fn join_fields<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| quote_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}
