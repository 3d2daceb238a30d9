//! Quoted-field CSV splitter for spreadsheet exports. `\r` is dropped everywhere
//! and rows may differ in width.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InField,
    InQuotedField,
}

/// Splits CSV text into rows of raw string fields.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = State::InField;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\r' {
            continue;
        }
        match state {
            State::InQuotedField => {
                if ch == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        state = State::InField;
                    }
                } else {
                    field.push(ch);
                }
            }
            State::InField => match ch {
                '"' => state = State::InQuotedField,
                ',' => current.push(std::mem::take(&mut field)),
                '\n' => {
                    current.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut current));
                }
                other => field.push(other),
            },
        }
    }

    if !field.is_empty() || !current.is_empty() {
        current.push(field);
        rows.push(current);
    }
    rows
}
