//! Splitting the argument text into raw argument strings

use crate::error::{LscError, LscResult};

/// Split `text` into raw arguments.
///
/// Arguments are separated by whitespace unless wrapped in matching `"` or
/// `'`. A backslash escapes the next character inside and outside quotes.
/// `#` outside quotes starts a comment that runs to the end of the line.
pub fn tokenize(text: &str) -> LscResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let Some(&first) = chars.peek() else {
            break;
        };

        match first {
            '#' => break,
            '"' | '\'' => {
                chars.next();
                let mut token = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == '\\' {
                        match chars.next() {
                            Some(escaped) => token.push(escaped),
                            None => break,
                        }
                    } else if c == first {
                        closed = true;
                        break;
                    } else {
                        token.push(c);
                    }
                }
                if !closed {
                    return Err(LscError::Parse("missing closing delimiter".to_string()));
                }
                tokens.push(token);
            }
            _ => {
                let mut token = String::new();
                while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '#') {
                    if c == '\\' {
                        token.push(chars.next().unwrap_or('\\'));
                    } else {
                        token.push(c);
                    }
                }
                tokens.push(token);
            }
        }
    }

    Ok(tokens)
}
