//! Line parsing for tactor scripts.
//!
//! One invocation per line. Quoted words are text, unquoted numeric words
//! are numbers, and a numeric first word is a command code. `#` starts a
//! comment line.

use tactor_dispatch::Value;

/// A word with its quoting preserved.
#[derive(Debug, Clone, PartialEq)]
struct Word {
    text: String,
    quoted: bool,
}

/// Split a line on whitespace, honoring single and double quotes and
/// backslash escapes.
fn split_words(line: &str) -> Result<Vec<Word>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            match ch {
                '"' => in_double = false,
                '\\' if matches!(chars.peek(), Some('"' | '\\')) => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                _ => current.push(ch),
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    quoted = true;
                },
                '"' => {
                    in_double = true;
                    quoted = true;
                },
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                c if c.is_whitespace() => {
                    if !current.is_empty() || quoted {
                        words.push(Word {
                            text: std::mem::take(&mut current),
                            quoted,
                        });
                        quoted = false;
                    }
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single {
        return Err("unterminated single quote".to_string());
    }
    if in_double {
        return Err("unterminated double quote".to_string());
    }
    if !current.is_empty() || quoted {
        words.push(Word {
            text: current,
            quoted,
        });
    }
    Ok(words)
}

/// Parse one script line into host values. Blank and comment lines give
/// `None`.
pub fn parse_line(line: &str) -> Result<Option<Vec<Value>>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let words = split_words(trimmed)?;
    let mut values = Vec::with_capacity(words.len());
    for (i, word) in words.into_iter().enumerate() {
        values.push(to_value(word, i == 0));
    }
    Ok(Some(values))
}

fn to_value(word: Word, first: bool) -> Value {
    if word.quoted {
        return Value::Text(word.text);
    }
    if first && let Ok(code) = word.text.parse::<u8>() {
        return Value::Code(code);
    }
    match word.text.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(word.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_numbers() {
        let values = parse_line("pulse 0 1 100 0").unwrap().unwrap();
        assert_eq!(
            values,
            vec![
                Value::from("pulse"),
                Value::Number(0.0),
                Value::Number(1.0),
                Value::Number(100.0),
                Value::Number(0.0),
            ]
        );
    }

    #[test]
    fn leading_number_is_code() {
        let values = parse_line("5 0 1 100 0").unwrap().unwrap();
        assert_eq!(values[0], Value::Code(5));
        assert_eq!(values[1], Value::Number(0.0));
    }

    #[test]
    fn leading_non_byte_number_stays_number() {
        assert_eq!(parse_line("300").unwrap().unwrap(), vec![Value::Number(300.0)]);
        assert_eq!(parse_line("1.5").unwrap().unwrap(), vec![Value::Number(1.5)]);
    }

    #[test]
    fn quoted_words_are_text() {
        let values = parse_line("connect 'My Device' 1").unwrap().unwrap();
        assert_eq!(values[1], Value::from("My Device"));
        let values = parse_line(r#"connect "42" 1"#).unwrap().unwrap();
        assert_eq!(values[1], Value::from("42"));
        let values = parse_line("'5'").unwrap().unwrap();
        assert_eq!(values, vec![Value::from("5")]);
    }

    #[test]
    fn empty_quotes_give_empty_text() {
        let values = parse_line("connect '' 1").unwrap().unwrap();
        assert_eq!(values[1], Value::from(""));
    }

    #[test]
    fn escapes() {
        let values = parse_line(r#"connect "a \"b\"" 1"#).unwrap().unwrap();
        assert_eq!(values[1], Value::from(r#"a "b""#));
        let values = parse_line(r"connect a\ b 1").unwrap().unwrap();
        assert_eq!(values[1], Value::from("a b"));
    }

    #[test]
    fn blank_and_comment_lines() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# setup").unwrap(), None);
    }

    #[test]
    fn unterminated_quote() {
        assert!(parse_line("connect 'DEV0 1").is_err());
        assert!(parse_line("connect \"DEV0 1").is_err());
    }
}
