//! Line classification for test documents.
//!
//! Blank lines and `#` comments are dropped here; every remaining line
//! becomes a [`Line`] with its indentation and one of three shapes.

use super::ParseError;

/// A decoded scalar value
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar {
    /// Written inside single or double quotes
    Quoted(String),
    /// Written bare, comment stripped
    Bare(String),
}

impl Scalar {
    pub(crate) fn into_text(self) -> String {
        match self {
            Self::Quoted(s) | Self::Bare(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LineKind {
    /// `key:` opening a nested block
    Header { key: String },
    /// `key: value`
    Entry { key: String, value: Scalar },
    /// `- key: value`
    Item { key: String, value: Option<Scalar> },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Line {
    /// 1-based line number
    pub number: usize,
    /// Leading spaces
    pub indent: usize,
    pub kind: LineKind,
}

pub(crate) fn lex(text: &str) -> Result<Vec<Line>, ParseError> {
    let mut lines = Vec::new();
    for (index, raw) in text.split('\n').enumerate() {
        let number = index + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let content = raw.trim_start_matches(' ');
        let indent = raw.len() - content.len();

        let visible = content.trim_start();
        if visible.is_empty() || visible.starts_with('#') {
            continue;
        }
        if content.starts_with('\t') {
            return Err(malformed(number, "tabs are not allowed in indentation"));
        }

        let kind = if let Some(rest) = list_item(content) {
            let (key, value) = key_value(rest, number)?;
            LineKind::Item { key, value }
        } else {
            match key_value(content, number)? {
                (key, Some(value)) => LineKind::Entry { key, value },
                (key, None) => LineKind::Header { key },
            }
        };
        lines.push(Line {
            number,
            indent,
            kind,
        });
    }
    Ok(lines)
}

fn list_item(content: &str) -> Option<&str> {
    if content == "-" {
        return Some("");
    }
    content
        .strip_prefix("- ")
        .map(|rest| rest.trim_start_matches(' '))
}

fn key_value(content: &str, line: usize) -> Result<(String, Option<Scalar>), ParseError> {
    let Some((key, rest)) = content.split_once(':') else {
        return Err(malformed(line, "expected 'key: value'"));
    };
    let key = key.trim_end();
    if !is_key(key) {
        return Err(malformed(
            line,
            &format!("'{}' is not a valid key (letters, digits and '_' only)", key),
        ));
    }
    let value = scalar(rest, key, line)?;
    Ok((key.to_string(), value))
}

pub(crate) fn is_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Decode the text after `key:`. `None` when nothing but a comment follows.
fn scalar(raw: &str, key: &str, line: usize) -> Result<Option<Scalar>, ParseError> {
    let raw = raw.trim_start();
    if raw.is_empty() || raw.starts_with('#') {
        return Ok(None);
    }

    let (value, rest) = match raw.as_bytes()[0] {
        b'"' => double_quoted(&raw[1..], line)?,
        b'\'' => single_quoted(&raw[1..], line)?,
        b'[' | b'{' | b'|' | b'>' => {
            return Err(ParseError::UnsupportedNesting {
                line,
                key: key.to_string(),
            });
        }
        _ => return Ok(Some(Scalar::Bare(strip_comment(raw).to_string()))),
    };

    let rest = rest.trim_start();
    if !rest.is_empty() && !rest.starts_with('#') {
        return Err(malformed(line, "unexpected text after closing quote"));
    }
    Ok(Some(Scalar::Quoted(value)))
}

/// A `#` only starts a comment when preceded by whitespace
fn strip_comment(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    let cut = (1..bytes.len())
        .find(|&i| bytes[i] == b'#' && (bytes[i - 1] == b' ' || bytes[i - 1] == b'\t'))
        .unwrap_or(bytes.len());
    raw[..cut].trim_end()
}

/// Returns the unescaped contents and the text after the closing quote
fn double_quoted(body: &str, line: usize) -> Result<(String, &str), ParseError> {
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((out, &body[i + 1..])),
            '\\' => {
                let Some((_, esc)) = chars.next() else {
                    return Err(ParseError::UnterminatedString { line });
                };
                match esc {
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    '/' => out.push('/'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    '0' => out.push('\0'),
                    'x' => out.push(hex_escape(&mut chars, 2, 'x', line)?),
                    'u' => out.push(hex_escape(&mut chars, 4, 'u', line)?),
                    'U' => out.push(hex_escape(&mut chars, 8, 'U', line)?),
                    other => {
                        return Err(ParseError::InvalidEscape {
                            line,
                            escape: other.to_string(),
                        });
                    }
                }
            }
            _ => out.push(c),
        }
    }
    Err(ParseError::UnterminatedString { line })
}

fn hex_escape(
    chars: &mut std::str::CharIndices<'_>,
    digits: usize,
    prefix: char,
    line: usize,
) -> Result<char, ParseError> {
    let hex: String = chars.by_ref().take(digits).map(|(_, c)| c).collect();
    let invalid = || ParseError::InvalidEscape {
        line,
        escape: format!("{}{}", prefix, hex),
    };
    if hex.len() != digits || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(invalid)
}

/// `''` inside single quotes is a literal quote
fn single_quoted(body: &str, line: usize) -> Result<(String, &str), ParseError> {
    let mut out = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                out.push('\'');
                continue;
            }
            return Ok((out, &body[i + 1..]));
        }
        out.push(c);
    }
    Err(ParseError::UnterminatedString { line })
}

fn malformed(line: usize, reason: &str) -> ParseError {
    ParseError::MalformedLine {
        line,
        reason: reason.to_string(),
    }
}
