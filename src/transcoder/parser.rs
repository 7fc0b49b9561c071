//! Recursive-descent parser over lexed lines.
//!
//! ```text
//! document := section*
//! section  := "test_info:" mapping
//!           | "global_settings:" mapping
//!           | "sequence:" step*
//!           | <other>: <skipped block>
//! mapping  := (key ": " scalar)*           one indent level deeper
//! step     := "- step: " kind entry*        entries deeper than the dash
//! ```
//!
//! Blank lines carry no structure: a step's entries continue until a line
//! at or left of its dash, so a blank line inside a step does not end it.

use std::str::FromStr;

use tracing::debug;

use super::lexer::{Line, LineKind, Scalar};
use super::{infer_value, Document, ParseError};
use crate::catalog::StepKind;
use crate::model::{ParamValue, Step, TestDefinition, UNTITLED_TEST};
use crate::settings::{DocumentMeta, GlobalSettings};

/// `key: value` inside a section block
struct MapEntry {
    line: usize,
    key: String,
    value: Scalar,
}

pub(crate) struct Parser {
    lines: Vec<Line>,
    pos: usize,
}

impl Parser {
    pub(crate) fn new(lines: Vec<Line>) -> Self {
        Self { lines, pos: 0 }
    }

    fn peek(&self) -> Option<&Line> {
        self.lines.get(self.pos)
    }

    pub(crate) fn document(mut self) -> Result<Document, ParseError> {
        let mut name = None;
        let mut description = None;
        let mut meta = DocumentMeta::default();
        let mut settings = GlobalSettings::default();
        let mut steps: Option<Vec<Step>> = None;
        let mut info_seen = false;
        let mut settings_seen = false;

        while let Some(line) = self.peek() {
            if line.indent != 0 {
                return Err(ParseError::UnexpectedIndent { line: line.number });
            }
            let line = line.clone();
            self.pos += 1;

            match line.kind {
                LineKind::Header { key } => match key.as_str() {
                    "test_info" => {
                        check_duplicate(&mut info_seen, line.number, &key)?;
                        for entry in self.mapping()? {
                            let text = entry.value.into_text();
                            match entry.key.as_str() {
                                "name" => name = Some(text),
                                "description" => description = Some(text),
                                "author" => meta.author = text,
                                "version" => meta.version = text,
                                other => debug!(key = other, "ignoring test_info entry"),
                            }
                        }
                    }
                    "global_settings" => {
                        check_duplicate(&mut settings_seen, line.number, &key)?;
                        for entry in self.mapping()? {
                            match entry.key.as_str() {
                                "sample_rate_hz" => settings.sample_rate_hz = setting(entry)?,
                                "max_test_time_s" => settings.max_test_time_s = setting(entry)?,
                                other => debug!(key = other, "ignoring global setting"),
                            }
                        }
                    }
                    "sequence" => {
                        if steps.is_some() {
                            return Err(ParseError::DuplicateSection {
                                line: line.number,
                                name: key.clone(),
                            });
                        }
                        steps = Some(self.sequence()?);
                    }
                    other => {
                        debug!(section = other, "skipping unknown section");
                        self.skip_block();
                    }
                },
                LineKind::Entry { key, .. } => {
                    debug!(key = %key, "ignoring top-level entry");
                }
                LineKind::Item { .. } => {
                    return Err(ParseError::MalformedLine {
                        line: line.number,
                        reason: "list item outside of 'sequence'".to_string(),
                    });
                }
            }
        }

        let steps = steps.ok_or(ParseError::MissingSequence)?;
        Ok(Document {
            definition: TestDefinition {
                name: name.unwrap_or_else(|| UNTITLED_TEST.to_string()),
                description: description.unwrap_or_default(),
                steps,
            },
            meta,
            settings,
        })
    }

    /// Flat `key: value` block one level below a section header
    fn mapping(&mut self) -> Result<Vec<MapEntry>, ParseError> {
        let mut entries: Vec<MapEntry> = Vec::new();
        let Some(indent) = self.peek().map(|l| l.indent).filter(|&i| i > 0) else {
            return Ok(entries);
        };

        while let Some(line) = self.peek() {
            if line.indent == 0 {
                break;
            }
            if line.indent != indent {
                return Err(ParseError::UnexpectedIndent { line: line.number });
            }
            let line = line.clone();
            self.pos += 1;

            match line.kind {
                LineKind::Entry { key, value } => {
                    if entries.iter().any(|e| e.key == key) {
                        return Err(ParseError::DuplicateKey {
                            line: line.number,
                            key,
                        });
                    }
                    entries.push(MapEntry {
                        line: line.number,
                        key,
                        value,
                    });
                }
                LineKind::Header { key } => {
                    return Err(ParseError::UnsupportedNesting {
                        line: line.number,
                        key,
                    });
                }
                LineKind::Item { .. } => {
                    return Err(ParseError::MalformedLine {
                        line: line.number,
                        reason: "unexpected list item".to_string(),
                    });
                }
            }
        }
        Ok(entries)
    }

    fn skip_block(&mut self) {
        while self.peek().is_some_and(|l| l.indent > 0) {
            self.pos += 1;
        }
    }

    /// List items under `sequence:`. Items may sit at column 0 (compact
    /// YAML style) or be indented; all items share the first one's column.
    fn sequence(&mut self) -> Result<Vec<Step>, ParseError> {
        let mut steps = Vec::new();
        let item_indent = match self.peek() {
            Some(Line {
                indent,
                kind: LineKind::Item { .. },
                ..
            }) => *indent,
            Some(line) if line.indent > 0 => {
                return Err(expected_step(line.number));
            }
            _ => return Ok(steps),
        };

        while let Some(line) = self.peek() {
            let is_item = matches!(line.kind, LineKind::Item { .. });
            if line.indent == 0 && !(item_indent == 0 && is_item) {
                break;
            }
            if line.indent != item_indent {
                return Err(ParseError::UnexpectedIndent { line: line.number });
            }
            let line = line.clone();
            self.pos += 1;

            let LineKind::Item { key, value } = line.kind else {
                return Err(expected_step(line.number));
            };
            steps.push(self.step(line.number, item_indent, key, value)?);
        }
        Ok(steps)
    }

    fn step(
        &mut self,
        number: usize,
        item_indent: usize,
        key: String,
        value: Option<Scalar>,
    ) -> Result<Step, ParseError> {
        if key != "step" {
            return Err(expected_step(number));
        }
        let raw_kind = value.ok_or_else(|| ParseError::MalformedLine {
            line: number,
            reason: "step kind is missing".to_string(),
        })?;
        let raw_kind = raw_kind.into_text();
        let kind = StepKind::from_str(raw_kind.trim()).map_err(|_| ParseError::UnknownStepKind {
            line: number,
            kind: raw_kind.clone(),
        })?;

        let mut step = Step::new(kind);
        let mut has_description = false;
        let mut body_indent = None;

        while let Some(line) = self.peek() {
            if line.indent <= item_indent {
                break;
            }
            let expected = *body_indent.get_or_insert(line.indent);
            if line.indent != expected {
                return Err(ParseError::UnexpectedIndent { line: line.number });
            }
            let line = line.clone();
            self.pos += 1;

            match line.kind {
                LineKind::Entry { key, value } => {
                    let duplicate = if key == "description" {
                        has_description
                    } else {
                        key == "step" || step.params.contains_key(&key)
                    };
                    if duplicate {
                        return Err(ParseError::DuplicateKey {
                            line: line.number,
                            key,
                        });
                    }
                    if key == "description" {
                        step.description = value.into_text();
                        has_description = true;
                    } else {
                        step.params.insert(key, param_value(value));
                    }
                }
                LineKind::Header { key } | LineKind::Item { key, .. } => {
                    return Err(ParseError::UnsupportedNesting {
                        line: line.number,
                        key,
                    });
                }
            }
        }
        Ok(step)
    }
}

fn check_duplicate(seen: &mut bool, line: usize, name: &str) -> Result<(), ParseError> {
    if *seen {
        return Err(ParseError::DuplicateSection {
            line,
            name: name.to_string(),
        });
    }
    *seen = true;
    Ok(())
}

fn expected_step(line: usize) -> ParseError {
    ParseError::MalformedLine {
        line,
        reason: "expected '- step: <kind>'".to_string(),
    }
}

fn setting(entry: MapEntry) -> Result<f64, ParseError> {
    match entry.value {
        Scalar::Bare(raw) => parse_number(&raw).ok_or(ParseError::InvalidSetting {
            line: entry.line,
            key: entry.key,
            value: raw,
        }),
        Scalar::Quoted(raw) => Err(ParseError::InvalidSetting {
            line: entry.line,
            key: entry.key,
            value: raw,
        }),
    }
}

/// Quoted values are always strings; bare values go through [`infer_value`].
fn param_value(value: Scalar) -> ParamValue {
    match value {
        Scalar::Quoted(s) => ParamValue::String(s),
        Scalar::Bare(s) => infer_value(&s),
    }
}

/// Decimal literal with optional sign, fraction and exponent, or one of the
/// YAML special floats (`.nan`, `.inf`, `-.inf`).
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    match raw {
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (unsigned, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int.len() + frac.len() == 0 || !all_digits(int) || !all_digits(frac) {
        return None;
    }
    if let Some(exp) = exponent {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if exp.is_empty() || !all_digits(exp) {
            return None;
        }
    }
    raw.parse().ok()
}
