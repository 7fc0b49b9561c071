//! Deterministic document rendering.

use crate::model::{ParamValue, Step, TestDefinition};
use crate::settings::{DocumentMeta, GlobalSettings};

pub(crate) fn render(
    definition: &TestDefinition,
    meta: &DocumentMeta,
    settings: &GlobalSettings,
) -> String {
    let mut out = String::new();

    out.push_str("test_info:\n");
    push_entry(&mut out, 2, "name", &quote(&definition.name));
    push_entry(&mut out, 2, "description", &quote(&definition.description));
    push_entry(&mut out, 2, "author", &quote(&meta.author));
    push_entry(&mut out, 2, "version", &quote(&meta.version));
    out.push('\n');

    out.push_str("global_settings:\n");
    push_entry(&mut out, 2, "sample_rate_hz", &number(settings.sample_rate_hz));
    push_entry(&mut out, 2, "max_test_time_s", &number(settings.max_test_time_s));
    out.push('\n');

    out.push_str("sequence:\n");
    let blocks: Vec<String> = definition.steps.iter().map(step_block).collect();
    out.push_str(&blocks.join("\n"));
    out
}

/// One list entry, each line newline-terminated. Blocks are separated by an
/// empty line when joined.
fn step_block(step: &Step) -> String {
    let mut block = String::new();
    push_entry(&mut block, 2, "- step", &step.kind.to_string());
    if !step.description.is_empty() {
        push_entry(&mut block, 4, "description", &quote(&step.description));
    }
    for (key, value) in &step.params {
        push_entry(&mut block, 4, key, &param(value));
    }
    block
}

fn push_entry(out: &mut String, indent: usize, key: &str, value: &str) {
    out.push_str(&" ".repeat(indent));
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

fn param(value: &ParamValue) -> String {
    match value {
        ParamValue::Number(n) => number(*n),
        ParamValue::String(s) => quote(s),
        ParamValue::Boolean(b) => b.to_string(),
    }
}

/// Shortest text that parses back to the same `f64`
pub(crate) fn number(n: f64) -> String {
    if n.is_nan() {
        ".nan".to_string()
    } else if n == f64::INFINITY {
        ".inf".to_string()
    } else if n == f64::NEG_INFINITY {
        "-.inf".to_string()
    } else {
        n.to_string()
    }
}

/// YAML double-quoted string
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
