//! Test definition data model
//!
//! Plain serializable data: a named, described, ordered list of steps.
//! Editor-only identity (step ids, selection) lives in [`crate::editor`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{ParamType, StepKind};
use crate::error::{BenchError, Result};

/// Name used when a document carries no `name:` entry
pub const UNTITLED_TEST: &str = "Untitled Test";

/// Value of a single step parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl ParamValue {
    /// Declared type this value would satisfy
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Number(_) => ParamType::Number,
            Self::String(_) => ParamType::String,
            Self::Boolean(_) => ParamType::Boolean,
        }
    }

    /// Coerce raw user input according to a declared parameter type.
    ///
    /// This is the conversion an input field performs before handing a value
    /// to [`crate::editor::Editor::update_step_param`]; the editor itself
    /// stores whatever it is given.
    pub fn coerce(ty: ParamType, raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        match ty {
            ParamType::Number => trimmed
                .parse::<f64>()
                .map(Self::Number)
                .map_err(|_| BenchError::validation(format!("'{}' is not a number", raw))),
            ParamType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(Self::Boolean(true)),
                "false" | "no" | "off" => Ok(Self::Boolean(false)),
                _ => Err(BenchError::validation(format!(
                    "'{}' is not a boolean (expected true/false)",
                    raw
                ))),
            },
            ParamType::String => Ok(Self::String(raw.to_string())),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Parameters of a step, kept in insertion order
pub type Params = IndexMap<String, ParamValue>;

/// One instruction in a test sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepKind,
    /// Free text; empty means "no description"
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Params,
}

impl Step {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            description: String::new(),
            params: Params::new(),
        }
    }

    /// Step populated from the kind's schema: every parameter at its
    /// default and the kind's label as description.
    pub fn from_schema(kind: StepKind) -> Self {
        let params = kind
            .schema()
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default.to_value()))
            .collect();
        Self {
            kind,
            description: kind.label().to_string(),
            params,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// A named, described, ordered sequence of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub name: String,
    pub description: String,
    /// Execution order
    pub steps: Vec<Step>,
}

impl TestDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            steps,
        }
    }

    /// Report parameters that do not line up with their kind's schema.
    ///
    /// The transcoder accepts any parameter name and value; this is the
    /// place that tells the author about it.
    pub fn schema_issues(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            for (name, value) in &step.params {
                match step.kind.param(name) {
                    None => issues.push(SchemaIssue::UnknownParam {
                        step: index,
                        kind: step.kind,
                        name: name.clone(),
                    }),
                    Some(spec) if spec.ty != value.param_type() => {
                        issues.push(SchemaIssue::TypeMismatch {
                            step: index,
                            kind: step.kind,
                            name: name.clone(),
                            expected: spec.ty,
                            found: value.param_type(),
                        })
                    }
                    Some(_) => {}
                }
            }
            for spec in step.kind.schema() {
                if !step.params.contains_key(spec.name) {
                    issues.push(SchemaIssue::MissingParam {
                        step: index,
                        kind: step.kind,
                        name: spec.name.to_string(),
                    });
                }
            }
        }
        issues
    }
}

impl Default for TestDefinition {
    /// The four-step skeleton a new test starts from
    fn default() -> Self {
        Self {
            name: "New Motor Test".to_string(),
            description: "Test description".to_string(),
            steps: vec![
                Step::new(StepKind::StartMotor).with_description("Initialize motor"),
                Step::new(StepKind::SetSpeed)
                    .with_description("Set target speed")
                    .with_param("rpm", 1500.0),
                Step::new(StepKind::Wait)
                    .with_description("Wait for stabilization")
                    .with_param("duration_s", 5.0),
                Step::new(StepKind::StopMotor).with_description("Stop motor"),
            ],
        }
    }
}

/// A parameter that disagrees with its kind's schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    UnknownParam {
        step: usize,
        kind: StepKind,
        name: String,
    },
    MissingParam {
        step: usize,
        kind: StepKind,
        name: String,
    },
    TypeMismatch {
        step: usize,
        kind: StepKind,
        name: String,
        expected: ParamType,
        found: ParamType,
    },
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownParam { step, kind, name } => {
                write!(f, "step {} ({}): unknown parameter '{}'", step + 1, kind, name)
            }
            Self::MissingParam { step, kind, name } => {
                write!(f, "step {} ({}): missing parameter '{}'", step + 1, kind, name)
            }
            Self::TypeMismatch { step, kind, name, expected, found } => write!(
                f,
                "step {} ({}): parameter '{}' should be {} but is {}",
                step + 1,
                kind,
                name,
                expected,
                found
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_schema_populates_defaults() {
        let step = Step::from_schema(StepKind::Monitor);
        assert_eq!(step.description, "Monitor");
        let keys: Vec<&str> = step.params.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["duration_s", "check_temperature", "max_temp"]);
        assert_eq!(step.params["duration_s"], ParamValue::Number(10.0));
        assert_eq!(step.params["check_temperature"], ParamValue::Boolean(true));
        assert_eq!(step.params["max_temp"], ParamValue::Number(80.0));
    }

    #[test]
    fn test_from_schema_empty_kind() {
        let step = Step::from_schema(StepKind::StopMotor);
        assert!(step.params.is_empty());
        assert_eq!(step.description, "Stop Motor");
    }

    #[test]
    fn test_default_skeleton() {
        let def = TestDefinition::default();
        assert_eq!(def.name, "New Motor Test");
        let kinds: Vec<StepKind> = def.steps.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::StartMotor,
                StepKind::SetSpeed,
                StepKind::Wait,
                StepKind::StopMotor
            ]
        );
        assert!(def.schema_issues().is_empty());
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(
            ParamValue::coerce(ParamType::Number, " 2000 ").unwrap(),
            ParamValue::Number(2000.0)
        );
        assert!(ParamValue::coerce(ParamType::Number, "fast").is_err());
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(
            ParamValue::coerce(ParamType::Boolean, "Yes").unwrap(),
            ParamValue::Boolean(true)
        );
        assert_eq!(
            ParamValue::coerce(ParamType::Boolean, "off").unwrap(),
            ParamValue::Boolean(false)
        );
        assert!(ParamValue::coerce(ParamType::Boolean, "maybe").is_err());
    }

    #[test]
    fn test_coerce_string_keeps_raw_text() {
        assert_eq!(
            ParamValue::coerce(ParamType::String, " 42 ").unwrap(),
            ParamValue::String(" 42 ".to_string())
        );
    }

    #[test]
    fn test_schema_issues_reported() {
        let def = TestDefinition::new(
            "t",
            "",
            vec![
                Step::new(StepKind::SetSpeed).with_param("rpm", "fast"),
                Step::new(StepKind::Wait).with_param("seconds", 3.0),
            ],
        );
        let issues = def.schema_issues();
        assert_eq!(issues.len(), 3);
        assert!(matches!(
            issues[0],
            SchemaIssue::TypeMismatch { step: 0, expected: ParamType::Number, .. }
        ));
        assert!(matches!(&issues[1], SchemaIssue::UnknownParam { step: 1, name, .. } if name == "seconds"));
        assert!(matches!(&issues[2], SchemaIssue::MissingParam { step: 1, name, .. } if name == "duration_s"));
        assert_eq!(
            issues[1].to_string(),
            "step 2 (wait): unknown parameter 'seconds'"
        );
    }

    #[test]
    fn test_json_roundtrip_keeps_param_order() {
        let step = Step::from_schema(StepKind::Monitor);
        let json = serde_json::to_string(&step).unwrap();
        let parsed: Step = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, step);
        let keys: Vec<&str> = parsed.params.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["duration_s", "check_temperature", "max_temp"]);
    }
}
