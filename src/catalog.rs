//! Step catalog for the motor test bench
//!
//! The closed set of step kinds a test sequence can contain, together with
//! the typed, defaulted parameter list each kind declares.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::model::ParamValue;

/// Instruction type of a single test step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StepKind {
    StartMotor,
    SetSpeed,
    ApplyLoad,
    Wait,
    Monitor,
    RemoveLoad,
    StopMotor,
}

/// Declared value type of a step parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParamType {
    Number,
    String,
    Boolean,
}

/// Compile-time default for a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaDefault {
    Number(f64),
    Text(&'static str),
    Boolean(bool),
}

impl SchemaDefault {
    pub fn to_value(self) -> ParamValue {
        match self {
            Self::Number(n) => ParamValue::Number(n),
            Self::Text(s) => ParamValue::String(s.to_string()),
            Self::Boolean(b) => ParamValue::Boolean(b),
        }
    }
}

/// One entry of a kind's parameter schema
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub label: &'static str,
    pub default: SchemaDefault,
}

const SET_SPEED: &[ParamSpec] = &[ParamSpec {
    name: "rpm",
    ty: ParamType::Number,
    label: "Target RPM",
    default: SchemaDefault::Number(1500.0),
}];

const APPLY_LOAD: &[ParamSpec] = &[ParamSpec {
    name: "load_nm",
    ty: ParamType::Number,
    label: "Torque (Nm)",
    default: SchemaDefault::Number(25.0),
}];

const WAIT: &[ParamSpec] = &[ParamSpec {
    name: "duration_s",
    ty: ParamType::Number,
    label: "Duration (s)",
    default: SchemaDefault::Number(5.0),
}];

const MONITOR: &[ParamSpec] = &[
    ParamSpec {
        name: "duration_s",
        ty: ParamType::Number,
        label: "Duration (s)",
        default: SchemaDefault::Number(10.0),
    },
    ParamSpec {
        name: "check_temperature",
        ty: ParamType::Boolean,
        label: "Check Temperature",
        default: SchemaDefault::Boolean(true),
    },
    ParamSpec {
        name: "max_temp",
        ty: ParamType::Number,
        label: "Max Temp (°C)",
        default: SchemaDefault::Number(80.0),
    },
];

impl StepKind {
    /// Human label, also used as the description of a freshly added step
    pub fn label(&self) -> &'static str {
        match self {
            Self::StartMotor => "Start Motor",
            Self::SetSpeed => "Set Speed",
            Self::ApplyLoad => "Apply Load",
            Self::Wait => "Wait",
            Self::Monitor => "Monitor",
            Self::RemoveLoad => "Remove Load",
            Self::StopMotor => "Stop Motor",
        }
    }

    /// Ordered parameter schema for this kind
    pub fn schema(&self) -> &'static [ParamSpec] {
        match self {
            Self::StartMotor | Self::RemoveLoad | Self::StopMotor => &[],
            Self::SetSpeed => SET_SPEED,
            Self::ApplyLoad => APPLY_LOAD,
            Self::Wait => WAIT,
            Self::Monitor => MONITOR,
        }
    }

    /// Look up a single parameter declaration by name
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.schema().iter().find(|spec| spec.name == name)
    }

    /// All kinds in catalog order
    pub fn all() -> impl Iterator<Item = StepKind> {
        Self::iter()
    }
}
