//! Transcoder integration tests
//!
//! Document layout, hand-edited input and error reporting.

use pretty_assertions::assert_eq;

use motorbench::catalog::StepKind;
use motorbench::model::{ParamValue, Step, TestDefinition, UNTITLED_TEST};
use motorbench::settings::{DocumentMeta, GlobalSettings};
use motorbench::transcoder::{self, ParseError, Transcoder};

fn ramp() -> TestDefinition {
    TestDefinition::new(
        "Ramp",
        "desc",
        vec![
            Step::new(StepKind::StartMotor),
            Step::new(StepKind::SetSpeed).with_param("rpm", 2000.0),
        ],
    )
}

const RAMP_DOCUMENT: &str = r#"test_info:
  name: "Ramp"
  description: "desc"
  author: "Test Engineer"
  version: "1.0"

global_settings:
  sample_rate_hz: 10
  max_test_time_s: 120

sequence:
  - step: start_motor

  - step: set_speed
    rpm: 2000
"#;

#[test]
fn test_ramp_document_layout() {
    assert_eq!(transcoder::serialize(&ramp()), RAMP_DOCUMENT);
}

#[test]
fn test_ramp_document_parses_back() {
    let parsed = transcoder::parse(RAMP_DOCUMENT).unwrap();
    assert_eq!(parsed, ramp());
    assert!(parsed.steps[0].params.is_empty());
    assert_eq!(parsed.steps[1].params["rpm"], ParamValue::Number(2000.0));
}

#[test]
fn test_serialization_is_deterministic() {
    let definition = TestDefinition::default();
    assert_eq!(
        transcoder::serialize(&definition),
        transcoder::serialize(&definition.clone())
    );
}

#[test]
fn test_output_is_valid_yaml() {
    let mut definition = TestDefinition::default();
    definition.name = "Quote \" and # hash: colon".to_string();
    definition.steps.push(
        Step::from_schema(StepKind::Monitor)
            .with_description("multi\nline")
            .with_param("label", "yes"),
    );
    let text = transcoder::serialize(&definition);

    let yaml: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    assert_eq!(yaml["test_info"]["name"].as_str(), Some(definition.name.as_str()));
    assert_eq!(yaml["global_settings"]["sample_rate_hz"].as_f64(), Some(10.0));

    let sequence = yaml["sequence"].as_sequence().unwrap();
    assert_eq!(sequence.len(), 5);
    assert_eq!(sequence[1]["step"].as_str(), Some("set_speed"));
    assert_eq!(sequence[1]["rpm"].as_f64(), Some(1500.0));
    assert_eq!(sequence[4]["description"].as_str(), Some("multi\nline"));
    assert_eq!(sequence[4]["check_temperature"].as_bool(), Some(true));
    // Quoted so YAML 1.1 readers keep it a string
    assert_eq!(sequence[4]["label"].as_str(), Some("yes"));
}

#[test]
fn test_transcoder_emits_configured_settings() {
    let transcoder = Transcoder::new(
        DocumentMeta {
            author: "QA".to_string(),
            version: "3".to_string(),
        },
        GlobalSettings {
            sample_rate_hz: 2.5,
            max_test_time_s: 900.0,
        },
    );
    let text = transcoder.serialize(&ramp());
    assert!(text.contains("  author: \"QA\"\n"));
    assert!(text.contains("  sample_rate_hz: 2.5\n"));
    assert!(text.contains("  max_test_time_s: 900\n"));

    let document = transcoder::parse_document(&text).unwrap();
    assert_eq!(document.meta, transcoder.meta);
    assert_eq!(document.settings, transcoder.settings);
    assert_eq!(transcoder::serialize_document(&document), text);
}

#[test]
fn test_missing_name_is_untitled() {
    let parsed = transcoder::parse("sequence:\n  - step: stop_motor\n").unwrap();
    assert_eq!(parsed.name, UNTITLED_TEST);
    assert_eq!(parsed.description, "");
    assert_eq!(parsed.steps, vec![Step::new(StepKind::StopMotor)]);
}

#[test]
fn test_missing_sequence_is_an_error() {
    let text = "test_info:\n  name: \"No steps\"\n";
    assert_eq!(transcoder::parse(text), Err(ParseError::MissingSequence));
    assert_eq!(transcoder::parse(""), Err(ParseError::MissingSequence));
}

#[test]
fn test_empty_sequence() {
    let parsed = transcoder::parse("test_info:\n  name: \"Idle\"\n\nsequence:\n").unwrap();
    assert_eq!(parsed.name, "Idle");
    assert!(parsed.steps.is_empty());
}

#[test]
fn test_unknown_step_kind_is_an_error() {
    let text = "sequence:\n  - step: start_motor\n  - step: end_test\n";
    assert_eq!(
        transcoder::parse(text),
        Err(ParseError::UnknownStepKind {
            line: 3,
            kind: "end_test".to_string(),
        })
    );
}

#[test]
fn test_unknown_parameters_pass_through() {
    let text = "sequence:\n  - step: wait\n    seconds: 3\n";
    let parsed = transcoder::parse(text).unwrap();
    assert_eq!(parsed.steps[0].params["seconds"], ParamValue::Number(3.0));

    let issues = parsed.schema_issues();
    assert_eq!(issues.len(), 2);
    assert_eq!(
        issues[0].to_string(),
        "step 1 (wait): unknown parameter 'seconds'"
    );
}

#[test]
fn test_hand_edited_document() {
    let text = "\
# Overnight soak test
test_info:
  name: Soak            # bare scalar
  description: 'It''s long'
  owner: \"lab 3\"

calibration:
  offset: 0.2

sequence:
- step: start_motor
- step: set_speed
  description: Spin up
  rpm: 1200
  ramp: fast
  hold: false
- step: monitor
  duration_s: 3600
  label: \"80\"
";
    let parsed = transcoder::parse(text).unwrap();
    assert_eq!(parsed.name, "Soak");
    assert_eq!(parsed.description, "It's long");
    assert_eq!(parsed.steps.len(), 3);

    let spin = &parsed.steps[1];
    assert_eq!(spin.description, "Spin up");
    assert_eq!(spin.params["rpm"], ParamValue::Number(1200.0));
    assert_eq!(spin.params["ramp"], ParamValue::String("fast".to_string()));
    assert_eq!(spin.params["hold"], ParamValue::Boolean(false));
    let keys: Vec<&str> = spin.params.keys().map(String::as_str).collect();
    assert_eq!(keys, ["rpm", "ramp", "hold"]);

    assert_eq!(
        parsed.steps[2].params["label"],
        ParamValue::String("80".to_string())
    );
}

#[test]
fn test_crlf_document() {
    let text = RAMP_DOCUMENT.replace('\n', "\r\n");
    assert_eq!(transcoder::parse(&text).unwrap(), ramp());
}

#[test]
fn test_blank_lines_inside_step_are_insignificant() {
    let text = "sequence:\n  - step: set_speed\n\n    rpm: 900\n";
    let parsed = transcoder::parse(text).unwrap();
    assert_eq!(parsed.steps[0].params["rpm"], ParamValue::Number(900.0));
}

#[test]
fn test_special_floats_roundtrip() {
    let definition = TestDefinition::new(
        "Limits",
        "",
        vec![
            Step::new(StepKind::Monitor)
                .with_param("max_temp", f64::INFINITY)
                .with_param("min_temp", f64::NEG_INFINITY),
        ],
    );
    let text = transcoder::serialize(&definition);
    assert!(text.contains("    max_temp: .inf\n"));
    assert!(text.contains("    min_temp: -.inf\n"));
    assert_eq!(transcoder::parse(&text).unwrap(), definition);
}

#[test]
fn test_errors_carry_line_numbers() {
    let cases = [
        ("sequence:\n  - step: wait\n      duration_s: 1\n    x: 2\n", 4),
        ("sequence:\n  - step: wait\n    duration_s: 1\n    duration_s: 2\n", 4),
        ("sequence:\n  - step: wait\n    nested:\n      a: 1\n", 3),
        ("sequence:\n  - step: wait\n    note: \"open\n", 3),
        ("sequence:\n  - wait: 5\n", 2),
        ("global_settings:\n  sample_rate_hz: fast\nsequence:\n", 2),
        ("sequence:\nsequence:\n", 2),
    ];
    for (text, line) in cases {
        let err = transcoder::parse(text).unwrap_err();
        assert_eq!(err.line(), Some(line), "{:?} -> {}", text, err);
    }
}

#[test]
fn test_failed_parse_does_not_panic_on_garbage() {
    for text in ["sequence", "sequence:\n  -", "  sequence:\n", "- step: wait\n", ":\n"] {
        assert!(transcoder::parse(text).is_err(), "{:?} should not parse", text);
    }
}
