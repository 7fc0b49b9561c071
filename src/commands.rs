//! Command handlers behind the CLI.
//!
//! Each handler writes its user-facing output to `out` so the binary can
//! point it at stdout and tests at a buffer.

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use crate::catalog::StepKind;
use crate::cli::{Commands, EditCommands};
use crate::config::BenchConfig;
use crate::editor::{Editor, StepId};
use crate::model::ParamValue;
use crate::store::{DefinitionStore, FsStore};
use crate::transcoder::{self, Document, Transcoder};

/// Run one CLI command
pub fn execute(command: &Commands, config: &BenchConfig, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Catalog => catalog(out),
        Commands::New {
            name,
            description,
            output,
        } => {
            let mut editor = Editor::new(config.transcoder());
            if let Some(name) = name {
                editor.set_name(name.as_str());
            }
            if let Some(description) = description {
                editor.set_description(description.as_str());
            }
            emit(&editor.to_text(), output.as_deref(), out)
        }
        Commands::Validate { file, strict } => validate(file, *strict, out),
        Commands::Fmt { file, write } => {
            let document = read_document(file)?;
            let text = transcoder::serialize_document(&document);
            if *write {
                write_document(file, &text)?;
                writeln!(out, "✓ Formatted {}", file.display())?;
                Ok(())
            } else {
                out.write_all(text.as_bytes())?;
                Ok(())
            }
        }
        Commands::Show { file } => show(&read_document(file)?, out),
        Commands::Edit { file, op } => edit(file, op, out),
        Commands::Save { file } => {
            let document = read_document(file)?;
            let mut store = FsStore::open(&config.store_dir)?;
            let record = store.save(&document.definition, &document_transcoder(&document))?;
            writeln!(out, "✓ Saved '{}' as {}", record.name, record.storage_path)?;
            Ok(())
        }
        Commands::List => {
            let store = FsStore::open(&config.store_dir)?;
            for record in store.list()? {
                writeln!(
                    out,
                    "{}  {}  {}",
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.storage_path,
                    record.name
                )?;
            }
            Ok(())
        }
        Commands::Load {
            storage_path,
            output,
        } => {
            let store = FsStore::open(&config.store_dir)?;
            let text = store.load(storage_path)?;
            emit(&text, output.as_deref(), out)
        }
    }
}

fn catalog(out: &mut dyn Write) -> Result<()> {
    for kind in StepKind::all() {
        writeln!(out, "{:<12} {}", kind.to_string(), kind.label())?;
        for spec in kind.schema() {
            let default = spec.default.to_value();
            writeln!(
                out,
                "    {:<18} {:<8} default {:<6} {}",
                spec.name,
                spec.ty.to_string(),
                default.to_string(),
                spec.label
            )?;
        }
    }
    Ok(())
}

fn validate(file: &Path, strict: bool, out: &mut dyn Write) -> Result<()> {
    let document = read_document(file)?;
    let issues = document.definition.schema_issues();
    for issue in &issues {
        warn!(%issue, "schema mismatch");
        writeln!(out, "warning: {}", issue)?;
    }
    if strict && !issues.is_empty() {
        return Err(anyhow!(
            "{} schema issue(s) in {}",
            issues.len(),
            file.display()
        ));
    }
    writeln!(
        out,
        "✓ {} is valid ({} steps)",
        file.display(),
        document.definition.steps.len()
    )?;
    Ok(())
}

fn show(document: &Document, out: &mut dyn Write) -> Result<()> {
    let definition = &document.definition;
    writeln!(out, "Name:        {}", definition.name)?;
    writeln!(out, "Description: {}", definition.description)?;
    writeln!(
        out,
        "Author:      {} (version {})",
        document.meta.author, document.meta.version
    )?;
    writeln!(
        out,
        "Sampling:    {} Hz, max {} s",
        document.settings.sample_rate_hz, document.settings.max_test_time_s
    )?;
    writeln!(out, "Steps:")?;
    for (i, step) in definition.steps.iter().enumerate() {
        let params: Vec<String> = step
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        writeln!(
            out,
            "  {:>2}. {:<12} {:<24} {}",
            i + 1,
            step.kind.to_string(),
            step.description,
            params.join(" ")
        )?;
    }
    Ok(())
}

fn edit(file: &Path, op: &EditCommands, out: &mut dyn Write) -> Result<()> {
    let document = read_document(file)?;
    let transcoder = document_transcoder(&document);
    let mut editor = Editor::with_definition(document.definition, transcoder);

    match op {
        EditCommands::Add { kind } => {
            editor.add_step(*kind);
        }
        EditCommands::Remove { index } => {
            let id = step_at(&editor, *index)?;
            editor.remove_step(id);
        }
        EditCommands::Move { index, direction } => {
            step_at(&editor, *index)?;
            if !editor.move_step(index - 1, *direction) {
                writeln!(out, "step {} cannot move {}, nothing changed", index, direction)?;
                return Ok(());
            }
        }
        EditCommands::Set {
            index,
            param,
            value,
        } => {
            let id = step_at(&editor, *index)?;
            let kind = editor.step(id).map(|s| s.kind);
            let value = match kind.and_then(|k| k.param(param)) {
                Some(spec) => ParamValue::coerce(spec.ty, value)?,
                None => transcoder::infer_value(value),
            };
            editor.update_step_param(id, param, value)?;
        }
        EditCommands::Unset { index, param } => {
            let id = step_at(&editor, *index)?;
            if editor.remove_step_param(id, param).is_none() {
                return Err(anyhow!("step {} has no parameter '{}'", index, param));
            }
        }
        EditCommands::Describe { index, text } => {
            let id = step_at(&editor, *index)?;
            editor.update_step_description(id, text.as_str());
        }
        EditCommands::Rename { name } => editor.set_name(name.as_str()),
        EditCommands::Summary { text } => editor.set_description(text.as_str()),
    }

    write_document(file, &editor.to_text())?;
    info!(file = %file.display(), steps = editor.len(), "edited test document");
    writeln!(out, "✓ Updated {} ({} steps)", file.display(), editor.len())?;
    Ok(())
}

/// 1-based position to step id
fn step_at(editor: &Editor, index: usize) -> Result<StepId> {
    index
        .checked_sub(1)
        .and_then(|i| editor.id_at(i))
        .ok_or_else(|| anyhow!("no step {} (document has {} steps)", index, editor.len()))
}

/// Transcoder that re-emits a document's own metadata and settings
fn document_transcoder(document: &Document) -> Transcoder {
    Transcoder::new(document.meta.clone(), document.settings)
}

pub fn read_document(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read test document {:?}", path))?;
    transcoder::parse_document(&text)
        .with_context(|| format!("Failed to parse test document {:?}", path))
}

fn write_document(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("Failed to write test document {:?}", path))
}

fn emit(text: &str, output: Option<&Path>, out: &mut dyn Write) -> Result<()> {
    match output {
        Some(path) => {
            write_document(path, text)?;
            writeln!(out, "✓ Wrote {}", path.display())?;
        }
        None => out.write_all(text.as_bytes())?,
    }
    Ok(())
}
