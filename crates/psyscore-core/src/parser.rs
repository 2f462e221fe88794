//! TOML instrument parser.
//!
//! Loads instrument definitions from TOML files and directories. Option
//! lists can be declared once under `[option_sets]` and referenced by name,
//! which keeps long Likert inventories readable.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    AlertRule, ArchetypeProfile, ClinicalPolicy, Dimension, Instrument, MatchingPolicy,
    Question, QuestionKind, QuestionOption, RemapPolicy, ScoringPolicy,
};

/// Intermediate TOML structure for parsing instrument files.
#[derive(Debug, Deserialize)]
struct TomlInstrumentFile {
    instrument: TomlInstrumentHeader,
    scoring: ScoringPolicy,
    #[serde(default)]
    option_sets: BTreeMap<String, Vec<QuestionOption>>,
    #[serde(default)]
    dimensions: Vec<Dimension>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
    #[serde(default)]
    alerts: Vec<AlertRule>,
    #[serde(default)]
    clinical: Option<ClinicalPolicy>,
    #[serde(default)]
    remap: Option<RemapPolicy>,
    #[serde(default)]
    matching: Option<MatchingPolicy>,
    #[serde(default)]
    archetypes: Vec<ArchetypeProfile>,
}

#[derive(Debug, Deserialize)]
struct TomlInstrumentHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    formula: Option<String>,
    /// Option set used by questions that do not declare their own.
    #[serde(default)]
    options: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    prompt: String,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    options: Option<TomlOptions>,
    #[serde(default)]
    reversed: bool,
    #[serde(default)]
    required: Option<bool>,
    #[serde(default)]
    dimension: Option<String>,
}

fn default_kind() -> String {
    "likert".to_string()
}

/// Either the name of an option set or an inline list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlOptions {
    Named(String),
    Inline(Vec<QuestionOption>),
}

/// Parse a single TOML file into an [`Instrument`].
pub fn parse_instrument(path: &Path) -> Result<Instrument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read instrument file: {}", path.display()))?;

    parse_instrument_str(&content, path)
}

/// Parse a TOML string into an [`Instrument`] (useful for testing).
pub fn parse_instrument_str(content: &str, source_path: &Path) -> Result<Instrument> {
    let parsed: TomlInstrumentFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let header = parsed.instrument;
    let option_sets = parsed.option_sets;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind: QuestionKind = q
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))?;

            let options = match q.options {
                Some(TomlOptions::Inline(options)) => options,
                Some(TomlOptions::Named(name)) => lookup_set(&option_sets, &name, &q.id)?,
                None => match &header.options {
                    Some(name) => lookup_set(&option_sets, name, &q.id)?,
                    None => anyhow::bail!(
                        "question '{}' has no options and the instrument declares no default set",
                        q.id
                    ),
                },
            };

            // Matcher items are optional unless stated otherwise.
            let required = q.required.unwrap_or(kind == QuestionKind::Likert);

            Ok(Question {
                id: q.id,
                prompt: q.prompt,
                kind,
                options,
                reversed: q.reversed,
                required,
                dimension: q.dimension,
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid question in {}", source_path.display()))?;

    Ok(Instrument {
        id: header.id,
        name: header.name,
        description: header.description,
        questions,
        dimensions: parsed.dimensions,
        scoring: parsed.scoring,
        formula: header.formula,
        alerts: parsed.alerts,
        clinical: parsed.clinical,
        remap: parsed.remap,
        matching: parsed.matching,
        archetypes: parsed.archetypes,
    })
}

fn lookup_set(
    sets: &BTreeMap<String, Vec<QuestionOption>>,
    name: &str,
    question: &str,
) -> Result<Vec<QuestionOption>> {
    sets.get(name)
        .cloned()
        .with_context(|| format!("question '{question}' refers to unknown option set '{name}'"))
}

/// A catalog file that could not be parsed.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.path.display(), self.error)
    }
}

/// Everything found under a catalog directory.
#[derive(Debug, Default)]
pub struct DirectoryScan {
    pub instruments: Vec<Instrument>,
    /// Files that failed to parse, in path order.
    pub failures: Vec<LoadFailure>,
}

/// Recursively parse all `.toml` instrument files under a directory.
///
/// Entries are visited in name order so the result does not depend on the
/// filesystem. Parse failures are collected rather than returned early.
pub fn scan_catalog_directory(dir: &Path) -> Result<DirectoryScan> {
    let mut scan = DirectoryScan::default();
    scan_into(dir, &mut scan)?;
    Ok(scan)
}

fn scan_into(dir: &Path, scan: &mut DirectoryScan) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            scan_into(&path, scan)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_instrument(&path) {
                Ok(instrument) => scan.instruments.push(instrument),
                Err(error) => scan.failures.push(LoadFailure { path, error }),
            }
        }
    }
    Ok(())
}

/// Recursively load all `.toml` instrument files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Instrument>> {
    let scan = scan_catalog_directory(dir)?;
    for failure in &scan.failures {
        tracing::warn!("skipping {failure}");
    }
    Ok(scan.instruments)
}
