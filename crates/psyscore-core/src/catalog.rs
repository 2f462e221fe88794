//! Validated, immutable instrument catalog.
//!
//! A [`Catalog`] is built once, validated as a whole, and then shared
//! read-only between scoring calls.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::archetype::max_possible;
use crate::model::Instrument;
use crate::parser::scan_catalog_directory;
use crate::validate::{validate_instrument, Severity, ValidationIssue};

/// Instruments keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    instruments: BTreeMap<String, Arc<Instrument>>,
}

impl Catalog {
    /// Build a catalog, rejecting it if any instrument has validation errors.
    pub fn new(instruments: Vec<Instrument>) -> Result<Self> {
        Self::build(instruments, false)
    }

    /// Build a catalog; with `strict`, warnings reject it as well.
    pub fn build(mut instruments: Vec<Instrument>, strict: bool) -> Result<Self> {
        let issues = audit(&mut instruments);
        for issue in issues.iter().filter(|i| i.severity == Severity::Warning) {
            tracing::warn!("{issue}");
        }
        let rejected: Vec<_> = issues
            .into_iter()
            .filter(|i| strict || i.severity == Severity::Error)
            .collect();

        if !rejected.is_empty() {
            let listing = rejected
                .iter()
                .map(|i| format!("  {i}"))
                .collect::<Vec<_>>()
                .join("\n");
            anyhow::bail!(
                "catalog rejected with {} problem(s):\n{listing}",
                rejected.len()
            );
        }

        let catalog: BTreeMap<_, _> = instruments
            .into_iter()
            .map(|i| (i.id.clone(), Arc::new(i)))
            .collect();
        tracing::debug!(instruments = catalog.len(), "catalog built");
        Ok(Self {
            instruments: catalog,
        })
    }

    /// Load and validate every instrument under `dir`.
    ///
    /// With `strict`, a file that fails to parse rejects the catalog;
    /// otherwise it is skipped with a warning.
    pub fn from_dir(dir: &Path, strict: bool) -> Result<Self> {
        let scan = scan_catalog_directory(dir)?;
        if strict && !scan.failures.is_empty() {
            let listing = scan
                .failures
                .iter()
                .map(|f| format!("  {f}"))
                .collect::<Vec<_>>()
                .join("\n");
            anyhow::bail!(
                "catalog rejected: {} file(s) failed to parse:\n{listing}",
                scan.failures.len()
            );
        }
        for failure in &scan.failures {
            tracing::warn!("skipping {failure}");
        }
        Self::build(scan.instruments, strict)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Instrument>> {
        self.instruments.get(id)
    }

    /// Instruments in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Instrument>> {
        self.instruments.values()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.instruments.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

/// Prepare and validate a set of instruments without building a catalog.
///
/// Returns every issue, warnings included, plus an error for each repeated
/// instrument id.
pub fn audit(instruments: &mut [Instrument]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    for instrument in instruments.iter_mut() {
        prepare(instrument);
        issues.extend(validate_instrument(instrument));
        if !seen.insert(instrument.id.clone()) {
            issues.push(ValidationIssue {
                instrument: instrument.id.clone(),
                subject: None,
                severity: Severity::Error,
                message: "instrument id is declared more than once".into(),
            });
        }
    }
    issues
}

/// Fill in values derived from the definition itself.
fn prepare(instrument: &mut Instrument) {
    let derived = max_possible(instrument);
    if let Some(policy) = instrument.matching.as_mut() {
        if policy.max_possible.is_empty() {
            policy.max_possible = derived;
        }
    }
}
