//! The `psyscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

use psyscore_core::catalog::audit;
use psyscore_core::parser::{parse_instrument, scan_catalog_directory, DirectoryScan};
use psyscore_core::validate::Severity;

pub fn execute(config: Option<PathBuf>, catalog: Option<PathBuf>) -> Result<()> {
    let path = super::load_config(config, catalog)?.catalog_dir;

    let DirectoryScan {
        mut instruments,
        failures,
    } = if path.is_dir() {
        scan_catalog_directory(&path)?
    } else {
        DirectoryScan {
            instruments: vec![parse_instrument(&path)?],
            failures: Vec::new(),
        }
    };
    if instruments.is_empty() && failures.is_empty() {
        anyhow::bail!("no instruments found in {}", path.display());
    }

    for failure in &failures {
        println!("File: {}", failure.path.display());
        println!("   ERROR: {:#}", failure.error);
    }

    let issues = audit(&mut instruments);

    for instrument in &instruments {
        println!(
            "Instrument: {} ({} questions, {} dimensions)",
            instrument.name,
            instrument.questions.len(),
            instrument.dimensions.len()
        );
        for issue in issues.iter().filter(|i| i.instrument == instrument.id) {
            let prefix = issue
                .subject
                .as_ref()
                .map(|s| format!("  [{s}]"))
                .unwrap_or_else(|| "  ".to_string());
            let tag = match issue.severity {
                Severity::Warning => "WARNING",
                Severity::Error => "ERROR",
            };
            println!("{prefix} {tag}: {}", issue.message);
        }
    }

    let errors = failures.len() + issues.iter().filter(|i| i.severity == Severity::Error).count();
    let warnings = issues.iter().filter(|i| i.severity == Severity::Warning).count();

    if errors + warnings == 0 {
        println!("All instruments valid.");
    } else {
        println!("\n{errors} error(s), {warnings} warning(s) found.");
    }

    if errors > 0 {
        anyhow::bail!("{errors} instrument error(s)");
    }
    Ok(())
}
