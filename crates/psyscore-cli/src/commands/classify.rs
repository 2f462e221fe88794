//! The `psyscore classify` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    instrument: String,
    score: f64,
) -> Result<()> {
    let engine = super::load_engine(config, catalog)?;
    let range = engine.classify(score, &instrument)?;

    println!("{score} -> {} [{}, {}]", range.level, range.min, range.max);
    if !range.description.is_empty() {
        println!("  {}", range.description);
    }
    for suggestion in &range.suggestions {
        println!("  - {suggestion}");
    }
    Ok(())
}
