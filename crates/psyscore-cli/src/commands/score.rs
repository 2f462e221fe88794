//! The `psyscore score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use psyscore_core::model::ScoreRange;
use psyscore_core::{Answers, ScoreResult};

pub fn execute(
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    instrument: String,
    answers_path: PathBuf,
    reference: Option<f64>,
    top_k: Option<usize>,
    format: String,
) -> Result<()> {
    let engine = super::load_engine(config, catalog)?;

    let content = std::fs::read_to_string(&answers_path)
        .with_context(|| format!("failed to read {}", answers_path.display()))?;
    let answers = Answers::from_json(&content)
        .with_context(|| format!("failed to parse answers in {}", answers_path.display()))?;

    let mut ctx = engine.default_context();
    if let Some(reference) = reference {
        ctx = ctx.with_reference(reference);
    }
    if let Some(k) = top_k {
        ctx = ctx.with_top_k(k);
    }

    let result = engine.score_with(&instrument, &answers, &ctx)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "text" => print_summary(&result),
        other => anyhow::bail!("unknown format '{other}' (expected text or json)"),
    }

    Ok(())
}

fn level(range: Option<&ScoreRange>) -> &str {
    range.map(|r| r.level.as_str()).unwrap_or("-")
}

fn print_summary(result: &ScoreResult) {
    println!("Instrument: {} ({})", result.instrument, result.formula);
    println!("Answered:   {}", result.answered);
    match result.normalized {
        Some(normalized) => println!(
            "Score:      {} ({normalized:.1}%) {}",
            result.total,
            level(result.range.as_ref())
        ),
        None => println!("Score:      {} {}", result.total, level(result.range.as_ref())),
    }

    if !result.dimensions.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Dimension", "Raw", "Mean", "Normalized", "Level"]);
        for d in &result.dimensions {
            table.add_row(vec![
                Cell::new(&d.name),
                Cell::new(format!("{}/{}", d.raw, d.size)),
                Cell::new(format!("{:.2}", d.mean)),
                Cell::new(format!("{:.1}", d.normalized)),
                Cell::new(level(d.band.as_ref())),
            ]);
        }
        println!("\n{table}");
    }

    if let Some(clinical) = &result.clinical {
        println!(
            "\nMean (all items):   {:.2} {}",
            clinical.mean_all,
            level(clinical.mean_band.as_ref())
        );
        println!("Positive items:     {}", clinical.positive_count);
        println!("Positive mean:      {:.2}", clinical.positive_mean);
        println!(
            "Screening:          {}",
            if clinical.screening_positive { "positive" } else { "negative" }
        );
    }

    if let Some(remap) = &result.remap {
        println!("\n{}: {} {}", remap.label, remap.value, level(remap.category.as_ref()));
        if let (Some(reference), Some(difference)) = (remap.reference, remap.difference) {
            println!(
                "  reference {reference}, difference {difference:+} {}",
                level(remap.difference_band.as_ref())
            );
        }
    }

    if !result.archetypes.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Rank", "Archetype", "Similarity"]);
        for (rank, m) in result.archetypes.iter().enumerate() {
            let name = if m.subtitle.is_empty() {
                m.name.clone()
            } else {
                format!("{} ({})", m.name, m.subtitle)
            };
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(name),
                Cell::new(format!("{:.1}%", m.similarity * 100.0)),
            ]);
        }
        println!("\n{table}");
    }

    for alert in &result.alerts {
        println!(
            "\n[{}] {}: {}",
            alert.severity.to_uppercase(),
            alert.question,
            alert.message
        );
    }
}
