//! The `psyscore list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

pub fn execute(config: Option<PathBuf>, catalog: Option<PathBuf>) -> Result<()> {
    let engine = super::load_engine(config, catalog)?;

    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Formula", "Questions", "Dimensions"]);
    for instrument in engine.catalog().iter() {
        table.add_row(vec![
            Cell::new(&instrument.id),
            Cell::new(&instrument.name),
            Cell::new(instrument.formula_id()),
            Cell::new(instrument.questions.len()),
            Cell::new(instrument.dimensions.len()),
        ]);
    }
    println!("{table}");

    println!("\nFormulas: {}", engine.formula_ids().join(", "));
    Ok(())
}
