//! The `psyscore init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    if Path::new("psyscore.toml").exists() {
        println!("psyscore.toml already exists, skipping.");
    } else {
        std::fs::write("psyscore.toml", SAMPLE_CONFIG).context("failed to write psyscore.toml")?;
        println!("Created psyscore.toml");
    }

    std::fs::create_dir_all("instruments")?;
    let example_path = Path::new("instruments/example.toml");
    if example_path.exists() {
        println!("instruments/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_INSTRUMENT)
            .context("failed to write instruments/example.toml")?;
        println!("Created instruments/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit instruments/example.toml or add your own instruments");
    println!("  2. Run: psyscore validate");
    println!("  3. Run: psyscore score --instrument example --answers answers.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# psyscore configuration

catalog_dir = "./instruments"
top_k = 3
strict = false
"#;

const EXAMPLE_INSTRUMENT: &str = r#"[instrument]
id = "example"
name = "Example Wellbeing Check"
description = "A four-item starter instrument"
options = "agree5"

[option_sets]
agree5 = [
    { value = 1, label = "Strongly disagree" },
    { value = 2, label = "Disagree" },
    { value = 3, label = "Neutral" },
    { value = 4, label = "Agree" },
    { value = 5, label = "Strongly agree" },
]

[scoring]
method = "sum"
scale = { min = 4, max = 20 }

[scoring.ranges]
bounds = "closed"

[[scoring.ranges.bands]]
min = 4
max = 11
level = "low"
description = "Wellbeing is low at the moment."

[[scoring.ranges.bands]]
min = 12
max = 20
level = "good"
description = "Wellbeing looks healthy."

[[dimensions]]
id = "mood"
name = "Mood"

[[questions]]
id = "ex_1"
prompt = "I wake up feeling rested."
dimension = "mood"

[[questions]]
id = "ex_2"
prompt = "I often feel tense for no clear reason."
dimension = "mood"
reversed = true

[[questions]]
id = "ex_3"
prompt = "I look forward to most days."
dimension = "mood"

[[questions]]
id = "ex_4"
prompt = "I enjoy the time I spend with other people."
dimension = "mood"
"#;
