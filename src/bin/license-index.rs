use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use license_index::{expression::PassthroughValidator, IndexBuilder, LicenseIndex, MatchOptions, RuleRecord};
use serde_json::to_string_pretty;

/// Scan a file or an inline string against a license index and print the matches.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the file to scan. Mutually exclusive with `--query`.
    location: Option<String>,

    /// Inline text to scan instead of reading a file.
    #[arg(short, long, conflicts_with = "location")]
    query: Option<String>,

    /// Path to a serialized index previously written with `LicenseIndex::to_bytes`.
    /// Without this, a small built-in demonstration index is used.
    #[arg(short, long)]
    index: Option<String>,

    /// Matches scoring below this threshold are dropped.
    #[arg(long, default_value = "0.1")]
    min_score: f32,

    /// Print one combined license expression instead of one line per match.
    #[arg(long)]
    as_expression: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let text = match (&cli.location, &cli.query) {
        (Some(path), _) => fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        (None, Some(query)) => query.clone(),
        (None, None) => anyhow::bail!("provide either a file location or --query"),
    };

    let index = match &cli.index {
        Some(path) => {
            log::info!("loading index from {path}");
            let bytes = fs::read(path).with_context(|| format!("reading index {path}"))?;
            LicenseIndex::from_bytes(&bytes).context("decoding index")?
        }
        None => {
            log::info!("no --index given, using the built-in demonstration index");
            demo_index().context("building demonstration index")?
        }
    };

    let options = MatchOptions {
        min_score: cli.min_score,
        deadline: None,
        cancel: None,
        expression_validator: Arc::new(PassthroughValidator),
    };

    let matches = license_index::match_text(&index, &text, &options);

    if cli.as_expression {
        let combined = matches
            .iter()
            .map(|m| m.license_expression.as_str())
            .collect::<Vec<_>>()
            .join(" AND ");
        println!("{combined}");
    } else {
        println!("{}", to_string_pretty(&matches)?);
    }

    Ok(())
}

/// A handful of well-known license openings, embedded so the binary is
/// runnable without a rule-loading pipeline (out of scope for this crate).
fn demo_index() -> anyhow::Result<LicenseIndex> {
    let mut builder = IndexBuilder::new();
    builder.add_rule(RuleRecord::new(
        "mit_1",
        "permission is hereby granted free of charge to any person obtaining a copy of this software and associated documentation files",
        "mit",
    ))?;
    builder.add_rule(
        RuleRecord::new(
            "apache_2_0_1",
            "licensed under the apache license version 2.0 the license you may not use this file except in compliance with the license",
            "apache-2.0",
        )
        .relevance(100),
    )?;
    builder.add_rule(RuleRecord::new(
        "gpl_3_0_1",
        "this program is free software you can redistribute it and or modify it under the terms of the gnu general public license",
        "gpl-3.0",
    ))?;
    Ok(builder.build()?)
}
