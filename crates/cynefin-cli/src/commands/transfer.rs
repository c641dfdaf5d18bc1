use super::utils::{StoreOptions, open_store};
use anyhow::{Context, Result};
use cynefin_application::HistorySnapshot;
use std::fs;
use std::path::Path;

pub fn export(options: &StoreOptions, output: Option<&Path>) -> Result<()> {
    let store = open_store(options)?;
    let snapshot = HistorySnapshot::capture(&store);
    let document = snapshot
        .to_json()
        .context("Failed to encode history snapshot")?;

    match output {
        Some(path) => {
            fs::write(path, document + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} sessions to {}",
                snapshot.total_sessions,
                path.display()
            );
        }
        None => println!("{}", document),
    }

    Ok(())
}

pub fn import(options: &StoreOptions, file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let snapshot = HistorySnapshot::from_json(&raw)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let mut store = open_store(options)?;
    let report = store.import(&snapshot);

    println!("Imported {} sessions", report.imported);
    if report.skipped > 0 {
        println!("Skipped {} sessions without an id", report.skipped);
    }
    if report.unpersisted > 0 {
        eprintln!(
            "Warning: {} results did not fit in storage and were not saved",
            report.unpersisted
        );
    }
    if store.len() < report.imported {
        println!(
            "History cap is {}; only the newest {} sessions were kept",
            store.config().cap,
            store.len()
        );
    }

    Ok(())
}
