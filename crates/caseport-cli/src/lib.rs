//! Directory driver for the `caseport` binary

use anyhow::{Context, Result};
use caseport_core::models::Settings;
use caseport_core::storage::SettingsStorage;
use caseport_core::{export_test_cases, Converter, MarkupConverter, UserDirectory};
use caseport_jira::JiraClient;
use chrono::Utc;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(name = "caseport")]
#[command(about = "Convert Jira test case exports into test case import files", long_about = None)]
pub struct Args {
    /// Directory holding the Jira XML exports
    #[arg(short, long, default_value = "input")]
    pub input: PathBuf,

    /// Directory receiving the converted files; emptied before each run
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Settings file
    #[arg(short, long, default_value = "settings.json")]
    pub settings: PathBuf,

    /// Model version written to each output file
    #[arg(long, default_value = caseport_core::export::DEFAULT_MODEL_VERSION)]
    pub model_version: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

/// Convert every input file; returns the total number of test cases written
pub async fn run(args: &Args) -> Result<usize> {
    let storage = SettingsStorage::new(args.settings.clone());
    let settings = storage
        .load()
        .with_context(|| format!("Failed to load settings from {}", storage.path().display()))?;

    let markup = MarkupConverter::new(settings.convert_wiki_markup);
    let directory = user_directory(&settings)?;
    let converter = Converter::new(settings, directory);

    clear_output_dir(&args.output)?;

    let mut total = 0;
    for path in list_input_files(&args.input)? {
        total += convert_file(&converter, &markup, &path, args).await?;
    }

    tracing::info!("Total test cases: {}", total);
    Ok(total)
}

/// Jira client for owner lookups. Credentials, and with them the keyring,
/// are only read when an owner field is mapped.
pub fn user_directory(settings: &Settings) -> Result<JiraClient> {
    let client = if settings.mappings.owner_field().is_some() {
        JiraClient::from_settings(&settings.jira_server_settings)
    } else {
        JiraClient::new(None, None)
    };
    client.context("Failed to create Jira client")
}

async fn convert_file<D: UserDirectory>(
    converter: &Converter<D>,
    markup: &MarkupConverter,
    path: &Path,
    args: &Args,
) -> Result<usize> {
    let name = path
        .file_name()
        .with_context(|| format!("Input path {} has no file name", path.display()))?;

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let test_cases = converter
        .convert_document(&raw)
        .await
        .with_context(|| format!("Failed to convert {}", path.display()))?;
    let xml = export_test_cases(&test_cases, Utc::now(), &args.model_version, markup)
        .with_context(|| format!("Failed to export {}", path.display()))?;

    let target = args.output.join(name);
    fs::write(&target, xml).with_context(|| format!("Failed to write {}", target.display()))?;

    tracing::info!(
        "Success: file converted with {} test cases: {}",
        test_cases.len(),
        path.display()
    );
    Ok(test_cases.len())
}

/// Create `dir` if needed and delete the files left in it by a previous run
pub fn clear_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }

    Ok(())
}

/// Regular files of `dir` sorted by name, skipping hidden and Office lock files
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let skipped = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(true, |name| name.starts_with("~$") || name.starts_with('.'));
        if skipped {
            tracing::debug!("Skipping {}", path.display());
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}
