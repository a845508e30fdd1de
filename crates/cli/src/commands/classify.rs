//! Classify command - run the request heuristic without storing anything

use anyhow::{Context, Result};
use reel_radar_domain::Classification;
use reel_radar_domain::usecases::RequestClassifier;
use serde::Serialize;
use std::io::{self, Read};
use std::path::PathBuf;

use crate::args::ClassifyArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct ClassifiedText<'a> {
    text: &'a str,
    #[serde(flatten)]
    classification: Classification,
}

pub async fn execute(args: ClassifyArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref()).unwrap_or_default();

    let input = get_input_text(&args)?;
    let texts = split_messages(&input, args.text.is_some());

    if texts.is_empty() {
        anyhow::bail!("No text provided for classification");
    }

    let classifier = RequestClassifier::new(config.classifier_config());
    tracing::debug!(messages = texts.len(), "Classifying text");

    let results: Vec<ClassifiedText<'_>> = texts
        .iter()
        .map(|&text| ClassifiedText {
            text,
            classification: classifier.classify(text),
        })
        .collect();

    if args.json {
        let json = if results.len() == 1 {
            serde_json::to_string_pretty(&results[0])
        } else {
            serde_json::to_string_pretty(&results)
        }
        .context("Failed to serialize output")?;
        println!("{}", json);
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("Message: {}", result.text);
        if result.classification.is_request {
            println!("Movie request: yes");
            println!("Titles:");
            for title in &result.classification.titles {
                println!("  - {}", title);
            }
        } else {
            println!("Movie request: no");
        }
    }

    Ok(())
}

/// `--text` is one message; files and stdin hold one message per line
fn split_messages(input: &str, single: bool) -> Vec<&str> {
    if single {
        return Some(input.trim())
            .filter(|t| !t.is_empty())
            .into_iter()
            .collect();
    }

    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn get_input_text(args: &ClassifyArgs) -> Result<String> {
    if let Some(ref text) = args.text {
        return Ok(text.clone());
    }

    if let Some(ref path) = args.file {
        if path.as_os_str() != "-" {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()));
        }
    }

    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read from stdin")?;
    Ok(text)
}
