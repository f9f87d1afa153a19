use std::{
    fmt,
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub summary: String,
    pub published: String,
    pub cvss: Option<f64>,
    pub url: String,
}

impl NormalizedRecord {
    pub fn severity(&self) -> Severity {
        Severity::from_score(self.cvss)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unscored,
}

impl Severity {
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s >= 9.0 => Self::Critical,
            Some(s) if s >= 7.0 => Self::High,
            Some(s) if s >= 4.0 => Self::Medium,
            Some(s) if s > 0.0 => Self::Low,
            _ => Self::Unscored,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unscored => "N/A",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    pub generated_at: String,
    pub source: String,
    pub items: Vec<NormalizedRecord>,
}

impl FeedDocument {
    pub fn new(source: &str, items: Vec<NormalizedRecord>, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at: timestamp(generated_at),
            source: source.to_string(),
            items,
        }
    }
}

/// `2024-01-01T12:00:00+00:00`, fractional seconds dropped.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Writes the feed to `path`, replacing whatever was there before.
pub fn write_feed(path: &Path, source: &str, items: Vec<NormalizedRecord>) -> Result<FeedDocument> {
    let document = FeedDocument::new(source, items, Utc::now());
    write_document(path, &document)?;
    Ok(document)
}

pub fn write_document(path: &Path, document: &FeedDocument) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }

    let mut json = serde_json::to_string_pretty(document).context("could not serialize feed")?;
    json.push('\n');

    fs::write(path, json).with_context(|| format!("could not write {}", path.display()))?;

    log::info!(
        "wrote {} items to {}",
        document.items.len(),
        path.display()
    );

    Ok(())
}

pub fn read_feed(path: &Path) -> Result<FeedDocument> {
    let file =
        File::open(path).with_context(|| format!("failed to open file {}", path.display()))?;

    let reader = BufReader::new(file);

    serde_json::from_reader(reader)
        .with_context(|| format!("failed to parse feed from {}", path.display()))
}
