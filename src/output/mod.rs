//! Tabular input and output.
//!
//! Listings are persisted as a seven-column CSV; enrichment appends an
//! `email` column. The reader is deliberately tolerant: headers are trimmed,
//! the website column is selectable, and any column a row lacks falls back
//! to the sentinel.

pub mod progress;

use crate::core::config::Config;
use crate::core::models::{BusinessRecord, NOT_AVAILABLE};
use crate::core::error::{AppError, Result};
use std::path::{Path, PathBuf};

const LISTING_HEADERS: [&str; 7] = [
    "name", "phone", "website", "rating", "reviews", "address", "category",
];

/// Writes the seven-column listing table.
pub fn write_listings(path: &Path, records: &[BusinessRecord]) -> Result<()> {
    write_table(path, records, false)
}

/// Writes the eight-column enriched table (listing columns plus `email`).
pub fn write_enriched(path: &Path, records: &[BusinessRecord]) -> Result<()> {
    write_table(path, records, true)
}

fn write_table(path: &Path, records: &[BusinessRecord], include_email: bool) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut headers: Vec<&str> = LISTING_HEADERS.to_vec();
    if include_email {
        headers.push("email");
    }
    writer.write_record(&headers)?;

    for record in records {
        let mut row = vec![
            record.name.as_str(),
            record.phone.as_str(),
            record.website.as_str(),
            record.rating.as_str(),
            record.reviews.as_str(),
            record.address.as_str(),
            record.category.as_str(),
        ];
        if include_email {
            row.push(record.email.as_deref().unwrap_or(NOT_AVAILABLE));
        }
        writer.write_record(&row)?;
    }
    writer.flush().map_err(AppError::Io)?;
    tracing::debug!(target: "output", "Wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

/// Reads records from a listing CSV produced by this crate or by hand.
///
/// The configured website column must exist (that is the one column the
/// contact stage cannot work without); every other column is optional.
pub fn read_records(path: &Path, config: &Config) -> Result<Vec<BusinessRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let wanted = config.website_column.trim().to_lowercase();
    if !headers.iter().any(|h| h == &wanted) {
        return Err(AppError::Input(format!(
            "Input file {} has no '{}' column (found: {}).",
            path.display(),
            config.website_column,
            headers.join(", ")
        )));
    }

    let column = |headers: &[String], row: &csv::StringRecord, name: &str| -> String {
        headers
            .iter()
            .position(|h| h == name)
            .and_then(|i| row.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    };

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let email = column(&headers, &row, "email");
        records.push(BusinessRecord {
            name: column(&headers, &row, "name"),
            phone: column(&headers, &row, "phone"),
            website: column(&headers, &row, &wanted),
            rating: column(&headers, &row, "rating"),
            reviews: column(&headers, &row, "reviews"),
            address: column(&headers, &row, "address"),
            category: column(&headers, &row, "category"),
            email: (email != NOT_AVAILABLE).then_some(email),
        });
    }
    tracing::info!(target: "output",
        "Loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Periodically rewrites the output file so an aborted run keeps every
/// fully-processed record.
pub struct CheckpointWriter {
    path: PathBuf,
    interval: usize,
    include_email: bool,
}

impl CheckpointWriter {
    pub fn new(path: &Path, interval: usize, include_email: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            interval: interval.max(1),
            include_email,
        }
    }

    /// Writes a checkpoint when `processed` has reached the next interval
    /// boundary. Checkpoint failures are logged and swallowed; losing a
    /// checkpoint must not fail the run.
    pub fn maybe_write(&self, records: &[BusinessRecord], processed: usize) {
        if processed == 0 || processed % self.interval != 0 {
            return;
        }
        match write_table(&self.path, records, self.include_email) {
            Ok(()) => {
                tracing::info!(target: "output",
                    "Checkpoint: {} record(s) saved to {}", records.len(), self.path.display());
            }
            Err(e) => {
                tracing::warn!(target: "output",
                    "Checkpoint write to {} failed: {}", self.path.display(), e);
            }
        }
    }

    /// Unconditional final write.
    pub fn finalize(&self, records: &[BusinessRecord]) -> Result<()> {
        write_table(&self.path, records, self.include_email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("leadscout-{}-{}", std::process::id(), name))
    }

    fn sample_record() -> BusinessRecord {
        BusinessRecord {
            name: "Acme Plumbing".to_string(),
            phone: "+12085551234".to_string(),
            website: "https://acme.com".to_string(),
            rating: "4.5".to_string(),
            reviews: "120".to_string(),
            address: "123 Main St, Boise, ID".to_string(),
            category: "Plumber".to_string(),
            email: None,
        }
    }

    #[test]
    fn listing_table_round_trips() {
        let path = temp_path("listing.csv");
        write_listings(&path, &[sample_record()]).unwrap();

        let config = Config::default();
        let records = read_records(&path, &config).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Acme Plumbing");
        assert_eq!(records[0].website, "https://acme.com");
        assert_eq!(records[0].email, None);
    }

    #[test]
    fn enriched_table_carries_email_and_sentinel() {
        let path = temp_path("enriched.csv");
        let mut with_email = sample_record();
        with_email.email = Some("info@acme.com".to_string());
        write_enriched(&path, &[with_email, sample_record()]).unwrap();

        let config = Config::default();
        let records = read_records(&path, &config).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records[0].email.as_deref(), Some("info@acme.com"));
        assert_eq!(records[1].email, None);
    }

    #[test]
    fn missing_website_column_is_an_input_error() {
        let path = temp_path("no-website.csv");
        std::fs::write(&path, "name,phone\nAcme,+1208\n").unwrap();

        let config = Config::default();
        let result = read_records(&path, &config);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(AppError::Input(_))));
    }

    #[test]
    fn reader_tolerates_padded_headers_and_missing_columns() {
        let path = temp_path("padded.csv");
        std::fs::write(&path, " Name , Website \nAcme, acme.com \n").unwrap();

        let config = Config::default();
        let records = read_records(&path, &config).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records[0].name, "Acme");
        assert_eq!(records[0].website, "acme.com");
        assert_eq!(records[0].phone, NOT_AVAILABLE);
    }

    #[test]
    fn checkpoints_fire_on_interval_boundaries() {
        let path = temp_path("checkpoint.csv");
        let writer = CheckpointWriter::new(&path, 2, false);
        let records = vec![sample_record()];

        writer.maybe_write(&records, 1);
        assert!(!path.exists());
        writer.maybe_write(&records, 2);
        assert!(path.exists());
        std::fs::remove_file(&path).ok();
    }
}
