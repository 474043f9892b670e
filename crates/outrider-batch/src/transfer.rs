//! Bulk dataset transfer builder
//!
//! Generates the shell program that stages discovered dataset partitions
//! onto the node and moves them into the backup prefix, or restores them
//! from backup. Each work unit contributes one conjunctive command group;
//! the groups are joined into a single program line so the channel executes
//! the whole transfer as one atomic submission. A failing unit therefore
//! aborts the remainder, which the caller only learns about via remote
//! logs.

use outrider_common::WorkUnit;

use crate::batch::CommandBatch;
use crate::error::{BatchError, Result};

/// Which way files move during a bulk transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Stage partitions onto the node and move the originals into backup
    Download,
    /// Move backed-up partitions back to the source prefix
    Rollback,
}

impl TransferDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::Download => "download",
            TransferDirection::Rollback => "rollback",
        }
    }
}

/// Paths and filters for a bulk dataset transfer.
#[derive(Debug, Clone)]
pub struct TransferSpec {
    /// Object storage bucket holding the dataset
    pub bucket: String,
    /// Prefix the live dataset lives under (e.g. "csv/")
    pub source_prefix: String,
    /// Prefix backups are moved to (e.g. "csv/backup/")
    pub backup_prefix: String,
    /// Directory on the node the dataset is staged into
    pub local_base: String,
    /// File extension the transfer is restricted to (no dot)
    pub extension: String,
}

impl TransferSpec {
    /// Create a spec with the default prefixes and filter
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            source_prefix: "csv/".to_string(),
            backup_prefix: "csv/backup/".to_string(),
            local_base: "/home/ubuntu/trainer/data/csv/".to_string(),
            extension: "csv".to_string(),
        }
    }

    /// Set the source prefix
    pub fn with_source_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.source_prefix = prefix.into();
        self
    }

    /// Set the backup prefix
    pub fn with_backup_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.backup_prefix = prefix.into();
        self
    }

    /// Set the local staging directory
    pub fn with_local_base(mut self, local_base: impl Into<String>) -> Self {
        self.local_base = local_base.into();
        self
    }

    /// Set the file extension filter
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    fn source_url(&self, unit: &str) -> String {
        format!("s3://{}/{}{}/", self.bucket, self.source_prefix, unit)
    }

    fn backup_url(&self, unit: &str) -> String {
        format!("s3://{}/{}{}/", self.bucket, self.backup_prefix, unit)
    }

    fn local_path(&self, unit: &str) -> String {
        format!("{}{}/", self.local_base, unit)
    }

    /// The prefix a direction discovers its work units under.
    pub fn discovery_prefix(&self, direction: TransferDirection) -> &str {
        match direction {
            TransferDirection::Download => &self.source_prefix,
            TransferDirection::Rollback => &self.backup_prefix,
        }
    }
}

/// Build the transfer program for the given direction and unit list.
///
/// Deterministic: units are emitted in the order given. Fails with
/// `NoUnitsFound` on an empty unit list, before any dispatch can happen.
pub fn build_transfer_batch(
    direction: TransferDirection,
    units: &[WorkUnit],
    spec: &TransferSpec,
) -> Result<CommandBatch> {
    if units.is_empty() {
        return Err(BatchError::NoUnitsFound(
            spec.discovery_prefix(direction).to_string(),
        ));
    }

    let groups: Vec<String> = units
        .iter()
        .map(|unit| match direction {
            TransferDirection::Download => download_group(unit, spec),
            TransferDirection::Rollback => rollback_group(unit, spec),
        })
        .collect();

    Ok(CommandBatch::from_lines(vec![groups.join(" && ")]))
}

/// Stage one unit onto the node, then move its source files into backup.
fn download_group(unit: &str, spec: &TransferSpec) -> String {
    let filter = format!("--exclude \"*\" --include \"*.{}\"", spec.extension);
    [
        format!("mkdir -p {}", spec.local_path(unit)),
        format!(
            "aws s3 sync {} {} {}",
            spec.source_url(unit),
            spec.local_path(unit),
            filter
        ),
        format!(
            "aws s3 mv {} {} --recursive {} --metadata-directive COPY",
            spec.source_url(unit),
            spec.backup_url(unit),
            filter
        ),
    ]
    .join(" && ")
}

/// Move one unit's backed-up files back to the source prefix.
fn rollback_group(unit: &str, spec: &TransferSpec) -> String {
    format!(
        "aws s3 mv {} {} --recursive --exclude \"*\" --include \"*.{}\" --metadata-directive COPY",
        spec.backup_url(unit),
        spec.source_url(unit),
        spec.extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TransferSpec {
        TransferSpec::new("dataset-bucket")
    }

    #[test]
    fn test_empty_units_rejected() {
        let err = build_transfer_batch(TransferDirection::Download, &[], &spec()).unwrap_err();
        assert!(matches!(err, BatchError::NoUnitsFound(p) if p == "csv/"));

        let err = build_transfer_batch(TransferDirection::Rollback, &[], &spec()).unwrap_err();
        assert!(matches!(err, BatchError::NoUnitsFound(p) if p == "csv/backup/"));
    }

    #[test]
    fn test_download_groups_in_unit_order() {
        let units = vec!["agua".to_string(), "hola".to_string()];
        let batch = build_transfer_batch(TransferDirection::Download, &units, &spec()).unwrap();

        // One composite program line
        assert_eq!(batch.len(), 1);
        let program = batch.joined();

        let agua = program.find("mkdir -p /home/ubuntu/trainer/data/csv/agua/").unwrap();
        let hola = program.find("mkdir -p /home/ubuntu/trainer/data/csv/hola/").unwrap();
        assert!(agua < hola);

        assert!(program.contains(
            "aws s3 sync s3://dataset-bucket/csv/agua/ /home/ubuntu/trainer/data/csv/agua/"
        ));
        assert!(program.contains(
            "aws s3 mv s3://dataset-bucket/csv/agua/ s3://dataset-bucket/csv/backup/agua/"
        ));
        assert!(program.contains("--include \"*.csv\""));
    }

    #[test]
    fn test_rollback_moves_backup_to_source() {
        let units = vec!["agua".to_string()];
        let batch = build_transfer_batch(TransferDirection::Rollback, &units, &spec()).unwrap();
        let program = batch.joined();

        assert!(program.contains(
            "aws s3 mv s3://dataset-bucket/csv/backup/agua/ s3://dataset-bucket/csv/agua/"
        ));
        // Rollback never touches the local staging directory
        assert!(!program.contains("mkdir"));
    }

    #[test]
    fn test_deterministic() {
        let units = vec!["agua".to_string(), "hola".to_string()];
        let a = build_transfer_batch(TransferDirection::Download, &units, &spec()).unwrap();
        let b = build_transfer_batch(TransferDirection::Download, &units, &spec()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_extension() {
        let spec = spec().with_extension("parquet");
        let units = vec!["agua".to_string()];
        let batch = build_transfer_batch(TransferDirection::Download, &units, &spec).unwrap();
        assert!(batch.joined().contains("--include \"*.parquet\""));
    }
}
