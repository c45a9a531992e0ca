use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use autostream_core::domain::lead::Lead;

use super::{LeadRepository, RepositoryError};

pub const CSV_HEADER: [&str; 4] = ["timestamp", "name", "email", "platform"];

/// Leads appended to a flat CSV file with a `timestamp,name,email,platform` header.
pub struct CsvLeadRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvLeadRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RepositoryError {
        RepositoryError::Io { path: self.path.display().to_string(), source }
    }
}

#[async_trait]
impl LeadRepository for CsvLeadRepository {
    async fn append(&self, lead: &Lead) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| self.io_error(source))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        let is_new = file.metadata().await.map_err(|source| self.io_error(source))?.len() == 0;

        let row = encode_row(lead, is_new)?;
        file.write_all(&row).await.map_err(|source| self.io_error(source))?;
        file.flush().await.map_err(|source| self.io_error(source))?;

        info!(
            event_name = "leads.csv.appended",
            path = %self.path.display(),
            wrote_header = is_new,
            "lead appended to csv"
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Lead>, RepositoryError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(self.io_error(error)),
        };

        decode_rows(&raw)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn encode_row(lead: &Lead, with_header: bool) -> Result<Vec<u8>, RepositoryError> {
    let mut writer = ::csv::WriterBuilder::new().has_headers(with_header).from_writer(Vec::new());
    writer.serialize(lead)?;
    writer.into_inner().map_err(|error| RepositoryError::Csv(error.into_error().into()))
}

fn decode_rows(raw: &[u8]) -> Result<Vec<Lead>, RepositoryError> {
    let mut reader = ::csv::ReaderBuilder::new().has_headers(true).from_reader(raw);
    reader
        .deserialize::<Lead>()
        .enumerate()
        .map(|(index, row)| {
            row.map_err(|error| RepositoryError::Decode { row: index + 1, message: error.to_string() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{decode_rows, encode_row};
    use autostream_core::domain::lead::Lead;

    fn lead(name: &str) -> Lead {
        let timestamp = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|date| date.and_hms_opt(9, 30, 0))
            .expect("valid timestamp");
        Lead::new(name, "creator@example.com", "YouTube", timestamp).expect("valid lead")
    }

    #[test]
    fn first_row_carries_the_header() {
        let encoded = encode_row(&lead("Ada"), true).expect("encode");
        let text = String::from_utf8(encoded).expect("utf8");
        assert_eq!(
            text,
            "timestamp,name,email,platform\n2024-05-01 09:30:00,Ada,creator@example.com,YouTube\n"
        );
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let encoded = encode_row(&lead("Lovelace, Ada"), false).expect("encode");
        let text = String::from_utf8(encoded).expect("utf8");
        assert_eq!(text, "2024-05-01 09:30:00,\"Lovelace, Ada\",creator@example.com,YouTube\n");
    }

    #[test]
    fn malformed_rows_report_their_position() {
        let raw = b"timestamp,name,email,platform\nyesterday,Ada,a@b.co,YouTube\n";
        let error = decode_rows(raw).expect_err("bad timestamp should fail");
        assert!(error.to_string().contains("row 1"));
    }

    #[test]
    fn rows_failing_lead_validation_are_rejected() {
        let raw = b"timestamp,name,email,platform\n\
2024-05-01 09:30:00,Ada,ada@example.com,YouTube\n\
2024-05-01 09:31:00,,not-an-email,\n";
        let error = decode_rows(raw).expect_err("invalid row should fail");
        let message = error.to_string();
        assert!(message.contains("row 2"), "{message}");
        assert!(message.contains("Name is required"), "{message}");
    }
}
