use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::document::Document;

#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    #[error("knowledge base file not found: `{0}`")]
    Missing(PathBuf),
    #[error("could not read knowledge base `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse knowledge base `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

#[derive(Debug, Default, Deserialize)]
struct KnowledgeBaseFile {
    #[serde(default)]
    documents: Vec<Document>,
}

/// Loads `{"documents": [{"title", "content"}]}`. A file without a `documents`
/// key yields an empty corpus; a missing file is an error.
pub fn load_knowledge_base(path: &Path) -> Result<Vec<Document>, KnowledgeBaseError> {
    if !path.is_file() {
        return Err(KnowledgeBaseError::Missing(path.to_path_buf()));
    }

    let raw = fs::read_to_string(path)
        .map_err(|source| KnowledgeBaseError::Read { path: path.to_path_buf(), source })?;

    parse_knowledge_base(&raw)
        .map_err(|source| KnowledgeBaseError::Parse { path: path.to_path_buf(), source })
}

pub fn parse_knowledge_base(raw: &str) -> Result<Vec<Document>, serde_json::Error> {
    let file: KnowledgeBaseFile = serde_json::from_str(raw)?;
    Ok(file
        .documents
        .into_iter()
        .map(|document| Document::new(document.title.trim(), document.content.trim()))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{load_knowledge_base, parse_knowledge_base, KnowledgeBaseError};

    #[test]
    fn parses_documents_and_trims_content() {
        let documents = parse_knowledge_base(
            r#"{"documents": [{"title": "Pricing", "content": "\n  Basic plan: $29/month  \n"}]}"#,
        )
        .expect("knowledge base should parse");

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].title, "Pricing");
        assert_eq!(documents[0].content, "Basic plan: $29/month");
    }

    #[test]
    fn missing_documents_key_is_an_empty_corpus() {
        let documents = parse_knowledge_base(r#"{"version": 1}"#).expect("should parse");
        assert!(documents.is_empty());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.json");

        let error = load_knowledge_base(&path).expect_err("missing file should fail");
        assert!(matches!(error, KnowledgeBaseError::Missing(ref missing) if missing == &path));
        assert!(error.to_string().contains("not found"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("kb.json");
        fs::write(&path, "{ not json").expect("write fixture");

        let error = load_knowledge_base(&path).expect_err("malformed file should fail");
        assert!(matches!(error, KnowledgeBaseError::Parse { .. }));
    }
}
