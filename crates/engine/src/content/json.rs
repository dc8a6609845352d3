use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use super::types::ContentError;

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
    let raw = fs::read_to_string(path).map_err(|source| ContentError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(path, &raw)
}

/// Parses `raw`, reporting the JSON path of the first failing value.
pub fn parse_json<T: DeserializeOwned>(path: &Path, raw: &str) -> Result<T, ContentError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        ContentError::Json {
            path: path.to_path_buf(),
            json_path: if json_path.is_empty() {
                ".".to_string()
            } else {
                json_path
            },
            source: error.into_inner(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::types::DialoguesDocument;

    #[test]
    fn errors_name_the_failing_json_path() {
        let raw = r#"{ "dialogues": [ { "name": "a", "sentences": [ { "speaker": "x" } ] } ] }"#;
        let err = parse_json::<DialoguesDocument>(Path::new("town_dialogues.json"), raw)
            .expect_err("missing msg");
        match err {
            ContentError::Json { json_path, .. } => {
                assert_eq!(json_path, "dialogues[0].sentences[0]");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_files_report_read_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_json_file::<DialoguesDocument>(&dir.path().join("absent.json"))
            .expect_err("missing");
        assert!(matches!(err, ContentError::ReadFile { .. }));
    }
}
