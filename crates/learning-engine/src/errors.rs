use thiserror::Error;

#[derive(Debug, Error)]
pub enum LearningEngineError {
    #[error("failed to read ledger file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write ledger file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse ledger file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Writes `value` to `path` via a temp file + rename, same atomic-persist
/// idiom the Knowledge Store and Pattern Store use.
pub(crate) fn write_json_atomic<T: serde::Serialize>(path: &std::path::Path, value: &T) -> Result<(), LearningEngineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LearningEngineError::Write { path: path.display().to_string(), source })?;
    }
    let json = serde_json::to_vec_pretty(value).map_err(|source| LearningEngineError::Parse { path: path.display().to_string(), source })?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json).map_err(|source| LearningEngineError::Write { path: tmp_path.display().to_string(), source })?;
    std::fs::rename(&tmp_path, path).map_err(|source| LearningEngineError::Write { path: path.display().to_string(), source })
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<Option<T>, LearningEngineError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path).map_err(|source| LearningEngineError::Read { path: path.display().to_string(), source })?;
    if bytes.is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_slice(&bytes).map_err(|source| LearningEngineError::Parse { path: path.display().to_string(), source })?;
    Ok(Some(value))
}
