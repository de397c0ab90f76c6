use std::fmt;

use super::FileId;

const UPLOAD_PREFIX: &str = "uploads";
const FALLBACK_FILENAME: &str = "upload";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn new(file_id: &FileId, filename: &str) -> Self {
        Self(format!(
            "{}/{}/{}",
            UPLOAD_PREFIX,
            file_id.as_uuid(),
            sanitize_filename(filename)
        ))
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keeps only the last path component so uploads cannot escape their folder.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match name {
        "" | "." | ".." => FALLBACK_FILENAME.to_string(),
        n => n.to_string(),
    }
}
