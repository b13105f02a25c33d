use crate::policy::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    #[default]
    Document,
}

impl FileCategory {
    pub const ALL: [FileCategory; 4] = [
        FileCategory::Image,
        FileCategory::Video,
        FileCategory::Audio,
        FileCategory::Document,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Video => "video",
            FileCategory::Audio => "audio",
            FileCategory::Document => "document",
        }
    }

    /// Classify a MIME type by its top-level type. Anything that is not
    /// image, video or audio is treated as a generic document.
    pub fn classify(mime_type: &str) -> Self {
        match mime_type.parse::<mime::Mime>() {
            Ok(m) if m.type_() == mime::IMAGE => FileCategory::Image,
            Ok(m) if m.type_() == mime::VIDEO => FileCategory::Video,
            Ok(m) if m.type_() == mime::AUDIO => FileCategory::Audio,
            _ => FileCategory::Document,
        }
    }

    /// Resolve a category name, falling back to `Document` for anything unrecognized.
    pub fn resolve(name: &str) -> Self {
        name.parse().unwrap_or_else(|e: PolicyError| {
            tracing::warn!("{}, treating as document", e);
            FileCategory::Document
        })
    }
}

impl FromStr for FileCategory {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(FileCategory::Image),
            "video" => Ok(FileCategory::Video),
            "audio" => Ok(FileCategory::Audio),
            "document" => Ok(FileCategory::Document),
            _ => Err(PolicyError::UnknownCategory(s.to_string())),
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted MIME patterns and size ceiling for one category.
///
/// Patterns follow the HTML `accept` attribute: `type/subtype`, `type/*`,
/// `*/*`, a trailing-wildcard subtype such as
/// `application/vnd.openxmlformats-officedocument.*`, or a `.ext` suffix
/// matched against the file name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadPolicy {
    pub accepted_patterns: Vec<String>,
    pub max_bytes: u64,
}

impl UploadPolicy {
    pub fn new<I, S>(patterns: I, max_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted_patterns: patterns.into_iter().map(Into::into).collect(),
            max_bytes,
        }
    }

    /// Whether any accepted pattern matches the given MIME type or file name.
    pub fn accepts(&self, mime_type: &str, file_name: &str) -> bool {
        let parsed = mime_type.trim().parse::<mime::Mime>().ok();

        self.accepted_patterns.iter().any(|pattern| {
            let pattern = pattern.trim();
            if let Some(ext) = pattern.strip_prefix('.') {
                return has_extension(file_name, ext);
            }
            match &parsed {
                Some(m) => mime_matches(pattern, m),
                None => false,
            }
        })
    }
}

fn has_extension(file_name: &str, ext: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, actual)| actual.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn mime_matches(pattern: &str, m: &mime::Mime) -> bool {
    let Some((ptype, psub)) = pattern.split_once('/') else {
        return false;
    };
    let psub = psub.split(';').next().unwrap_or("").trim();

    if ptype == "*" {
        return psub == "*";
    }
    if !ptype.eq_ignore_ascii_case(m.type_().as_str()) {
        return false;
    }

    let subtype = match m.suffix() {
        Some(suffix) => format!("{}+{}", m.subtype().as_str(), suffix.as_str()),
        None => m.subtype().as_str().to_string(),
    };

    if psub == "*" {
        true
    } else if let Some(prefix) = psub.strip_suffix('*') {
        subtype
            .to_ascii_lowercase()
            .starts_with(&prefix.to_ascii_lowercase())
    } else {
        psub.eq_ignore_ascii_case(&subtype)
    }
}
