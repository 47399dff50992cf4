use serde::{Deserialize, Serialize};

/// Binary flag rendered as `"Yes"` / `"No"` in responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value { YesNo::Yes } else { YesNo::No }
    }
}

/// A single assessment returned to a caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub name: String,
    pub url: String,
    pub remote_testing: YesNo,
    pub adaptive_irt: YesNo,
    pub duration: String,
    pub test_type: String,
}

/// Metadata stored alongside each indexed chunk.
///
/// Every key defaults to an empty string when absent from the sidecar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitMetadata {
    pub name: String,
    pub url: String,
    pub remote_testing: String,
    pub adaptive_irt: String,
    pub duration: String,
    pub test_type: String,
}

/// One candidate produced by a similarity search.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedHit {
    pub document: String,
    pub metadata: HitMetadata,
    /// Cosine similarity; higher is more relevant.
    pub score: f32,
}

/// Caller input after routing on the `http` prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryInput {
    UrlReference { url: String },
    RawText { text: String },
}

impl QueryInput {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http") {
            QueryInput::UrlReference {
                url: raw.to_string(),
            }
        } else {
            QueryInput::RawText {
                text: raw.to_string(),
            }
        }
    }
}
