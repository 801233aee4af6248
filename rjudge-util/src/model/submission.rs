use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier the remote judge assigned to a submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl From<String> for SubmissionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SubmissionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for SubmissionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}
