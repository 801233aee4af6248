use std::fmt;

use getset::Getters;
use serde::{Deserialize, Serialize};

/// Login of one pooled account on the remote judge.
#[derive(Serialize, Deserialize, Getters, Clone, PartialEq, Eq, Hash)]
#[get = "pub"]
pub struct Credential {
    handle: String,
    password: String,
}

impl Credential {
    pub fn new(handle: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credential")
            .field("handle", &self.handle)
            .field("password", &"********")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_password() {
        let cred = Credential::new("tourist", "hunter2");
        let debug = format!("{:?}", cred);
        assert!(debug.contains("tourist"));
        assert!(!debug.contains("hunter2"));
    }
}
