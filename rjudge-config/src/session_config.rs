use std::time::Duration;

use getset::{CopyGetters, Getters};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};

use rjudge_util::abs_path::AbsPathBuf;
use rjudge_util::service::CookieStorage;

use crate::Result;

#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    timeout: Duration,
    #[get_copy = "pub"]
    retry_limit: usize,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    retry_interval: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[get = "pub"]
    cookies_dir: Option<AbsPathBuf>,
}

impl SessionConfig {
    const USER_AGENT: &'static str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    pub fn client_builder(&self) -> ClientBuilder {
        Client::builder()
            .referer(false)
            .redirect(Policy::none()) // redirects manually
            .user_agent(Self::USER_AGENT)
            .timeout(Some(self.timeout))
    }

    /// Opens the cookie jar of `handle`, or an in-memory one when no cookies dir is set.
    pub fn open_cookie_storage(&self, handle: &str) -> Result<CookieStorage> {
        match &self.cookies_dir {
            Some(dir) => CookieStorage::open(&dir.join(format!("{}.json", handle))),
            None => Ok(CookieStorage::in_memory()),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry_limit: 4,
            retry_interval: Duration::from_secs(2),
            cookies_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_deserialize_partial() -> anyhow::Result<()> {
        let config: SessionConfig = serde_yaml::from_str("timeout: 5s")?;
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.retry_limit(), 4);
        assert_eq!(config.cookies_dir(), &None);
        Ok(())
    }

    #[test]
    fn test_open_cookie_storage_per_handle() -> anyhow::Result<()> {
        let test_dir = tempdir()?;
        let yaml = format!("cookies_dir: {}", test_dir.path().display());
        let config: SessionConfig = serde_yaml::from_str(&yaml)?;
        let _alice = config.open_cookie_storage("alice")?;
        let _bob = config.open_cookie_storage("bob")?;
        assert!(test_dir.path().join("alice.json").is_file());
        assert!(config.open_cookie_storage("alice").is_err());
        Ok(())
    }
}
