use std::time::Duration;

use getset::{CopyGetters, Getters};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use rjudge_util::model::Credential;

use crate::string_serde;

#[derive(Serialize, Deserialize, Getters, CopyGetters, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct CodeforcesConfig {
    #[serde(with = "string_serde")]
    #[get = "pub"]
    base_url: Url,
    #[get_copy = "pub"]
    submit_attempts: usize,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    submit_retry_interval: Duration,
    #[get_copy = "pub"]
    id_resolution_retries: usize,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    id_resolution_interval: Duration,
    #[serde(with = "humantime_serde")]
    #[get_copy = "pub"]
    poll_interval: Duration,
    #[get_copy = "pub"]
    max_polls: usize,
    #[get = "pub"]
    accounts: Vec<Credential>,
}

impl CodeforcesConfig {
    const DEFAULT_BASE_URL: &'static str = "https://codeforces.com/";
}

impl Default for CodeforcesConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(Self::DEFAULT_BASE_URL).unwrap(),
            submit_attempts: 3,
            submit_retry_interval: Duration::from_secs(1),
            id_resolution_retries: 3,
            id_resolution_interval: Duration::from_secs(1),
            poll_interval: Duration::from_secs(2),
            max_polls: 60,
            accounts: Vec::new(),
        }
    }
}
