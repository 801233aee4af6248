//! Config for rjudge.
//!
//! Config is read from `rjudge.yaml` found in the working directory or any of
//! its parents. Durations are written in humantime format (e.g.: `2s`, `1m 30s`)
//! and `session.cookies_dir` is processed with shell-like expansions.

use std::fmt;
use std::io::Write;

use anyhow::{anyhow, Context as _};
use getset::Getters;
use lazy_static::lazy_static;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use rjudge_util::abs_path::AbsPathBuf;

mod codeforces_config;
mod session_config;

pub use codeforces_config::CodeforcesConfig;
pub use session_config::SessionConfig;

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

lazy_static! {
    static ref VERSION: Version = Version::parse(env!("CARGO_PKG_VERSION")).unwrap();
}

#[derive(Serialize, Getters, Debug, Clone, PartialEq, Eq, Hash)]
#[get = "pub"]
pub struct Config {
    base_dir: AbsPathBuf,
    body: ConfigBody,
}

impl Config {
    pub fn search(cnsl: &mut dyn Write) -> Result<Self> {
        let base_dir = ConfigBody::search(cnsl)?;
        Self::load(base_dir, cnsl)
    }

    pub fn load(base_dir: AbsPathBuf, cnsl: &mut dyn Write) -> Result<Self> {
        let body = ConfigBody::load(&base_dir, cnsl)?;
        Ok(Self { base_dir, body })
    }

    pub fn default_in_dir(base_dir: AbsPathBuf) -> Self {
        Self {
            base_dir,
            body: ConfigBody::default(),
        }
    }

    pub fn session(&self) -> &SessionConfig {
        &self.body.session
    }

    pub fn codeforces(&self) -> &CodeforcesConfig {
        &self.body.codeforces
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let yaml_str = serde_yaml::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", yaml_str)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigBody {
    #[serde(with = "string_serde")]
    version: Version,
    #[serde(default)]
    session: SessionConfig,
    #[serde(default)]
    codeforces: CodeforcesConfig,
}

impl ConfigBody {
    pub const FILE_NAME: &'static str = "rjudge.yaml";

    pub fn generate_to(writer: &mut dyn Write) -> Result<()> {
        write!(
            writer,
            include_str!("../resources/rjudge.yaml.txt"),
            version = &*VERSION,
        )
        .context("Could not write config")
    }

    fn search(cnsl: &mut dyn Write) -> Result<AbsPathBuf> {
        let cwd = AbsPathBuf::cwd()?;
        let base_dir = cwd.search_dir_contains(Self::FILE_NAME).with_context(|| {
            format!(
                "Could not find config file ({}) in {} or any of the parent directories. \
                 Create config file first by `rjudge init` command.",
                Self::FILE_NAME,
                cwd
            )
        })?;
        writeln!(cnsl, "Found config file in base_dir: {}", base_dir)?;
        Ok(base_dir)
    }

    fn load(base_dir: &AbsPathBuf, cnsl: &mut dyn Write) -> Result<Self> {
        let body: Self = base_dir.join(Self::FILE_NAME).load_pretty(
            |file| serde_yaml::from_reader(file).context("Could not read config file as yaml"),
            Some(base_dir),
            cnsl,
        )?;
        body.validate()?;
        Ok(body)
    }

    fn validate(&self) -> Result<()> {
        let version_req = VersionReq::parse(&self.version.to_string())
            .context("Could not parse version requirement")?;
        if !version_req.matches(&VERSION) {
            return Err(anyhow!(
                r#"Found mismatched version in config file.
    config version: {}
    rjudge version: {}
Fix the config file so that it is compatible with the current version of rjudge."#,
                self.version,
                &*VERSION
            ));
        }
        if self.codeforces.submit_attempts() == 0 {
            return Err(anyhow!("codeforces.submit_attempts must be at least 1"));
        }
        if self.codeforces.max_polls() == 0 {
            return Err(anyhow!("codeforces.max_polls must be at least 1"));
        }
        Ok(())
    }
}

impl Default for ConfigBody {
    fn default() -> Self {
        Self {
            version: VERSION.clone(),
            session: SessionConfig::default(),
            codeforces: CodeforcesConfig::default(),
        }
    }
}

mod string_serde {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}
