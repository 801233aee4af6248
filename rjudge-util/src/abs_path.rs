use std::env::current_dir;
use std::fmt;
use std::fs;
use std::io::{self, Seek as _, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context as _};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Wraps `shellexpand::full` method.
fn expand<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    Ok(shellexpand::full(&path.as_ref().to_string_lossy())?.parse()?)
}

/// An absolute (not necessarily canonicalized) path that may or may not exist.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsPathBuf(PathBuf);

impl AbsPathBuf {
    /// Constructs an absolute path.
    ///
    /// Returns error if `path` is not absolute.
    pub fn try_new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(anyhow!("Path is not absolute : {}", path.display()));
        }
        let mut ret = Self(PathBuf::new());
        ret.push(path);
        Ok(ret)
    }

    /// Constructs an absolute path while expanding leading tilde and environment variables.
    ///
    /// Returns error if expanded `path` is not absolute.
    pub fn from_shell_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::try_new(expand(path)?)
    }

    /// Returns current directory as an absolute path.
    pub fn cwd() -> Result<Self> {
        Ok(Self(current_dir()?))
    }

    pub fn join<P: AsRef<Path>>(&self, path: P) -> Self {
        Self(self.0.join(path))
    }

    fn push<P: AsRef<Path>>(&mut self, path: P) {
        self.0.push(path)
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent().map(|parent| Self(parent.to_owned()))
    }

    /// Searches `self` and its ancestors for a directory that contains `file_name`.
    pub fn search_dir_contains(&self, file_name: &str) -> Option<Self> {
        for dir in self.0.ancestors() {
            let mut file_path = dir.join(file_name);
            if file_path.is_file() {
                file_path.pop();
                return Some(Self(file_path));
            }
        }
        None
    }

    pub fn save_pretty(
        &self,
        save: impl FnOnce(fs::File) -> Result<()>,
        overwrite: bool,
        base_dir: Option<&AbsPathBuf>,
        cnsl: &mut dyn Write,
    ) -> Result<Option<bool>> {
        write!(
            cnsl,
            "Saving {} ... ",
            self.strip_prefix_if(base_dir).display()
        )?;
        let result = self.save(save, overwrite);
        let msg = match result {
            Ok(Some(true)) => "overwritten",
            Ok(Some(false)) => "saved",
            Ok(None) => "already exists",
            Err(_) => "failed",
        };
        writeln!(cnsl, "{}", msg)?;
        result
    }

    // returns Some(true): overwritten, Some(false): created, None: skipped
    pub fn save(
        &self,
        save: impl FnOnce(fs::File) -> Result<()>,
        overwrite: bool,
    ) -> Result<Option<bool>> {
        let is_existed = self.as_ref().is_file();
        if !overwrite && is_existed {
            return Ok(None);
        }
        self.create_dir_all_and_open(false, true)
            .with_context(|| format!("Could not open file : {}", self))
            .and_then(|mut file| {
                // truncate file before write
                file.seek(SeekFrom::Start(0))?;
                file.set_len(0)?;
                Ok(file)
            })
            .and_then(save)?;
        Ok(Some(is_existed))
    }

    pub fn load_pretty<T>(
        &self,
        load: impl FnOnce(fs::File) -> Result<T>,
        base_dir: Option<&AbsPathBuf>,
        cnsl: &mut dyn Write,
    ) -> Result<T> {
        write!(
            cnsl,
            "Loading {} ... ",
            self.strip_prefix_if(base_dir).display()
        )?;
        let result = self.load(load);
        let msg = match result {
            Ok(_) => "loaded",
            Err(_) => "failed",
        };
        writeln!(cnsl, "{}", msg)?;
        result
    }

    pub fn load<T>(&self, load: impl FnOnce(fs::File) -> Result<T>) -> Result<T> {
        fs::OpenOptions::new()
            .read(true)
            .open(&self.0)
            .with_context(|| format!("Could not open file : {}", self))
            .and_then(load)
    }

    pub fn create_dir_all_and_open(&self, is_read: bool, is_write: bool) -> io::Result<fs::File> {
        if let Some(dir) = self.parent() {
            dir.create_dir_all()?
        }
        self.open(is_read, is_write)
    }

    fn create_dir_all(&self) -> io::Result<()> {
        fs::create_dir_all(self.as_ref())
    }

    fn open(&self, is_read: bool, is_write: bool) -> io::Result<fs::File> {
        fs::OpenOptions::new()
            .read(is_read)
            .write(is_write)
            .create(true)
            .open(&self.0)
    }

    /// Relative to `base` when `self` is under it, as given otherwise.
    fn strip_prefix_if(&self, base: Option<&AbsPathBuf>) -> &Path {
        base.and_then(|base| self.0.strip_prefix(&base.0).ok())
            .unwrap_or_else(|| self.0.as_path())
    }
}

impl AsRef<PathBuf> for AbsPathBuf {
    fn as_ref(&self) -> &PathBuf {
        &self.0
    }
}

impl FromStr for AbsPathBuf {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_shell_path(s)
    }
}

impl<'de> Deserialize<'de> for AbsPathBuf {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl fmt::Display for AbsPathBuf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use std::fs::File;

    use serde::Deserialize;
    use tempfile::tempdir;

    use super::*;
    use crate::assert_matches;

    #[derive(Deserialize, Debug)]
    struct TestData {
        cookies_dir: AbsPathBuf,
    }

    #[test]
    fn test_try_new() -> anyhow::Result<()> {
        let tests = &[
            ("/a/b", "/a/b"),
            ("/a//b", "/a/b"),
            ("/a/./b", "/a/b"),
            ("/a/b/", "/a/b"),
        ];
        for (actual, expected) in tests {
            let actual = AbsPathBuf::try_new(actual)?;
            assert_eq!(actual.as_ref(), &PathBuf::from(expected));
        }
        assert_matches!(AbsPathBuf::try_new("a/b") => Err(_));
        Ok(())
    }

    #[test]
    fn test_from_shell_path() -> anyhow::Result<()> {
        let actual: AbsPathBuf = "~/cookies".parse()?;
        let expected = PathBuf::from(shellexpand::tilde("~/cookies").as_ref());
        assert_eq!(actual.as_ref(), &expected);
        assert_matches!("$RJUDGE_UNKNOWN_VAR/a".parse::<AbsPathBuf>() => Err(_));
        Ok(())
    }

    #[test]
    fn test_deserialize() -> anyhow::Result<()> {
        let data: TestData = serde_yaml::from_str("cookies_dir: /var/lib/rjudge")?;
        assert_eq!(data.cookies_dir, AbsPathBuf::try_new("/var/lib/rjudge")?);
        let result = serde_yaml::from_str::<TestData>("cookies_dir: var/lib/rjudge");
        assert_matches!(result => Err(_));
        Ok(())
    }

    #[test]
    fn test_search_dir_contains() -> anyhow::Result<()> {
        let test_dir = tempdir()?;
        let base = AbsPathBuf::try_new(test_dir.path())?;
        File::create(base.join("rjudge.yaml").as_ref())?;
        let nested = base.join("a").join("b");
        nested.create_dir_all()?;
        assert_eq!(nested.search_dir_contains("rjudge.yaml"), Some(base.clone()));
        assert_eq!(nested.search_dir_contains("unknown.yaml"), None);
        Ok(())
    }

    #[test]
    fn test_save_without_overwrite() -> anyhow::Result<()> {
        let test_dir = tempdir()?;
        let path = AbsPathBuf::try_new(test_dir.path())?.join("x").join("file.txt");
        let write = |text: &'static str| {
            move |mut file: fs::File| -> Result<()> { Ok(file.write_all(text.as_bytes())?) }
        };
        assert_eq!(path.save(write("first"), false)?, Some(false));
        assert_eq!(path.save(write("second"), false)?, None);
        assert_eq!(path.save(write("third"), true)?, Some(true));
        assert_eq!(fs::read_to_string(path.as_ref())?, "third");
        Ok(())
    }
}
