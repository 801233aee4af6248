use std::convert::TryFrom as _;
use std::fs::File;
use std::io::{BufReader, Seek as _, SeekFrom};

use anyhow::Context as _;
use cookie::Cookie as RawCookie;
use cookie_store::CookieStore;
use fs2::FileExt as _;
use reqwest::blocking::{Request, Response};
use reqwest::header::{HeaderValue, COOKIE, SET_COOKIE};

use crate::abs_path::AbsPathBuf;
use crate::{Error, Result};

/// Cookie jar of a single session, optionally persisted to a locked json file.
pub struct CookieStorage {
    file: Option<File>,
    store: CookieStore,
}

impl CookieStorage {
    pub fn open(path: &AbsPathBuf) -> Result<Self> {
        let file = path
            .create_dir_all_and_open(true, true)
            .context("Could not open cookies file")?;
        file.try_lock_exclusive()
            .context("Could not lock cookies file")?;
        let reader = BufReader::new(&file);
        let store = CookieStore::load_json(reader).map_err(Error::msg)?;
        Ok(Self {
            file: Some(file),
            store,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            file: None,
            store: CookieStore::default(),
        }
    }

    pub fn load_into(&self, request: &mut Request) -> Result<()> {
        let cookie = self
            .store
            .get_request_values(request.url())
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        if !cookie.is_empty() {
            request
                .headers_mut()
                .insert(COOKIE, HeaderValue::try_from(cookie)?);
        }
        Ok(())
    }

    pub fn store_from(&mut self, response: &Response) -> Result<()> {
        let cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|val| {
                val.to_str()
                    .ok()
                    .and_then(|cookie_str| RawCookie::parse(cookie_str.to_owned()).ok())
            });
        let url = response.url();
        self.store.store_response_cookies(cookies, url);
        self.save().context("Could not save cookies to json file")
    }

    /// Returns true if an unexpired cookie named `name` is stored for any domain.
    pub fn contains(&self, name: &str) -> bool {
        self.store
            .iter_unexpired()
            .any(|cookie| cookie.name() == name)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store = CookieStore::default();
        self.save().context("Could not save cookies to json file")
    }

    pub fn save(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.seek(SeekFrom::Start(0))?;
            file.set_len(0)?;
            self.store.save_json(file).map_err(Error::msg)?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, set_cookie: &str, url: &reqwest::Url) -> Result<()> {
        let cookie = RawCookie::parse(set_cookie.to_owned())?;
        self.store.store_response_cookies(std::iter::once(cookie), url);
        self.save()
    }
}

impl Drop for CookieStorage {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            // unlocking can only fail if the handle is already invalid
            let _ = file.unlock();
        }
    }
}
