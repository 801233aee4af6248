use std::time::Duration;

use getset::{CopyGetters, Getters};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{StatusCode, Url};
use retry::{delay, retry, OperationResult};
use tracing::{debug, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::service::{CookieStorage, ResponseExt as _};

/// Extracts the anti-forgery token from a response body.
pub type ExtractToken = fn(&str) -> Option<String>;

/// A response whose body has been read.
#[derive(Getters, CopyGetters, Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    #[get_copy = "pub"]
    status: StatusCode,
    #[get = "pub"]
    url: Url,
    #[get = "pub"]
    location: Option<Url>,
    #[get = "pub"]
    body: String,
}

impl Fetched {
    pub fn new(status: StatusCode, url: Url, location: Option<Url>, body: impl Into<String>) -> Self {
        Self {
            status,
            url,
            location,
            body: body.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == StatusCode::FOUND
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

/// One browser-like session against the remote judge.
///
/// Owns the cookie jar and the anti-forgery token. The first token found in a
/// response body is kept until `reset` is called.
pub struct Session {
    client: Client,
    base_url: Url,
    cookies: CookieStorage,
    token: Option<String>,
    extract_token: ExtractToken,
    retry_limit: usize,
    retry_interval: Duration,
}

impl Session {
    const DEFAULT_RETRY_LIMIT: usize = 4;
    const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

    pub fn new(
        client: Client,
        base_url: Url,
        cookies: CookieStorage,
        extract_token: ExtractToken,
    ) -> Self {
        Self {
            client,
            base_url,
            cookies,
            token: None,
            extract_token,
            retry_limit: Self::DEFAULT_RETRY_LIMIT,
            retry_interval: Self::DEFAULT_RETRY_INTERVAL,
        }
    }

    pub fn with_retry(mut self, retry_limit: usize, retry_interval: Duration) -> Self {
        self.retry_limit = retry_limit;
        self.retry_interval = retry_interval;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> RemoteResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| {
                RemoteError::Protocol(format!("Could not parse url path {} : {}", path, err))
            })
    }

    pub fn get(&self, path: &str) -> RemoteResult<RequestBuilder> {
        Ok(self.client.get(self.url(path)?))
    }

    pub fn post(&self, path: &str) -> RemoteResult<RequestBuilder> {
        Ok(self.client.post(self.url(path)?))
    }

    /// Sends a request once.
    ///
    /// Replies with 5xx become `RemoteError::ServerError`.
    pub fn execute(&mut self, builder: RequestBuilder) -> RemoteResult<Fetched> {
        let mut request = builder
            .build()
            .map_err(|err| RemoteError::Protocol(format!("Could not build request : {}", err)))?;
        self.cookies
            .load_into(&mut request)
            .map_err(|err| RemoteError::Protocol(format!("{:#}", err)))?;
        let method = request.method().clone();
        let url = request.url().clone();

        let response = match self.client.execute(request) {
            Ok(response) => response,
            Err(err) => {
                debug!("{:7} {} ... failed", method.as_str(), url);
                return Err(err.into());
            }
        };
        let status = response.status();
        debug!("{:7} {} ... {}", method.as_str(), url, status);

        if let Err(err) = self.cookies.store_from(&response) {
            warn!("{:#}", err);
        }
        if status.is_server_error() {
            return Err(RemoteError::ServerError(status));
        }
        let location = if status.is_redirection() {
            let location = response
                .location_url(&self.base_url)
                .map_err(|err| RemoteError::Protocol(format!("{:#}", err)))?;
            Some(location)
        } else {
            None
        };
        let url = response.url().clone();
        let body = response.text()?;
        self.observe(&body);

        Ok(Fetched {
            status,
            url,
            location,
            body,
        })
    }

    /// Sends an idempotent request, retrying transport failures and server errors.
    pub fn retry_execute(&mut self, builder: RequestBuilder) -> RemoteResult<Fetched> {
        let retry_interval = self.retry_interval.as_millis() as u64;
        let durations = delay::Fixed::from_millis(retry_interval).take(self.retry_limit);
        let result = retry(durations, || {
            let attempt = match builder.try_clone() {
                Some(attempt) => attempt,
                None => {
                    return OperationResult::Err(RemoteError::Protocol(
                        "Could not clone request".into(),
                    ))
                }
            };
            match self.execute(attempt) {
                Ok(fetched) => OperationResult::Ok(fetched),
                Err(err) if err.is_transient() => {
                    warn!("{}, retrying", err);
                    OperationResult::Retry(err)
                }
                Err(err) => OperationResult::Err(err),
            }
        });
        result.map_err(RemoteError::from)
    }

    /// Captures the anti-forgery token from `body` unless one is already held.
    pub fn observe(&mut self, body: &str) {
        if self.token.is_some() {
            return;
        }
        if let Some(token) = (self.extract_token)(body) {
            debug!("captured anti-forgery token");
            self.token = Some(token);
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn require_token(&self) -> RemoteResult<&str> {
        self.token()
            .ok_or_else(|| RemoteError::Protocol("No anti-forgery token captured".into()))
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains(name)
    }

    /// Forgets the token so that the next response can provide a new one.
    pub fn forget_token(&mut self) {
        self.token = None;
    }

    /// Drops cookies and token, forcing a fresh login.
    pub fn reset(&mut self) {
        self.token = None;
        if let Err(err) = self.cookies.clear() {
            warn!("{:#}", err);
        }
    }

    #[cfg(test)]
    pub(crate) fn cookies_mut(&mut self) -> &mut CookieStorage {
        &mut self.cookies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_matches;

    fn extract_meta(body: &str) -> Option<String> {
        body.strip_prefix("token:").map(|t| t.trim().to_owned())
    }

    fn session() -> Session {
        Session::new(
            Client::new(),
            Url::parse("https://codeforces.com/").unwrap(),
            CookieStorage::in_memory(),
            extract_meta,
        )
    }

    #[test]
    fn test_first_token_wins() {
        let mut session = session();
        assert_eq!(session.token(), None);
        session.observe("<html>no token</html>");
        assert_eq!(session.token(), None);
        session.observe("token: first");
        session.observe("token: second");
        assert_eq!(session.token(), Some("first"));
    }

    #[test]
    fn test_reset_clears_token_and_cookies() -> anyhow::Result<()> {
        let mut session = session();
        session.observe("token: abc");
        let url = session.base_url().clone();
        session
            .cookies_mut()
            .insert_raw("X-User-Sha1=u; Path=/", &url)?;
        assert!(session.has_cookie("X-User-Sha1"));
        session.reset();
        assert_eq!(session.token(), None);
        assert!(!session.has_cookie("X-User-Sha1"));
        session.observe("token: def");
        assert_eq!(session.token(), Some("def"));
        Ok(())
    }

    #[test]
    fn test_require_token() {
        let mut session = session();
        assert_matches!(session.require_token() => Err(RemoteError::Protocol(_)));
        session.observe("token: abc");
        assert_matches!(session.require_token() => Ok("abc"));
    }

    #[test]
    fn test_url() -> anyhow::Result<()> {
        let session = session();
        assert_eq!(
            session.url("contest/1200/problem/A")?.as_str(),
            "https://codeforces.com/contest/1200/problem/A"
        );
        Ok(())
    }

    #[test]
    #[ignore]
    fn test_execute_live() -> anyhow::Result<()> {
        let mut session = session();
        let request = session.get("enter")?;
        let fetched = session.retry_execute(request)?;
        assert_eq!(fetched.status(), StatusCode::OK);
        Ok(())
    }
}
