use std::time::Duration;

use reqwest::StatusCode;
use retry::{retry, OperationResult};
use tracing::{debug, info, warn};

use rjudge_config::CodeforcesConfig;
use rjudge_util::error::{RemoteError, RemoteResult};
use rjudge_util::model::{
    Credential, LangIdRef, NormalizedVerdict, ProblemRef, ProblemStatement, SubmissionId,
};
use rjudge_util::service::{Fetched, Session};

use crate::page::{EnterPage, HasFormErrors as _, MyPage, ProblemPage, SubmitPage, IDENTITY_COOKIE};
use crate::status::StatusPayload;

/// Typed operations of the codeforces web protocol over a `Session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapter {
    id_resolution_retries: usize,
    id_resolution_interval: Duration,
}

impl Adapter {
    const ROOT_PATH: &'static str = "";
    const STATUS_PATH: &'static str = "data/submitSource";

    pub fn new(config: &CodeforcesConfig) -> Self {
        Self {
            id_resolution_retries: config.id_resolution_retries(),
            id_resolution_interval: config.id_resolution_interval(),
        }
    }

    /// Fetches the statement of `raw_ref`.
    ///
    /// Returns `None` if `raw_ref` is not a problem reference or the page has
    /// no recognizable statement.
    pub fn fetch_problem(
        &self,
        session: &mut Session,
        raw_ref: &str,
    ) -> RemoteResult<Option<ProblemStatement>> {
        let problem = match ProblemRef::parse(raw_ref) {
            Some(problem) => problem,
            None => return Ok(None),
        };
        let request = session.get(&ProblemPage::path(&problem))?;
        let fetched = session.retry_execute(request)?;
        if fetched.status() != StatusCode::OK {
            warn!("Could not find problem {} : {}", problem, fetched.status());
            return Ok(None);
        }
        match ProblemPage::new(fetched.body()).extract_statement() {
            Ok(statement) => Ok(Some(statement)),
            Err(err) => {
                warn!("Could not read problem {} : {}", problem, err);
                Ok(None)
            }
        }
    }

    /// Logs in, priming the csrf token first when the session has none.
    pub fn login(&self, session: &mut Session, credential: &Credential) -> RemoteResult<()> {
        if session.token().is_none() {
            let request = session.get(EnterPage::PATH)?;
            session.retry_execute(request)?;
        }
        let token = session.require_token()?.to_owned();
        let form = EnterPage::login_form(&token, credential.handle(), credential.password());
        let request = session.post(EnterPage::PATH)?.form(&form);
        let fetched = session.execute(request)?;

        if !fetched.is_found() {
            let message = EnterPage::new(fetched.body())
                .extract_form_errors()
                .unwrap_or_else(|| format!("Login was refused with {}", fetched.status()));
            return Err(RemoteError::Authentication(message));
        }
        if !session.has_cookie(IDENTITY_COOKIE) {
            return Err(RemoteError::Authentication(format!(
                "Could not find {} cookie after login",
                IDENTITY_COOKIE
            )));
        }
        info!("Logged in as {}", credential.handle());
        Ok(())
    }

    /// Submits `source` and returns the id codeforces assigned to it.
    pub fn submit(
        &self,
        session: &mut Session,
        problem: &ProblemRef,
        lang_id: LangIdRef,
        source: &str,
    ) -> RemoteResult<SubmissionId> {
        let token = session.require_token()?.to_owned();
        let form = SubmitPage::submit_form(problem, lang_id, source, &token);
        let request = session
            .post(&SubmitPage::path(problem, &token))?
            .form(&form);
        let fetched = session.execute(request)?;
        check_submitted(&fetched)?;
        debug!("Submitted {}, resolving submission id", problem);
        self.resolve_submission_id(session, problem)
    }

    /// Reads the newest entry of the submission history, backing off
    /// exponentially while it does not show up.
    fn resolve_submission_id(
        &self,
        session: &mut Session,
        problem: &ProblemRef,
    ) -> RemoteResult<SubmissionId> {
        let path = MyPage::path(problem);
        let durations = (0..self.id_resolution_retries as u32)
            .map(|i| self.id_resolution_interval * 2u32.saturating_pow(i));
        let result = retry(durations, || {
            let fetched = match session.get(&path) {
                Ok(request) => session.retry_execute(request),
                Err(err) => Err(err),
            };
            let fetched = match fetched {
                Ok(fetched) => fetched,
                Err(err) => return OperationResult::Retry(err.to_string()),
            };
            match MyPage::new(fetched.body()).extract_latest_submission_id() {
                Some(id) => OperationResult::Ok(id),
                None => OperationResult::Retry("No submission in history".to_owned()),
            }
        });
        result.map_err(|err| {
            let reason = match err {
                retry::Error::Operation { error, .. } => error,
                retry::Error::Internal(msg) => msg,
            };
            RemoteError::IdResolution {
                contest_id: problem.group_id().clone(),
                reason,
            }
        })
    }

    /// Queries the judging status of `id`.
    pub fn get_status(
        &self,
        session: &mut Session,
        id: &SubmissionId,
    ) -> RemoteResult<NormalizedVerdict> {
        if session.token().is_none() {
            let request = session.get(Self::ROOT_PATH)?;
            session.retry_execute(request)?;
        }
        let token = session.require_token()?.to_owned();
        let form = [("submissionId", id.as_ref()), ("csrf_token", token.as_str())];
        let request = session.post(Self::STATUS_PATH)?.form(&form);
        let fetched = session.retry_execute(request)?;
        if fetched.status() == StatusCode::FORBIDDEN {
            session.forget_token();
            return Err(RemoteError::VerdictUnavailable(
                "Csrf token was refused, it will be renewed".into(),
            ));
        }
        StatusPayload::parse(fetched.body())?.normalize()
    }
}

/// Codeforces answers a successful submit with a redirect to the status page.
fn check_submitted(fetched: &Fetched) -> RemoteResult<()> {
    if fetched.status() == StatusCode::FORBIDDEN {
        return Err(RemoteError::Authentication(
            "Csrf token was refused".into(),
        ));
    }
    if !fetched.is_found() {
        let message = SubmitPage::new(fetched.body())
            .extract_form_errors()
            .unwrap_or_else(|| format!("Received {} instead of a redirect", fetched.status()));
        return Err(RemoteError::SubmissionRejected(message));
    }
    let redirected_to_login = fetched
        .location()
        .as_ref()
        .map_or(false, |url| url.path().trim_end_matches('/').ends_with("/enter"));
    if redirected_to_login {
        return Err(RemoteError::Authentication("Session has expired".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use reqwest::Url;
    use rjudge_util::assert_matches;
    use rjudge_util::model::Verdict;

    use super::*;
    use crate::stub::{response, StubServer};

    const TOKEN: &str = "4f2e9c1b7a3d5e6f8091a2b3c4d5e6f7";
    const EMPTY_HISTORY: &str = "<html><body><table class=\"status-frame-datatable\"></table></body></html>";

    fn adapter() -> Adapter {
        Adapter {
            id_resolution_retries: 2,
            id_resolution_interval: Duration::from_millis(1),
        }
    }

    fn enter_page() -> String {
        response("200 OK", &[], include_str!("../tests/fixtures/enter.html"))
    }

    fn primed_session(server: &StubServer) -> anyhow::Result<Session> {
        let mut session = server.session()?;
        let request = session.get(EnterPage::PATH)?;
        session.retry_execute(request)?;
        assert_eq!(session.token(), Some(TOKEN));
        Ok(session)
    }

    fn fetched(status: StatusCode, location: Option<&str>, body: &str) -> Fetched {
        let url = Url::parse("https://codeforces.com/contest/1200/submit").unwrap();
        let location = location.map(|loc| url.join(loc).unwrap());
        Fetched::new(status, url, location, body)
    }

    #[test]
    fn test_check_submitted() {
        let ok = fetched(StatusCode::FOUND, Some("/contest/1200/my"), "");
        assert_matches!(check_submitted(&ok) => Ok(()));
    }

    #[test]
    fn test_check_submitted_rejected() {
        let body = include_str!("../tests/fixtures/submit_rejected.html");
        let rejected = fetched(StatusCode::OK, None, body);
        match check_submitted(&rejected) {
            Err(RemoteError::SubmissionRejected(message)) => {
                assert_eq!(message, "You have submitted exactly the same code before")
            }
            result => panic!("unexpected result : {:?}", result),
        }
    }

    #[test]
    fn test_check_submitted_stale_session() {
        let to_login = fetched(StatusCode::FOUND, Some("/enter?back=%2Fcontest%2F1200%2Fsubmit"), "");
        assert_matches!(check_submitted(&to_login) => Err(RemoteError::Authentication(_)));
        let forbidden = fetched(StatusCode::FORBIDDEN, None, "");
        assert_matches!(check_submitted(&forbidden) => Err(RemoteError::Authentication(_)));
    }

    #[test]
    fn test_adapter_from_config() {
        let adapter = Adapter::new(&CodeforcesConfig::default());
        assert_eq!(adapter.id_resolution_retries, 3);
        assert_eq!(adapter.id_resolution_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_login() -> anyhow::Result<()> {
        let server = StubServer::start(vec![
            enter_page(),
            response(
                "302 Found",
                &["Location: /", "Set-Cookie: X-User-Sha1=9a0b1c; Path=/"],
                "",
            ),
        ])?;
        let mut session = server.session()?;
        adapter().login(&mut session, &Credential::new("alice", "secret"))?;
        assert!(session.has_cookie(IDENTITY_COOKIE));

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].starts_with("GET /enter\n"));
        assert!(requests[1].starts_with("POST /enter\n"));
        assert!(requests[1].contains(&format!("csrf_token={}", TOKEN)));
        assert!(requests[1].contains("handleOrEmail=alice"));
        assert!(requests[1].contains("password=secret"));
        Ok(())
    }

    #[test]
    fn test_login_rejected() -> anyhow::Result<()> {
        let server = StubServer::start(vec![
            enter_page(),
            response(
                "200 OK",
                &[],
                include_str!("../tests/fixtures/enter_failed.html"),
            ),
        ])?;
        let mut session = server.session()?;
        match adapter().login(&mut session, &Credential::new("alice", "wrong")) {
            Err(RemoteError::Authentication(message)) => {
                assert_eq!(message, "Invalid handle/email or password")
            }
            result => panic!("unexpected result : {:?}", result),
        }
        assert!(!session.has_cookie(IDENTITY_COOKIE));
        Ok(())
    }

    #[test]
    fn test_login_without_identity_cookie() -> anyhow::Result<()> {
        let server = StubServer::start(vec![
            enter_page(),
            response("302 Found", &["Location: /"], ""),
        ])?;
        let mut session = server.session()?;
        let result = adapter().login(&mut session, &Credential::new("alice", "secret"));
        assert_matches!(result => Err(RemoteError::Authentication(_)));
        Ok(())
    }

    #[test]
    fn test_submit() -> anyhow::Result<()> {
        let server = StubServer::start(vec![
            enter_page(),
            response("302 Found", &["Location: /contest/1200/my"], ""),
            response("200 OK", &[], EMPTY_HISTORY),
            response("200 OK", &[], include_str!("../tests/fixtures/my.html")),
        ])?;
        let mut session = primed_session(&server)?;
        let problem = ProblemRef::parse("1200A").unwrap();
        let id = adapter().submit(&mut session, &problem, "54", "int main() {}")?;
        assert_eq!(id.as_ref(), "176856006");

        let requests = server.requests();
        assert_eq!(requests.len(), 4);
        assert!(requests[1].starts_with(&format!(
            "POST /contest/1200/submit?csrf_token={}\n",
            TOKEN
        )));
        assert!(requests[1].contains("submittedProblemIndex=A"));
        assert!(requests[1].contains("programTypeId=54"));
        assert!(requests[2].starts_with("GET /contest/1200/my\n"));
        assert!(requests[3].starts_with("GET /contest/1200/my\n"));
        Ok(())
    }

    #[test]
    fn test_submit_without_resolved_id() -> anyhow::Result<()> {
        let server = StubServer::start(vec![
            enter_page(),
            response("302 Found", &["Location: /contest/1200/my"], ""),
            response("200 OK", &[], EMPTY_HISTORY),
            response("200 OK", &[], EMPTY_HISTORY),
            response("200 OK", &[], EMPTY_HISTORY),
        ])?;
        let mut session = primed_session(&server)?;
        let problem = ProblemRef::parse("1200A").unwrap();
        match adapter().submit(&mut session, &problem, "54", "int main() {}") {
            Err(RemoteError::IdResolution { contest_id, .. }) => assert_eq!(contest_id, "1200"),
            result => panic!("unexpected result : {:?}", result),
        }
        // the first lookup and one per retry
        assert_eq!(server.requests().len(), 5);
        Ok(())
    }

    #[test]
    fn test_get_status_renews_refused_token() -> anyhow::Result<()> {
        let server = StubServer::start(vec![
            enter_page(),
            response("403 Forbidden", &[], ""),
            enter_page(),
            response(
                "200 OK",
                &[],
                r#"{"verdict": "Accepted", "testCount": "1", "timeConsumed#1": "15", "memoryConsumed#1": "0"}"#,
            ),
        ])?;
        let mut session = server.session()?;
        let id = SubmissionId::from("176856006");

        let refused = adapter().get_status(&mut session, &id);
        assert_matches!(refused => Err(RemoteError::VerdictUnavailable(_)));
        assert_eq!(session.token(), None);

        let verdict = adapter().get_status(&mut session, &id)?;
        assert_eq!(verdict.status(), Verdict::Accepted);
        assert!(verdict.is_terminal());

        let requests = server.requests();
        assert_eq!(requests.len(), 4);
        assert!(requests[0].starts_with("GET /\n"));
        assert!(requests[1].starts_with("POST /data/submitSource\n"));
        assert!(requests[1].contains("submissionId=176856006"));
        assert!(requests[2].starts_with("GET /\n"));
        Ok(())
    }
}
