#![warn(clippy::all)]

use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context as _};
use reqwest::blocking::Client;
use tracing::{debug, info};

use rjudge_config::{CodeforcesConfig, Config, SessionConfig};
use rjudge_util::error::{RemoteError, RemoteResult};
use rjudge_util::model::{NormalizedVerdict, ProblemStatement, SubmissionId};
use rjudge_util::service::{
    AccountPool, CookieStorage, Session, SubmissionJob, SubmitPolicy, Worker,
};

mod account;
mod adapter;
pub mod page;
mod render;
pub mod status;
#[cfg(test)]
mod stub;

pub use account::CodeforcesAccount;
pub use adapter::Adapter;

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

/// Entry point of the codeforces integration.
///
/// Submissions are spread over the configured accounts. Problems and
/// statuses are read through a separate anonymous session.
pub struct Codeforces {
    pool: Option<AccountPool>,
    reader: Mutex<Session>,
    adapter: Adapter,
    poll_interval: Duration,
    max_polls: usize,
}

impl Codeforces {
    pub fn new(config: &Config) -> Result<Self> {
        let session_conf = config.session();
        let conf = config.codeforces();
        let client = session_conf
            .client_builder()
            .build()
            .context("Could not setup client")?;
        let adapter = Adapter::new(conf);

        let pool = if conf.accounts().is_empty() {
            None
        } else {
            let policy = SubmitPolicy {
                attempts: conf.submit_attempts(),
                interval: conf.submit_retry_interval(),
            };
            let workers = conf
                .accounts()
                .iter()
                .map(|credential| {
                    let cookies = session_conf.open_cookie_storage(credential.handle())?;
                    let session = build_session(&client, conf, session_conf, cookies);
                    let account = CodeforcesAccount::new(credential.clone(), session, adapter.clone());
                    Worker::spawn(account, policy)
                })
                .collect::<Result<Vec<_>>>()?;
            let pool = AccountPool::new(workers)?;
            info!("Started workers for {} accounts", pool.len());
            Some(pool)
        };

        let reader = build_session(&client, conf, session_conf, CookieStorage::in_memory());
        Ok(Self {
            pool,
            reader: Mutex::new(reader),
            adapter,
            poll_interval: conf.poll_interval(),
            max_polls: conf.max_polls(),
        })
    }

    /// Queues `source` for submission. `callback` receives the submission id
    /// once the submission is confirmed, or the error that stopped it.
    ///
    /// Returns the handle of the account the job was given to.
    pub fn submit_code(
        &self,
        source: impl Into<String>,
        problem_ref: impl Into<String>,
        lang_id: impl Into<String>,
        callback: impl FnOnce(RemoteResult<SubmissionId>) + Send + 'static,
    ) -> Result<&str> {
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| anyhow!("Could not submit : no codeforces account is configured"))?;
        let job = SubmissionJob::new(source, problem_ref, lang_id, callback);
        Ok(pool.submit(job))
    }

    pub fn get_problem(&self, problem_ref: &str) -> RemoteResult<Option<ProblemStatement>> {
        self.adapter.fetch_problem(&mut *self.lock_reader()?, problem_ref)
    }

    pub fn get_submission_status(&self, id: &SubmissionId) -> RemoteResult<NormalizedVerdict> {
        self.adapter.get_status(&mut *self.lock_reader()?, id)
    }

    /// Polls the status of `id` until it is terminal.
    pub fn wait_verdict(
        &self,
        id: &SubmissionId,
        mut on_poll: impl FnMut(&NormalizedVerdict),
    ) -> RemoteResult<NormalizedVerdict> {
        let mut last_err = None;
        for i in 0..self.max_polls {
            if i > 0 {
                thread::sleep(self.poll_interval);
            }
            match self.get_submission_status(id) {
                Ok(verdict) if verdict.is_terminal() => return Ok(verdict),
                Ok(verdict) => {
                    debug!("Submission {} is still judging : {}", id, verdict.info());
                    on_poll(&verdict);
                }
                // the verdict can lag behind a fresh submission
                Err(RemoteError::VerdictUnavailable(message)) => {
                    debug!("Verdict of {} is not available : {}", id, message);
                    last_err = Some(message);
                }
                Err(err) => return Err(err),
            }
        }
        info!("Gave up waiting for {} after {} polls", id, self.max_polls);
        Err(RemoteError::VerdictUnavailable(last_err.unwrap_or_else(|| {
            format!("Still judging after {} polls", self.max_polls)
        })))
    }

    pub fn accounts_depths(&self) -> Vec<usize> {
        self.pool.as_ref().map(AccountPool::depths).unwrap_or_default()
    }

    fn lock_reader(&self) -> RemoteResult<MutexGuard<Session>> {
        self.reader
            .lock()
            .map_err(|_| RemoteError::Protocol("Reader session was poisoned".into()))
    }
}

fn build_session(
    client: &Client,
    conf: &CodeforcesConfig,
    session_conf: &SessionConfig,
    cookies: CookieStorage,
) -> Session {
    Session::new(
        client.clone(),
        conf.base_url().clone(),
        cookies,
        page::extract_csrf_token,
    )
    .with_retry(session_conf.retry_limit(), session_conf.retry_interval())
}
