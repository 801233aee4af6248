use rjudge_util::error::RemoteResult;
use rjudge_util::model::{Credential, LangIdRef, ProblemRef, SubmissionId};
use rjudge_util::service::{Act, Session};

use crate::adapter::Adapter;
use crate::page::IDENTITY_COOKIE;

/// One pooled codeforces account and the session it owns.
pub struct CodeforcesAccount {
    credential: Credential,
    session: Session,
    adapter: Adapter,
}

impl CodeforcesAccount {
    pub fn new(credential: Credential, session: Session, adapter: Adapter) -> Self {
        Self {
            credential,
            session,
            adapter,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.has_cookie(IDENTITY_COOKIE) && self.session.token().is_some()
    }
}

impl Act for CodeforcesAccount {
    fn handle(&self) -> &str {
        self.credential.handle()
    }

    fn ensure_logged_in(&mut self) -> RemoteResult<()> {
        if self.is_logged_in() {
            return Ok(());
        }
        self.adapter.login(&mut self.session, &self.credential)
    }

    fn submit(
        &mut self,
        problem: &ProblemRef,
        lang_id: LangIdRef,
        source: &str,
    ) -> RemoteResult<SubmissionId> {
        self.adapter
            .submit(&mut self.session, problem, lang_id, source)
    }

    fn invalidate(&mut self) {
        self.session.reset();
    }
}
