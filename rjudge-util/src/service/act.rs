use crate::error::RemoteResult;
use crate::model::{LangIdRef, ProblemRef, SubmissionId};

/// An account on a remote judge that can submit code.
pub trait Act: Send {
    fn handle(&self) -> &str;

    fn ensure_logged_in(&mut self) -> RemoteResult<()>;

    fn submit(
        &mut self,
        problem: &ProblemRef,
        lang_id: LangIdRef,
        source: &str,
    ) -> RemoteResult<SubmissionId>;

    /// Forgets the session so that the next `ensure_logged_in` logs in again.
    fn invalidate(&mut self);
}
