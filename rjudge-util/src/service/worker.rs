use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context as _;
use retry::{delay, retry, OperationResult};
use tracing::{debug, info, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::model::{LangId, ProblemRef, SubmissionId};
use crate::service::Act;
use crate::Result;

pub type Callback = Box<dyn FnOnce(RemoteResult<SubmissionId>) + Send>;

/// Source code waiting to be submitted, with the callback that receives the outcome.
pub struct SubmissionJob {
    source: String,
    problem_ref: String,
    lang_id: LangId,
    callback: Callback,
}

impl SubmissionJob {
    pub fn new(
        source: impl Into<String>,
        problem_ref: impl Into<String>,
        lang_id: impl Into<LangId>,
        callback: impl FnOnce(RemoteResult<SubmissionId>) + Send + 'static,
    ) -> Self {
        Self {
            source: source.into(),
            problem_ref: problem_ref.into(),
            lang_id: lang_id.into(),
            callback: Box::new(callback),
        }
    }

    pub fn problem_ref(&self) -> &str {
        &self.problem_ref
    }

    fn finish(self, result: RemoteResult<SubmissionId>) {
        (self.callback)(result)
    }
}

impl fmt::Debug for SubmissionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionJob")
            .field("problem_ref", &self.problem_ref)
            .field("lang_id", &self.lang_id)
            .field("source_len", &self.source.len())
            .finish()
    }
}

/// How many times a submit is attempted when the remote judge cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitPolicy {
    pub attempts: usize,
    pub interval: Duration,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            interval: Duration::from_secs(1),
        }
    }
}

/// Background thread that submits the jobs of one account in order.
///
/// Once the remote judge refuses the credentials at login, the worker is
/// disabled: its jobs fail without contacting the remote judge again.
pub struct Worker {
    handle: String,
    sender: Option<Sender<SubmissionJob>>,
    pending: Arc<AtomicUsize>,
    disabled: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn<A: Act + 'static>(actor: A, policy: SubmitPolicy) -> Result<Self> {
        let handle = actor.handle().to_owned();
        let (sender, receiver) = mpsc::channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let disabled = Arc::new(AtomicBool::new(false));
        let thread = {
            let pending = Arc::clone(&pending);
            let disabled = Arc::clone(&disabled);
            thread::Builder::new()
                .name(format!("worker-{}", handle))
                .spawn(move || drain(actor, policy, receiver, &pending, &disabled))
                .with_context(|| format!("Could not spawn worker for {}", handle))?
        };
        Ok(Self {
            handle,
            sender: Some(sender),
            pending,
            disabled,
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Number of jobs queued or in progress.
    pub fn depth(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// True once the credentials of this worker were refused.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    pub fn push(&self, job: SubmissionJob) {
        debug!("Queueing {} on {}", job.problem_ref(), self.handle);
        self.pending.fetch_add(1, Ordering::SeqCst);
        let sent = match &self.sender {
            Some(sender) => sender.send(job),
            None => Err(SendError(job)),
        };
        if let Err(SendError(job)) = sent {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            let message = format!("Worker for {} is stopped", self.handle);
            job.finish(Err(RemoteError::Protocol(message)));
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // closing the queue lets the thread finish the remaining jobs and exit
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Worker for {} panicked", self.handle);
            }
        }
    }
}

fn drain<A: Act>(
    mut actor: A,
    policy: SubmitPolicy,
    receiver: Receiver<SubmissionJob>,
    pending: &AtomicUsize,
    disabled: &AtomicBool,
) {
    let finish = |job: SubmissionJob, result: RemoteResult<SubmissionId>| {
        job.finish(result);
        pending.fetch_sub(1, Ordering::SeqCst);
    };
    while let Ok(job) = receiver.recv() {
        if disabled.load(Ordering::SeqCst) {
            let message = format!("Credentials of {} were rejected earlier", actor.handle());
            finish(job, Err(RemoteError::Authentication(message)));
            continue;
        }

        let login_failure = match login(&mut actor) {
            Ok(login_failure) => login_failure,
            Err(message) => {
                warn!("Disabling {}, credentials were rejected : {}", actor.handle(), message);
                disabled.store(true, Ordering::SeqCst);
                actor.invalidate();
                fail_with_queued(job, &receiver, &message, &finish);
                continue;
            }
        };

        match process(&mut actor, policy, &job, login_failure) {
            Err(RemoteError::Authentication(message)) => {
                // stale session, the next job logs in again
                warn!("Session of {} went stale : {}", actor.handle(), message);
                actor.invalidate();
                fail_with_queued(job, &receiver, &message, &finish);
            }
            result => {
                match &result {
                    Ok(id) => info!("Submitted {} as {}", job.problem_ref(), id),
                    Err(err) => warn!("Could not submit {} : {}", job.problem_ref(), err),
                }
                finish(job, result);
            }
        }
    }
    debug!("Worker for {} stopped", actor.handle());
}

/// Fails `job` and every job queued behind it with an authentication error.
fn fail_with_queued(
    job: SubmissionJob,
    receiver: &Receiver<SubmissionJob>,
    message: &str,
    finish: &impl Fn(SubmissionJob, RemoteResult<SubmissionId>),
) {
    finish(job, Err(RemoteError::Authentication(message.to_owned())));
    for queued in receiver.try_iter() {
        finish(queued, Err(RemoteError::Authentication(message.to_owned())));
    }
}

fn process<A: Act>(
    actor: &mut A,
    policy: SubmitPolicy,
    job: &SubmissionJob,
    login_failure: Option<RemoteError>,
) -> RemoteResult<SubmissionId> {
    let problem = ProblemRef::parse(&job.problem_ref).ok_or_else(|| {
        RemoteError::Parse(format!("Invalid problem reference : {}", job.problem_ref))
    })?;

    let interval = policy.interval.as_millis() as u64;
    let durations = delay::Fixed::from_millis(interval).take(policy.attempts.saturating_sub(1));
    let result = retry(durations, || {
        match actor.submit(&problem, &job.lang_id, &job.source) {
            Ok(id) => OperationResult::Ok(id),
            Err(err) if err.is_transient() => {
                warn!("{}, retrying submit of {}", err, problem);
                OperationResult::Retry(err)
            }
            Err(err) => OperationResult::Err(err),
        }
    });
    match (result.map_err(RemoteError::from), login_failure) {
        // a submit without a session only reports the missing token
        (Err(RemoteError::Protocol(message)), Some(cause)) => {
            debug!("Submit of {} failed after login failure : {}", problem, message);
            Err(cause)
        }
        (result, _) => result,
    }
}

/// Returns the message of the refusal when the credentials are rejected.
/// Other login failures are swallowed and handed back so a failing submit can
/// report them.
fn login<A: Act>(actor: &mut A) -> std::result::Result<Option<RemoteError>, String> {
    match actor.ensure_logged_in() {
        Ok(()) => Ok(None),
        Err(RemoteError::Authentication(message)) => Err(message),
        Err(err) => {
            warn!("Could not log in as {} : {}", actor.handle(), err);
            actor.invalidate();
            Ok(Some(err))
        }
    }
}
