//! Waiting for a pending build in the background.

use std::fmt::Display;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use super::{CommandRequest, Decision, MergeOutcome, Orchestrator, PendingClaim, decide, responses};
use crate::build::BuildTrigger;
use crate::effects::{GitHubInterpreter, GitInterpreter, PrData};
use crate::status::{CheckPolicy, Verdict};
use crate::types::PrNumber;

/// How a background wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The build went green and a merge was attempted.
    Completed(MergeOutcome),
    BadBuild(Verdict),
    TimedOut,
}

/// Join point for a background wait.
///
/// Dropping the handle detaches the task; it still runs to completion.
#[derive(Debug)]
pub struct WaitHandle {
    pr: PrNumber,
    task: JoinHandle<WaitOutcome>,
}

impl WaitHandle {
    pub fn pr(&self) -> PrNumber {
        self.pr
    }

    /// Waits for the task to finish.
    pub async fn join(self) -> Result<WaitOutcome, JoinError> {
        self.task.await
    }
}

impl<G, M, B> Orchestrator<G, M, B>
where
    G: GitHubInterpreter + Send + Sync + 'static,
    G::Error: Display,
    M: GitInterpreter + Send + Sync + 'static,
    M::Error: Display,
    B: BuildTrigger + Send + Sync + 'static,
{
    /// Spawns the waiting task. It owns `claim` and releases it however it
    /// ends.
    pub(super) fn spawn_wait(
        &self,
        request: CommandRequest,
        pr: PrData,
        policy: CheckPolicy,
        claim: PendingClaim,
    ) -> WaitHandle {
        let this = self.clone();
        let number = request.pr;
        let task = tokio::spawn(async move {
            let _claim = claim;
            this.wait_for_build(request, pr, policy).await
        });
        WaitHandle { pr: number, task }
    }

    async fn wait_for_build(
        &self,
        request: CommandRequest,
        pr: PrData,
        policy: CheckPolicy,
    ) -> WaitOutcome {
        let config = self.inner.config.wait;
        let started = Instant::now();
        let mut interval = config.initial_interval;

        while started.elapsed() < config.ceiling {
            sleep(interval).await;
            let verdict = self.current_verdict(&request.repo, &pr, &policy).await;
            debug!(
                pr = %request.pr,
                verdict = %verdict,
                waited_secs = started.elapsed().as_secs(),
                "re-checked build status"
            );
            match decide(verdict) {
                Decision::MergeNow => {
                    return WaitOutcome::Completed(self.perform_merge(&request, &pr).await);
                }
                Decision::ReportBad(verdict) => {
                    self.post(&request.repo, request.pr, responses::bad_build(verdict))
                        .await;
                    return WaitOutcome::BadBuild(verdict);
                }
                Decision::Wait => {}
            }
            interval += config.step;
        }

        info!(pr = %request.pr, "gave up waiting for the build");
        self.post(&request.repo, request.pr, responses::timed_out(config.ceiling))
            .await;
        WaitOutcome::TimedOut
    }
}
