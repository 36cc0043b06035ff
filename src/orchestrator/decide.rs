//! The one decision both `merge` and a threshold-reaching `lgtm` go through.

use crate::status::Verdict;

/// What to do with a PR given its current build verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    MergeNow,
    /// Keep polling until the verdict settles or the wait ceiling passes.
    Wait,
    /// Refuse, reporting the bad verdict.
    ReportBad(Verdict),
}

pub fn decide(verdict: Verdict) -> Decision {
    match verdict {
        Verdict::Success => Decision::MergeNow,
        Verdict::Pending => Decision::Wait,
        Verdict::Error | Verdict::Failure => Decision::ReportBad(verdict),
    }
}
