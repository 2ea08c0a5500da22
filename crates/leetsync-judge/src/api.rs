//! Judge query trait

use crate::Result;
use crate::models::{ProblemContent, SubmissionDetail, SubmissionPage};

/// Read-only queries against a coding judge.
///
/// Each method is a single blocking request-response. Implementations do
/// not retry; callers wrap calls in their own retry policy and use
/// [`crate::Error::is_transient`] to decide what is worth retrying.
pub trait JudgeApi {
    /// Fetch one page of the submission list, newest first.
    fn submissions(&self, offset: usize, limit: usize) -> Result<SubmissionPage>;

    /// Fetch code and metrics for one submission.
    ///
    /// Returns `Ok(None)` when the judge answers with an empty payload,
    /// which happens once a problem has become inaccessible.
    fn submission_detail(&self, submission_id: &str) -> Result<Option<SubmissionDetail>>;

    /// Fetch the description of a problem by slug.
    ///
    /// Returns `Ok(None)` for locked or removed problems.
    fn problem(&self, title_slug: &str) -> Result<Option<ProblemContent>>;
}

impl<T: JudgeApi + ?Sized> JudgeApi for &T {
    fn submissions(&self, offset: usize, limit: usize) -> Result<SubmissionPage> {
        (**self).submissions(offset, limit)
    }

    fn submission_detail(&self, submission_id: &str) -> Result<Option<SubmissionDetail>> {
        (**self).submission_detail(submission_id)
    }

    fn problem(&self, title_slug: &str) -> Result<Option<ProblemContent>> {
        (**self).problem(title_slug)
    }
}
