//! Data returned by the judge

/// Status label the judge attaches to a successful submission.
pub const ACCEPTED: &str = "Accepted";

/// One submission event as reported by the judge's submission list.
///
/// Immutable once fetched. `problem_id` is usually absent from the list
/// query and gets resolved lazily from the detail or problem queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Platform-assigned submission identifier
    pub id: String,

    /// Human-readable problem title, e.g. "Two Sum"
    pub title: String,

    /// URL slug of the problem, e.g. "two-sum"
    pub title_slug: String,

    /// Status label, e.g. "Accepted" or "Wrong Answer"
    pub status: String,

    /// Language tag, e.g. "python3"
    pub lang: String,

    /// Execution-time metric as displayed by the judge, e.g. "52 ms"
    pub runtime: String,

    /// Memory metric as displayed by the judge, e.g. "17.2 MB"
    pub memory: String,

    /// Acceptance time in seconds since the Unix epoch
    pub timestamp: i64,

    /// Numeric problem identifier, when known
    pub problem_id: Option<String>,
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        self.status == ACCEPTED
    }
}

/// One page of the paginated submission list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionPage {
    pub submissions: Vec<Submission>,
    pub has_next: bool,
}

/// Per-submission detail: source code and percentile metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionDetail {
    pub code: String,
    pub runtime_percentile: Option<f64>,
    pub memory_percentile: Option<f64>,
    /// Frontend (display) problem number, e.g. "1"
    pub problem_id: Option<String>,
}

/// Descriptive content of a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemContent {
    pub frontend_id: Option<String>,
    pub title: String,
    /// Problem statement (HTML as served by the judge)
    pub content: String,
    pub difficulty: Option<String>,
}
