//! In-memory judge for sync engine tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use leetsync_judge::{
    Error, JudgeApi, ProblemContent, Result, Submission, SubmissionDetail, SubmissionPage,
};

/// Which judge query a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Submissions,
    Detail,
    Problem,
}

/// Build an accepted submission with a slug derived from `title`.
pub fn accepted(id: &str, title: &str, lang: &str, timestamp: i64) -> Submission {
    Submission {
        id: id.to_string(),
        title: title.to_string(),
        title_slug: title.to_lowercase().replace(' ', "-"),
        status: "Accepted".to_string(),
        lang: lang.to_string(),
        runtime: "52 ms".to_string(),
        memory: "17.2 MB".to_string(),
        timestamp,
        problem_id: None,
    }
}

/// A judge backed by plain collections.
///
/// Submissions are served newest first, as the real judge does. Every
/// query is recorded so tests can assert on request patterns, and each
/// query kind can be scripted to fail transiently a number of times.
#[derive(Default)]
pub struct FakeJudge {
    submissions: Vec<Submission>,
    code: HashMap<String, String>,
    problems: HashMap<String, ProblemContent>,
    withheld_code: HashSet<String>,
    transient_failures: RefCell<HashMap<Query, u32>>,
    permanent_failures: HashSet<Query>,
    broken_problems: HashSet<String>,
    calls: RefCell<Vec<String>>,
    page_requests: Cell<usize>,
}

impl FakeJudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a submission with its source code.
    pub fn with_submission(mut self, submission: Submission, code: &str) -> Self {
        self.code.insert(submission.id.clone(), code.to_string());
        self.submissions.push(submission);
        self.submissions
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        self
    }

    /// Register a problem description under `slug`.
    pub fn with_problem(
        mut self,
        slug: &str,
        frontend_id: &str,
        title: &str,
        content: &str,
    ) -> Self {
        self.problems.insert(
            slug.to_string(),
            ProblemContent {
                frontend_id: Some(frontend_id.to_string()),
                title: title.to_string(),
                content: content.to_string(),
                difficulty: Some("Easy".to_string()),
            },
        );
        self
    }

    /// Make the detail query for `submission_id` answer with no payload.
    pub fn withhold_code(mut self, submission_id: &str) -> Self {
        self.withheld_code.insert(submission_id.to_string());
        self
    }

    /// Fail the next `times` calls of `query` with HTTP 503.
    pub fn fail_transiently(self, query: Query, times: u32) -> Self {
        self.transient_failures.borrow_mut().insert(query, times);
        self
    }

    /// Fail every call of `query` with a schema error.
    pub fn fail_permanently(mut self, query: Query) -> Self {
        self.permanent_failures.insert(query);
        self
    }

    /// Answer the problem query for `slug` with a schema error.
    pub fn break_problem(mut self, slug: &str) -> Self {
        self.broken_problems.insert(slug.to_string());
        self
    }

    /// Every query issued so far, e.g. `"submissions(0, 20)"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of submission-list pages requested (including failed attempts).
    pub fn page_requests(&self) -> usize {
        self.page_requests.get()
    }

    fn record(&self, query: Query, call: String) -> Result<()> {
        self.calls.borrow_mut().push(call);

        if self.permanent_failures.contains(&query) {
            return Err(Error::schema(format!("scripted failure for {query:?}")));
        }

        let mut failures = self.transient_failures.borrow_mut();
        if let Some(remaining) = failures.get_mut(&query)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(Error::Status {
                status: 503,
                body: "scripted outage".to_string(),
            });
        }
        Ok(())
    }
}

impl JudgeApi for FakeJudge {
    fn submissions(&self, offset: usize, limit: usize) -> Result<SubmissionPage> {
        self.page_requests.set(self.page_requests.get() + 1);
        self.record(Query::Submissions, format!("submissions({offset}, {limit})"))?;

        let page: Vec<Submission> = self
            .submissions
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(SubmissionPage {
            submissions: page,
            has_next: offset + limit < self.submissions.len(),
        })
    }

    fn submission_detail(&self, submission_id: &str) -> Result<Option<SubmissionDetail>> {
        self.record(Query::Detail, format!("detail({submission_id})"))?;

        if self.withheld_code.contains(submission_id) {
            return Ok(None);
        }
        let Some(code) = self.code.get(submission_id) else {
            return Ok(None);
        };
        let problem_id = self
            .submissions
            .iter()
            .find(|s| s.id == submission_id)
            .and_then(|s| self.problems.get(&s.title_slug))
            .and_then(|p| p.frontend_id.clone());

        Ok(Some(SubmissionDetail {
            code: code.clone(),
            runtime_percentile: Some(87.3),
            memory_percentile: Some(45.1),
            problem_id,
        }))
    }

    fn problem(&self, title_slug: &str) -> Result<Option<ProblemContent>> {
        self.record(Query::Problem, format!("problem({title_slug})"))?;
        if self.broken_problems.contains(title_slug) {
            return Err(Error::schema(format!("scripted failure for problem {title_slug}")));
        }
        Ok(self.problems.get(title_slug).cloned())
    }
}
