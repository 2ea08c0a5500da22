//! Fetching solution code and problem descriptions

use std::collections::HashMap;

use leetsync_judge::{JudgeApi, ProblemContent, Submission};

use crate::Result;
use crate::config::LockedContentPolicy;
use crate::retry::RetryPolicy;

/// Everything needed to write a submission's files.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContent {
    pub code: String,
    /// `None` when the description is unavailable and the policy allows
    /// a placeholder
    pub problem: Option<ProblemContent>,
    pub runtime_percentile: Option<f64>,
    pub memory_percentile: Option<f64>,
    /// Numeric problem id, from the listing, the detail or the problem query
    pub problem_id: Option<String>,
}

/// Outcome of resolving one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedContent),
    /// Content the judge no longer serves; the submission is skipped
    Unavailable { reason: String },
}

/// Resolves code and descriptions, caching descriptions per problem.
pub struct ContentResolver<'a, J> {
    judge: &'a J,
    retry: &'a RetryPolicy,
    policy: LockedContentPolicy,
    problems: HashMap<String, Option<ProblemContent>>,
}

impl<'a, J: JudgeApi> ContentResolver<'a, J> {
    pub fn new(judge: &'a J, retry: &'a RetryPolicy, policy: LockedContentPolicy) -> Self {
        Self {
            judge,
            retry,
            policy,
            problems: HashMap::new(),
        }
    }

    /// Fetch code and description for `submission`.
    ///
    /// Transient failures are retried; an empty payload from either query
    /// yields [`Resolution::Unavailable`]. Missing code always makes the
    /// submission unavailable, a missing description only under
    /// [`LockedContentPolicy::Skip`].
    pub fn resolve(&mut self, submission: &Submission) -> Result<Resolution> {
        let detail = self.retry.retry("fetch submission detail", || {
            self.judge.submission_detail(&submission.id)
        })?;
        let Some(detail) = detail else {
            return Ok(Resolution::Unavailable {
                reason: "solution code is not accessible".to_string(),
            });
        };

        let problem = self.problem(&submission.title_slug)?;
        if problem.is_none() && self.policy == LockedContentPolicy::Skip {
            return Ok(Resolution::Unavailable {
                reason: "problem description is not accessible".to_string(),
            });
        }

        let problem_id = submission
            .problem_id
            .clone()
            .or(detail.problem_id)
            .or_else(|| problem.as_ref().and_then(|p| p.frontend_id.clone()));

        Ok(Resolution::Resolved(ResolvedContent {
            code: detail.code,
            problem,
            runtime_percentile: detail.runtime_percentile,
            memory_percentile: detail.memory_percentile,
            problem_id,
        }))
    }

    fn problem(&mut self, slug: &str) -> Result<Option<ProblemContent>> {
        if let Some(cached) = self.problems.get(slug) {
            return Ok(cached.clone());
        }
        let fetched = self
            .retry
            .retry("fetch problem", || self.judge.problem(slug))?;
        self.problems.insert(slug.to_string(), fetched.clone());
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leetsync_test_utils::judge::{FakeJudge, Query, accepted};

    fn judge() -> FakeJudge {
        FakeJudge::new()
            .with_submission(accepted("1", "Two Sum", "python3", 100), "print(1)")
            .with_submission(accepted("2", "Two Sum", "cpp", 200), "int main;")
            .with_submission(accepted("3", "Locked One", "python3", 300), "pass")
            .with_problem("two-sum", "1", "Two Sum", "<p>sum</p>")
    }

    #[test]
    fn resolves_code_description_and_problem_id() {
        let judge = judge();
        let retry = RetryPolicy::immediate(1);
        let mut resolver = ContentResolver::new(&judge, &retry, LockedContentPolicy::Skip);

        let Resolution::Resolved(content) = resolver
            .resolve(&accepted("1", "Two Sum", "python3", 100))
            .unwrap()
        else {
            panic!("expected content");
        };
        assert_eq!(content.code, "print(1)");
        assert_eq!(content.problem_id.as_deref(), Some("1"));
        assert_eq!(content.runtime_percentile, Some(87.3));
    }

    #[test]
    fn caches_problem_per_slug() {
        let judge = judge();
        let retry = RetryPolicy::immediate(1);
        let mut resolver = ContentResolver::new(&judge, &retry, LockedContentPolicy::Skip);

        resolver.resolve(&accepted("1", "Two Sum", "python3", 100)).unwrap();
        resolver.resolve(&accepted("2", "Two Sum", "cpp", 200)).unwrap();

        let problem_calls = judge.calls().iter().filter(|c| c.starts_with("problem(")).count();
        assert_eq!(problem_calls, 1);
    }

    #[test]
    fn locked_problem_is_unavailable_under_skip() {
        let judge = judge();
        let retry = RetryPolicy::immediate(1);
        let mut resolver = ContentResolver::new(&judge, &retry, LockedContentPolicy::Skip);

        let resolution = resolver.resolve(&accepted("3", "Locked One", "python3", 300)).unwrap();
        assert!(matches!(resolution, Resolution::Unavailable { .. }));
    }

    #[test]
    fn locked_problem_resolves_under_placeholder() {
        let judge = judge();
        let retry = RetryPolicy::immediate(1);
        let mut resolver = ContentResolver::new(&judge, &retry, LockedContentPolicy::Placeholder);

        let Resolution::Resolved(content) = resolver
            .resolve(&accepted("3", "Locked One", "python3", 300))
            .unwrap()
        else {
            panic!("expected content");
        };
        assert_eq!(content.problem, None);
        assert_eq!(content.problem_id, None);
    }

    #[test]
    fn withheld_code_is_unavailable_regardless_of_policy() {
        let judge = judge().withhold_code("1");
        let retry = RetryPolicy::immediate(1);
        let mut resolver = ContentResolver::new(&judge, &retry, LockedContentPolicy::Placeholder);

        let resolution = resolver.resolve(&accepted("1", "Two Sum", "python3", 100)).unwrap();
        assert_eq!(
            resolution,
            Resolution::Unavailable {
                reason: "solution code is not accessible".into()
            }
        );
    }

    #[test]
    fn transient_detail_failures_are_retried() {
        let judge = judge().fail_transiently(Query::Detail, 2);
        let retry = RetryPolicy::immediate(3);
        let mut resolver = ContentResolver::new(&judge, &retry, LockedContentPolicy::Skip);

        let resolution = resolver.resolve(&accepted("1", "Two Sum", "python3", 100)).unwrap();
        assert!(matches!(resolution, Resolution::Resolved(_)));
    }
}
