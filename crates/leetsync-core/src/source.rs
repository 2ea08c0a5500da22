//! Paginated retrieval of accepted submissions

use std::collections::VecDeque;
use std::time::Duration;

use leetsync_judge::{JudgeApi, Submission};

use crate::Result;
use crate::marker::SyncMarker;
use crate::retry::RetryPolicy;

/// Pages through the judge's submission list, newest first.
pub struct SubmissionSource<'a, J> {
    judge: &'a J,
    retry: &'a RetryPolicy,
    page_size: usize,
    page_delay: Duration,
}

impl<'a, J: JudgeApi> SubmissionSource<'a, J> {
    pub fn new(
        judge: &'a J,
        retry: &'a RetryPolicy,
        page_size: usize,
        page_delay: Duration,
    ) -> Self {
        Self {
            judge,
            retry,
            page_size: page_size.max(1),
            page_delay,
        }
    }

    /// Lazily yield accepted submissions, newest first.
    ///
    /// Paging stops when the judge reports no further pages, returns an
    /// empty page, or serves a page that reaches back to `since`. Older
    /// submissions cannot be new, so there is no point fetching them.
    /// A page that still fails after the retry budget ends the sequence
    /// with an error; nothing after it is yielded.
    pub fn fetch_accepted(&self, since: &SyncMarker) -> AcceptedSubmissions<'_, 'a, J> {
        AcceptedSubmissions {
            source: self,
            since: since.clone(),
            offset: 0,
            pages: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }
}

/// Iterator returned by [`SubmissionSource::fetch_accepted`].
pub struct AcceptedSubmissions<'s, 'a, J> {
    source: &'s SubmissionSource<'a, J>,
    since: SyncMarker,
    offset: usize,
    pages: usize,
    buffer: VecDeque<Submission>,
    exhausted: bool,
}

impl<J: JudgeApi> AcceptedSubmissions<'_, '_, J> {
    fn fetch_page(&mut self) -> Result<()> {
        let source = self.source;
        if self.pages > 0 && !source.page_delay.is_zero() {
            std::thread::sleep(source.page_delay);
        }

        let offset = self.offset;
        let page = source.retry.retry("fetch submission page", || {
            source.judge.submissions(offset, source.page_size)
        })?;
        self.pages += 1;

        let fetched = page.submissions.len();
        let reached_marker =
            !self.since.is_epoch() && page.submissions.iter().any(|s| self.since.covers(s));
        tracing::debug!(offset, fetched, has_next = page.has_next, "fetched submission page");

        self.offset += fetched;
        self.exhausted = fetched == 0 || !page.has_next || reached_marker;
        self.buffer
            .extend(page.submissions.into_iter().filter(Submission::is_accepted));
        Ok(())
    }
}

impl<J: JudgeApi> Iterator for AcceptedSubmissions<'_, '_, J> {
    type Item = Result<Submission>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(submission) = self.buffer.pop_front() {
                return Some(Ok(submission));
            }
            if self.exhausted {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
    }
}
