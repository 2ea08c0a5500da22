//! Files written for one synced submission

use leetsync_git::TreeEntry;
use leetsync_judge::{ProblemContent, Submission};

use crate::naming::Identity;

const PROBLEM_URL_BASE: &str = "https://leetcode.com/problems";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Problem description, written once per folder
    Description,
    /// One accepted solution, always a new file
    Solution,
}

/// A file to add to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionArtifact {
    pub kind: ArtifactKind,
    pub folder: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

impl SolutionArtifact {
    pub fn description(identity: &Identity, content: String) -> Self {
        Self {
            kind: ArtifactKind::Description,
            folder: identity.folder.clone(),
            file_name: crate::naming::DESCRIPTION_FILE.to_string(),
            content: content.into_bytes(),
        }
    }

    pub fn solution(identity: &Identity, code: &str) -> Self {
        let mut content = code.as_bytes().to_vec();
        if !content.ends_with(b"\n") {
            content.push(b'\n');
        }
        Self {
            kind: ArtifactKind::Solution,
            folder: identity.folder.clone(),
            file_name: identity.file_name(),
            content,
        }
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.folder, self.file_name)
    }

    pub fn to_tree_entry(&self) -> TreeEntry {
        TreeEntry::file(self.path(), self.content.clone())
    }
}

/// Render the README for a problem folder.
///
/// Without `problem` (content withheld by the judge) a placeholder body is
/// written instead of the statement.
pub fn render_description(submission: &Submission, problem: Option<&ProblemContent>) -> String {
    let title = problem.map(|p| p.title.as_str()).unwrap_or(&submission.title);
    let heading = match problem.and_then(|p| p.frontend_id.as_deref()) {
        Some(id) => format!("# {id}. {title}"),
        None => format!("# {title}"),
    };

    let mut out = heading;
    out.push_str("\n\n");

    if let Some(difficulty) = problem.and_then(|p| p.difficulty.as_deref()) {
        out.push_str(&format!("**Difficulty:** {difficulty}\n\n"));
    }

    match problem {
        Some(p) => {
            out.push_str(p.content.trim());
            out.push('\n');
        }
        None => out.push_str(
            "_The problem statement is not available. It may require a subscription \
             or have been removed._\n",
        ),
    }

    out.push_str(&format!(
        "\n---\n\nSource: {PROBLEM_URL_BASE}/{}/\n",
        submission.title_slug
    ));
    out
}
