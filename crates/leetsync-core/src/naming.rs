//! Problem folder names and per-problem solution numbering

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use leetsync_judge::Submission;
use regex::Regex;

use crate::language::extension_for;

/// File name of the per-problem description.
pub const DESCRIPTION_FILE: &str = "README.md";

static SOLUTION_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^solution(?:_(\d+))?\.([A-Za-z0-9]+)$").expect("solution file pattern is valid")
});

/// Normalise a problem title for use in a folder name.
///
/// Lower-cases, turns runs of whitespace, hyphens and underscores into a
/// single `_`, and drops every other non-alphanumeric character.
/// `"Pow(x, n)"` becomes `"powx_n"`.
pub fn normalize_title(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut last_was_separator = true; // Start true to skip leading separators

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if (c.is_whitespace() || c == '-' || c == '_') && !last_was_separator {
            result.push('_');
            last_was_separator = true;
        }
    }

    if result.ends_with('_') {
        result.pop();
    }

    result
}

/// Build the folder name for a problem.
///
/// With `numbered` set the folder is `<id>_<title>` where `<id>` is the
/// numeric problem id zero-padded to four digits. When the problem id is
/// missing or not numeric, `fallback_id` (the submission's own id) takes
/// its place. Without `numbered` the folder is the normalised title alone.
pub fn folder_name(
    problem_id: Option<&str>,
    title: &str,
    fallback_id: &str,
    numbered: bool,
) -> String {
    let normalized = normalize_title(title);
    if !numbered && !normalized.is_empty() {
        return normalized;
    }

    let id = match problem_id.and_then(|id| id.trim().parse::<u64>().ok()) {
        Some(n) => format!("{n:04}"),
        None => match fallback_id.parse::<u64>() {
            Ok(n) => format!("{n:04}"),
            Err(_) => normalize_title(fallback_id),
        },
    };

    if normalized.is_empty() {
        id
    } else {
        format!("{id}_{normalized}")
    }
}

/// Solution numbering state for every problem folder.
///
/// Seeded from the paths already in the target tree so numbering resumes
/// after an interrupted run instead of overwriting earlier files. Keyed by
/// folder and file extension, since the extension is all a file name
/// records about its language.
#[derive(Debug, Clone, Default)]
pub struct SolutionIndex {
    highest: HashMap<(String, String), u32>,
    paths: HashSet<String>,
}

impl SolutionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from repository paths such as `0001_two_sum/solution_2.py`.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut index = Self::new();
        for path in paths {
            index.record(path.as_ref());
        }
        index
    }

    /// Register a path as present.
    ///
    /// A bare `solution.<ext>` counts as index 1.
    pub fn record(&mut self, path: &str) {
        self.paths.insert(path.to_string());

        let Some((folder, file)) = path.split_once('/') else {
            return;
        };
        if file.contains('/') {
            return;
        }
        let Some(caps) = SOLUTION_FILE.captures(file) else {
            return;
        };

        let n = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(1);
        let ext = caps[2].to_string();
        let highest = self.highest.entry((folder.to_string(), ext)).or_insert(0);
        *highest = (*highest).max(n);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Index the next solution for `folder` and `extension` would get.
    pub fn next_index(&self, folder: &str, extension: &str) -> u32 {
        self.highest
            .get(&(folder.to_string(), extension.to_string()))
            .copied()
            .unwrap_or(0)
            + 1
    }

    /// Number of paths known.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Where one submission's solution goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub folder: String,
    pub solution_index: u32,
    pub extension: &'static str,
}

impl Identity {
    pub fn file_name(&self) -> String {
        format!("solution_{}.{}", self.solution_index, self.extension)
    }

    pub fn solution_path(&self) -> String {
        format!("{}/{}", self.folder, self.file_name())
    }

    pub fn description_path(&self) -> String {
        format!("{}/{DESCRIPTION_FILE}", self.folder)
    }
}

/// Assigns folders and solution indices for one run.
#[derive(Debug, Clone)]
pub struct NameResolver {
    numbered: bool,
    index: SolutionIndex,
}

impl NameResolver {
    pub fn new(numbered: bool, index: SolutionIndex) -> Self {
        Self { numbered, index }
    }

    /// Resolve folder and next solution index, and reserve that index.
    ///
    /// `problem_id` overrides the submission's own `problem_id` when the
    /// latter was not part of the listing.
    pub fn resolve_identity(
        &mut self,
        submission: &Submission,
        problem_id: Option<&str>,
    ) -> Identity {
        let problem_id = submission.problem_id.as_deref().or(problem_id);
        let folder = folder_name(problem_id, &submission.title, &submission.id, self.numbered);
        let extension = extension_for(&submission.lang);
        let solution_index = self.index.next_index(&folder, extension);

        let identity = Identity {
            folder,
            solution_index,
            extension,
        };
        self.index.record(&identity.solution_path());
        identity
    }

    /// Claim the description file of `identity`'s folder.
    ///
    /// Returns `true` the first time a folder without a description is
    /// seen; later calls for the same folder return `false`.
    pub fn claim_description(&mut self, identity: &Identity) -> bool {
        let path = identity.description_path();
        if self.index.contains(&path) {
            return false;
        }
        self.index.record(&path);
        true
    }

    pub fn index(&self) -> &SolutionIndex {
        &self.index
    }
}
