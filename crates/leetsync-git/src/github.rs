//! GitHub repository store backed by the git-data REST API

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::store::{BranchTip, CommitRecord, ObjectId, RepositoryStore, TreeEntry, validate_path};
use crate::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Store that mutates a GitHub repository without a local clone.
pub struct GithubStore {
    http: Client,
    api_base: String,
    owner: String,
    repo: String,
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Deserialize)]
struct GitRef {
    object: ShaRef,
}

#[derive(Deserialize)]
struct ShaRef {
    sha: String,
}

#[derive(Deserialize)]
struct GitCommit {
    tree: ShaRef,
}

#[derive(Deserialize)]
struct GitTree {
    tree: Vec<GitTreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct GitTreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct CommitListItem {
    sha: String,
    commit: CommitListDetail,
}

#[derive(Deserialize)]
struct CommitListDetail {
    message: String,
    committer: Option<CommitListPerson>,
}

#[derive(Deserialize)]
struct CommitListPerson {
    date: String,
}

impl GithubStore {
    /// Create a store for `repository` given as `owner/name`.
    pub fn new(token: &str, repository: &str) -> Result<Self> {
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'))
            .ok_or_else(|| Error::RepositoryNotFound {
                repository: repository.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("leetsync"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::schema(format!("token is not a valid header value: {e}")))?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(Error::Client)?;

        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// Point the store at a GitHub Enterprise API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo)
        } else {
            format!(
                "{}/repos/{}/{}/{}",
                self.api_base, self.owner, self.repo, path
            )
        }
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        tracing::debug!(%url, "GitHub request");
        let response = request.send().map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized {
                message: format!("HTTP 401 from {url}"),
            });
        }

        let rate_limited = status == StatusCode::FORBIDDEN
            && response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0");
        if rate_limited {
            return Err(Error::RateLimited {
                url: url.to_string(),
            });
        }

        Err(Error::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body: response.text().unwrap_or_default(),
        })
    }

    fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
        response.json::<T>().map_err(|source| {
            if source.is_decode() {
                Error::schema(format!("{url}: {source}"))
            } else {
                Error::Transport {
                    url: url.to_string(),
                    source,
                }
            }
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self.send(self.http.get(&url), &url)?;
        Self::decode(response, &url)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let url = self.url(path);
        let response = self.send(self.http.post(&url).json(body), &url)?;
        Self::decode(response, &url)
    }

    fn not_found_as_repository(&self, err: Error) -> Error {
        match err {
            Error::Status { status: 404, .. } => Error::RepositoryNotFound {
                repository: self.full_name(),
            },
            other => other,
        }
    }

    fn create_blob(&self, content: &[u8]) -> Result<String> {
        let body = json!({ "content": BASE64.encode(content), "encoding": "base64" });
        let blob: ShaRef = self.post("git/blobs", &body)?;
        Ok(blob.sha)
    }

    fn ref_conflict(branch: &str, expected: Option<&ObjectId>, err: Error) -> Error {
        match err {
            Error::Status {
                status: 409 | 422,
                body,
                ..
            } => Error::RefConflict {
                branch: branch.to_string(),
                expected: expected
                    .map(|id| id.short().to_string())
                    .unwrap_or_else(|| "no branch".into()),
                message: body,
            },
            other => other,
        }
    }
}

impl RepositoryStore for GithubStore {
    fn describe(&self) -> String {
        format!("github:{}", self.full_name())
    }

    fn default_branch(&self) -> Result<String> {
        let info: RepoInfo = self
            .get("")
            .map_err(|e| self.not_found_as_repository(e))?;
        Ok(info.default_branch)
    }

    fn branch_tip(&self, branch: &str) -> Result<Option<BranchTip>> {
        let git_ref: GitRef = match self.get(&format!("git/ref/heads/{branch}")) {
            Ok(r) => r,
            // An empty repository has no refs at all.
            Err(Error::Status { status: 409, .. }) => return Ok(None),
            Err(Error::Status { status: 404, .. }) => {
                // Distinguish a missing branch from a missing repository.
                self.default_branch()?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let commit: GitCommit = self.get(&format!("git/commits/{}", git_ref.object.sha))?;
        Ok(Some(BranchTip {
            commit: ObjectId::new(git_ref.object.sha),
            tree: ObjectId::new(commit.tree.sha),
        }))
    }

    fn list_paths(&self, tree: &ObjectId) -> Result<Vec<String>> {
        let listing: GitTree = self.get(&format!("git/trees/{tree}?recursive=1"))?;
        blob_paths(tree, listing)
    }

    fn history(&self, from: &ObjectId, page: usize, per_page: usize) -> Result<Vec<CommitRecord>> {
        let items: Vec<CommitListItem> = self.get(&format!(
            "commits?sha={from}&per_page={per_page}&page={}",
            page + 1
        ))?;

        items
            .into_iter()
            .map(|item| {
                let time = match item.commit.committer {
                    Some(person) => DateTime::parse_from_rfc3339(&person.date)
                        .map_err(|e| Error::schema(format!("commit {}: {e}", item.sha)))?
                        .timestamp(),
                    None => 0,
                };
                Ok(CommitRecord {
                    id: ObjectId::new(item.sha),
                    message: item.commit.message,
                    time,
                })
            })
            .collect()
    }

    fn create_tree(&self, base: Option<&ObjectId>, entries: &[TreeEntry]) -> Result<ObjectId> {
        let mut tree = Vec::with_capacity(entries.len());
        for entry in entries {
            validate_path(&entry.path)?;
            let item = match std::str::from_utf8(&entry.content) {
                Ok(text) => json!({
                    "path": entry.path,
                    "mode": entry.mode.as_octal(),
                    "type": "blob",
                    "content": text,
                }),
                Err(_) => json!({
                    "path": entry.path,
                    "mode": entry.mode.as_octal(),
                    "type": "blob",
                    "sha": self.create_blob(&entry.content)?,
                }),
            };
            tree.push(item);
        }

        let mut body = json!({ "tree": tree });
        if let Some(base) = base {
            body["base_tree"] = json!(base.as_str());
        }

        let created: ShaRef = self.post("git/trees", &body)?;
        Ok(ObjectId::new(created.sha))
    }

    fn create_commit(
        &self,
        tree: &ObjectId,
        parents: &[ObjectId],
        message: &str,
    ) -> Result<ObjectId> {
        let parents: Vec<&str> = parents.iter().map(ObjectId::as_str).collect();
        let body = json!({ "message": message, "tree": tree.as_str(), "parents": parents });
        let created: ShaRef = self.post("git/commits", &body)?;
        Ok(ObjectId::new(created.sha))
    }

    fn update_branch(
        &self,
        branch: &str,
        new: &ObjectId,
        expected: Option<&ObjectId>,
        force: bool,
    ) -> Result<()> {
        // GitHub has no compare-and-swap on refs. A non-forced update is
        // rejected unless it fast-forwards, and every commit built by the
        // sync engine has `expected` as its only parent. The ref is re-read
        // first so a rewind to an ancestor of `expected` is not fast-forwarded
        // over; a rewind landing between the read and the patch still is.
        if !force
            && let Some(expected) = expected
        {
            let current: GitRef = self
                .get(&format!("git/ref/heads/{branch}"))
                .map_err(|e| match e {
                    Error::Status { status: 404, .. } => Error::RefConflict {
                        branch: branch.to_string(),
                        expected: expected.short().to_string(),
                        message: "branch no longer exists".into(),
                    },
                    other => other,
                })?;
            check_expected(branch, expected, &current.object.sha)?;
        }

        let result = match expected {
            None if !force => {
                let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": new.as_str() });
                self.post::<Value>("git/refs", &body).map(|_| ())
            }
            _ => {
                let url = self.url(&format!("git/refs/heads/{branch}"));
                let body = json!({ "sha": new.as_str(), "force": force });
                self.send(self.http.patch(&url).json(&body), &url).map(|_| ())
            }
        };

        result.map_err(|e| Self::ref_conflict(branch, expected, e))
    }
}

fn check_expected(branch: &str, expected: &ObjectId, current: &str) -> Result<()> {
    if current == expected.as_str() {
        return Ok(());
    }
    Err(Error::RefConflict {
        branch: branch.to_string(),
        expected: expected.short().to_string(),
        message: format!("branch is at {}", ObjectId::new(current).short()),
    })
}

/// File paths of a recursive tree listing. A truncated listing would
/// seed solution indices from a partial view, so it is refused.
fn blob_paths(tree: &ObjectId, listing: GitTree) -> Result<Vec<String>> {
    if listing.truncated {
        return Err(Error::schema(format!(
            "tree {tree} is too large for a recursive listing ({} entries returned)",
            listing.tree.len()
        )));
    }
    Ok(listing
        .tree
        .into_iter()
        .filter(|item| item.kind == "blob")
        .map(|item| item.path)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_repository() {
        let store = GithubStore::new("token", "octo/solutions").unwrap();
        assert_eq!(store.full_name(), "octo/solutions");
        assert_eq!(store.describe(), "github:octo/solutions");
        assert_eq!(
            store.url("git/trees"),
            "https://api.github.com/repos/octo/solutions/git/trees"
        );
        assert_eq!(store.url(""), "https://api.github.com/repos/octo/solutions");
    }

    #[test]
    fn rejects_malformed_repository_names() {
        for name in ["solutions", "/solutions", "octo/", "octo/a/b"] {
            assert!(
                matches!(
                    GithubStore::new("token", name),
                    Err(Error::RepositoryNotFound { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn api_base_override_drops_trailing_slash() {
        let store = GithubStore::new("token", "octo/solutions")
            .unwrap()
            .with_api_base("https://ghe.example.com/api/v3/");
        assert_eq!(
            store.url("git/refs/heads/main"),
            "https://ghe.example.com/api/v3/repos/octo/solutions/git/refs/heads/main"
        );
    }

    #[test]
    fn unprocessable_ref_update_becomes_conflict() {
        let err = GithubStore::ref_conflict(
            "main",
            Some(&ObjectId::new("0123456789")),
            Error::Status {
                status: 422,
                url: "u".into(),
                body: "Update is not a fast forward".into(),
            },
        );
        match err {
            Error::RefConflict {
                branch, expected, ..
            } => {
                assert_eq!(branch, "main");
                assert_eq!(expected, "0123456");
            }
            other => panic!("expected RefConflict, got {other:?}"),
        }
    }

    #[test]
    fn tree_listing_keeps_blobs_only() {
        let listing: GitTree = serde_json::from_value(json!({
            "tree": [
                {"path": "0001_two_sum", "type": "tree"},
                {"path": "0001_two_sum/solution_1.py", "type": "blob"},
                {"path": "README.md", "type": "blob"}
            ],
            "truncated": false
        }))
        .unwrap();
        let paths = blob_paths(&ObjectId::new("abc"), listing).unwrap();
        assert_eq!(paths, ["0001_two_sum/solution_1.py", "README.md"]);
    }

    #[test]
    fn truncated_tree_listing_is_fatal() {
        let listing: GitTree = serde_json::from_value(json!({
            "tree": [{"path": "0001_two_sum/solution_1.py", "type": "blob"}],
            "truncated": true
        }))
        .unwrap();
        let err = blob_paths(&ObjectId::new("abc"), listing).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }), "unexpected error: {err:?}");
        assert!(!err.is_transient());
    }

    #[test]
    fn moved_branch_fails_expectation() {
        let expected = ObjectId::new("1111111111");
        assert!(check_expected("main", &expected, "1111111111").is_ok());

        match check_expected("main", &expected, "2222222222").unwrap_err() {
            Error::RefConflict {
                expected, message, ..
            } => {
                assert_eq!(expected, "1111111");
                assert_eq!(message, "branch is at 2222222");
            }
            other => panic!("expected RefConflict, got {other:?}"),
        }
    }
}
