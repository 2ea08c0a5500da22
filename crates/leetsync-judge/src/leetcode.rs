//! LeetCode GraphQL client
//!
//! Decoding is split from transport so payload handling can be tested
//! against captured responses without a network.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::JudgeApi;
use crate::models::{ProblemContent, Submission, SubmissionDetail, SubmissionPage};
use crate::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://leetcode.com/graphql/";
const SITE: &str = "https://leetcode.com";

const SUBMISSION_LIST_QUERY: &str = r#"
query submissionList($offset: Int!, $limit: Int!) {
    submissionList(offset: $offset, limit: $limit) {
        hasNext
        submissions {
            id
            title
            titleSlug
            statusDisplay
            lang
            runtime
            memory
            timestamp
        }
    }
}
"#;

const SUBMISSION_DETAILS_QUERY: &str = r#"
query submissionDetails($id: Int!) {
    submissionDetails(submissionId: $id) {
        code
        runtimePercentile
        memoryPercentile
        question {
            questionFrontendId
        }
    }
}
"#;

const QUESTION_QUERY: &str = r#"
query questionContent($titleSlug: String!) {
    question(titleSlug: $titleSlug) {
        questionFrontendId
        title
        content
        difficulty
        isPaidOnly
    }
}
"#;

/// Blocking client for the LeetCode GraphQL endpoint.
pub struct LeetCodeClient {
    http: Client,
    endpoint: String,
}

impl LeetCodeClient {
    /// Create a client authenticated with a session cookie and CSRF token.
    pub fn new(session: &str, csrf_token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("leetsync"));
        headers.insert(REFERER, HeaderValue::from_static(SITE));
        headers.insert("x-csrftoken", header_value(csrf_token)?);
        headers.insert(
            "cookie",
            header_value(&format!(
                "LEETCODE_SESSION={session}; csrftoken={csrf_token};"
            ))?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(Error::Client)?;

        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different GraphQL endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn query(&self, query: &str, variables: Value) -> Result<Value> {
        tracing::debug!(endpoint = %self.endpoint, ?variables, "GraphQL request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .map_err(|source| Error::Transport {
                url: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthorized {
                message: format!("HTTP {status}"),
            });
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().map_err(|source| {
            if source.is_decode() {
                Error::schema(format!("response is not JSON: {source}"))
            } else {
                Error::Transport {
                    url: self.endpoint.clone(),
                    source,
                }
            }
        })
    }
}

impl JudgeApi for LeetCodeClient {
    fn submissions(&self, offset: usize, limit: usize) -> Result<SubmissionPage> {
        let body = self.query(
            SUBMISSION_LIST_QUERY,
            json!({ "offset": offset, "limit": limit }),
        )?;
        decode_submission_page(body)
    }

    fn submission_detail(&self, submission_id: &str) -> Result<Option<SubmissionDetail>> {
        let id: i64 = submission_id
            .parse()
            .map_err(|_| Error::schema(format!("submission id '{submission_id}' is not numeric")))?;
        let body = self.query(SUBMISSION_DETAILS_QUERY, json!({ "id": id }))?;
        decode_submission_detail(body)
    }

    fn problem(&self, title_slug: &str) -> Result<Option<ProblemContent>> {
        let body = self.query(QUESTION_QUERY, json!({ "titleSlug": title_slug }))?;
        decode_problem(body)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::schema(format!("credential is not a valid header value: {e}")))
}

/// Split a GraphQL envelope into the requested field and any error messages.
fn envelope(mut body: Value, field: &str) -> Result<(Option<Value>, Vec<String>)> {
    let errors: Vec<String> = body
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default();

    let Some(data) = body.get_mut("data").filter(|d| d.is_object()) else {
        if errors.is_empty() {
            return Err(Error::schema("response has no `data` object"));
        }
        return Err(Error::GraphQl {
            messages: errors.join("; "),
        });
    };

    let value = data.get_mut(field).map(Value::take).filter(|v| !v.is_null());
    Ok((value, errors))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage {
    has_next: bool,
    submissions: Vec<RawSubmission>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubmission {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    title: String,
    title_slug: String,
    status_display: String,
    lang: String,
    runtime: String,
    memory: String,
    #[serde(deserialize_with = "string_or_number")]
    timestamp: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDetail {
    code: Option<String>,
    runtime_percentile: Option<f64>,
    memory_percentile: Option<f64>,
    question: Option<RawQuestionRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestionRef {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    question_frontend_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    question_frontend_id: Option<String>,
    title: String,
    content: Option<String>,
    difficulty: Option<String>,
    #[serde(default)]
    is_paid_only: bool,
}

/// Decode a `submissionList` response.
///
/// A null list without errors means the judge did not recognise the
/// session; that is reported as [`Error::Unauthorized`].
pub fn decode_submission_page(body: Value) -> Result<SubmissionPage> {
    let (value, errors) = envelope(body, "submissionList")?;
    let Some(value) = value else {
        if errors.is_empty() {
            return Err(Error::Unauthorized {
                message: "submission list is null; the session cookie is likely expired".into(),
            });
        }
        return Err(Error::GraphQl {
            messages: errors.join("; "),
        });
    };

    let raw: RawPage = serde_json::from_value(value)
        .map_err(|e| Error::schema(format!("submissionList: {e}")))?;

    let submissions = raw
        .submissions
        .into_iter()
        .map(|s| {
            let timestamp = s.timestamp.parse::<i64>().map_err(|_| {
                Error::schema(format!(
                    "submission {} has non-numeric timestamp '{}'",
                    s.id, s.timestamp
                ))
            })?;
            Ok(Submission {
                id: s.id,
                title: s.title,
                title_slug: s.title_slug,
                status: s.status_display,
                lang: s.lang,
                runtime: s.runtime,
                memory: s.memory,
                timestamp,
                problem_id: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SubmissionPage {
        submissions,
        has_next: raw.has_next,
    })
}

/// Decode a `submissionDetails` response. Missing code counts as unavailable.
pub fn decode_submission_detail(body: Value) -> Result<Option<SubmissionDetail>> {
    let (value, errors) = envelope(body, "submissionDetails")?;
    let Some(value) = value else {
        if !errors.is_empty() {
            tracing::debug!(errors = %errors.join("; "), "submission detail withheld");
        }
        return Ok(None);
    };

    let raw: RawDetail = serde_json::from_value(value)
        .map_err(|e| Error::schema(format!("submissionDetails: {e}")))?;

    let Some(code) = raw.code.filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    Ok(Some(SubmissionDetail {
        code,
        runtime_percentile: raw.runtime_percentile,
        memory_percentile: raw.memory_percentile,
        problem_id: raw.question.and_then(|q| q.question_frontend_id),
    }))
}

/// Decode a `question` response. Paid-only problems come back without content.
pub fn decode_problem(body: Value) -> Result<Option<ProblemContent>> {
    let (value, errors) = envelope(body, "question")?;
    let Some(value) = value else {
        if !errors.is_empty() {
            tracing::debug!(errors = %errors.join("; "), "problem content withheld");
        }
        return Ok(None);
    };

    let raw: RawQuestion =
        serde_json::from_value(value).map_err(|e| Error::schema(format!("question: {e}")))?;

    let Some(content) = raw.content.filter(|c| !c.trim().is_empty()) else {
        tracing::debug!(title = %raw.title, paid_only = raw.is_paid_only, "problem has no content");
        return Ok(None);
    };

    Ok(Some(ProblemContent {
        frontend_id: raw.question_frontend_id,
        title: raw.title,
        content,
        difficulty: raw.difficulty,
    }))
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_submission_page() {
        let body = json!({
            "data": {
                "submissionList": {
                    "hasNext": true,
                    "submissions": [{
                        "id": "1180000001",
                        "title": "Two Sum",
                        "titleSlug": "two-sum",
                        "statusDisplay": "Accepted",
                        "lang": "python3",
                        "runtime": "52 ms",
                        "memory": "17.2 MB",
                        "timestamp": "1700000000"
                    }, {
                        "id": 1180000000,
                        "title": "Two Sum",
                        "titleSlug": "two-sum",
                        "statusDisplay": "Wrong Answer",
                        "lang": "python3",
                        "runtime": "N/A",
                        "memory": "N/A",
                        "timestamp": 1699999000
                    }]
                }
            }
        });

        let page = decode_submission_page(body).unwrap();
        assert!(page.has_next);
        assert_eq!(page.submissions.len(), 2);
        assert_eq!(page.submissions[0].id, "1180000001");
        assert_eq!(page.submissions[0].timestamp, 1_700_000_000);
        assert!(page.submissions[0].is_accepted());
        assert_eq!(page.submissions[1].id, "1180000000");
        assert!(!page.submissions[1].is_accepted());
    }

    #[test]
    fn null_submission_list_means_expired_session() {
        let body = json!({ "data": { "submissionList": null } });
        let err = decode_submission_page(body).unwrap_err();
        assert!(matches!(err, Error::Unauthorized { .. }), "got {err:?}");
    }

    #[test]
    fn graphql_errors_without_data_are_reported() {
        let body = json!({ "errors": [{ "message": "boom" }] });
        let err = decode_submission_page(body).unwrap_err();
        assert!(matches!(err, Error::GraphQl { ref messages } if messages == "boom"));
        assert!(!err.is_transient());
    }

    #[test]
    fn missing_data_is_a_schema_error() {
        let err = decode_problem(json!({ "unexpected": 1 })).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn decodes_submission_detail() {
        let body = json!({
            "data": {
                "submissionDetails": {
                    "code": "class Solution: pass",
                    "runtimePercentile": 87.3,
                    "memoryPercentile": null,
                    "question": { "questionFrontendId": "1" }
                }
            }
        });

        let detail = decode_submission_detail(body).unwrap().unwrap();
        assert_eq!(detail.code, "class Solution: pass");
        assert_eq!(detail.runtime_percentile, Some(87.3));
        assert_eq!(detail.memory_percentile, None);
        assert_eq!(detail.problem_id.as_deref(), Some("1"));
    }

    #[test]
    fn null_detail_is_unavailable_not_an_error() {
        let body = json!({
            "data": { "submissionDetails": null },
            "errors": [{ "message": "You do not have permission" }]
        });
        assert_eq!(decode_submission_detail(body).unwrap(), None);
    }

    #[test]
    fn empty_code_is_unavailable() {
        let body = json!({ "data": { "submissionDetails": { "code": "" } } });
        assert_eq!(decode_submission_detail(body).unwrap(), None);
    }

    #[test]
    fn decodes_problem_content() {
        let body = json!({
            "data": {
                "question": {
                    "questionFrontendId": "9",
                    "title": "Palindrome Number",
                    "content": "<p>Given an integer x...</p>",
                    "difficulty": "Easy",
                    "isPaidOnly": false
                }
            }
        });

        let problem = decode_problem(body).unwrap().unwrap();
        assert_eq!(problem.frontend_id.as_deref(), Some("9"));
        assert_eq!(problem.title, "Palindrome Number");
        assert_eq!(problem.difficulty.as_deref(), Some("Easy"));
    }

    #[test]
    fn paid_only_problem_without_content_is_unavailable() {
        let body = json!({
            "data": {
                "question": {
                    "questionFrontendId": "157",
                    "title": "Read N Characters Given Read4",
                    "content": null,
                    "difficulty": "Easy",
                    "isPaidOnly": true
                }
            }
        });
        assert_eq!(decode_problem(body).unwrap(), None);
    }
}
