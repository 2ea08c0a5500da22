//! Configuration resolution
//!
//! Values are merged from three layers, lowest priority first:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables
//!
//! Explicit [`Overrides`] (command-line flags) win over all three.
//! Credentials are only ever read from the environment. Judge credentials
//! are checked by the commands that need them.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;
use crate::{Error, Result};

pub const ENV_LEETCODE_SESSION: &str = "LEETCODE_SESSION";
pub const ENV_LEETCODE_CSRF: &str = "LEETCODE_CSRF_TOKEN";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const ENV_LOCAL_REPO: &str = "LEETSYNC_LOCAL_REPO";
pub const ENV_BRANCH: &str = "LEETSYNC_BRANCH";
pub const ENV_DEDUP_WINDOW: &str = "LEETSYNC_DEDUP_WINDOW_SECS";
pub const ENV_BATCH_SIZE: &str = "LEETSYNC_BATCH_SIZE";
pub const ENV_FORCE_UPDATE: &str = "LEETSYNC_FORCE_UPDATE";
pub const ENV_PAGE_SIZE: &str = "LEETSYNC_PAGE_SIZE";
pub const ENV_PAGE_DELAY: &str = "LEETSYNC_PAGE_DELAY_MS";
pub const ENV_MAX_ATTEMPTS: &str = "LEETSYNC_MAX_ATTEMPTS";
pub const ENV_RETRY_BASE: &str = "LEETSYNC_RETRY_BASE_MS";
pub const ENV_NUMBERED_FOLDERS: &str = "LEETSYNC_NUMBERED_FOLDERS";
pub const ENV_LOCKED_CONTENT: &str = "LEETSYNC_LOCKED_CONTENT";
pub const ENV_AUTHOR_NAME: &str = "LEETSYNC_AUTHOR_NAME";
pub const ENV_AUTHOR_EMAIL: &str = "LEETSYNC_AUTHOR_EMAIL";

const MAX_PAGE_SIZE: usize = 100;

/// What to do with a submission whose problem description is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockedContentPolicy {
    /// Skip the submission entirely
    #[default]
    Skip,
    /// Commit the solution with a placeholder description
    Placeholder,
}

impl FromStr for LockedContentPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "placeholder" => Ok(Self::Placeholder),
            other => Err(format!("expected 'skip' or 'placeholder', got '{other}'")),
        }
    }
}

/// Retry section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
}

/// Author section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorSection {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Contents of a `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// GitHub repository as `owner/name`
    pub repository: Option<String>,
    pub local_repo: Option<PathBuf>,
    pub branch: Option<String>,
    pub dedup_window_secs: Option<u64>,
    pub batch_size: Option<usize>,
    pub force_update: Option<bool>,
    pub page_size: Option<usize>,
    pub page_delay_ms: Option<u64>,
    pub numbered_folders: Option<bool>,
    pub locked_content: Option<LockedContentPolicy>,
    pub retry: RetrySection,
    pub author: AuthorSection,
}

impl FileConfig {
    /// Parse a TOML config file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// `$XDG_CONFIG_HOME/leetsync/config.toml` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("leetsync").join("config.toml"))
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub local_repo: Option<PathBuf>,
    pub branch: Option<String>,
}

/// Credentials for the judge.
///
/// Only commands that query the judge need them, so their absence is
/// reported by [`JudgeCredentials::require`] rather than at load time.
#[derive(Clone, Default)]
pub struct JudgeCredentials {
    pub session: Option<String>,
    pub csrf_token: Option<String>,
}

impl JudgeCredentials {
    /// Session cookie and CSRF token, or an error naming the first one missing.
    pub fn require(&self) -> Result<(&str, &str)> {
        let missing = |key: &str| Error::MissingConfig {
            key: key.to_string(),
        };
        let session = self
            .session
            .as_deref()
            .ok_or_else(|| missing(ENV_LEETCODE_SESSION))?;
        let csrf_token = self
            .csrf_token
            .as_deref()
            .ok_or_else(|| missing(ENV_LEETCODE_CSRF))?;
        Ok((session, csrf_token))
    }
}

impl std::fmt::Debug for JudgeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeCredentials").finish_non_exhaustive()
    }
}

/// Repository the solutions are mirrored into.
#[derive(Clone, PartialEq, Eq)]
pub enum Target {
    Github { repository: String, token: String },
    Local { path: PathBuf },
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Github { repository, .. } => f
                .debug_struct("Github")
                .field("repository", repository)
                .finish_non_exhaustive(),
            Target::Local { path } => f.debug_struct("Local").field("path", path).finish(),
        }
    }
}

/// Commit identity used by the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: "leetsync".to_string(),
            email: "leetsync@users.noreply.github.com".to_string(),
        }
    }
}

/// Tunables of the sync engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Minimum separation between two kept submissions of one problem+language
    pub dedup_window_secs: i64,
    /// Submissions per commit
    pub batch_size: usize,
    /// Overwrite the branch even if it moved concurrently
    pub force_update: bool,
    /// Submissions requested per page
    pub page_size: usize,
    /// Pause between page requests
    pub page_delay: Duration,
    /// Prefix problem folders with the zero-padded problem number
    pub numbered_folders: bool,
    pub locked_content: LockedContentPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            dedup_window_secs: 300,
            batch_size: 1,
            force_update: false,
            page_size: 20,
            page_delay: Duration::from_millis(1000),
            numbered_folders: true,
            locked_content: LockedContentPolicy::Skip,
        }
    }
}

/// Fully resolved and validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub judge: JudgeCredentials,
    pub target: Target,
    /// Branch to sync into; `None` means the target's default branch
    pub branch: Option<String>,
    pub sync: SyncSettings,
    pub retry: RetryPolicy,
    pub author: Author,
}

impl Config {
    /// Load configuration from the process environment and an optional file.
    ///
    /// Without an explicit `file`, the default config path is used when it exists.
    pub fn load(file: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let file_config = match file {
            Some(path) => FileConfig::read(path)?,
            None => match FileConfig::default_path().filter(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "using default config file");
                    FileConfig::read(&path)?
                }
                None => FileConfig::default(),
            },
        };

        Self::resolve(file_config, overrides, |key| std::env::var(key).ok())
    }

    /// Merge the layers and validate the result.
    ///
    /// `env` looks up one environment variable; empty values count as unset.
    pub fn resolve<F>(file: FileConfig, overrides: Overrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            env(key).ok_or_else(|| Error::MissingConfig {
                key: key.to_string(),
            })
        };

        let judge = JudgeCredentials {
            session: env(ENV_LEETCODE_SESSION),
            csrf_token: env(ENV_LEETCODE_CSRF),
        };

        let local_repo = overrides
            .local_repo
            .or_else(|| env(ENV_LOCAL_REPO).map(PathBuf::from))
            .or(file.local_repo);

        let target = match local_repo {
            Some(path) => Target::Local { path },
            None => {
                let repository = env(ENV_GITHUB_REPOSITORY)
                    .or(file.repository)
                    .ok_or_else(|| Error::MissingConfig {
                        key: format!("{ENV_GITHUB_REPOSITORY} or {ENV_LOCAL_REPO}"),
                    })?;
                validate_repository(&repository)?;
                Target::Github {
                    repository,
                    token: required(ENV_GITHUB_TOKEN)?,
                }
            }
        };

        let branch = overrides.branch.or_else(|| env(ENV_BRANCH)).or(file.branch);

        let defaults = SyncSettings::default();
        let dedup_window: u64 = parse_env(&env, ENV_DEDUP_WINDOW)?
            .or(file.dedup_window_secs)
            .unwrap_or(defaults.dedup_window_secs as u64);
        let sync = SyncSettings {
            dedup_window_secs: i64::try_from(dedup_window)
                .map_err(|_| Error::invalid_config(ENV_DEDUP_WINDOW, "window is too large"))?,
            batch_size: parse_env(&env, ENV_BATCH_SIZE)?
                .or(file.batch_size)
                .unwrap_or(defaults.batch_size),
            force_update: parse_bool_env(&env, ENV_FORCE_UPDATE)?
                .or(file.force_update)
                .unwrap_or(defaults.force_update),
            page_size: parse_env(&env, ENV_PAGE_SIZE)?
                .or(file.page_size)
                .unwrap_or(defaults.page_size),
            page_delay: parse_env(&env, ENV_PAGE_DELAY)?
                .or(file.page_delay_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.page_delay),
            numbered_folders: parse_bool_env(&env, ENV_NUMBERED_FOLDERS)?
                .or(file.numbered_folders)
                .unwrap_or(defaults.numbered_folders),
            locked_content: parse_env(&env, ENV_LOCKED_CONTENT)?
                .or(file.locked_content)
                .unwrap_or(defaults.locked_content),
        };

        let retry_defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_env(&env, ENV_MAX_ATTEMPTS)?
                .or(file.retry.max_attempts)
                .unwrap_or(retry_defaults.max_attempts),
            base_delay: parse_env(&env, ENV_RETRY_BASE)?
                .or(file.retry.base_delay_ms)
                .map(Duration::from_millis)
                .unwrap_or(retry_defaults.base_delay),
            ..retry_defaults
        };

        let author_defaults = Author::default();
        let author = Author {
            name: env(ENV_AUTHOR_NAME)
                .or(file.author.name)
                .unwrap_or(author_defaults.name),
            email: env(ENV_AUTHOR_EMAIL)
                .or(file.author.email)
                .unwrap_or(author_defaults.email),
        };

        let config = Self {
            judge,
            target,
            branch,
            sync,
            retry,
            author,
        };
        config.validate()?;
        Ok(config)
    }

    /// Range checks that apply regardless of which layer a value came from.
    pub fn validate(&self) -> Result<()> {
        if self.sync.batch_size == 0 {
            return Err(Error::invalid_config(ENV_BATCH_SIZE, "must be at least 1"));
        }
        if self.sync.page_size == 0 || self.sync.page_size > MAX_PAGE_SIZE {
            return Err(Error::invalid_config(
                ENV_PAGE_SIZE,
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::invalid_config(ENV_MAX_ATTEMPTS, "must be at least 1"));
        }
        if let Some(branch) = &self.branch
            && (branch.starts_with('-') || branch.contains("..") || branch.contains(' '))
        {
            return Err(Error::invalid_config(
                ENV_BRANCH,
                format!("'{branch}' is not a valid branch name"),
            ));
        }
        Ok(())
    }
}

fn validate_repository(repository: &str) -> Result<()> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(Error::invalid_config(
            ENV_GITHUB_REPOSITORY,
            format!("expected 'owner/name', got '{repository}'"),
        )),
    }
}

fn parse_env<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::invalid_config(key, e.to_string()))
        })
        .transpose()
}

fn parse_bool_env<F>(env: &F, key: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|raw| match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(Error::invalid_config(
                key,
                format!("expected a boolean, got '{other}'"),
            )),
        })
        .transpose()
}
