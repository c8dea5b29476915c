//! [`ContentStore`] over a git working tree.
//!
//! Documents are plain files; each write stages the touched paths and
//! records exactly one commit through the `git` CLI. Writes from cooperating
//! processes are serialized by an advisory lock under `.git/`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{ContentStore, Revision, StoreError, archived_copy, check_relative};
use crate::dates::ARCHIVE_STAMP_FORMAT;
use crate::lock::{DEFAULT_LOCK_TIMEOUT, StoreLock};
use crate::model::{ARCHIVE_DIR, BACKLOG_DIR, MEETING_DIR};

const LOCK_FILE: &str = "docket.lock";
const README: &str = "\
# Docket Repository

This repository contains meeting notes and backlog items managed by docket.

## Structure
- `/meetings` - Meeting notes
- `/backlogs` - Backlog items
- `/archives` - Archived items
";

/// Author recorded on every commit the store makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

impl Default for GitIdentity {
    fn default() -> Self {
        Self {
            name: "Docket".to_string(),
            email: "docket@localhost".to_string(),
        }
    }
}

/// One commit touching a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub sha: String,
    pub author: String,
    pub date: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct GitStore {
    root: PathBuf,
    identity: GitIdentity,
    lock_timeout: Duration,
}

impl GitStore {
    /// Open an existing repository.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotInitialized`] when `root` has no `.git` directory.
    pub fn open(root: &Path, identity: GitIdentity) -> Result<Self, StoreError> {
        if !root.join(".git").exists() {
            return Err(StoreError::NotInitialized {
                path: root.display().to_string(),
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
            identity,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// Open `root`, bootstrapping a fresh repository when none exists.
    ///
    /// Returns the store and whether it was created by this call.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created or any git command fails.
    pub fn open_or_init(root: &Path, identity: GitIdentity) -> Result<(Self, bool), StoreError> {
        if root.join(".git").exists() {
            debug!(root = %root.display(), "opening existing repository");
            return Ok((Self::open(root, identity)?, false));
        }

        info!(root = %root.display(), "initializing new repository");
        fs::create_dir_all(root).map_err(|e| StoreError::io(&root.display().to_string(), e))?;
        let store = Self {
            root: root.to_path_buf(),
            identity,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        };
        store.git(&["init", "-q"])?;
        store.git(&["config", "user.name", &store.identity.name])?;
        store.git(&["config", "user.email", &store.identity.email])?;
        store.bootstrap()?;
        Ok((store, true))
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bootstrap(&self) -> Result<Revision, StoreError> {
        for dir in [MEETING_DIR, BACKLOG_DIR, ARCHIVE_DIR] {
            self.write_file(&format!("{dir}/.gitkeep"), "")?;
        }
        self.write_file("README.md", README)?;
        self.git(&["add", "-A"])?;
        self.commit("Initial repository structure")
    }

    fn lock(&self) -> Result<StoreLock, StoreError> {
        Ok(StoreLock::acquire(
            &self.root.join(".git").join(LOCK_FILE),
            self.lock_timeout,
        )?)
    }

    fn abs(&self, path: &str) -> Result<PathBuf, StoreError> {
        check_relative(path)?;
        Ok(self.root.join(path))
    }

    fn write_file(&self, path: &str, text: &str) -> Result<(), StoreError> {
        let abs = self.abs(path)?;
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(path, e))?;
        }
        fs::write(&abs, text).map_err(|e| StoreError::io(path, e))
    }

    fn require(&self, path: &str) -> Result<PathBuf, StoreError> {
        let abs = self.abs(path)?;
        if abs.is_file() {
            Ok(abs)
        } else {
            Err(StoreError::NotFound {
                path: path.to_string(),
            })
        }
    }

    /// Run git in the repository root and return trimmed stdout.
    fn git(&self, args: &[&str]) -> Result<String, StoreError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| StoreError::Git {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: format!("failed to spawn git: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StoreError::Git {
                command: args.join(" "),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn commit(&self, message: &str) -> Result<Revision, StoreError> {
        let name = format!("user.name={}", self.identity.name);
        let email = format!("user.email={}", self.identity.email);
        self.git(&[
            "-c",
            &name,
            "-c",
            &email,
            "commit",
            "-q",
            "--allow-empty",
            "-m",
            message,
        ])?;
        let sha = self.git(&["rev-parse", "HEAD"])?;
        debug!(sha = %sha, message, "committed");
        Ok(Revision::new(sha))
    }

    fn stage_and_commit(&self, paths: &[&str], message: &str) -> Result<Revision, StoreError> {
        let mut args = vec!["add", "-A", "--"];
        args.extend_from_slice(paths);
        self.git(&args)?;
        self.commit(message)
    }

    /// Most recent commits touching `path`, newest first.
    ///
    /// # Errors
    ///
    /// Fails when `git log` fails.
    pub fn history(&self, path: &str, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        check_relative(path)?;
        let max = format!("-n{limit}");
        let out = self.git(&[
            "log",
            &max,
            "--format=%H%x1f%an%x1f%ad%x1f%s%x1e",
            "--date=format:%Y-%m-%d %H:%M",
            "--",
            path,
        ])?;
        Ok(out
            .split('\x1e')
            .filter_map(|record| {
                let mut fields = record.trim().split('\x1f');
                Some(HistoryEntry {
                    sha: fields.next().filter(|s| !s.is_empty())?.to_string(),
                    author: fields.next()?.to_string(),
                    date: fields.next()?.to_string(),
                    message: fields.next()?.to_string(),
                })
            })
            .collect())
    }

    fn has_remote(&self) -> Result<bool, StoreError> {
        Ok(!self.git(&["remote"])?.is_empty())
    }

    /// `git pull --rebase`. Returns `false` when no remote is configured.
    ///
    /// # Errors
    ///
    /// Fails when the pull itself fails.
    pub fn pull(&self) -> Result<bool, StoreError> {
        if !self.has_remote()? {
            warn!("no remote configured; skipping pull");
            return Ok(false);
        }
        let _lock = self.lock()?;
        self.git(&["pull", "--rebase"])?;
        info!("pulled from remote");
        Ok(true)
    }

    /// `git push`. Returns `false` when no remote is configured.
    ///
    /// # Errors
    ///
    /// Fails when the push itself fails.
    pub fn push(&self) -> Result<bool, StoreError> {
        if !self.has_remote()? {
            warn!("no remote configured; skipping push");
            return Ok(false);
        }
        self.git(&["push"])?;
        info!("pushed to remote");
        Ok(true)
    }
}

impl ContentStore for GitStore {
    fn create(&self, path: &str, text: &str, message: &str) -> Result<Revision, StoreError> {
        let _lock = self.lock()?;
        self.write_file(path, text)?;
        let rev = self.stage_and_commit(&[path], message)?;
        info!(path, rev = rev.short(), "created document");
        Ok(rev)
    }

    fn update(&self, path: &str, text: &str, message: &str) -> Result<Revision, StoreError> {
        let _lock = self.lock()?;
        self.require(path)?;
        self.write_file(path, text)?;
        let rev = self.stage_and_commit(&[path], message)?;
        info!(path, rev = rev.short(), "updated document");
        Ok(rev)
    }

    fn read(&self, path: &str) -> Result<String, StoreError> {
        let abs = self.require(path)?;
        fs::read_to_string(abs).map_err(|e| StoreError::io(path, e))
    }

    fn delete(&self, path: &str, message: &str) -> Result<Revision, StoreError> {
        let _lock = self.lock()?;
        let abs = self.require(path)?;
        fs::remove_file(abs).map_err(|e| StoreError::io(path, e))?;
        let rev = self.stage_and_commit(&[path], message)?;
        info!(path, rev = rev.short(), "deleted document");
        Ok(rev)
    }

    fn list(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        let abs = self.abs(dir)?;
        let entries = match fs::read_dir(&abs) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(dir, e)),
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| {
                Path::new(name)
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn archive(&self, path: &str, reason: &str) -> Result<Revision, StoreError> {
        let _lock = self.lock()?;
        let abs = self.require(path)?;
        let content = fs::read_to_string(&abs).map_err(|e| StoreError::io(path, e))?;
        let stamp = Local::now().format(ARCHIVE_STAMP_FORMAT).to_string();
        let (target, archived) = archived_copy(path, &content, reason, &stamp);

        self.write_file(&target, &archived)?;
        fs::remove_file(abs).map_err(|e| StoreError::io(path, e))?;
        let rev = self.stage_and_commit(&[path, &target], &format!("Archive {path}: {reason}"))?;
        info!(path, target = %target, rev = rev.short(), "archived document");
        Ok(rev)
    }
}
