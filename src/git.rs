use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use git2::{Oid, Repository, RepositoryState};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::errors::SyncError;

/// The only remote syncup talks to.
pub const REMOTE: &str = "origin";

// ── Repository queries (git2) ─────────────────────────────────────────────────

/// Find the working-tree root of the repository containing `start`.
pub fn repo_root(start: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(start)
        .map_err(|e| SyncError::NotARepo(e.message().to_string()))?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| SyncError::NotARepo("bare repository has no working tree".to_string()))?;
    Ok(workdir.to_path_buf())
}

/// Return the name of the currently checked-out branch.
pub fn current_branch(root: &Path) -> Result<String> {
    let repo = Repository::open(root)?;
    let head = repo.head().context("No HEAD; is this a fresh repo with no commits?")?;
    if !head.is_branch() {
        bail!(SyncError::DetachedHead);
    }
    head.shorthand()
        .map(|s| s.to_string())
        .context("Current branch name is not valid UTF-8")
}

/// Return the fetch URL of `remote`, failing with `NoRemote` when it is not configured.
pub fn remote_url(root: &Path, remote: &str) -> Result<String> {
    let repo = Repository::open(root)?;
    let remotes = repo.remotes()?;
    if !remotes.iter().flatten().any(|name| name == remote) {
        bail!(SyncError::NoRemote(remote.to_string()));
    }
    let found = repo.find_remote(remote)?;
    Ok(found.url().unwrap_or_default().to_string())
}

/// The branch `refs/remotes/<remote>/HEAD` points at, if git recorded one.
pub fn remote_head_branch(root: &Path, remote: &str) -> Option<String> {
    let repo = Repository::open(root).ok()?;
    let reference = repo
        .find_reference(&format!("refs/remotes/{}/HEAD", remote))
        .ok()?;
    let target = reference.symbolic_target()?;
    target
        .strip_prefix(&format!("refs/remotes/{}/", remote))
        .map(|s| s.to_string())
}

/// Whether the remote-tracking ref `<remote>/<branch>` exists locally.
pub fn remote_branch_exists(root: &Path, remote: &str, branch: &str) -> Result<bool> {
    let repo = Repository::open(root)?;
    let exists = repo
        .find_reference(&format!("refs/remotes/{}/{}", remote, branch))
        .is_ok();
    Ok(exists)
}

/// Read a string value from the repository's effective git config.
pub fn config_string(root: &Path, key: &str) -> Option<String> {
    let repo = Repository::open(root).ok()?;
    let config = repo.config().ok()?;
    config.get_string(key).ok().filter(|v| !v.trim().is_empty())
}

/// Whether git has a rebase stopped mid-way in this repository.
pub fn rebase_in_progress(root: &Path) -> Result<bool> {
    let repo = Repository::open(root)?;
    Ok(matches!(
        repo.state(),
        RepositoryState::Rebase | RepositoryState::RebaseInteractive | RepositoryState::RebaseMerge
    ))
}

fn stash_tip(root: &Path) -> Option<Oid> {
    let repo = Repository::open(root).ok()?;
    repo.refname_to_id("refs/stash").ok()
}

// ── Commands (git binary) ─────────────────────────────────────────────────────

fn git(root: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(root);
    cmd
}

/// Run git and capture stdout. A non-zero exit becomes `CommandFailure`
/// carrying git's stderr.
fn capture(root: &Path, args: &[&str]) -> Result<String> {
    debug!(?args, "running git (captured)");
    let output = git(root)
        .args(args)
        .output()
        .with_context(|| format!("Failed to run `git {}`", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(SyncError::command_failure(args, stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run git with the terminal attached so the operator sees git's own output.
/// Returns whether it exited successfully.
fn stream(root: &Path, args: &[&str]) -> Result<bool> {
    debug!(?args, "running git");
    let status = git(root)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run `git {}`", args.join(" ")))?;
    debug!(?args, code = status.code(), "git finished");
    Ok(status.success())
}

/// Short, human-readable working-tree status.
pub fn status_short(root: &Path) -> Result<String> {
    capture(root, &["status", "--short"])
}

/// True when the working tree has staged, unstaged or untracked changes.
pub fn has_uncommitted_changes(root: &Path) -> Result<bool> {
    let porcelain = capture(root, &["status", "--porcelain"])?;
    Ok(!porcelain.trim().is_empty())
}

/// Stash all changes (untracked included) under `message`.
///
/// Returns `true` only if a new stash entry was actually created, so the
/// caller never pops a stash it did not push.
pub fn stash_push(root: &Path, message: &str) -> Result<bool> {
    let before = stash_tip(root);
    capture(root, &["stash", "push", "--include-untracked", "-m", message])?;
    let after = stash_tip(root);
    Ok(after.is_some() && after != before)
}

/// Pop the most recent stash. `false` means git reported a conflict.
pub fn stash_pop(root: &Path) -> Result<bool> {
    stream(root, &["stash", "pop"])
}

/// Fetch latest refs from `remote`.
pub fn fetch(root: &Path, remote: &str) -> Result<()> {
    if !stream(root, &["fetch", remote])? {
        bail!(SyncError::command_failure(
            &["fetch", remote],
            "see git output above"
        ));
    }
    Ok(())
}

/// Rebase the current branch onto `upstream`. `false` means the rebase stopped.
pub fn rebase(root: &Path, upstream: &str) -> Result<bool> {
    stream(root, &["rebase", upstream])
}

/// Push `branch` to `remote` and set it as the upstream.
pub fn push_upstream(root: &Path, remote: &str, branch: &str) -> Result<()> {
    let args = ["push", "--set-upstream", remote, branch];
    if !stream(root, &args)? {
        bail!(SyncError::command_failure(&args, "see git output above"));
    }
    Ok(())
}

/// Stash message for an automatic stash taken at `now`.
pub fn autostash_message(now: DateTime<Local>) -> String {
    format!("syncup-autostash-{}", now.format("%Y%m%d-%H%M%S%.3f"))
}
