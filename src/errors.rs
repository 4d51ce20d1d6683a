//! Failure kinds that end a sync run.
//!
//! Every variant maps to exit status 1. They are raised through `anyhow` so
//! callers can `downcast_ref::<SyncError>()` when they need the kind.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The start directory is not inside a git working tree.
    #[error("Not inside a git repository ({0})")]
    NotARepo(String),

    /// HEAD does not point at a branch.
    #[error("HEAD is detached; check out a branch before syncing")]
    DetachedHead,

    /// No remote with the expected name is configured.
    #[error("No remote named '{0}' is configured. Add one with `git remote add {0} <url>`.")]
    NoRemote(String),

    /// The operator answered no to a confirmation prompt.
    #[error("Aborted: {0}")]
    OperatorAbort(String),

    /// `git rebase` exited non-zero.
    #[error(
        "Rebase onto {upstream} stopped with conflicts.\n\
         Resolve the conflicted files, then:\n  \
           git add <files>\n  \
           git rebase --continue\n\
         or give up with `git rebase --abort`.{stash_hint}\n\
         Run syncup again once the rebase is finished."
    )]
    RebaseConflict { upstream: String, stash_hint: String },

    /// `git stash pop` exited non-zero after a successful rebase.
    #[error(
        "Reapplying stash '{0}' produced conflicts.\n\
         The rebase succeeded but nothing was pushed. Resolve the conflicts,\n\
         drop the stash with `git stash drop` once it is no longer needed,\n\
         then run syncup again."
    )]
    StashReapplyConflict(String),

    /// Any other failing git invocation.
    #[error("`git {command}` failed: {detail}")]
    CommandFailure { command: String, detail: String },
}

impl SyncError {
    pub fn rebase_conflict(upstream: &str, stash: Option<&str>) -> Self {
        let stash_hint = match stash {
            Some(msg) => format!(
                "\nYour uncommitted changes are saved in stash '{}'; restore them with `git stash pop`.",
                msg
            ),
            None => String::new(),
        };
        SyncError::RebaseConflict {
            upstream: upstream.to_string(),
            stash_hint,
        }
    }

    pub fn command_failure(args: &[&str], detail: impl Into<String>) -> Self {
        SyncError::CommandFailure {
            command: args.join(" "),
            detail: detail.into(),
        }
    }
}
