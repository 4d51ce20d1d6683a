use anyhow::{bail, Result};
use chrono::Local;
use colored::Colorize;
use std::path::Path;
use tracing::{info, warn};

use crate::{
    config::{self, SyncOptions},
    errors::SyncError,
    git::{self, REMOTE},
    prompt::Prompter,
};

/// What a successful run did.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub branch: String,
    pub remote_url: String,
    /// Message of the stash taken before fetching, if one was created.
    pub stash: Option<String>,
    /// False when the branch had no remote counterpart yet and the rebase was skipped.
    pub rebased: bool,
}

/// Stash, fetch, rebase onto `origin/<branch>`, restore the stash and push.
///
/// Stops at the first failure and leaves the working tree as git left it.
pub fn run(start: &Path, opts: &SyncOptions, prompter: &mut dyn Prompter) -> Result<SyncReport> {
    let root = git::repo_root(start)?;

    let branch = git::current_branch(&root)?;
    let primary = config::primary_branch(&root, opts);
    info!(%branch, %primary, root = %root.display(), "starting sync");
    confirm_branch(&branch, &primary, prompter)?;

    let remote_url = git::remote_url(&root, REMOTE)?;
    println!(
        "{} Syncing '{}' with {} ({})",
        "→".blue().bold(),
        branch.cyan(),
        REMOTE.yellow(),
        remote_url
    );

    let stash = stash_changes(&root, prompter)?;

    info!(remote = REMOTE, "fetching");
    println!("{} Fetching from {}…", "→".blue().bold(), REMOTE.yellow());
    git::fetch(&root, REMOTE)?;

    let upstream = format!("{}/{}", REMOTE, branch);
    let rebased = if git::remote_branch_exists(&root, REMOTE, &branch)? {
        info!(%upstream, "rebasing");
        println!("{} Rebasing onto {}…", "→".blue().bold(), upstream.cyan());
        if !git::rebase(&root, &upstream)? {
            if git::rebase_in_progress(&root)? {
                bail!(SyncError::rebase_conflict(&upstream, stash.as_deref()));
            }
            bail!(SyncError::command_failure(
                &["rebase", upstream.as_str()],
                "git refused to start the rebase; commit or stash your changes and run syncup again"
            ));
        }
        true
    } else {
        warn!(%upstream, "no remote-tracking branch, skipping rebase");
        println!(
            "{} {} does not exist yet; skipping rebase, the push will create it.",
            "!".yellow().bold(),
            upstream.cyan()
        );
        false
    };

    if let Some(message) = &stash {
        info!(%message, "restoring stash");
        println!("{} Restoring stashed changes…", "→".blue().bold());
        if !git::stash_pop(&root)? {
            bail!(SyncError::StashReapplyConflict(message.clone()));
        }
    }

    info!(%branch, remote = REMOTE, "pushing");
    println!("{} Pushing '{}' to {}…", "→".blue().bold(), branch.cyan(), REMOTE.yellow());
    git::push_upstream(&root, REMOTE, &branch)?;

    println!(
        "{} '{}' is in sync with {}.",
        "✓".green().bold(),
        branch.cyan(),
        upstream.cyan()
    );
    info!(%branch, stashed = stash.is_some(), rebased, "sync finished");

    Ok(SyncReport {
        branch,
        remote_url,
        stash,
        rebased,
    })
}

fn confirm_branch(branch: &str, primary: &str, prompter: &mut dyn Prompter) -> Result<()> {
    if branch == primary {
        return Ok(());
    }
    println!(
        "{} You are on '{}', not the primary branch '{}'.",
        "!".yellow().bold(),
        branch.cyan(),
        primary.cyan()
    );
    let proceed = prompter.confirm(&format!("Sync '{}' anyway?", branch), false)?;
    if !proceed {
        bail!(SyncError::OperatorAbort(format!("not syncing '{}'", branch)));
    }
    Ok(())
}

/// Show the working-tree status and, if it is dirty, offer to stash it.
/// Returns the stash message when a stash entry was created.
fn stash_changes(root: &Path, prompter: &mut dyn Prompter) -> Result<Option<String>> {
    let status = git::status_short(root)?;
    if !git::has_uncommitted_changes(root)? {
        println!("{} Working tree clean.", "✓".green());
        return Ok(None);
    }

    println!("{} Uncommitted changes:", "!".yellow().bold());
    for line in status.lines() {
        println!("  {}", line);
    }

    if !prompter.confirm("Stash them before rebasing?", true)? {
        warn!("continuing with uncommitted changes");
        println!("{} Continuing with uncommitted changes.", "!".yellow().bold());
        return Ok(None);
    }

    let message = git::autostash_message(Local::now());
    info!(%message, "stashing uncommitted changes");
    if !git::stash_push(root, &message)? {
        warn!(%message, "git stash created no entry");
        return Ok(None);
    }
    println!("{} Stashed as '{}'.", "✓".green(), message.cyan());
    Ok(Some(message))
}
