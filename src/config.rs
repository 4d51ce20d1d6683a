use std::path::Path;

use crate::git;

/// Environment variable that overrides the primary branch.
pub const PRIMARY_BRANCH_ENV: &str = "SYNCUP_PRIMARY_BRANCH";

/// Git config key that sets the primary branch per repository (or globally).
pub const PRIMARY_BRANCH_KEY: &str = "syncup.primaryBranch";

pub const DEFAULT_PRIMARY_BRANCH: &str = "main";

/// Options for a sync run, resolved before any git work starts.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Explicit primary branch. `None` means resolve it from the repository.
    pub primary_branch: Option<String>,
}

impl SyncOptions {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(PRIMARY_BRANCH_ENV).ok())
    }

    fn from_env_value(value: Option<String>) -> Self {
        let primary_branch = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        SyncOptions { primary_branch }
    }
}

/// Resolve the branch that can be synced without a confirmation prompt.
///
/// 1. explicit option (usually from `SYNCUP_PRIMARY_BRANCH`)
/// 2. `syncup.primaryBranch` from git config
/// 3. the branch `origin/HEAD` points at
/// 4. `main`
pub fn primary_branch(root: &Path, opts: &SyncOptions) -> String {
    if let Some(branch) = &opts.primary_branch {
        return branch.clone();
    }
    if let Some(branch) = git::config_string(root, PRIMARY_BRANCH_KEY) {
        return branch.trim().to_string();
    }
    if let Some(branch) = git::remote_head_branch(root, git::REMOTE) {
        return branch;
    }
    DEFAULT_PRIMARY_BRANCH.to_string()
}
