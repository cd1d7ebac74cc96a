//! Runtime settings for the sync engine, read from the environment once at
//! startup.

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// When false, inbound issue-body edits are observed but never overwrite
    /// the task description. Titles are always re-synced.
    pub sync_issue_body: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sync_issue_body: true,
        }
    }
}

impl SyncSettings {
    pub fn from_env() -> Self {
        let sync_issue_body = std::env::var("FORGEBOARD_SYNC_ISSUE_BODY")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self { sync_issue_body }
    }
}
