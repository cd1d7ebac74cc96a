//! Wire types for issue webhook payloads.
//!
//! The shapes below are the intersection of the GitHub and Gitea issue
//! event schemas; fields either provider may omit are defaulted so one set
//! of types deserializes both.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePayload {
    pub action: String,
    pub issue: IssueInfo,
    pub repository: RepositoryInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueInfo {
    pub id: i64,
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub user: Option<IssueUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueUser {
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub owner: Option<RepoOwner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// Issue actions the sync engine reacts to. Anything else (labeled,
/// assigned, milestoned, ...) is acknowledged and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueAction {
    Opened,
    Closed,
    Reopened,
    Edited,
    Deleted,
}

impl IssueAction {
    pub fn classify(action: &str) -> Option<Self> {
        match action {
            "opened" => Some(Self::Opened),
            "closed" => Some(Self::Closed),
            "reopened" => Some(Self::Reopened),
            "edited" => Some(Self::Edited),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Splits `owner/name` into its two parts; anything else is rejected.
pub fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
    let mut parts = full_name.splitn(2, '/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let name = parts.next().filter(|s| !s.is_empty() && !s.contains('/'))?;
    Some((owner, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_rejects_unknown_actions() {
        assert_eq!(IssueAction::classify("opened"), Some(IssueAction::Opened));
        assert_eq!(IssueAction::classify("labeled"), None);
        assert_eq!(IssueAction::classify(""), None);
    }

    #[test]
    fn split_full_name_validates_shape() {
        assert_eq!(split_full_name("acme/widgets"), Some(("acme", "widgets")));
        assert_eq!(split_full_name("acme"), None);
        assert_eq!(split_full_name("/widgets"), None);
        assert_eq!(split_full_name("acme/"), None);
        assert_eq!(split_full_name("a/b/c"), None);
    }

    #[test]
    fn deserializes_minimal_gitea_payload() {
        let raw = serde_json::json!({
            "action": "opened",
            "issue": {
                "id": 9001,
                "number": 42,
                "title": "Widget breaks",
                "state": "open",
                "html_url": "https://gitea.example.com/acme/widgets/issues/42"
            },
            "repository": {
                "name": "widgets",
                "full_name": "acme/widgets"
            }
        });
        let payload: IssuePayload = serde_json::from_value(raw).unwrap();
        assert_eq!(payload.issue.number, 42);
        assert!(payload.issue.body.is_none());
        assert!(payload.issue.user.is_none());
    }
}
