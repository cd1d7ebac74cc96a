//! Echo suppression for bidirectional sync.
//!
//! Issues the engine itself creates on the forge are marked: the title gets
//! a visible origin prefix and the body an HTML-comment marker carrying the
//! task id. Inbound deliveries matching either marker are our own writes
//! coming back and must not create mirror tasks.

/// Hidden body marker, `<!-- forgeboard:task:<uuid> -->`.
pub const TASK_MARKER_PREFIX: &str = "<!-- forgeboard:task:";

/// Visible title prefix on issues the engine authors.
pub const TITLE_ORIGIN_PREFIX: &str = "[forgeboard]";

const MARKER_CLOSE: &str = "-->";

/// True when the issue carries either origin marker.
pub fn is_self_authored(title: &str, body: Option<&str>) -> bool {
    if title.trim_start().starts_with(TITLE_ORIGIN_PREFIX) {
        return true;
    }
    body.is_some_and(|b| b.contains(TASK_MARKER_PREFIX))
}

/// Body marker to embed when authoring an issue for a task.
pub fn task_marker(task_id: uuid::Uuid) -> String {
    format!("{TASK_MARKER_PREFIX}{task_id} {MARKER_CLOSE}")
}

/// Removes every task marker comment from an issue body so markers never
/// leak into task descriptions.
pub fn strip_task_markers(body: &str) -> String {
    let mut out = body.to_string();
    while let Some(start) = out.find(TASK_MARKER_PREFIX) {
        match out[start..].find(MARKER_CLOSE) {
            Some(rel_end) => {
                out.replace_range(start..start + rel_end + MARKER_CLOSE.len(), "");
            }
            // Unterminated marker, drop the rest of the body.
            None => {
                out.truncate(start);
                break;
            }
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn title_prefix_marks_self_authored() {
        assert!(is_self_authored("[forgeboard] Fix login", None));
        assert!(is_self_authored("  [forgeboard] Fix login", None));
        assert!(!is_self_authored("Fix login", None));
    }

    #[test]
    fn body_marker_marks_self_authored() {
        let id = Uuid::new_v4();
        let body = format!("Details here\n\n{}", task_marker(id));
        assert!(is_self_authored("Fix login", Some(&body)));
        assert!(!is_self_authored("Fix login", Some("Details here")));
    }

    #[test]
    fn strip_removes_all_markers() {
        let a = task_marker(Uuid::new_v4());
        let b = task_marker(Uuid::new_v4());
        let body = format!("Intro\n{a}\nMiddle\n{b}\n");
        let stripped = strip_task_markers(&body);
        assert!(!stripped.contains(TASK_MARKER_PREFIX));
        assert!(stripped.contains("Intro"));
        assert!(stripped.contains("Middle"));
    }

    #[test]
    fn strip_handles_unterminated_marker() {
        let body = format!("Intro {TASK_MARKER_PREFIX}abc");
        assert_eq!(strip_task_markers(&body), "Intro");
    }

    #[test]
    fn strip_is_noop_on_clean_body() {
        assert_eq!(strip_task_markers("Just text"), "Just text");
    }
}
