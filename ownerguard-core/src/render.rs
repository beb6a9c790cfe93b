//! Human-readable output: the required-approvals comment and the reviewers
//! block embedded in the pull request body.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const REVIEWERS_BLOCK_START: &str = "<!-- reviewers start -->";
pub const REVIEWERS_BLOCK_END: &str = "<!-- reviewers end -->";

/// The comment posted when approvals are outstanding: one line per pending
/// file with its owners, paths shown relative to the workspace.
pub fn required_approvals_comment(
    required_approvals: &BTreeMap<PathBuf, BTreeSet<String>>,
    path_prefix: &Path,
) -> String {
    let files: Vec<String> = required_approvals
        .iter()
        .map(|(file, owners)| {
            let shown = file.strip_prefix(path_prefix).unwrap_or(file);
            let owners: Vec<&str> = owners.iter().map(String::as_str).collect();
            format!("- {} ({})", shown.display(), owners.join(", "))
        })
        .collect();

    format!(
        "Approval is still required for {} files\n{}",
        required_approvals.len(),
        files.join("\n")
    )
}

fn comment_block(pending_owners: &BTreeSet<String>, details: &str) -> String {
    if pending_owners.is_empty() {
        return format!("{REVIEWERS_BLOCK_START}{REVIEWERS_BLOCK_END}");
    }

    let mentions: Vec<String> = pending_owners
        .iter()
        .map(|owner| format!("@{owner}"))
        .collect();

    format!(
        "{REVIEWERS_BLOCK_START}\n### Reviewers\n\nNeeds to be approved by: {}\n<details>\n<summary>Details</summary>\n{details}\n</details>\n{REVIEWERS_BLOCK_END}",
        mentions.join(", ")
    )
}

fn find_block(body: &str) -> Option<(usize, usize)> {
    let start = body.find(REVIEWERS_BLOCK_START)?;
    let end = body[start..].find(REVIEWERS_BLOCK_END)?;
    Some((start, start + end + REVIEWERS_BLOCK_END.len()))
}

/// Compute the new pull request body, or `None` when the rendered block is
/// byte-identical to what the body already contains. An existing block is
/// replaced in place; otherwise the block is appended.
pub fn updated_body(
    current_body: Option<&str>,
    pending_owners: &BTreeSet<String>,
    details: &str,
) -> Option<String> {
    let body = current_body.unwrap_or("");
    let block = comment_block(pending_owners, details);

    match find_block(body) {
        Some((start, end)) => {
            if &body[start..end] == block {
                None
            } else {
                Some(format!("{}{}{}", &body[..start], block, &body[end..]))
            }
        }
        None => Some(format!("{body}\n\n{block}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_required_approvals_comment_strips_prefix() {
        let required = BTreeMap::from([
            (
                PathBuf::from("/workspace/app/x.js"),
                owners(&["bob", "carol"]),
            ),
            (PathBuf::from("/workspace/y.js"), owners(&["bob"])),
        ]);

        let comment = required_approvals_comment(&required, Path::new("/workspace"));

        assert_eq!(
            comment,
            "Approval is still required for 2 files\n- app/x.js (bob, carol)\n- y.js (bob)"
        );
    }

    #[test]
    fn test_updated_body_appends_when_block_is_absent() {
        let body = updated_body(Some("Fixes a bug."), &owners(&["carol"]), "details")
            .expect("body should change");

        assert!(body.starts_with("Fixes a bug.\n\n"));
        assert!(body.contains("Needs to be approved by: @carol"));
        assert!(body.contains(REVIEWERS_BLOCK_START));
        assert!(body.ends_with(REVIEWERS_BLOCK_END));
    }

    #[test]
    fn test_updated_body_replaces_existing_block_in_place() {
        let first = updated_body(Some("Intro."), &owners(&["carol"]), "old").unwrap();
        let second = updated_body(Some(&first), &owners(&["bob"]), "new").unwrap();

        assert!(second.starts_with("Intro.\n\n"));
        assert!(second.contains("@bob"));
        assert!(!second.contains("@carol"));
        assert_eq!(second.matches(REVIEWERS_BLOCK_START).count(), 1);
    }

    #[test]
    fn test_updated_body_is_noop_when_block_is_identical() {
        let first = updated_body(Some("Intro."), &owners(&["carol"]), "same").unwrap();
        assert_eq!(updated_body(Some(&first), &owners(&["carol"]), "same"), None);
    }

    #[test]
    fn test_updated_body_with_no_pending_owners_renders_empty_block() {
        let body = updated_body(None, &owners(&[]), "").unwrap();
        assert!(body.ends_with(&format!("{REVIEWERS_BLOCK_START}{REVIEWERS_BLOCK_END}")));
    }

    #[test]
    fn test_updated_body_preserves_text_after_the_block() {
        let with_block = format!(
            "Intro.\n\n{REVIEWERS_BLOCK_START}old{REVIEWERS_BLOCK_END}\n\nOutro."
        );
        let updated = updated_body(Some(&with_block), &owners(&["carol"]), "d").unwrap();

        assert!(updated.starts_with("Intro.\n\n"));
        assert!(updated.ends_with("\n\nOutro."));
    }
}
