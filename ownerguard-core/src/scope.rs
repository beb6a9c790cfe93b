//! Path-scope matching for ownership resolution.
//!
//! A scope restricts which directory levels may contribute ownership
//! declarations. It is a restricted glob: `*` matches within one path
//! segment, `**` matches any number of segments. The pattern is combined
//! with the workspace prefix and compiled once into an anchored,
//! case-insensitive regex; the matcher is immutable afterwards, so a single
//! instance can be shared across concurrent directory walks.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone)]
pub struct ScopeMatcher {
    regex: Regex,
}

impl ScopeMatcher {
    /// Compile `level` (a workspace-relative glob) against the workspace
    /// prefix. The resulting matcher tests full candidate paths.
    pub fn compile(path_prefix: &Path, level: &str) -> Result<Self> {
        let combined = join_pattern(path_prefix, level);
        let regex = RegexBuilder::new(&glob_to_regex(&combined))
            .case_insensitive(true)
            .build()
            .with_context(|| format!("invalid scope pattern {combined:?}"))?;

        Ok(Self { regex })
    }

    pub fn is_match(&self, candidate: &Path) -> bool {
        self.regex.is_match(&candidate.to_string_lossy())
    }
}

fn join_pattern(path_prefix: &Path, level: &str) -> String {
    let prefix = path_prefix.to_string_lossy();
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        level.trim_start_matches('/')
    )
}

/// Translate the restricted glob into an anchored regex.
///
/// `**` followed by a separator matches any number of whole segments
/// (including none, so `a/**/b` covers `a/b`); a trailing `**` matches any
/// suffix. A single `*` never crosses a separator.
fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        regex.push_str("(?:[^/]+/)*");
                    } else {
                        regex.push_str(".*");
                    }
                } else {
                    regex.push_str("[^/]*");
                }
            }
            c if r"\.+()|[]{}^$?".contains(c) => {
                regex.push('\\');
                regex.push(c);
            }
            c => regex.push(c),
        }
    }

    regex.push('$');
    regex
}

/// Pick the scope for a pull request from its labels.
///
/// Labels without a mapping entry are ignored. With several mapped labels
/// the most specific (deepest-nested) path wins; unrelated paths keep the
/// first match, so the result is deterministic in label order.
pub fn select_scope_level(
    labels_on_pr: &[String],
    mapping: &BTreeMap<String, String>,
) -> Option<String> {
    let matched: Vec<&str> = labels_on_pr
        .iter()
        .filter_map(|label| mapping.get(label))
        .map(String::as_str)
        .collect();

    let mut selected = *matched.first()?;
    for candidate in &matched[1..] {
        if Path::new(candidate).starts_with(selected) {
            selected = candidate;
        }
    }

    Some(selected.to_string())
}
