//! Validated configuration for the ownership core.
//!
//! All ambient input (environment, CLI flags, action inputs) is converted
//! into one `OwnershipConfig` value at startup and passed into each
//! component; nothing reads the environment after construction.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use crate::walker;

#[derive(Debug, Clone)]
pub struct OwnershipConfig {
    /// Root the changed-file paths are joined against.
    pub workspace_root: PathBuf,
    /// Name of the per-directory declaration file.
    pub declaration_filename: String,
    /// Basenames that never require ownership approval.
    pub ignore_filenames: Vec<String>,
    /// Label name -> path scope. `None` when no mapping is configured or
    /// the configured mapping failed validation.
    pub label_scopes: Option<BTreeMap<String, String>>,
    /// Comment phrase that forces a required-approvals report.
    pub trigger_phrase: String,
    /// Directory whose declaration file applies to the whole project.
    pub override_path: Option<PathBuf>,
}

impl OwnershipConfig {
    pub fn new(
        workspace_root: PathBuf,
        declaration_filename: String,
        ignore_filenames: Vec<String>,
        label_scopes_json: Option<&str>,
        trigger_phrase: String,
        override_path: Option<PathBuf>,
    ) -> Result<Self> {
        walker::validate_declaration_filename(&declaration_filename)
            .context("invalid ownership configuration")?;

        Ok(Self {
            workspace_root,
            declaration_filename,
            ignore_filenames,
            label_scopes: label_scopes_json.and_then(parse_label_scopes),
            trigger_phrase,
            override_path,
        })
    }

    /// Does a comment ask for the required-approvals report?
    pub fn is_trigger_comment(&self, comment_body: &str) -> bool {
        comment_body.lines().any(|line| {
            line.trim()
                .to_lowercase()
                .contains(&self.trigger_phrase.to_lowercase())
        })
    }
}

/// Parse the label -> scope mapping. The input must be a flat JSON object
/// with string values; anything else is rejected with a warning and the
/// run proceeds with no scope restriction.
pub fn parse_label_scopes(raw: &str) -> Option<BTreeMap<String, String>> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("label mapping is not valid JSON, proceeding without scopes: {err}");
            return None;
        }
    };

    let Some(object) = value.as_object() else {
        warn!("label mapping must be a flat object of strings, proceeding without scopes");
        return None;
    };

    let mut mapping = BTreeMap::new();
    for (label, scope) in object {
        match scope.as_str() {
            Some(scope) => {
                mapping.insert(label.clone(), scope.to_string());
            }
            None => {
                warn!("label mapping must be a flat object of strings, proceeding without scopes");
                return None;
            }
        }
    }

    Some(mapping)
}
