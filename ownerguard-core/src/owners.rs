//! Building the per-file owner mapping.
//!
//! Every changed file is walked concurrently; the resulting declaration
//! files are inverted into a declaration -> governed-files index so each
//! declaration is read exactly once. A changed file's owner set is the
//! union over every declaration governing it, with the pull request author
//! filtered out. Files with no applicable declaration map to an empty set
//! and never block merging.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Result;
use futures::future::join_all;
use tracing::warn;

use crate::scope::ScopeMatcher;
use crate::walker;

/// Changed file -> deduplicated owner identities.
pub type OwnersMap = BTreeMap<PathBuf, BTreeSet<String>>;

/// Drop changed files whose basename is on the ignore list. If that would
/// drop every file, the original list is kept unchanged.
pub fn filter_ignored(changed_files: Vec<PathBuf>, ignore_filenames: &[String]) -> Vec<PathBuf> {
    if ignore_filenames.is_empty() {
        return changed_files;
    }

    let kept: Vec<PathBuf> = changed_files
        .iter()
        .filter(|file| {
            file.file_name()
                .and_then(|name| name.to_str())
                .map(|name| !ignore_filenames.iter().any(|ignored| ignored == name))
                .unwrap_or(true)
        })
        .cloned()
        .collect();

    if kept.is_empty() {
        changed_files
    } else {
        kept
    }
}

/// Resolve ownership for every changed file.
pub async fn build_owners_map(
    changed_files: &[PathBuf],
    declaration_filename: &str,
    scope: Option<&ScopeMatcher>,
    override_path: Option<&Path>,
    author: &str,
) -> Result<OwnersMap> {
    // Each walk writes only its own result slot; the merge below runs after
    // every walk has completed.
    let walks = join_all(changed_files.iter().map(|file| {
        walker::resolve(file, declaration_filename, scope, override_path)
    }))
    .await;

    let mut governed: BTreeMap<PathBuf, Vec<&PathBuf>> = BTreeMap::new();
    for (file, walk) in changed_files.iter().zip(walks) {
        for declaration in walk? {
            governed.entry(declaration).or_default().push(file);
        }
    }

    let owners_per_declaration = join_all(
        governed
            .keys()
            .map(|declaration| read_declaration(declaration, author)),
    )
    .await;

    let mut map: OwnersMap = changed_files
        .iter()
        .map(|file| (file.clone(), BTreeSet::new()))
        .collect();

    for ((_, files), owners) in governed.iter().zip(owners_per_declaration) {
        for file in files {
            if let Some(entry) = map.get_mut(*file) {
                entry.extend(owners.iter().cloned());
            }
        }
    }

    Ok(map)
}

/// Parse one declaration file: one owner identity per non-empty line, with
/// the author excluded. An unreadable declaration contributes no owners and
/// must not abort the batch.
async fn read_declaration(path: &Path, author: &str) -> Vec<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(data) => data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && *line != author)
            .map(str::to_string)
            .collect(),
        Err(err) => {
            warn!(
                "declaration file {} could not be read, contributing no owners: {}",
                path.display(),
                err
            );
            Vec::new()
        }
    }
}
