//! Directory ascent for ownership declarations.
//!
//! For one changed file, the walker climbs from the file's directory to the
//! filesystem root and collects every declaration file it passes,
//! nearest-first. A scope matcher, when present, cuts the ascent short at
//! the first out-of-scope level once at least one file has been found;
//! while nothing has been found yet the ascent keeps going, so a repository
//! with no in-scope declarations still falls back to declarations further
//! up. A fixed override directory can supply a project-wide declaration
//! that is always included.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::scope::ScopeMatcher;

/// Declaration filenames are bare names; anything that could escape the
/// current directory is rejected before any filesystem access happens.
pub fn validate_declaration_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        bail!("declaration filename is required");
    }

    if filename.contains('/') || filename.contains(std::path::MAIN_SEPARATOR) || filename == ".." {
        bail!("declaration filename must be a bare filename, got {filename:?}");
    }

    Ok(())
}

/// Resolve the declaration files applicable to `target`, nearest-first.
///
/// The override declaration, when it exists, is appended last: it is the
/// project-wide fallback and therefore the farthest declaration. Results
/// are deduplicated by path.
pub async fn resolve(
    target: &Path,
    declaration_filename: &str,
    scope: Option<&ScopeMatcher>,
    override_path: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    validate_declaration_filename(declaration_filename)?;

    let mut found: Vec<PathBuf> = Vec::new();
    let mut cursor = target.parent().map(Path::to_path_buf);

    while let Some(dir) = cursor {
        let candidate = dir.join(declaration_filename);

        if let Some(matcher) = scope {
            // Leaving the scope ends the ascent, but only once something has
            // been found; an empty result keeps climbing so declarations
            // above the scope still apply as a fallback.
            if !matcher.is_match(&candidate) && !found.is_empty() {
                break;
            }
        }

        if file_exists(&candidate).await && !found.contains(&candidate) {
            found.push(candidate);
        }

        cursor = dir.parent().map(Path::to_path_buf);
    }

    if let Some(root) = override_path {
        let fallback = root.join(declaration_filename);
        if file_exists(&fallback).await && !found.contains(&fallback) {
            found.push(fallback);
        }
    }

    Ok(found)
}

/// A read error at one level is indistinguishable from absence; the ascent
/// carries on either way.
async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
