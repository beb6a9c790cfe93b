use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use ownerguard_core::config::OwnershipConfig;

/// Code-ownership review bot for pull requests.
///
/// Inputs follow the Actions convention and can equally be passed as
/// flags; everything else comes from the `GITHUB_*` environment the runner
/// provides.
#[derive(Parser, Debug)]
#[command(name = "ownerguard")]
#[command(about = "Code-ownership review bot for pull requests", long_about = None)]
pub struct Cli {
    /// Name of the per-directory ownership declaration file
    #[arg(long, env = "INPUT_SOURCE", default_value = ".owners")]
    pub source: String,

    /// Basenames that never require ownership approval
    #[arg(long, env = "INPUT_IGNORE", value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// JSON object mapping pull request labels to path scopes
    #[arg(long, env = "INPUT_LABELS")]
    pub labels: Option<String>,

    /// Directory whose declaration file applies to the whole project
    #[arg(long, env = "INPUT_OWNERS_PATH")]
    pub owners_path: Option<PathBuf>,

    /// Comment phrase that forces a required-approvals report
    #[arg(long, env = "INPUT_TRIGGER_PHRASE", default_value = "/reviewers")]
    pub trigger_phrase: String,
}

#[derive(Clone)]
pub struct Config {
    pub token: String,
    pub event_name: String,
    pub event_path: PathBuf,
    pub repo_owner: String,
    pub repo_name: String,
    pub ownership: OwnershipConfig,
}

impl Config {
    pub fn from_env(cli: &Cli) -> Result<Self> {
        let token = env::var("GITHUB_TOKEN")
            .context("GITHUB_TOKEN environment variable is required")?;

        let workspace = env::var("GITHUB_WORKSPACE")
            .map(PathBuf::from)
            .context("GITHUB_WORKSPACE environment variable is required")?;

        let event_name = env::var("GITHUB_EVENT_NAME")
            .context("GITHUB_EVENT_NAME environment variable is required")?;

        let event_path = env::var("GITHUB_EVENT_PATH")
            .map(PathBuf::from)
            .context("GITHUB_EVENT_PATH environment variable is required")?;

        let repository = env::var("GITHUB_REPOSITORY")
            .context("GITHUB_REPOSITORY environment variable is required")?;
        let (repo_owner, repo_name) = split_repository(&repository)?;

        let ownership = OwnershipConfig::new(
            workspace,
            cli.source.clone(),
            cli.ignore.clone(),
            cli.labels.as_deref(),
            cli.trigger_phrase.clone(),
            cli.owners_path.clone(),
        )?;

        Ok(Config {
            token,
            event_name,
            event_path,
            repo_owner,
            repo_name,
            ownership,
        })
    }
}

/// Split the `owner/name` form GITHUB_REPOSITORY uses.
pub fn split_repository(repository: &str) -> Result<(String, String)> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => bail!("GITHUB_REPOSITORY must look like owner/name, got {repository:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_repository_valid() {
        assert_eq!(
            split_repository("acme/widgets").unwrap(),
            ("acme".to_string(), "widgets".to_string())
        );
    }

    #[test]
    fn test_split_repository_rejects_missing_parts() {
        assert!(split_repository("acme").is_err());
        assert!(split_repository("acme/").is_err());
        assert!(split_repository("/widgets").is_err());
        assert!(split_repository("").is_err());
    }

    #[test]
    fn test_split_repository_keeps_extra_segments_in_name() {
        // GitHub never produces this, but splitting once keeps the result
        // deterministic if it ever does.
        assert_eq!(
            split_repository("acme/widgets/extra").unwrap(),
            ("acme".to_string(), "widgets/extra".to_string())
        );
    }
}
