pub mod config;
pub mod github;
pub mod interpreter;
pub mod payload;

pub use config::{Cli, Config};
pub use github::GitHubClient;
pub use interpreter::{run, ReconcilerContext};
pub use payload::{classify, Classification, EventPayload};
