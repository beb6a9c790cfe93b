//! Ownership resolution and approval evaluation for ownerguard.
//!
//! The core is pure apart from the filesystem reads in [`walker`] and
//! [`owners`]: given one host event, it resolves which identities own each
//! changed file, reduces the review history to a latest-decision-per-
//! reviewer view, classifies files as satisfied or pending and decides the
//! merge-gate action. All remote I/O lives behind the effect types in
//! [`machine`] and is executed by the binary crate.

pub mod config;
pub mod evaluate;
pub mod machine;
pub mod owners;
pub mod render;
pub mod review;
pub mod scope;
pub mod walker;

pub use config::OwnershipConfig;
pub use evaluate::{Evaluation, Verdict};
pub use owners::OwnersMap;
pub use review::{LatestReviewMap, Review, ReviewState};
pub use scope::ScopeMatcher;
