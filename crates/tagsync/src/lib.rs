//! tagsync - container image tag consistency
//!
//! Every component of a project has one canonical version, stored in its own
//! version file. tagsync finds each reference to the component's image
//! (`[registry/]image:tag`) across docs, configs and sources, and either
//! reports references that disagree with the version file (`verify`) or
//! rewrites them in place (`update`).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Registry   │   │   Scanner    │   │ ImagePattern │
//! │ (component → │   │ (tree walk → │   │ (prefix/tag  │
//! │  image, tag) │   │  candidates) │   │   matching)  │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        └──────────────────┼──────────────────┘
//!                    ┌──────▼───────┐
//!                    │    Engine    │
//!                    │ verify/update│
//!                    └──────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod scout;

pub use config::{ProjectConfig, CONFIG_FILE_NAME};
pub use engine::{
    ComponentCheck, ComponentFailure, ComponentUpdate, Engine, FileUpdate, Mismatch, UpdateReport,
    VerifyReport,
};
pub use error::{Result, TagSyncError};
pub use registry::{Component, ComponentRegistry, VersionTag};
pub use scout::{ImageMatch, ImagePattern, PatternCache, ScanConfig, Scanner};
