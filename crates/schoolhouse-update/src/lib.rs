//! Self-update engine for the Schoolhouse shell.
//!
//! Fetches the published artifact, compares it with the local one by
//! SHA-256, asks the user, replaces the local artifact atomically (keeping
//! one prior copy) and re-executes the process.

pub mod artifact;
pub mod checker;
pub mod digest;
pub mod error;
pub mod prompt;
pub mod restart;
pub mod scheduler;
pub mod shape;
pub mod source;
pub mod state;

pub use artifact::LocalArtifact;
pub use checker::{CheckOutcome, CycleOutcome, UpdateCandidate, UpdateChecker, UpdateStatus};
pub use digest::{is_update, ContentDigest};
pub use error::UpdateError;
pub use prompt::{AutoPrompt, ConsolePrompt, Notice, Trigger, UserPrompt, UPDATE_QUESTION};
pub use restart::{ProcessRestarter, Restarter};
pub use scheduler::{CheckScheduler, UpdateLoop};
pub use shape::{ArtifactKind, ShapeCheck};
pub use source::{HttpSource, UpdateSource};
pub use state::{UpdateState, UpdateStateMachine};
