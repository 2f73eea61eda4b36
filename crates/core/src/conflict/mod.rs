//! Conflict detection, operator prompts, and upload conflict resolution.
//!
//! The conflict subsystem is responsible for:
//! 1. **Detection** -- comparing a local script with its server copy and
//!    setting the conflict bitmask.
//! 2. **Prompting** -- the host-agnostic question/answer contract.
//! 3. **Resolution** -- walking a batch in order and deciding, with the
//!    operator, which scripts may overwrite the server copy.

pub mod detector;
pub mod prompt;
pub mod resolver;

pub use detector::ConflictDetector;
pub use prompt::{Answer, Prompt};
pub use resolver::{resolve_conflicts, Resolution, ResolveOptions, UnverifiedPolicy};
