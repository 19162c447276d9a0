pub mod core;
pub mod repair;

// Re-export the primary types so callers can use `crate::engine::*` directly.
pub use self::core::{Choice, Engine, Outcome, SkipReason};
pub use self::repair::repair;
