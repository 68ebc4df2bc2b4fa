//! Foundation module - Shared engine primitives.
//!
//! Contains the confirmation-level enum, dialogue-act name constants,
//! and the fatal error type that form the vocabulary of the dialogue
//! policy engine.

pub mod acts;
mod confirmation;
mod errors;

pub use confirmation::Confirmation;
pub use errors::InvariantViolation;

/// Name of the dialogue policy implemented by this engine.
///
/// Every [`DialogueState`](crate::dialogue::DialogueState) produced by the
/// transition operations carries this name, and the template layer checks
/// it before applying any rule.
pub const POLICY_NAME: &str = "transaction";
