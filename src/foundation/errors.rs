//! Fatal error types for the dialogue engine.
//!
//! The engine distinguishes two failure classes. Guard failures ("this rule
//! does not apply here") are plain `None` returns and part of normal control
//! flow. The errors below are invariant violations: the upstream caller
//! handed us a malformed history or an act the policy does not recognize.
//! They must never be caught and retried.

use thiserror::Error;

/// A programming error in the caller: the dialogue-state invariants were
/// violated or an unknown dialogue act reached the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// An accepted or executed item appeared after a proposed one (H1).
    #[error("history item {index} follows a proposed item but is not proposed")]
    ProposedNotSuffix { index: usize },

    /// The first pending item is not adjacent to the current item.
    #[error("pending item at {next} does not follow current item {current} (skipped {skipped} proposed)")]
    NextIndexMismatch {
        next: usize,
        current: usize,
        skipped: usize,
    },

    /// A domain switch was recorded after the current item.
    #[error("previous-domain index {previous} is after current index {current}")]
    DomainIndexOutOfOrder { previous: usize, current: usize },

    /// Result classification was requested for an item that never executed.
    #[error("cannot classify results of an unexecuted history item")]
    UnexecutedItem,

    /// The tagger needs a classified result and the context has none.
    #[error("dialogue act '{act}' requires an executed result in the context")]
    MissingResultInfo { act: String },

    /// The context has no executed records where the act requires them.
    #[error("dialogue act '{act}' requires a non-empty result")]
    MissingResults { act: String },

    /// The act reached the tagger's default branch.
    #[error("unexpected user dialogue act '{act}'")]
    UnexpectedDialogueAct { act: String },

    /// A query was inserted into a non-empty history with no executed item.
    #[error("cannot insert a query: no statement has executed yet")]
    NoCurrentItem,

    /// A greeting arrived mid-conversation.
    #[error("dialogue act 'greet' requires an empty history")]
    GreetWithHistory,

    /// An agent reply was packaged for a user-side act.
    #[error("agent dialogue act '{act}' must start with 'sys_'")]
    NotAgentAct { act: String },
}
