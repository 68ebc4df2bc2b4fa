//! Dialogue module - state model, context extraction, and transitions.
//!
//! The history model (`state`) and its derived per-turn summary
//! (`context`, `result_info`, `next_info`) are read-only views; all state
//! changes go through the pure operations in `transitions`. The `tagger`
//! and `reply` modules sit on top and face the template layer.

pub mod context;
pub mod next_info;
pub mod reply;
pub mod result_info;
pub mod state;
pub mod tagger;
pub mod transitions;

pub use context::ContextInfo;
pub use next_info::NextStatementInfo;
pub use reply::{make_agent_reply, AgentReply, AgentReplyOptions};
pub use result_info::{ResultInfo, LARGE_RESULT_THRESHOLD};
pub use state::{DialogueState, ExchangeItem, ExecutionResult, ResultCount, ResultRecord};
pub use tagger::{
    get_context_tags, is_user_asking_result_question, tag_context_for_agent, ContextTag,
};
