//! Dialogue-act name constants.
//!
//! Acts are symbolic labels chosen by the (external) template layer; the
//! engine only gives meaning to the ones listed here. User acts are bare
//! names, agent acts carry the `sys_` prefix.

// User-side acts understood by the context tagger.
pub const END: &str = "end";
pub const GREET: &str = "greet";
pub const CANCEL: &str = "cancel";
pub const EXECUTE: &str = "execute";
pub const ASK_RECOMMEND: &str = "ask_recommend";
pub const ACTION_QUESTION: &str = "action_question";
pub const LEARN_MORE: &str = "learn_more";

// Agent-side acts the engine special-cases.
pub const SYS_INIT: &str = "sys_init";
pub const SYS_END: &str = "sys_end";
pub const SYS_ACTION_SUCCESS: &str = "sys_action_success";
pub const SYS_ACTION_ERROR: &str = "sys_action_error";
pub const SYS_DISPLAY_RESULT: &str = "sys_display_result";
pub const SYS_SEARCH_QUESTION: &str = "sys_search_question";
pub const SYS_GENERIC_SEARCH_QUESTION: &str = "sys_generic_search_question";
pub const SYS_RECOMMEND_ONE: &str = "sys_recommend_one";

/// Prefix shared by every agent-side act.
pub const SYS_PREFIX: &str = "sys_";

/// Prefix of the recommendation family of agent acts.
pub const SYS_RECOMMEND_PREFIX: &str = "sys_recommend_";

/// Returns true if `act` ends the agent's turn once nothing is pending.
pub fn is_terminal_act(act: &str) -> bool {
    act.starts_with(SYS_RECOMMEND_PREFIX)
        || matches!(
            act,
            SYS_ACTION_SUCCESS | SYS_ACTION_ERROR | SYS_END | SYS_DISPLAY_RESULT
        )
}
