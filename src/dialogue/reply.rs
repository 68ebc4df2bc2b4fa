//! Agent reply packaging.
//!
//! Once the policy has picked the agent's next state, `make_agent_reply`
//! bundles it with the freshly extracted context, the tag list the
//! template layer selects utterances by, and the end-of-turn flags.

use serde_json::Value as Aux;
use tracing::debug;

use crate::foundation::{acts, InvariantViolation};
use crate::statement::ValueType;

use super::context::ContextInfo;
use super::state::DialogueState;
use super::tagger::{get_context_tags, tags, ContextTag};

/// Collapsed tag for the whole `sys_recommend_*` family except
/// `sys_recommend_one`.
const SYS_RECOMMEND_MANY: &str = "sys_recommend_many";

/// Knobs for [`make_agent_reply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentReplyOptions {
    /// Overrides the end-of-dialogue flag. `None` applies the default rule:
    /// the act is terminal and nothing is pending.
    pub end: Option<bool>,
    /// The agent expects a verbatim answer (no parsing of the next turn).
    pub raw: bool,
}

/// A packaged agent turn: the new state with its derived context, the tags
/// to select a template by, and what the agent expects next.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    context: ContextInfo,
    tags: Vec<ContextTag>,
    expect: Option<ValueType>,
    end: bool,
    raw: bool,
}

impl AgentReply {
    /// The agent's new dialogue state.
    pub fn state(&self) -> &DialogueState {
        self.context.state()
    }

    pub fn context(&self) -> &ContextInfo {
        &self.context
    }

    pub fn tags(&self) -> &[ContextTag] {
        &self.tags
    }

    /// Type of the slot the agent is asking for, if the turn is a question.
    pub fn expect(&self) -> Option<&ValueType> {
        self.expect.as_ref()
    }

    /// True when the dialogue is over after this turn.
    pub fn end(&self) -> bool {
        self.end
    }

    /// True when the agent expects a verbatim answer.
    pub fn raw(&self) -> bool {
        self.raw
    }

    /// A copy of the reply with the end-of-dialogue flag overridden.
    pub fn set_end_bit(&self, end: bool) -> Self {
        let mut copy = self.clone();
        copy.end = end;
        copy
    }
}

/// Packages the agent's next state into a reply.
///
/// Re-extracts the context from `state` (so tags always describe the state
/// being uttered, not the one the user acted on) and attaches `aux`, the
/// opaque payload follow-up turns match against.
///
/// # Errors
///
/// `NotAgentAct` if the state's act lacks the `sys_` prefix; extraction
/// errors pass through.
pub fn make_agent_reply(
    state: DialogueState,
    aux: Aux,
    expect: Option<ValueType>,
    options: AgentReplyOptions,
) -> Result<AgentReply, InvariantViolation> {
    if !state.dialogue_act.starts_with(acts::SYS_PREFIX) {
        return Err(InvariantViolation::NotAgentAct {
            act: state.dialogue_act.clone(),
        });
    }

    let end = options
        .end
        .unwrap_or_else(|| acts::is_terminal_act(&state.dialogue_act) && !state.has_pending_item());

    let mut context = ContextInfo::extract(state)?;
    context.set_aux(aux);

    let mut reply_tags = vec![
        ContextTag::from(tags::ANY_AGENT),
        primary_tag(context.dialogue_act()),
    ];
    reply_tags.extend(get_context_tags(&context));

    debug!(
        act = context.dialogue_act(),
        end,
        raw = options.raw,
        tags = reply_tags.len(),
        "packaged agent reply"
    );

    Ok(AgentReply {
        context,
        tags: reply_tags,
        expect,
        end,
        raw: options.raw,
    })
}

/// Maps the agent act to its primary tag.
///
/// The generic search question shares the search-question templates; other
/// `*_question` acts collapse onto the act that asked them; the
/// recommendation family beyond `sys_recommend_one` shares one tag.
fn primary_tag(act: &str) -> ContextTag {
    if act == acts::SYS_GENERIC_SEARCH_QUESTION {
        return ContextTag::from(acts::SYS_SEARCH_QUESTION);
    }
    if act != acts::SYS_SEARCH_QUESTION {
        if let Some(base) = act.strip_suffix("_question") {
            return ContextTag::new(base);
        }
    }
    if act.starts_with(acts::SYS_RECOMMEND_PREFIX) && act != acts::SYS_RECOMMEND_ONE {
        return ContextTag::from(SYS_RECOMMEND_MANY);
    }
    ContextTag::new(act)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::state::{ExchangeItem, ExecutionResult, ResultRecord};
    use crate::foundation::Confirmation;
    use crate::statement::{
        ArgDef, FunctionSchema, FunctionType, Invocation, QueryExpression, Statement, Value,
        ID_ARG,
    };

    fn restaurant_schema() -> FunctionSchema {
        FunctionSchema::new(
            "com.yelp.restaurant",
            FunctionType::Query,
            vec![ArgDef::output(
                ID_ARG,
                ValueType::Entity("Restaurant".into()),
            )],
        )
        .with_list()
    }

    fn executed_query() -> ExchangeItem {
        let mut record = ResultRecord::new();
        record.insert(ID_ARG.into(), Value::entity("terun", "Restaurant"));
        ExchangeItem::executed(
            Statement::query(QueryExpression::Call(restaurant_schema())),
            Confirmation::Confirmed,
            ExecutionResult::of_records(vec![record]),
        )
    }

    fn pending_action() -> ExchangeItem {
        ExchangeItem::pending(
            Statement::action(Invocation::bare(FunctionSchema::new(
                "com.yelp.make_reservation",
                FunctionType::Action,
                vec![ArgDef::input(
                    "restaurant",
                    ValueType::Entity("Restaurant".into()),
                )],
            ))),
            Confirmation::Accepted,
        )
    }

    fn tag_names(reply: &AgentReply) -> Vec<&str> {
        reply.tags().iter().map(ContextTag::as_str).collect()
    }

    #[test]
    fn user_act_is_rejected() {
        let state = DialogueState::new("execute", None, vec![]);
        assert_eq!(
            make_agent_reply(state, Aux::Null, None, AgentReplyOptions::default()),
            Err(InvariantViolation::NotAgentAct {
                act: "execute".to_string()
            })
        );
    }

    #[test]
    fn any_agent_tag_leads_then_primary() {
        let state = DialogueState::new("sys_search_question", None, vec![executed_query()]);
        let reply =
            make_agent_reply(state, Aux::Null, None, AgentReplyOptions::default()).unwrap();
        assert_eq!(reply.tags()[0], tags::ANY_AGENT);
        assert_eq!(reply.tags()[1], "sys_search_question");
        assert!(tag_names(&reply).contains(&tags::WITH_RESULT));
    }

    #[test]
    fn generic_search_question_shares_search_question_templates() {
        assert_eq!(primary_tag("sys_generic_search_question"), "sys_search_question");
    }

    #[test]
    fn question_acts_collapse_onto_their_base_act() {
        assert_eq!(primary_tag("sys_ask_phone_question"), "sys_ask_phone");
        // except the search question, which keeps its own templates
        assert_eq!(primary_tag("sys_search_question"), "sys_search_question");
    }

    #[test]
    fn recommend_family_collapses_except_recommend_one() {
        assert_eq!(primary_tag("sys_recommend_two"), "sys_recommend_many");
        assert_eq!(primary_tag("sys_recommend_three"), "sys_recommend_many");
        assert_eq!(primary_tag("sys_recommend_one"), "sys_recommend_one");
    }

    #[test]
    fn terminal_act_with_nothing_pending_ends_the_dialogue() {
        let state = DialogueState::new("sys_action_success", None, vec![executed_query()]);
        let reply =
            make_agent_reply(state, Aux::Null, None, AgentReplyOptions::default()).unwrap();
        assert!(reply.end());
    }

    #[test]
    fn pending_item_keeps_the_dialogue_open() {
        let state = DialogueState::new(
            "sys_recommend_one",
            None,
            vec![executed_query(), pending_action()],
        );
        let reply =
            make_agent_reply(state, Aux::Null, None, AgentReplyOptions::default()).unwrap();
        assert!(!reply.end());
    }

    #[test]
    fn non_terminal_act_keeps_the_dialogue_open() {
        let state = DialogueState::new("sys_search_question", None, vec![executed_query()]);
        let reply =
            make_agent_reply(state, Aux::Null, None, AgentReplyOptions::default()).unwrap();
        assert!(!reply.end());
    }

    #[test]
    fn explicit_end_option_overrides_the_rule() {
        let state = DialogueState::new("sys_search_question", None, vec![executed_query()]);
        let reply = make_agent_reply(
            state,
            Aux::Null,
            None,
            AgentReplyOptions {
                end: Some(true),
                raw: false,
            },
        )
        .unwrap();
        assert!(reply.end());
    }

    #[test]
    fn set_end_bit_returns_an_overridden_copy() {
        let state = DialogueState::new("sys_end", None, vec![]);
        let reply =
            make_agent_reply(state, Aux::Null, None, AgentReplyOptions::default()).unwrap();
        assert!(reply.end());
        let reopened = reply.set_end_bit(false);
        assert!(!reopened.end());
        assert!(reply.end());
    }

    #[test]
    fn aux_payload_reaches_the_context() {
        let state = DialogueState::new("sys_recommend_one", None, vec![executed_query()]);
        let reply = make_agent_reply(
            state,
            serde_json::json!({"num_results": 1}),
            None,
            AgentReplyOptions::default(),
        )
        .unwrap();
        assert_eq!(reply.context().aux()["num_results"], 1);
    }

    #[test]
    fn expect_and_raw_travel_through() {
        let state = DialogueState::new("sys_slot_fill", None, vec![executed_query()]);
        let reply = make_agent_reply(
            state,
            Aux::Null,
            Some(ValueType::String),
            AgentReplyOptions {
                end: None,
                raw: true,
            },
        )
        .unwrap();
        assert_eq!(reply.expect(), Some(&ValueType::String));
        assert!(reply.raw());
    }
}
