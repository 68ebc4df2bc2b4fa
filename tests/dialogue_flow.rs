//! End-to-end turn scenarios: a full search, slot-fill, confirm, execute
//! round trip, plus a property check on the history shapes the transition
//! operations can produce.

use proptest::prelude::*;
use serde_json::json;

use dialogue_policy::dialogue::transitions::{add_action, add_action_param, add_query};
use dialogue_policy::dialogue::{
    make_agent_reply, tag_context_for_agent, AgentReplyOptions, ContextInfo, ContextTag,
    DialogueState, ExecutionResult, ResultRecord,
};
use dialogue_policy::foundation::{acts, Confirmation, InvariantViolation};
use dialogue_policy::statement::{
    ArgDef, Filter, FunctionSchema, FunctionType, Invocation, QueryExpression, Value, ValueType,
    ID_ARG,
};

fn restaurant_schema() -> FunctionSchema {
    FunctionSchema::new(
        "com.yelp.restaurant",
        FunctionType::Query,
        vec![
            ArgDef::output(ID_ARG, ValueType::Entity("Restaurant".into())),
            ArgDef::output("rating", ValueType::Number),
            ArgDef::optional_input("cuisine", ValueType::String),
        ],
    )
    .with_list()
}

fn reserve_schema() -> FunctionSchema {
    FunctionSchema::new(
        "com.yelp.make_reservation",
        FunctionType::Action,
        vec![
            ArgDef::input("restaurant", ValueType::Entity("Restaurant".into())),
            ArgDef::input("party_size", ValueType::Number),
            ArgDef::output("confirmation_number", ValueType::Number),
        ],
    )
}

fn restaurant_record(name: &str) -> ResultRecord {
    let mut record = ResultRecord::new();
    record.insert(ID_ARG.into(), Value::entity(name, "Restaurant"));
    record.insert("rating".into(), Value::Number(4));
    record
}

fn tag_names(tags: &[ContextTag]) -> Vec<&str> {
    tags.iter().map(ContextTag::as_str).collect()
}

/// The runtime side of a turn: fills in the results of the first pending
/// non-proposed item, leaving the rest of the state untouched.
fn execute_next(mut state: DialogueState, results: ExecutionResult) -> DialogueState {
    let pending = state
        .history
        .iter_mut()
        .find(|item| !item.is_executed() && !item.confirmation.is_proposed())
        .expect("a pending item to execute");
    pending.results = Some(results);
    state
}

#[test]
fn search_then_reserve_round_trip() {
    // turn 1: the user searches for pizza places
    let ctx = ContextInfo::initial();
    let query = QueryExpression::Filter {
        inner: Box::new(QueryExpression::Call(restaurant_schema())),
        filter: Filter::Atom {
            param: "cuisine".into(),
            value: Value::String("pizza".into()),
        },
    };
    let state = add_query(&ctx, acts::EXECUTE, query, Confirmation::Accepted).unwrap();
    assert_eq!(state.history.len(), 1);

    // before execution the context cannot be tagged: the pending query has
    // no result for the agent to talk about
    let ctx = ContextInfo::extract(state.clone()).unwrap();
    assert_eq!(
        tag_context_for_agent(&ctx),
        Err(InvariantViolation::MissingResultInfo {
            act: "execute".to_string()
        })
    );

    // the runtime executes the search and finds exactly one match
    let state = execute_next(
        state,
        ExecutionResult::of_records(vec![restaurant_record("terun")]),
    );
    let ctx = ContextInfo::extract(state).unwrap();
    assert_eq!(
        tag_names(&tag_context_for_agent(&ctx).unwrap()),
        ["single_result_search_command", "complete_search_command"]
    );

    // the agent recommends the match and proposes booking it
    let agent_state = add_action(
        &ctx,
        "sys_recommend_one",
        &Invocation::bare(reserve_schema()),
        Confirmation::Proposed,
    );
    let reply = make_agent_reply(
        agent_state,
        json!({"num_results": 1}),
        None,
        AgentReplyOptions::default(),
    )
    .unwrap();
    assert_eq!(reply.tags()[1], "sys_recommend_one");
    // the proposal is still pending, so the dialogue stays open
    assert!(!reply.end());

    // turn 2: the user accepts the proposal
    let state = add_action(
        reply.context(),
        acts::EXECUTE,
        &Invocation::bare(reserve_schema()),
        Confirmation::Accepted,
    );
    let ctx = ContextInfo::extract(state).unwrap();
    let next_info = ctx.next_info().unwrap();
    assert!(next_info.is_action);
    assert_eq!(next_info.chain_parameter.as_deref(), Some("restaurant"));
    assert!(!next_info.chain_parameter_filled);

    // the runtime wires the recommended restaurant into the action
    let state = add_action_param(
        &ctx,
        acts::EXECUTE,
        &Invocation::bare(reserve_schema()),
        "restaurant",
        Value::entity("terun", "Restaurant"),
        Confirmation::Accepted,
    );
    let ctx = ContextInfo::extract(state).unwrap();
    assert!(ctx.next_info().unwrap().chain_parameter_filled);
    assert_eq!(
        ctx.next_info().unwrap().missing_params,
        vec!["party_size".to_string()]
    );
    // a required slot is still open, so the agent must slot-fill
    assert_eq!(
        tag_names(&tag_context_for_agent(&ctx).unwrap()),
        ["incomplete_action_after_search"]
    );

    // turn 3: the user supplies the missing slot
    let state = add_action_param(
        &ctx,
        acts::EXECUTE,
        &Invocation::bare(reserve_schema()),
        "party_size",
        Value::Number(4),
        Confirmation::Accepted,
    );
    let ctx = ContextInfo::extract(state).unwrap();
    assert!(ctx.next_info().unwrap().is_complete);
    assert_eq!(
        tag_names(&tag_context_for_agent(&ctx).unwrap()),
        ["confirm_action"]
    );

    // turn 4: the user confirms; earlier parameters are kept as-is
    let state = add_action(
        &ctx,
        acts::EXECUTE,
        &Invocation::bare(reserve_schema()),
        Confirmation::Confirmed,
    );
    let confirmed = state.history.last().unwrap();
    assert_eq!(confirmed.confirmation, Confirmation::Confirmed);
    let booked = confirmed.statement.last_action().unwrap();
    assert_eq!(
        booked.param("restaurant").unwrap().value,
        Value::entity("terun", "Restaurant")
    );
    assert_eq!(booked.param("party_size").unwrap().value, Value::Number(4));

    // the runtime executes the reservation
    let mut outcome = ResultRecord::new();
    outcome.insert("confirmation_number".into(), Value::Number(271));
    let state = execute_next(state, ExecutionResult::of_records(vec![outcome]));
    let ctx = ContextInfo::extract(state).unwrap();
    assert_eq!(
        tag_names(&tag_context_for_agent(&ctx).unwrap()),
        ["completed_action_success"]
    );

    // the agent reports success; nothing is pending anymore, so this turn
    // ends the dialogue
    let reply = make_agent_reply(
        DialogueState::new(
            acts::SYS_ACTION_SUCCESS,
            None,
            ctx.state().history.clone(),
        ),
        serde_json::Value::Null,
        None,
        AgentReplyOptions::default(),
    )
    .unwrap();
    assert_eq!(reply.tags()[1], "sys_action_success");
    assert!(reply.end());
}

#[test]
fn failed_execution_surfaces_the_error() {
    let ctx = ContextInfo::initial();
    let state = add_query(
        &ctx,
        acts::EXECUTE,
        QueryExpression::Call(restaurant_schema()),
        Confirmation::Accepted,
    )
    .unwrap();
    let state = execute_next(state, ExecutionResult::error("network_down"));
    let ctx = ContextInfo::extract(state).unwrap();
    assert_eq!(ctx.error(), Some("network_down"));
    assert_eq!(
        tag_names(&tag_context_for_agent(&ctx).unwrap()),
        ["completed_action_error"]
    );
}

#[test]
fn refinement_keeps_the_accepted_action() {
    // search, accept an action, then refine the search: the accepted
    // action must survive the refinement
    let ctx = ContextInfo::initial();
    let state = add_query(
        &ctx,
        acts::EXECUTE,
        QueryExpression::Call(restaurant_schema()),
        Confirmation::Accepted,
    )
    .unwrap();
    let state = execute_next(
        state,
        ExecutionResult::of_records(vec![
            restaurant_record("terun"),
            restaurant_record("oren"),
        ]),
    );
    let ctx = ContextInfo::extract(state).unwrap();
    let state = add_action(
        &ctx,
        acts::EXECUTE,
        &Invocation::bare(reserve_schema()),
        Confirmation::Accepted,
    );
    let ctx = ContextInfo::extract(state).unwrap();

    let refined = QueryExpression::Filter {
        inner: Box::new(QueryExpression::Call(restaurant_schema())),
        filter: Filter::Atom {
            param: "cuisine".into(),
            value: Value::String("pizza".into()),
        },
    };
    let state = add_query(&ctx, acts::EXECUTE, refined, Confirmation::Accepted).unwrap();
    assert_eq!(state.history.len(), 3);
    assert!(state.history[1].statement.is_table());
    assert!(state.history[2].statement.last_action().is_some());
    assert_eq!(state.history[2].confirmation, Confirmation::Accepted);
}

// ── history-shape property ──────────────────────────────────────────────

#[derive(Debug, Clone)]
enum TurnOp {
    Query,
    Action(Confirmation),
    ActionParam(Confirmation),
    Execute,
}

fn confirmation_strategy() -> impl Strategy<Value = Confirmation> {
    prop_oneof![
        Just(Confirmation::Proposed),
        Just(Confirmation::Accepted),
        Just(Confirmation::Confirmed),
    ]
}

fn turn_op_strategy() -> impl Strategy<Value = TurnOp> {
    prop_oneof![
        Just(TurnOp::Query),
        confirmation_strategy().prop_map(TurnOp::Action),
        confirmation_strategy().prop_map(TurnOp::ActionParam),
        Just(TurnOp::Execute),
    ]
}

fn apply_turn(state: DialogueState, op: &TurnOp) -> DialogueState {
    let ctx = ContextInfo::extract(state.clone()).expect("transition output must extract");
    match op {
        TurnOp::Query => add_query(
            &ctx,
            acts::EXECUTE,
            QueryExpression::Call(restaurant_schema()),
            Confirmation::Accepted,
        )
        .unwrap_or(state),
        TurnOp::Action(confirmation) => add_action(
            &ctx,
            acts::EXECUTE,
            &Invocation::bare(reserve_schema()),
            *confirmation,
        ),
        TurnOp::ActionParam(confirmation) => add_action_param(
            &ctx,
            acts::EXECUTE,
            &Invocation::bare(reserve_schema()),
            "party_size",
            Value::Number(2),
            *confirmation,
        ),
        TurnOp::Execute => {
            let mut state = state;
            if let Some(pending) = state
                .history
                .iter_mut()
                .find(|item| !item.is_executed() && !item.confirmation.is_proposed())
            {
                pending.results =
                    Some(ExecutionResult::of_records(vec![restaurant_record("terun")]));
            }
            state
        }
    }
}

fn proposed_items_form_a_suffix(state: &DialogueState) -> bool {
    let mut seen_proposed = false;
    for item in &state.history {
        if item.confirmation.is_proposed() {
            seen_proposed = true;
        } else if seen_proposed {
            return false;
        }
    }
    true
}

proptest! {
    #[test]
    fn transition_chains_keep_histories_extractable(
        ops in prop::collection::vec(turn_op_strategy(), 1..10)
    ) {
        let mut state = DialogueState::initial();
        for op in &ops {
            state = apply_turn(state, op);
            prop_assert!(proposed_items_form_a_suffix(&state));
        }
        // the final state must still extract cleanly
        prop_assert!(ContextInfo::extract(state).is_ok());
    }
}
