//! Transition operations.
//!
//! Pure functions from a `ContextInfo` (plus a newly proposed statement)
//! to the next `DialogueState`. Nothing here mutates the context's state;
//! every operation copies the slice of history it keeps and builds a fresh
//! state around it. All operations funnel through [`add_new_item`].

use tracing::debug;

use crate::foundation::{Confirmation, InvariantViolation};
use crate::statement::{InputParam, Invocation, QueryExpression, Statement, Value};

use super::context::ContextInfo;
use super::state::{DialogueState, ExchangeItem};

/// The funnel primitive: a new state with the given act, keeping the right
/// prefix of the context's history and appending `new_items`.
///
/// Each new item has its default-valued parameters stripped, its results
/// cleared, and its confirmation stamped to `confirmation`.
///
/// For a `Proposed` confirmation the non-proposed prefix of the history is
/// kept (a proposal never discards agreed-upon work). Otherwise everything
/// after the current item is wiped, dropping previously accepted or
/// proposed continuations.
pub fn add_new_item(
    ctx: &ContextInfo,
    act: &str,
    act_params: Option<Vec<String>>,
    confirmation: Confirmation,
    new_items: Vec<ExchangeItem>,
) -> DialogueState {
    let mut items = new_items;
    for item in &mut items {
        item.statement.strip_default_params();
        item.results = None;
        item.confirmation = confirmation;
    }

    let mut history = Vec::new();
    if confirmation == Confirmation::Proposed {
        history.extend(
            ctx.state()
                .history
                .iter()
                .take_while(|item| !item.confirmation.is_proposed())
                .cloned(),
        );
    } else if let Some(current) = ctx.current_index() {
        history.extend(ctx.state().history[..=current].iter().cloned());
    }
    history.extend(items);

    debug!(act, %confirmation, items = history.len(), "building next dialogue state");
    DialogueState::new(act, act_params, history)
}

/// A state where only the act and its parameters change: the non-proposed
/// prefix of history is kept, proposals are dropped.
pub fn make_simple_state(
    ctx: &ContextInfo,
    act: &str,
    act_params: Option<Vec<String>>,
) -> DialogueState {
    let history = ctx
        .state()
        .history
        .iter()
        .take_while(|item| !item.confirmation.is_proposed())
        .cloned()
        .collect();
    DialogueState::new(act, act_params, history)
}

/// Inserts a new query right after the current item, keeping any trailing
/// non-proposed items (an already-accepted follow-up action survives a
/// search refinement).
///
/// # Errors
///
/// `NoCurrentItem` if the history is non-empty but nothing has executed
/// yet. An empty history is allowed: the very first user query.
pub fn add_query(
    ctx: &ContextInfo,
    act: &str,
    new_query: QueryExpression,
    confirmation: Confirmation,
) -> Result<DialogueState, InvariantViolation> {
    let new_item = ExchangeItem::pending(Statement::query(new_query), confirmation);

    let current = match ctx.current_index() {
        Some(current) => current,
        None if ctx.state().history.is_empty() => {
            return Ok(DialogueState::new(act, None, vec![new_item]));
        }
        None => return Err(InvariantViolation::NoCurrentItem),
    };

    let history = &ctx.state().history;
    let mut new_history: Vec<ExchangeItem> = history[..=current].to_vec();
    new_history.push(new_item);
    new_history.extend(
        history[current + 1..]
            .iter()
            .filter(|item| !item.confirmation.is_proposed())
            .cloned(),
    );
    Ok(DialogueState::new(act, None, new_history))
}

/// A new query and a new action together, both at the same confirmation
/// level, with wipe-after-current semantics (unlike [`add_query`], nothing
/// trailing survives).
pub fn add_query_and_action(
    ctx: &ContextInfo,
    act: &str,
    new_query: QueryExpression,
    new_action: Invocation,
    confirmation: Confirmation,
) -> DialogueState {
    let query_item = ExchangeItem::pending(Statement::query(new_query), confirmation);
    let action_item = ExchangeItem::pending(Statement::action(new_action), confirmation);
    add_new_item(ctx, act, None, confirmation, vec![query_item, action_item])
}

/// Accepts, confirms, or proposes an action.
///
/// Parameters carried by `action` are deliberately ignored: when the
/// pending item already invokes the same function its statement is reused,
/// either untouched (same confirmation, or a re-proposal) or with its
/// confirmation upgraded. Otherwise a fresh parameterless invocation is
/// appended.
pub fn add_action(
    ctx: &ContextInfo,
    act: &str,
    action: &Invocation,
    confirmation: Confirmation,
) -> DialogueState {
    if ctx.next_info().is_some() {
        let next = ctx.next().expect("next_info implies a pending item");
        if let Some(next_invocation) = next.statement.last_action() {
            if next_invocation.schema.is_same_function(&action.schema) {
                debug_assert!(!next.is_executed());
                if confirmation == Confirmation::Proposed || confirmation == next.confirmation {
                    // the action is already represented at this level;
                    // only the act changes
                    return DialogueState::new(act, None, ctx.state().history.clone());
                }
                let upgraded = ExchangeItem::pending(next.statement.clone(), confirmation);
                return add_new_item(ctx, act, None, confirmation, vec![upgraded]);
            }
        }
    }

    let bare = ExchangeItem::pending(
        Statement::action(Invocation::bare(action.schema.clone())),
        confirmation,
    );
    add_new_item(ctx, act, None, confirmation, vec![bare])
}

/// Sets one parameter on the pending action, merging in any other defined
/// parameters of `action`.
///
/// When no compatible pending item exists, a fresh invocation is built
/// from scratch; unset required inputs get an explicit placeholder so
/// executability checks keep seeing the statement as incomplete.
pub fn add_action_param(
    ctx: &ContextInfo,
    act: &str,
    action: &Invocation,
    param_name: &str,
    value: Value,
    confirmation: Confirmation,
) -> DialogueState {
    if ctx.next_info().is_some() {
        let next = ctx.next().expect("next_info implies a pending item");
        if let Some(next_invocation) = next.statement.last_action() {
            if next_invocation.schema.is_same_function(&action.schema) {
                let mut statement = next.statement.clone();
                let invocation = statement
                    .last_action_mut()
                    .expect("cloned statement keeps its action");
                invocation.set_or_add_param(param_name, value);
                invocation.merge_parameters(action);
                let item = ExchangeItem::pending(statement, confirmation);
                return add_new_item(ctx, act, None, confirmation, vec![item]);
            }
        }
    }

    let mut params = vec![InputParam::new(param_name, value)];
    for param in &action.params {
        if !param.value.is_defined() || param.name == param_name {
            continue;
        }
        params.push(param.clone());
    }
    for arg in action.schema.input_args().filter(|a| a.required) {
        if !params.iter().any(|p| p.name == arg.name) {
            params.push(InputParam::new(arg.name.clone(), Value::Undefined));
        }
    }

    let item = ExchangeItem::pending(
        Statement::action(Invocation::new(action.schema.clone(), params)),
        confirmation,
    );
    add_new_item(ctx, act, None, confirmation, vec![item])
}

/// Discards any pending item and inserts `action` exactly as given.
pub fn replace_action(
    ctx: &ContextInfo,
    act: &str,
    action: &Invocation,
    confirmation: Confirmation,
) -> DialogueState {
    let item = ExchangeItem::pending(Statement::action(action.clone()), confirmation);
    add_new_item(ctx, act, None, confirmation, vec![item])
}
