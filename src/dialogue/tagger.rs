//! Context taggers.
//!
//! Turns a `ContextInfo` into the ordered list of opaque tags the
//! template-selection layer keys its rules on. The engine gives the tag
//! strings no meaning of its own.
//!
//! `tag_context_for_agent` is the policy's decision surface: a closed
//! decision table over the current user dialogue act. `get_context_tags`
//! is the unconditional secondary tag set shared by both sides.

use std::fmt;

use serde::Serialize;

use crate::foundation::{acts, InvariantViolation};
use crate::statement::ID_ARG;

use super::context::ContextInfo;
use super::result_info::ResultInfo;

/// An opaque label consumed by the template layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContextTag(String);

impl ContextTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContextTag {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for ContextTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for ContextTag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Fixed tag names.
pub mod tags {
    pub const END: &str = "end";
    pub const GREET: &str = "greet";
    pub const CANCEL: &str = "cancel";
    pub const LEARN_MORE: &str = "learn_more";
    pub const COMPLETED_ACTION_SUCCESS: &str = "completed_action_success";
    pub const COMPLETED_ACTION_ERROR: &str = "completed_action_error";
    pub const CONFIRM_ACTION: &str = "confirm_action";
    pub const INCOMPLETE_ACTION_AFTER_SEARCH: &str = "incomplete_action_after_search";
    pub const EMPTY_SEARCH_COMMAND: &str = "empty_search_command";
    pub const DISPLAY_NONLIST_RESULT: &str = "display_nonlist_result";
    pub const AGGREGATION_QUESTION: &str = "aggregation_question";
    pub const SINGLE_RESULT_SEARCH_COMMAND: &str = "single_result_search_command";
    pub const COMPLETE_SEARCH_COMMAND: &str = "complete_search_command";
    pub const SEARCH_COMMAND: &str = "search_command";

    pub const ANY_AGENT: &str = "sys_any";

    pub const MULTIDOMAIN: &str = "multidomain";
    pub const WITH_ACTION: &str = "with_action";
    pub const INCOMPLETE_ACTION: &str = "incomplete_action";
    pub const WITHOUT_ACTION: &str = "without_action";
    pub const WITH_ERROR: &str = "with_error";
    pub const WITH_RESULT: &str = "with_result";
    pub const WITH_TABLE_RESULT: &str = "with_table_result";
    pub const WITH_AGGREGATION_RESULT: &str = "with_aggregation_result";
    pub const FOR_RELATED_QUESTION: &str = "for_related_question";
    pub const WITH_RESULT_QUESTION: &str = "with_result_question";
    pub const WITH_RESULT_NOQUESTION: &str = "with_result_noquestion";
    pub const WITH_RESULT_ARGMINMAX: &str = "with_result_argminmax";
    pub const WITH_RESULT_AND_ACTION: &str = "with_result_and_action";
    pub const WITHOUT_PROJECTION: &str = "without_projection";
}

/// The shape of the current result, as the tagger's decision table sees
/// it. Closed so the `execute` branch is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultShape {
    /// A pure action statement executed.
    NonTable { has_empty: bool },
    EmptyTable,
    NonListTable,
    QuestionTable,
    PlainTable,
}

impl ResultShape {
    fn of(info: &ResultInfo) -> Self {
        if !info.is_table {
            ResultShape::NonTable {
                has_empty: info.has_empty_result,
            }
        } else if info.has_empty_result {
            // an aggregation cannot be empty, it would be zero
            ResultShape::EmptyTable
        } else if !info.is_list {
            ResultShape::NonListTable
        } else if info.is_question {
            ResultShape::QuestionTable
        } else {
            ResultShape::PlainTable
        }
    }
}

/// Tags the context on the user's side: one primary tag family per
/// dialogue act.
///
/// # Errors
///
/// Fatal on acts this policy does not recognize, on `greet` with a
/// non-empty history, and on `execute`/`ask_recommend` contexts that have
/// neither a pending action nor an executed result. The tagger must only
/// run once `current_index` is populated (after execution) unless an
/// action is pending.
pub fn tag_context_for_agent(ctx: &ContextInfo) -> Result<Vec<ContextTag>, InvariantViolation> {
    let act = ctx.dialogue_act();
    match act {
        // no continuation is possible after an explicit "end", but the
        // context is still tagged to generate the goodbye
        acts::END => Ok(vec![ContextTag::from(tags::END)]),

        acts::GREET => {
            if !ctx.state().history.is_empty() {
                return Err(InvariantViolation::GreetWithHistory);
            }
            Ok(vec![ContextTag::from(tags::GREET)])
        }

        acts::CANCEL => Ok(vec![ContextTag::from(tags::CANCEL)]),

        acts::ACTION_QUESTION => Ok(vec![ContextTag::from(tags::COMPLETED_ACTION_SUCCESS)]),

        acts::LEARN_MORE => {
            if ctx.results().is_none() {
                return Err(InvariantViolation::MissingResults {
                    act: act.to_string(),
                });
            }
            Ok(vec![ContextTag::from(tags::LEARN_MORE)])
        }

        acts::EXECUTE | acts::ASK_RECOMMEND => tag_execute(ctx),

        _ => Err(InvariantViolation::UnexpectedDialogueAct {
            act: act.to_string(),
        }),
    }
}

fn tag_execute(ctx: &ContextInfo) -> Result<Vec<ContextTag>, InvariantViolation> {
    if let Some(next_info) = ctx.next_info() {
        // a pending action we want to run; chain parameters are
        // meaningless for a bare pending query, which must wait for a
        // result instead
        if next_info.is_action
            && (next_info.chain_parameter.is_none() || next_info.chain_parameter_filled)
        {
            return Ok(if next_info.is_complete {
                vec![ContextTag::from(tags::CONFIRM_ACTION)]
            } else {
                vec![ContextTag::from(tags::INCOMPLETE_ACTION_AFTER_SEARCH)]
            });
        }
    }

    let info = ctx
        .result_info()
        .ok_or_else(|| InvariantViolation::MissingResultInfo {
            act: ctx.dialogue_act().to_string(),
        })?;

    if info.has_error {
        return Ok(vec![ContextTag::from(tags::COMPLETED_ACTION_ERROR)]);
    }

    let tags_for = |names: &[&str]| names.iter().copied().map(ContextTag::from).collect();
    Ok(match ResultShape::of(info) {
        ResultShape::NonTable { has_empty } => {
            if has_empty && action_should_have_result(ctx) {
                tags_for(&[tags::EMPTY_SEARCH_COMMAND])
            } else {
                tags_for(&[tags::COMPLETED_ACTION_SUCCESS])
            }
        }
        ResultShape::EmptyTable => tags_for(&[tags::EMPTY_SEARCH_COMMAND]),
        ResultShape::NonListTable => tags_for(&[tags::DISPLAY_NONLIST_RESULT]),
        ResultShape::QuestionTable => {
            if info.is_aggregation {
                // "how many restaurants nearby have more than 500 reviews?"
                tags_for(&[tags::AGGREGATION_QUESTION])
            } else if info.arg_min_max_field.is_some() || info.has_single_result {
                // answered like a single-result search, worded differently
                tags_for(&[
                    tags::SINGLE_RESULT_SEARCH_COMMAND,
                    tags::COMPLETE_SEARCH_COMMAND,
                ])
            } else if info.has_large_result {
                tags_for(&[tags::SEARCH_COMMAND, tags::COMPLETE_SEARCH_COMMAND])
            } else {
                tags_for(&[tags::COMPLETE_SEARCH_COMMAND])
            }
        }
        ResultShape::PlainTable => {
            if info.has_single_result {
                // we can recommend
                tags_for(&[
                    tags::SINGLE_RESULT_SEARCH_COMMAND,
                    tags::COMPLETE_SEARCH_COMMAND,
                ])
            } else if info.has_large_result && ctx.dialogue_act() != acts::ASK_RECOMMEND {
                // we can refine
                tags_for(&[tags::SEARCH_COMMAND, tags::COMPLETE_SEARCH_COMMAND])
            } else {
                tags_for(&[tags::COMPLETE_SEARCH_COMMAND])
            }
        }
    })
}

/// Secondary tags appended to every tagged context, agent or user side.
pub fn get_context_tags(ctx: &ContextInfo) -> Vec<ContextTag> {
    let mut out = Vec::new();

    if ctx.is_multi_domain() {
        out.push(ContextTag::from(tags::MULTIDOMAIN));
    }

    if let Some(next_info) = ctx.next_info() {
        out.push(ContextTag::from(tags::WITH_ACTION));
        if !next_info.is_complete {
            out.push(ContextTag::from(tags::INCOMPLETE_ACTION));
        }
    } else if ctx.result_info().is_some_and(|info| info.is_table) {
        out.push(ContextTag::from(tags::WITHOUT_ACTION));
    }

    let info = match ctx.result_info() {
        Some(info) => info,
        None => return out,
    };
    // a failed execution contributes only the error tag, even when partial
    // records came back with it
    if info.has_error {
        out.push(ContextTag::from(tags::WITH_ERROR));
        return out;
    }
    if info.has_empty_result {
        return out;
    }

    debug_assert!(ctx.results().is_some_and(|records| !records.is_empty()));
    out.push(ContextTag::from(tags::WITH_RESULT));
    if info.is_table && !info.is_aggregation {
        out.push(ContextTag::from(tags::WITH_TABLE_RESULT));
    }
    if info.is_aggregation {
        out.push(ContextTag::from(tags::WITH_AGGREGATION_RESULT));
    }

    if can_have_related_question(ctx) {
        out.push(ContextTag::from(tags::FOR_RELATED_QUESTION));
    }
    if is_user_asking_result_question(ctx) {
        out.push(ContextTag::from(tags::WITH_RESULT_QUESTION));
    } else {
        if info.arg_min_max_field.is_some() {
            out.push(ContextTag::from(tags::WITH_RESULT_ARGMINMAX));
        }
        out.push(ContextTag::from(tags::WITH_RESULT_NOQUESTION));
        if ctx.next_info().is_some() {
            out.push(ContextTag::from(tags::WITH_RESULT_AND_ACTION));
        }
        if info.projection.is_none() {
            out.push(ContextTag::from(tags::WITHOUT_PROJECTION));
        }
    }
    out
}

/// Is the user asking a question about the result, rather than refining a
/// search?
///
/// True for the action follow-up act, for compute questions, for a
/// first-turn query filtered on its identifying field, and whenever the
/// active projection is not a subset of the previous turn's projection.
pub fn is_user_asking_result_question(ctx: &ContextInfo) -> bool {
    if ctx.dialogue_act() == acts::ACTION_QUESTION {
        return true;
    }
    let current_index = match ctx.current_index() {
        Some(index) => index,
        None => return false,
    };
    let current = &ctx.state().history[current_index];
    let table = match current.statement.last_query() {
        Some(table) => table,
        None => return false,
    };
    if table.is_compute_projection() {
        return true;
    }

    if current_index == 0 {
        return table
            .find_filter()
            .is_some_and(|filter| filter.uses_param(ID_ARG));
    }

    let info = ctx
        .result_info()
        .expect("a context with a current item carries its result info");
    let current_projection = match &info.projection {
        Some(projection) => projection,
        None => return false,
    };

    let previous = &ctx.state().history[current_index - 1];
    // only executed statements make it below the current index
    let previous_info = ResultInfo::classify(ctx.state(), previous)
        .expect("items before the current one have executed");
    match &previous_info.projection {
        None => true,
        // a refinement may keep the same fields or lose some to a filter;
        // a grown or changed field set is a question
        Some(previous_projection) => {
            !is_subset(current_projection, previous_projection)
        }
    }
}

fn can_have_related_question(ctx: &ContextInfo) -> bool {
    ctx.current()
        .and_then(|item| item.statement.last_query())
        .map(|table| !table.schema().related().is_empty())
        .unwrap_or(false)
}

fn action_should_have_result(ctx: &ContextInfo) -> bool {
    ctx.current_function()
        .is_some_and(|schema| schema.has_output_args())
}

fn is_subset(small: &[String], big: &[String]) -> bool {
    small.iter().all(|element| big.contains(element))
}
