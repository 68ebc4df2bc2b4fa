//! Result classifier.
//!
//! Derives a `ResultInfo` from an executed history item: what shape of
//! statement produced the result and what shape the result itself has.
//! The context tagger's decision surface is built almost entirely on top
//! of these flags.

use crate::foundation::{acts, InvariantViolation};
use crate::statement::{QueryExpression, SortDirection, ValueType, ID_ARG};

use super::state::{DialogueState, ExchangeItem, ResultCount};

/// Result sets with at least this many records count as large.
pub const LARGE_RESULT_THRESHOLD: u64 = 10;

/// Classification of an executed history item.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultInfo {
    /// The statement is query-like (ends in a query, nothing left to run).
    pub is_table: bool,
    /// The user asked a question over the result: a projection, a
    /// compute-projection, an index selection, or an aggregation.
    pub is_question: bool,
    pub is_aggregation: bool,
    /// The underlying function returns a list.
    pub is_list: bool,
    /// The table has the "sort then take one" shape.
    pub arg_min_max_field: Option<(String, SortDirection)>,
    /// Explicitly projected output fields, sorted.
    pub projection: Option<Vec<String>>,
    pub has_error: bool,
    pub has_empty_result: bool,
    pub has_single_result: bool,
    pub has_large_result: bool,
    /// The first record carries a defined identifying field.
    pub has_id: bool,
    /// Type of the schema's identifying output argument, if any.
    pub id_type: Option<ValueType>,
}

impl ResultInfo {
    /// Classifies an executed item within its state.
    ///
    /// # Errors
    ///
    /// `UnexecutedItem` if the item has no results; classification of a
    /// pending item is a caller bug.
    pub fn classify(state: &DialogueState, item: &ExchangeItem) -> Result<Self, InvariantViolation> {
        let results = item.results.as_ref().ok_or(InvariantViolation::UnexecutedItem)?;

        let stmt = &item.statement;
        let is_table = stmt.is_table();

        let (is_question, is_aggregation, is_list, arg_min_max_field, mut projection);
        if is_table {
            let table = stmt.last_query().expect("table statement ends in a query");
            is_question =
                table.is_projection() || table.is_index_selection() || table.is_aggregation();
            is_aggregation = table.is_aggregation();
            is_list = stmt.schema().is_list();
            arg_min_max_field = table_arg_min_max(table);
            debug_assert!(arg_min_max_field.is_none() || is_question);
            projection = table.projection_arguments();
            if let Some(fields) = projection.as_mut() {
                fields.sort();
            }
        } else {
            is_question = false;
            is_aggregation = false;
            is_list = false;
            arg_min_max_field = None;
            // for the "what did that action produce" follow-up, the asked
            // fields travel in the dialogue-act parameters
            projection = if state.dialogue_act == acts::ACTION_QUESTION {
                state.dialogue_act_params.clone()
            } else {
                None
            };
        }

        let has_large_result = match &results.count {
            ResultCount::Symbolic(_) => true,
            ResultCount::Exact(n) => results.more || *n >= LARGE_RESULT_THRESHOLD,
        };
        let has_id = results
            .records
            .first()
            .and_then(|record| record.get(ID_ARG))
            .is_some_and(|value| value.is_defined());

        Ok(Self {
            is_table,
            is_question,
            is_aggregation,
            is_list,
            arg_min_max_field,
            projection,
            has_error: results.error.is_some(),
            has_empty_result: results.records.is_empty(),
            has_single_result: results.records.len() == 1,
            has_large_result,
            has_id,
            id_type: stmt.schema().id_arg_type().cloned(),
        })
    }
}

/// Detects the arg-min/max shape: after unwrapping projections, an index
/// of exactly 1 or -1 over a sort, or an equivalent slice (base 1 or -1,
/// limit 1). Index -1 of an ascending sort is the maximum, so the
/// direction inverts.
fn table_arg_min_max(table: &QueryExpression) -> Option<(String, SortDirection)> {
    let mut table = table;
    while let QueryExpression::Projection { inner, .. } = table {
        table = inner;
    }

    match table {
        QueryExpression::Index { inner, index } if *index == 1 || *index == -1 => {
            sort_extremum(inner, *index)
        }
        QueryExpression::Slice { inner, base, limit }
            if (*base == 1 || *base == -1) && *limit == 1 =>
        {
            sort_extremum(inner, *base)
        }
        _ => None,
    }
}

fn sort_extremum(inner: &QueryExpression, position: i64) -> Option<(String, SortDirection)> {
    if let QueryExpression::Sort {
        field, direction, ..
    } = inner
    {
        let direction = if position == -1 {
            direction.invert()
        } else {
            *direction
        };
        Some((field.clone(), direction))
    } else {
        None
    }
}
