//! Iteration over a selected node sequence, with multi-key stable
//! sorting.

use crate::ast::{InstructionId, InstructionKind, SortDataType, SortKey, SortOrder};
use crate::error::Fault;
use crate::executor::Interpreter;
use std::cmp::Ordering;
use weft_model::diag::DiagCode;
use weft_model::eval::EvalError;
use weft_model::node::SourceNode;
use weft_model::sink::EventSink;
use weft_model::value::Value;

enum SortValue {
    Text(String),
    Number(f64),
}

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    pub(crate) fn handle_for_each(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::ForEach { select, sort_keys } = self.kind(id) else {
            return Ok(());
        };
        if self.ctx.current_node.is_none() {
            return Err(self.fatal(DiagCode::NullSourceNode, Fault::NullSourceNode));
        }
        let nodes = match self.evaluate(select)? {
            Value::NodeSet(nodes) => nodes,
            other => {
                let error = EvalError::Type(format!(
                    "iteration select must yield a node-set, got {}",
                    other
                ));
                return Err(self.fatal(DiagCode::EvalFailure, Fault::Eval(error)));
            }
        };
        let nodes = self.sort_node_set(nodes, sort_keys)?;

        // No current template rule inside the body: apply-imports is
        // suspended for the duration, including fault exits.
        let saved_rule = self.ctx.current_rule.take();
        let saved_focus = self.ctx.save_focus();
        let size = nodes.len();
        let mut result = Ok(());
        for (i, node) in nodes.into_iter().enumerate() {
            self.ctx.set_focus(node, i + 1, size);
            result = self.execute_children(id, sink);
            if result.is_err() {
                break;
            }
        }
        self.ctx.restore_focus(saved_focus);
        self.ctx.current_rule = saved_rule;
        result
    }

    /// Stable multi-key sort; key values and their comparison semantics
    /// come from the expression evaluator's coercions.
    pub(crate) fn sort_node_set(
        &mut self,
        nodes: Vec<N>,
        sort_keys: &[SortKey],
    ) -> Result<Vec<N>, Fault> {
        if sort_keys.is_empty() {
            return Ok(nodes);
        }

        let size = nodes.len();
        let mut sort_data: Vec<(N, Vec<SortValue>)> = Vec::with_capacity(size);
        for (i, node) in nodes.into_iter().enumerate() {
            let mut values = Vec::with_capacity(sort_keys.len());
            for key in sort_keys {
                let value = self.evaluate_at(&key.select, node, i + 1, size)?;
                let sort_value = match key.data_type {
                    SortDataType::Number => SortValue::Number(value.to_number()),
                    SortDataType::Text => SortValue::Text(value.to_string()),
                };
                values.push(sort_value);
            }
            sort_data.push((node, values));
        }

        sort_data.sort_by(|a, b| {
            for (i, (value_a, value_b)) in a.1.iter().zip(b.1.iter()).enumerate() {
                let ordering = match (value_a, value_b) {
                    (SortValue::Text(ta), SortValue::Text(tb)) => ta.cmp(tb),
                    (SortValue::Number(na), SortValue::Number(nb)) => {
                        na.partial_cmp(nb).unwrap_or(Ordering::Equal)
                    }
                    _ => Ordering::Equal,
                };
                if ordering != Ordering::Equal {
                    return if sort_keys[i].order == SortOrder::Descending {
                        ordering.reverse()
                    } else {
                        ordering
                    };
                }
            }
            Ordering::Equal
        });

        Ok(sort_data.into_iter().map(|(node, _)| node).collect())
    }
}
