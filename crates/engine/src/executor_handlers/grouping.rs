//! Regex-driven substring grouping.
//!
//! The select string is split into matching and non-matching segments.
//! Matching segments expose the substring groups — the whole match at
//! index 0, captures after it — through the execution context; the
//! non-matching variant always exposes an empty sequence. The previous
//! group state comes back on every exit path, so `current_group()`
//! outside any grouping body stays empty.

use crate::ast::{InstructionId, InstructionKind};
use crate::error::Fault;
use crate::executor::Interpreter;
use regex::RegexBuilder;
use weft_model::diag::DiagCode;
use weft_model::node::SourceNode;
use weft_model::sink::EventSink;

impl<'s, 'a, N: SourceNode<'a> + 'a> Interpreter<'s, 'a, N> {
    pub(crate) fn handle_analyze_string(
        &mut self,
        id: InstructionId,
        sink: &mut dyn EventSink,
    ) -> Result<(), Fault> {
        let InstructionKind::AnalyzeString {
            select,
            regex,
            flags,
        } = self.kind(id)
        else {
            return Ok(());
        };
        let input = self.evaluate(select)?.to_string();
        let pattern = self.evaluate_avt(regex)?;

        let mut builder = RegexBuilder::new(&pattern);
        if let Some(flags) = flags {
            for flag in flags.chars() {
                match flag {
                    'i' => {
                        builder.case_insensitive(true);
                    }
                    's' => {
                        builder.dot_matches_new_line(true);
                    }
                    'm' => {
                        builder.multi_line(true);
                    }
                    'x' => {
                        builder.ignore_whitespace(true);
                    }
                    _ => {}
                }
            }
        }
        let re = match builder.build() {
            Ok(re) => re,
            Err(e) => {
                return Err(self.fatal(
                    DiagCode::InvalidRegex,
                    Fault::InvalidRegex {
                        pattern,
                        message: e.to_string(),
                    },
                ));
            }
        };

        let matching = self.segment_body(id, true);
        let non_matching = self.segment_body(id, false);

        let saved_group = std::mem::take(&mut self.ctx.group);
        let mut result = Ok(());
        let mut last_end = 0usize;

        for captures in re.captures_iter(&input) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            if whole.start() > last_end
                && let Some(body) = non_matching
            {
                self.ctx.group = Vec::new();
                result = self.execute_children(body, sink);
                if result.is_err() {
                    break;
                }
            }
            if let Some(body) = matching {
                self.ctx.group = captures
                    .iter()
                    .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                result = self.execute_children(body, sink);
                if result.is_err() {
                    break;
                }
            }
            last_end = whole.end();
        }
        if result.is_ok()
            && last_end < input.len()
            && let Some(body) = non_matching
        {
            self.ctx.group = Vec::new();
            result = self.execute_children(body, sink);
        }

        self.ctx.group = saved_group;
        result
    }

    fn segment_body(&self, id: InstructionId, matching: bool) -> Option<InstructionId> {
        self.child_ids(id).iter().copied().find(|&child| {
            if matching {
                matches!(self.kind(child), InstructionKind::MatchingSubstring)
            } else {
                matches!(self.kind(child), InstructionKind::NonMatchingSubstring)
            }
        })
    }
}
