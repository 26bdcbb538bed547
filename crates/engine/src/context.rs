//! The mutable state threaded through every instruction.

use crate::ast::InstructionId;
use weft_model::diag::Location;
use weft_model::node::Name;

/// Index of a rule in the stylesheet's rule table.
pub type RuleId = usize;

/// Per-run execution state, mutated in place as instructions execute.
/// Anything an instruction changes for the duration of a nested call
/// (mode, current rule, locator) is captured by [`ExecutionContext::save`]
/// and put back with [`ExecutionContext::restore`] on every exit path.
#[derive(Debug)]
pub struct ExecutionContext<N> {
    /// The node instructions evaluate against; `None` before the first
    /// node is established or inside a synthetic context.
    pub current_node: Option<N>,
    /// 1-based position of the current node in the current node list.
    pub position: usize,
    pub size: usize,
    /// Current template mode; `None` is the unnamed mode.
    pub mode: Option<Name>,
    /// The rule whose body is executing; `None` in contexts where
    /// apply-imports is prohibited (iteration bodies, named templates
    /// invoked outside matching).
    pub current_rule: Option<RuleId>,
    /// Substring groups of the innermost grouping construct; empty
    /// outside one.
    pub group: Vec<String>,
    pub locator: Location,
    /// Attribute-set names currently being applied, for self-reference
    /// detection.
    pub active_attribute_sets: Vec<Name>,
    /// Active instruction frames, innermost last. Drives the recursion
    /// limit and recursion diagnostics.
    pub frames: Vec<InstructionId>,
}

/// Saved slice of the context around a nested call.
#[derive(Debug, Clone)]
pub struct ContextSave {
    mode: Option<Name>,
    current_rule: Option<RuleId>,
    locator: Location,
}

/// Saved node focus around an iteration.
#[derive(Debug, Clone, Copy)]
pub struct FocusSave<N> {
    current_node: Option<N>,
    position: usize,
    size: usize,
}

impl<N: Copy> ExecutionContext<N> {
    pub fn new() -> Self {
        ExecutionContext {
            current_node: None,
            position: 1,
            size: 1,
            mode: None,
            current_rule: None,
            group: Vec::new(),
            locator: Location::default(),
            active_attribute_sets: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn save(&self) -> ContextSave {
        ContextSave {
            mode: self.mode.clone(),
            current_rule: self.current_rule,
            locator: self.locator,
        }
    }

    pub fn restore(&mut self, save: ContextSave) {
        self.mode = save.mode;
        self.current_rule = save.current_rule;
        self.locator = save.locator;
    }

    pub fn save_focus(&self) -> FocusSave<N> {
        FocusSave {
            current_node: self.current_node,
            position: self.position,
            size: self.size,
        }
    }

    pub fn restore_focus(&mut self, save: FocusSave<N>) {
        self.current_node = save.current_node;
        self.position = save.position;
        self.size = save.size;
    }

    pub fn set_focus(&mut self, node: N, position: usize, size: usize) {
        self.current_node = Some(node);
        self.position = position;
        self.size = size;
    }
}

impl<N: Copy> Default for ExecutionContext<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_restore_round_trips() {
        let mut ctx: ExecutionContext<u32> = ExecutionContext::new();
        ctx.mode = Some(Name::local("toc"));
        ctx.current_rule = Some(3);
        ctx.locator = Location::new(10, 2);

        let saved = ctx.save();
        ctx.mode = None;
        ctx.current_rule = None;
        ctx.locator = Location::new(99, 1);
        ctx.restore(saved);

        assert_eq!(ctx.mode, Some(Name::local("toc")));
        assert_eq!(ctx.current_rule, Some(3));
        assert_eq!(ctx.locator, Location::new(10, 2));
    }

    #[test]
    fn focus_save_round_trips() {
        let mut ctx: ExecutionContext<u32> = ExecutionContext::new();
        ctx.set_focus(7, 2, 5);
        let saved = ctx.save_focus();
        ctx.set_focus(9, 1, 1);
        ctx.restore_focus(saved);
        assert_eq!(ctx.current_node, Some(7));
        assert_eq!((ctx.position, ctx.size), (2, 5));
    }
}
