//! The compiled stylesheet: an immutable instruction arena plus the named
//! resolution tables.
//!
//! Instructions live in an arena and refer to each other by integer
//! handle, with a non-owning parent back-reference used for ancestor
//! lookups (enclosing function, enclosing attribute set). The arena and
//! every table are built once by [`StylesheetBuilder`] — which raises all
//! structural errors at composition time — and are read-only afterwards,
//! so one [`CompiledStylesheet`] can serve any number of concurrent runs.

use crate::error::ComposeError;
use std::collections::HashMap;
use std::sync::OnceLock;
use weft_model::diag::Location;
use weft_model::eval::{DecimalFormat, Expr, Pattern};
use weft_model::node::Name;

/// Handle of an instruction in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionId(pub u32);

/// An attribute value template: literal text interleaved with expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Avt {
    Static(String),
    Dynamic(Vec<AvtPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AvtPart {
    Static(String),
    Dynamic(Expr),
}

impl Avt {
    pub fn fixed(text: impl Into<String>) -> Self {
        Avt::Static(text.into())
    }

    pub fn dynamic(expr: Expr) -> Self {
        Avt::Dynamic(vec![AvtPart::Dynamic(expr)])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDataType {
    Text,
    Number,
}

/// One sort key of an iteration; keys apply in declaration order as a
/// stable multi-key sort.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub select: Expr,
    pub order: SortOrder,
    pub data_type: SortDataType,
}

impl SortKey {
    pub fn text(select: Expr) -> Self {
        SortKey {
            select,
            order: SortOrder::Ascending,
            data_type: SortDataType::Text,
        }
    }

    pub fn number(select: Expr) -> Self {
        SortKey {
            select,
            order: SortOrder::Ascending,
            data_type: SortDataType::Number,
        }
    }

    pub fn descending(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }
}

/// The closed set of instruction kinds. The dispatcher matches this
/// exhaustively; new instructions extend the enum and the match.
#[derive(Debug)]
pub enum InstructionKind {
    /// Container for the body of a template rule or named template.
    Template,
    /// Declared parameter; bound by the caller or from its default.
    Param {
        name: Name,
        slot: usize,
        select: Option<Expr>,
    },
    /// Local variable binding in the current frame.
    Variable {
        name: Name,
        slot: usize,
        select: Option<Expr>,
    },
    Text(String),
    ValueOf {
        select: Expr,
    },
    If {
        test: Expr,
    },
    Choose,
    When {
        test: Expr,
    },
    Otherwise,
    ForEach {
        select: Expr,
        sort_keys: Vec<SortKey>,
    },
    ApplyTemplates {
        select: Option<Expr>,
        mode: Option<Name>,
        sort_keys: Vec<SortKey>,
    },
    ApplyImports,
    CallTemplate {
        name: Name,
        resolved: OnceLock<usize>,
    },
    WithParam {
        name: Name,
        select: Expr,
    },
    Copy,
    CopyOf {
        select: Expr,
    },
    Element {
        name: Avt,
        use_sets: Vec<Name>,
    },
    Attribute {
        name: Avt,
    },
    Comment,
    ProcessingInstruction {
        target: Avt,
    },
    Namespace {
        name: Avt,
        excluded: bool,
    },
    AttributeSet {
        name: Name,
        use_sets: Vec<Name>,
    },
    Message {
        terminate: bool,
    },
    Function {
        name: Name,
    },
    FunctionResult {
        select: Option<Expr>,
    },
    ExsltFunctionResult {
        select: Expr,
    },
    AnalyzeString {
        select: Expr,
        regex: Avt,
        flags: Option<String>,
    },
    MatchingSubstring,
    NonMatchingSubstring,
    ExtensionCall {
        namespace: String,
        local_name: String,
        attributes: Vec<(Name, Avt)>,
    },
    Unknown {
        name: Name,
    },
    Fallback,
}

impl InstructionKind {
    /// Constructs a named-call kind with an empty resolution cache.
    pub fn call_template(name: Name) -> Self {
        InstructionKind::CallTemplate {
            name,
            resolved: OnceLock::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InstructionKind::Template => "template",
            InstructionKind::Param { .. } => "param",
            InstructionKind::Variable { .. } => "variable",
            InstructionKind::Text(_) => "text",
            InstructionKind::ValueOf { .. } => "value-of",
            InstructionKind::If { .. } => "if",
            InstructionKind::Choose => "choose",
            InstructionKind::When { .. } => "when",
            InstructionKind::Otherwise => "otherwise",
            InstructionKind::ForEach { .. } => "for-each",
            InstructionKind::ApplyTemplates { .. } => "apply-templates",
            InstructionKind::ApplyImports => "apply-imports",
            InstructionKind::CallTemplate { .. } => "call-template",
            InstructionKind::WithParam { .. } => "with-param",
            InstructionKind::Copy => "copy",
            InstructionKind::CopyOf { .. } => "copy-of",
            InstructionKind::Element { .. } => "element",
            InstructionKind::Attribute { .. } => "attribute",
            InstructionKind::Comment => "comment",
            InstructionKind::ProcessingInstruction { .. } => "processing-instruction",
            InstructionKind::Namespace { .. } => "namespace",
            InstructionKind::AttributeSet { .. } => "attribute-set",
            InstructionKind::Message { .. } => "message",
            InstructionKind::Function { .. } => "function",
            InstructionKind::FunctionResult { .. } => "result",
            InstructionKind::ExsltFunctionResult { .. } => "func-result",
            InstructionKind::AnalyzeString { .. } => "analyze-string",
            InstructionKind::MatchingSubstring => "matching-substring",
            InstructionKind::NonMatchingSubstring => "non-matching-substring",
            InstructionKind::ExtensionCall { .. } => "extension-call",
            InstructionKind::Unknown { .. } => "unknown",
            InstructionKind::Fallback => "fallback",
        }
    }
}

/// A node of the compiled instruction tree.
#[derive(Debug)]
pub struct InstructionNode {
    pub kind: InstructionKind,
    pub children: Vec<InstructionId>,
    pub parent: Option<InstructionId>,
    pub location: Location,
}

/// A template invocable by name.
#[derive(Debug)]
pub struct NamedTemplate {
    pub name: Name,
    pub body: InstructionId,
}

/// A match template. Rules are consulted best-first per mode: higher
/// import precedence wins, then higher priority, then later declaration.
#[derive(Debug)]
pub struct TemplateRule {
    pub pattern: Pattern,
    pub mode: Option<Name>,
    pub priority: f64,
    pub precedence: u32,
    pub body: InstructionId,
}

#[derive(Debug)]
pub struct KeyDefinition {
    pub match_pattern: Pattern,
    pub use_expr: Expr,
}

/// A global binding; its slot is its index in the globals table and it is
/// forced lazily on first read.
#[derive(Debug)]
pub struct GlobalBinding {
    pub name: Name,
    pub select: Expr,
}

#[derive(Debug)]
pub struct FunctionDef {
    pub name: Name,
    pub node: InstructionId,
    pub param_count: usize,
}

/// Declared metadata an extension handler is resolved from.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionDecl {
    Script { language: String, source: String },
    NativeClass { class_name: String },
}

/// The immutable result of composition. Shared read-only across runs.
#[derive(Debug, Default)]
pub struct CompiledStylesheet {
    nodes: Vec<InstructionNode>,
    pub globals: Vec<GlobalBinding>,
    pub named_templates: Vec<NamedTemplate>,
    template_index: HashMap<Name, usize>,
    pub rules: Vec<TemplateRule>,
    rules_by_mode: HashMap<Option<Name>, Vec<usize>>,
    pub attribute_sets: HashMap<Name, Vec<InstructionId>>,
    pub keys: HashMap<Name, KeyDefinition>,
    pub decimal_formats: HashMap<Option<Name>, DecimalFormat>,
    pub functions: HashMap<Name, FunctionDef>,
    pub extensions: HashMap<String, ExtensionDecl>,
}

impl CompiledStylesheet {
    pub fn node(&self, id: InstructionId) -> &InstructionNode {
        &self.nodes[id.0 as usize]
    }

    pub fn children(&self, id: InstructionId) -> &[InstructionId] {
        &self.node(id).children
    }

    pub fn named_template(&self, name: &Name) -> Option<usize> {
        self.template_index.get(name).copied()
    }

    pub fn named_template_at(&self, index: usize) -> &NamedTemplate {
        &self.named_templates[index]
    }

    /// Rule indexes for a mode, best match first.
    pub fn rules_for_mode(&self, mode: Option<&Name>) -> &[usize] {
        self.rules_by_mode
            .get(&mode.cloned())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn rule(&self, index: usize) -> &TemplateRule {
        &self.rules[index]
    }

    /// Walks parent links from `id` (exclusive) to the nearest ancestor
    /// whose kind satisfies the predicate.
    pub fn enclosing(
        &self,
        id: InstructionId,
        mut pred: impl FnMut(&InstructionKind) -> bool,
    ) -> Option<InstructionId> {
        let mut current = self.node(id).parent;
        while let Some(ancestor) = current {
            if pred(&self.node(ancestor).kind) {
                return Some(ancestor);
            }
            current = self.node(ancestor).parent;
        }
        None
    }
}

/// Assembles a [`CompiledStylesheet`], raising structural errors as the
/// tree is built. Register functions only after their bodies are
/// complete: the parameter count is captured at registration.
#[derive(Debug, Default)]
pub struct StylesheetBuilder {
    sheet: CompiledStylesheet,
}

impl StylesheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instruction, optionally attached to a parent. Structural
    /// errors (disallowed child kind, misplaced parameter) are raised
    /// here, never at execution time.
    pub fn add(
        &mut self,
        parent: Option<InstructionId>,
        kind: InstructionKind,
        location: Location,
    ) -> Result<InstructionId, ComposeError> {
        if let Some(pid) = parent {
            let parent_kind = &self.sheet.node(pid).kind;
            if !allowed_child(parent_kind, &kind) {
                return Err(ComposeError::DisallowedChild {
                    parent: parent_kind.label(),
                    child: kind.label(),
                });
            }
            if matches!(kind, InstructionKind::Param { .. }) {
                let all_params = self
                    .sheet
                    .node(pid)
                    .children
                    .iter()
                    .all(|&c| matches!(self.sheet.node(c).kind, InstructionKind::Param { .. }));
                if !all_params {
                    return Err(ComposeError::MisplacedParam);
                }
            }
        }
        let id = InstructionId(self.sheet.nodes.len() as u32);
        self.sheet.nodes.push(InstructionNode {
            kind,
            children: Vec::new(),
            parent,
            location,
        });
        if let Some(pid) = parent {
            self.sheet.nodes[pid.0 as usize].children.push(id);
        }
        Ok(id)
    }

    /// `add` without a source location, for programmatic composition.
    pub fn instr(
        &mut self,
        parent: Option<InstructionId>,
        kind: InstructionKind,
    ) -> Result<InstructionId, ComposeError> {
        self.add(parent, kind, Location::default())
    }

    pub fn named_template(
        &mut self,
        name: Name,
        body: InstructionId,
    ) -> Result<(), ComposeError> {
        if self.sheet.template_index.contains_key(&name) {
            return Err(ComposeError::DuplicateTemplate(name));
        }
        let index = self.sheet.named_templates.len();
        self.sheet.named_templates.push(NamedTemplate {
            name: name.clone(),
            body,
        });
        self.sheet.template_index.insert(name, index);
        Ok(())
    }

    pub fn rule(
        &mut self,
        pattern: Pattern,
        mode: Option<Name>,
        priority: f64,
        precedence: u32,
        body: InstructionId,
    ) {
        self.sheet.rules.push(TemplateRule {
            pattern,
            mode,
            priority,
            precedence,
            body,
        });
    }

    /// Registers an attribute-set definition node. One name may
    /// accumulate several definitions; they concatenate in registration
    /// (import) order into one logical set.
    pub fn attribute_set(&mut self, node: InstructionId) -> Result<(), ComposeError> {
        let InstructionKind::AttributeSet { name, .. } = &self.sheet.node(node).kind else {
            return Err(ComposeError::DisallowedChild {
                parent: "attribute-set table",
                child: self.sheet.node(node).kind.label(),
            });
        };
        let name = name.clone();
        self.sheet.attribute_sets.entry(name).or_default().push(node);
        Ok(())
    }

    pub fn key(
        &mut self,
        name: Name,
        match_pattern: Pattern,
        use_expr: Expr,
    ) -> Result<(), ComposeError> {
        if self.sheet.keys.contains_key(&name) {
            return Err(ComposeError::DuplicateKey(name));
        }
        self.sheet.keys.insert(
            name,
            KeyDefinition {
                match_pattern,
                use_expr,
            },
        );
        Ok(())
    }

    pub fn decimal_format(&mut self, name: Option<Name>, format: DecimalFormat) {
        self.sheet.decimal_formats.insert(name, format);
    }

    /// Declares a global binding and returns its slot.
    pub fn global(&mut self, name: Name, select: Expr) -> usize {
        let slot = self.sheet.globals.len();
        self.sheet.globals.push(GlobalBinding { name, select });
        slot
    }

    /// Registers a function-definition node; its leading `Param` children
    /// determine the argument count, and the slot after them holds the
    /// invocation result.
    pub fn function(&mut self, node: InstructionId) -> Result<(), ComposeError> {
        let InstructionKind::Function { name } = &self.sheet.node(node).kind else {
            return Err(ComposeError::DisallowedChild {
                parent: "function table",
                child: self.sheet.node(node).kind.label(),
            });
        };
        let name = name.clone();
        if self.sheet.functions.contains_key(&name) {
            return Err(ComposeError::DuplicateFunction(name));
        }
        let param_count = self
            .sheet
            .node(node)
            .children
            .iter()
            .filter(|&&c| matches!(self.sheet.node(c).kind, InstructionKind::Param { .. }))
            .count();
        self.sheet.functions.insert(
            name.clone(),
            FunctionDef {
                name,
                node,
                param_count,
            },
        );
        Ok(())
    }

    pub fn declare_extension(&mut self, namespace: impl Into<String>, decl: ExtensionDecl) {
        self.sheet.extensions.insert(namespace.into(), decl);
    }

    pub fn build(mut self) -> CompiledStylesheet {
        let mut by_mode: HashMap<Option<Name>, Vec<usize>> = HashMap::new();
        for (index, rule) in self.sheet.rules.iter().enumerate() {
            by_mode.entry(rule.mode.clone()).or_default().push(index);
        }
        for indexes in by_mode.values_mut() {
            indexes.sort_by(|&a, &b| {
                let ra = &self.sheet.rules[a];
                let rb = &self.sheet.rules[b];
                rb.precedence
                    .cmp(&ra.precedence)
                    .then(
                        rb.priority
                            .partial_cmp(&ra.priority)
                            .unwrap_or(std::cmp::Ordering::Equal),
                    )
                    .then(b.cmp(&a))
            });
        }
        self.sheet.rules_by_mode = by_mode;
        self.sheet
    }
}

/// Which child kinds a parent admits. Kinds not named here accept the
/// general sequence constructors.
fn allowed_child(parent: &InstructionKind, child: &InstructionKind) -> bool {
    use InstructionKind as K;
    match parent {
        K::Choose => matches!(child, K::When { .. } | K::Otherwise),
        K::AnalyzeString { .. } => {
            matches!(child, K::MatchingSubstring | K::NonMatchingSubstring)
        }
        K::CallTemplate { .. } | K::ApplyTemplates { .. } => {
            matches!(child, K::WithParam { .. })
        }
        K::AttributeSet { .. } => matches!(child, K::Attribute { .. }),
        K::Text(_) | K::ValueOf { .. } | K::CopyOf { .. } | K::ApplyImports => false,
        K::Template | K::Function { .. } => {
            matches!(child, K::Param { .. }) || is_sequence_constructor(child)
        }
        K::ExtensionCall { .. } | K::Unknown { .. } => {
            matches!(child, K::Fallback) || is_sequence_constructor(child)
        }
        _ => is_sequence_constructor(child),
    }
}

fn is_sequence_constructor(kind: &InstructionKind) -> bool {
    use InstructionKind as K;
    !matches!(
        kind,
        K::When { .. }
            | K::Otherwise
            | K::MatchingSubstring
            | K::NonMatchingSubstring
            | K::WithParam { .. }
            | K::Param { .. }
            | K::Fallback
            | K::Template
            | K::AttributeSet { .. }
            | K::Function { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(src: &str) -> Expr {
        Expr::new(src)
    }

    #[test]
    fn when_is_rejected_outside_choose() {
        let mut builder = StylesheetBuilder::new();
        let template = builder.instr(None, InstructionKind::Template).unwrap();
        let err = builder
            .instr(
                Some(template),
                InstructionKind::When {
                    test: expr("true()"),
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            ComposeError::DisallowedChild {
                parent: "template",
                child: "when",
            }
        );
    }

    #[test]
    fn text_is_a_leaf() {
        let mut builder = StylesheetBuilder::new();
        let template = builder.instr(None, InstructionKind::Template).unwrap();
        let text = builder
            .instr(Some(template), InstructionKind::Text("x".into()))
            .unwrap();
        assert!(
            builder
                .instr(Some(text), InstructionKind::Text("y".into()))
                .is_err()
        );
    }

    #[test]
    fn params_must_lead() {
        let mut builder = StylesheetBuilder::new();
        let template = builder.instr(None, InstructionKind::Template).unwrap();
        builder
            .instr(Some(template), InstructionKind::Text("x".into()))
            .unwrap();
        let err = builder
            .instr(
                Some(template),
                InstructionKind::Param {
                    name: Name::local("p"),
                    slot: 0,
                    select: None,
                },
            )
            .unwrap_err();
        assert_eq!(err, ComposeError::MisplacedParam);
    }

    #[test]
    fn duplicate_named_template_is_rejected() {
        let mut builder = StylesheetBuilder::new();
        let body = builder.instr(None, InstructionKind::Template).unwrap();
        builder.named_template(Name::local("t"), body).unwrap();
        assert_eq!(
            builder.named_template(Name::local("t"), body),
            Err(ComposeError::DuplicateTemplate(Name::local("t")))
        );
    }

    #[test]
    fn rules_sort_best_first() {
        let mut builder = StylesheetBuilder::new();
        let b1 = builder.instr(None, InstructionKind::Template).unwrap();
        let b2 = builder.instr(None, InstructionKind::Template).unwrap();
        let b3 = builder.instr(None, InstructionKind::Template).unwrap();
        builder.rule(Pattern::new("para"), None, 0.0, 1, b1);
        builder.rule(Pattern::new("para"), None, 1.0, 1, b2);
        builder.rule(Pattern::new("para"), None, 5.0, 0, b3);
        let sheet = builder.build();
        let order = sheet.rules_for_mode(None);
        // Higher precedence beats higher priority; within a precedence the
        // higher priority wins.
        assert_eq!(order, &[1, 0, 2]);
    }

    #[test]
    fn enclosing_walks_parent_links() {
        let mut builder = StylesheetBuilder::new();
        let function = builder
            .instr(
                None,
                InstructionKind::Function {
                    name: Name::prefixed("f", "sum"),
                },
            )
            .unwrap();
        let choose = builder.instr(Some(function), InstructionKind::Choose).unwrap();
        let when = builder
            .instr(
                Some(choose),
                InstructionKind::When {
                    test: expr("true()"),
                },
            )
            .unwrap();
        let result = builder
            .instr(
                Some(when),
                InstructionKind::ExsltFunctionResult {
                    select: expr("1"),
                },
            )
            .unwrap();
        let sheet = builder.build();
        assert_eq!(
            sheet.enclosing(result, |k| matches!(k, InstructionKind::Function { .. })),
            Some(function)
        );
        assert_eq!(
            sheet.enclosing(function, |k| matches!(k, InstructionKind::Function { .. })),
            None
        );
    }
}
