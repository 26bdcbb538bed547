//! Test doubles for the collaborator contracts, exported for integration
//! testing in downstream crates.
//!
//! [`MockTree`] is an arena-backed source tree built in document order
//! (node ids are preorder positions, so `Ord` on [`MockNode`] is document
//! order). [`MockEvaluator`] interprets a deliberately tiny slice of a
//! path language — just enough to drive the engine from tests without a
//! real front end.

use crate::diag::{DiagCode, Diagnostics, Location};
use crate::eval::{EvalContext, EvalError, Evaluator, Expr, Pattern, Scope};
use crate::node::{NodeType, QName, SourceNode};
use crate::sink::{Event, EventSink};
use crate::value::Value;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
struct MockNodeData {
    node_type: NodeType,
    name: Option<(Option<String>, String)>,
    value: String,
    children: Vec<usize>,
    attributes: Vec<usize>,
    parent: Option<usize>,
}

/// An in-memory source tree. Build it top-down: every builder call
/// appends the new node, so constructing in document order yields ids
/// that compare in document order.
#[derive(Debug, Default)]
pub struct MockTree {
    nodes: Vec<MockNodeData>,
}

impl MockTree {
    /// Creates a tree containing only the root node (id 0).
    pub fn new() -> Self {
        MockTree {
            nodes: vec![MockNodeData {
                node_type: NodeType::Root,
                name: None,
                value: String::new(),
                children: Vec::new(),
                attributes: Vec::new(),
                parent: None,
            }],
        }
    }

    pub fn root_id(&self) -> usize {
        0
    }

    pub fn element(&mut self, parent: usize, name: &str) -> usize {
        let (prefix, local) = split_name(name);
        self.append(
            parent,
            MockNodeData {
                node_type: NodeType::Element,
                name: Some((prefix, local)),
                value: String::new(),
                children: Vec::new(),
                attributes: Vec::new(),
                parent: Some(parent),
            },
            false,
        )
    }

    pub fn attribute(&mut self, element: usize, name: &str, value: &str) -> usize {
        let (prefix, local) = split_name(name);
        self.append(
            element,
            MockNodeData {
                node_type: NodeType::Attribute,
                name: Some((prefix, local)),
                value: value.to_string(),
                children: Vec::new(),
                attributes: Vec::new(),
                parent: Some(element),
            },
            true,
        )
    }

    pub fn text(&mut self, parent: usize, value: &str) -> usize {
        self.append(
            parent,
            MockNodeData {
                node_type: NodeType::Text,
                name: None,
                value: value.to_string(),
                children: Vec::new(),
                attributes: Vec::new(),
                parent: Some(parent),
            },
            false,
        )
    }

    pub fn comment(&mut self, parent: usize, value: &str) -> usize {
        self.append(
            parent,
            MockNodeData {
                node_type: NodeType::Comment,
                name: None,
                value: value.to_string(),
                children: Vec::new(),
                attributes: Vec::new(),
                parent: Some(parent),
            },
            false,
        )
    }

    pub fn pi(&mut self, parent: usize, target: &str, value: &str) -> usize {
        self.append(
            parent,
            MockNodeData {
                node_type: NodeType::ProcessingInstruction,
                name: Some((None, target.to_string())),
                value: value.to_string(),
                children: Vec::new(),
                attributes: Vec::new(),
                parent: Some(parent),
            },
            false,
        )
    }

    pub fn node(&self, id: usize) -> MockNode<'_> {
        MockNode { id, tree: self }
    }

    pub fn root(&self) -> MockNode<'_> {
        self.node(0)
    }

    fn append(&mut self, parent: usize, data: MockNodeData, as_attribute: bool) -> usize {
        let id = self.nodes.len();
        self.nodes.push(data);
        if as_attribute {
            self.nodes[parent].attributes.push(id);
        } else {
            self.nodes[parent].children.push(id);
        }
        id
    }

    fn string_value_of(&self, id: usize) -> String {
        let data = &self.nodes[id];
        match data.node_type {
            NodeType::Root | NodeType::Element => {
                let mut out = String::new();
                for &child in &data.children {
                    out.push_str(&self.string_value_of(child));
                }
                out
            }
            _ => data.value.clone(),
        }
    }
}

fn split_name(name: &str) -> (Option<String>, String) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, name.to_string()),
    }
}

/// A cheap handle into a [`MockTree`].
#[derive(Debug, Clone, Copy)]
pub struct MockNode<'a> {
    pub id: usize,
    pub tree: &'a MockTree,
}

impl<'a> MockNode<'a> {
    fn tree_addr(&self) -> usize {
        self.tree as *const MockTree as usize
    }
}

impl<'a> PartialEq for MockNode<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.tree, other.tree)
    }
}
impl<'a> Eq for MockNode<'a> {}

impl<'a> PartialOrd for MockNode<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<'a> Ord for MockNode<'a> {
    // Document order within one tree; trees ordered by address so that
    // the ordering stays total across documents.
    fn cmp(&self, other: &Self) -> Ordering {
        self.tree_addr()
            .cmp(&other.tree_addr())
            .then(self.id.cmp(&other.id))
    }
}

impl<'a> Hash for MockNode<'a> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tree_addr().hash(state);
        self.id.hash(state);
    }
}

impl<'a> SourceNode<'a> for MockNode<'a> {
    fn node_type(&self) -> NodeType {
        self.tree.nodes[self.id].node_type
    }

    fn name(&self) -> Option<QName<'a>> {
        self.tree.nodes[self.id]
            .name
            .as_ref()
            .map(|(prefix, local)| QName {
                prefix: prefix.as_deref(),
                local_part: local,
            })
    }

    fn string_value(&self) -> String {
        self.tree.string_value_of(self.id)
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let tree = self.tree;
        let ids = tree.nodes[self.id].attributes.clone();
        Box::new(ids.into_iter().map(move |id| MockNode { id, tree }))
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let tree = self.tree;
        let ids = tree.nodes[self.id].children.clone();
        Box::new(ids.into_iter().map(move |id| MockNode { id, tree }))
    }

    fn parent(&self) -> Option<Self> {
        self.tree.nodes[self.id].parent.map(|id| MockNode {
            id,
            tree: self.tree,
        })
    }
}

/// A sample document shared by several test suites:
///
/// ```text
/// <root>
///   <para id="p1">Hello</para>
///   <!-- note -->
///   <div/>
///   <?target data?>
///   <para>World</para>
/// </root>
/// ```
pub fn create_test_tree() -> MockTree {
    let mut tree = MockTree::new();
    let root = tree.root_id();
    let para1 = tree.element(root, "para");
    tree.attribute(para1, "id", "p1");
    tree.text(para1, "Hello");
    tree.comment(root, " note ");
    tree.element(root, "div");
    tree.pi(root, "target", "data");
    let para2 = tree.element(root, "para");
    tree.text(para2, "World");
    tree
}

/// An [`EventSink`] that records every event in call order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<Event>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenated character content.
    pub fn text(&self) -> String {
        crate::sink::text_of(&self.events)
    }

    /// Renders the event stream as angle-bracket markup for compact
    /// assertions. Attributes and namespaces are attached to the
    /// immediately preceding start-element; ones arriving later (the
    /// pending-attribute case) render as `{@name=value}` markers.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < self.events.len() {
            match &self.events[i] {
                Event::StartElement(name) => {
                    out.push('<');
                    out.push_str(&name.to_string());
                    let mut j = i + 1;
                    while let Some(event) = self.events.get(j) {
                        match event {
                            Event::Attribute { name, value } => {
                                out.push_str(&format!(" {}=\"{}\"", name, value));
                            }
                            Event::Namespace { prefix, uri, .. } => {
                                out.push_str(&format!(" xmlns:{}=\"{}\"", prefix, uri));
                            }
                            _ => break,
                        }
                        j += 1;
                    }
                    out.push('>');
                    i = j;
                    continue;
                }
                Event::EndElement(name) => {
                    out.push_str(&format!("</{}>", name));
                }
                Event::Attribute { name, value } => {
                    out.push_str(&format!("{{@{}={}}}", name, value));
                }
                Event::Namespace { prefix, uri, .. } => {
                    out.push_str(&format!("{{xmlns:{}={}}}", prefix, uri));
                }
                Event::Characters(text) => out.push_str(text),
                Event::Comment(text) => {
                    out.push_str(&format!("<!--{}-->", text));
                }
                Event::ProcessingInstruction { target, data } => {
                    out.push_str(&format!("<?{} {}?>", target, data));
                }
            }
            i += 1;
        }
        out
    }
}

impl EventSink for RecordingSink {
    fn start_element(&mut self, name: &crate::node::Name) {
        self.events.push(Event::StartElement(name.clone()));
    }
    fn end_element(&mut self, name: &crate::node::Name) {
        self.events.push(Event::EndElement(name.clone()));
    }
    fn attribute(&mut self, name: &crate::node::Name, value: &str) {
        self.events.push(Event::Attribute {
            name: name.clone(),
            value: value.to_string(),
        });
    }
    fn namespace(&mut self, prefix: &str, uri: &str, excluded: bool) {
        self.events.push(Event::Namespace {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
            excluded,
        });
    }
    fn characters(&mut self, text: &str) {
        self.events.push(Event::Characters(text.to_string()));
    }
    fn comment(&mut self, text: &str) {
        self.events.push(Event::Comment(text.to_string()));
    }
    fn processing_instruction(&mut self, target: &str, data: &str) {
        self.events.push(Event::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
    }
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagRecord {
    Fatal { code: DiagCode, detail: String },
    Warn { code: DiagCode, detail: String },
    Message(String),
}

/// A [`Diagnostics`] implementation that collects reports for assertions.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    records: RefCell<Vec<DiagRecord>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DiagRecord> {
        self.records.borrow().clone()
    }

    pub fn fatal_codes(&self) -> Vec<DiagCode> {
        self.records
            .borrow()
            .iter()
            .filter_map(|r| match r {
                DiagRecord::Fatal { code, .. } => Some(*code),
                _ => None,
            })
            .collect()
    }

    pub fn warn_codes(&self) -> Vec<DiagCode> {
        self.records
            .borrow()
            .iter()
            .filter_map(|r| match r {
                DiagRecord::Warn { code, .. } => Some(*code),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter_map(|r| match r {
                DiagRecord::Message(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn fatal(&self, code: DiagCode, detail: &str, _locator: &Location) {
        self.records.borrow_mut().push(DiagRecord::Fatal {
            code,
            detail: detail.to_string(),
        });
    }

    fn warn(&self, code: DiagCode, detail: &str, _locator: &Location) {
        self.records.borrow_mut().push(DiagRecord::Warn {
            code,
            detail: detail.to_string(),
        });
    }

    fn message(&self, text: &str) {
        self.records.borrow_mut().push(DiagRecord::Message(text.to_string()));
    }
}

/// A scripted evaluator for driving the engine from tests.
///
/// Understood expression forms:
/// - `'literal'`, numbers, `true()`, `false()`
/// - `.` (context node), `position()`, `last()`
/// - `$name` — variable lookup through the scope
/// - paths of child steps: `item`, `*`, `text()`, `node()`, `@id`,
///   `items/item`, with a leading `/` starting at the document root
/// - `string(e)`, `number(e)`, `boolean(e)`, `not(e)`, `count(e)`,
///   `concat(e, ...)`
/// - `key('name', e)`, `regex-group(n)`, `current-group()`,
///   `format-number(e, 'picture')` / `format-number(e, 'picture', 'fmt')`
/// - `prefix:local(args...)` — stylesheet function invocation
///
/// Pattern forms mirror the expression steps: `/`, `*`, `name`,
/// `parent/name`, `@name`, `@*`, `text()`, `comment()`,
/// `processing-instruction()`, `node()`, with `|` alternatives.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockEvaluator;

impl<'a, N: SourceNode<'a>> Evaluator<'a, N> for MockEvaluator {
    fn evaluate(
        &self,
        expr: &Expr,
        ctx: &mut EvalContext<'a, '_, N>,
    ) -> Result<Value<N>, EvalError> {
        eval_str(&expr.source, ctx)
    }

    fn matches(&self, pattern: &Pattern, node: N) -> Result<bool, EvalError> {
        Ok(pattern_matches(pattern.source.trim(), node))
    }
}

fn eval_str<'a, N: SourceNode<'a>>(
    src: &str,
    ctx: &mut EvalContext<'a, '_, N>,
) -> Result<Value<N>, EvalError> {
    let src = src.trim();

    if let Some(inner) = quoted(src) {
        return Ok(Value::String(inner.to_string()));
    }
    if let Ok(n) = src.parse::<f64>() {
        return Ok(Value::Number(n));
    }
    match src {
        "true()" => return Ok(Value::Boolean(true)),
        "false()" => return Ok(Value::Boolean(false)),
        "position()" => return Ok(Value::Number(ctx.position as f64)),
        "last()" => return Ok(Value::Number(ctx.size as f64)),
        "." => return Ok(Value::NodeSet(vec![ctx.node])),
        "current-group()" => {
            return Ok(Value::String(ctx.scope.current_group().join(",")));
        }
        _ => {}
    }
    if let Some(name) = src.strip_prefix('$') {
        return ctx.scope.variable(name);
    }
    if let Some((fname, args_src)) = function_form(src) {
        if !matches!(fname, "text" | "node" | "comment") {
            return eval_function(fname, args_src, ctx);
        }
    }
    Ok(Value::NodeSet(eval_path(src, ctx)))
}

fn eval_function<'a, N: SourceNode<'a>>(
    fname: &str,
    args_src: &str,
    ctx: &mut EvalContext<'a, '_, N>,
) -> Result<Value<N>, EvalError> {
    let args = split_args(args_src);
    match fname {
        "string" => {
            let v = eval_str(args.first().copied().unwrap_or("."), ctx)?;
            Ok(Value::String(v.to_string()))
        }
        "number" => {
            let v = eval_str(args.first().copied().unwrap_or("."), ctx)?;
            Ok(Value::Number(v.to_number()))
        }
        "boolean" => {
            let v = eval_str(require_arg(&args, 0, fname)?, ctx)?;
            Ok(Value::Boolean(v.to_bool()))
        }
        "not" => {
            let v = eval_str(require_arg(&args, 0, fname)?, ctx)?;
            Ok(Value::Boolean(!v.to_bool()))
        }
        "count" => {
            let v = eval_str(require_arg(&args, 0, fname)?, ctx)?;
            match v {
                Value::NodeSet(nodes) => Ok(Value::Number(nodes.len() as f64)),
                other => Err(EvalError::Type(format!(
                    "count() requires a node-set, got {}",
                    other
                ))),
            }
        }
        "concat" => {
            let mut out = String::new();
            for arg in &args {
                out.push_str(&eval_str(arg, ctx)?.to_string());
            }
            Ok(Value::String(out))
        }
        "key" => {
            let name = quoted(require_arg(&args, 0, fname)?)
                .ok_or_else(|| EvalError::Type("key() name must be a literal".into()))?
                .to_string();
            let reference = eval_str(require_arg(&args, 1, fname)?, ctx)?;
            let nodes = ctx.scope.key(&name, &reference)?;
            Ok(Value::NodeSet(nodes))
        }
        "regex-group" => {
            let idx = eval_str(require_arg(&args, 0, fname)?, ctx)?.to_number() as usize;
            let group = ctx.scope.current_group().get(idx).cloned().unwrap_or_default();
            Ok(Value::String(group))
        }
        "format-number" => {
            let n = eval_str(require_arg(&args, 0, fname)?, ctx)?.to_number();
            let format_name = args.get(2).and_then(|a| quoted(a));
            let format = ctx.scope.decimal_format(format_name);
            if n.is_nan() {
                return Ok(Value::String(format.nan));
            }
            if n.is_infinite() {
                return Ok(Value::String(format.infinity));
            }
            let mut text = Value::<N>::Number(n.abs()).to_string();
            text = text.replace('.', &format.decimal_separator.to_string());
            if n < 0.0 {
                text.insert(0, format.minus_sign);
            }
            Ok(Value::String(text))
        }
        name if name.contains(':') => {
            let mut values = Vec::with_capacity(args.len());
            for arg in &args {
                values.push(eval_str(arg, ctx)?);
            }
            ctx.scope.call_function(name, &values)
        }
        other => Err(EvalError::UnknownFunction(other.to_string())),
    }
}

fn eval_path<'a, N: SourceNode<'a>>(src: &str, ctx: &mut EvalContext<'a, '_, N>) -> Vec<N> {
    let (mut nodes, rest) = if let Some(rest) = src.strip_prefix('/') {
        (vec![ctx.node.document_root()], rest)
    } else {
        (vec![ctx.node], src)
    };
    if rest.is_empty() {
        return nodes;
    }
    for step in rest.split('/') {
        let mut next = Vec::new();
        for node in &nodes {
            select_step(*node, step.trim(), &mut next);
        }
        nodes = next;
    }
    nodes
}

fn select_step<'a, N: SourceNode<'a>>(node: N, step: &str, out: &mut Vec<N>) {
    if let Some(attr) = step.strip_prefix('@') {
        for a in node.attributes() {
            if attr == "*" || a.name().is_some_and(|q| q.local_part == attr) {
                out.push(a);
            }
        }
        return;
    }
    for child in node.children() {
        let keep = match step {
            "node()" => true,
            "*" => child.node_type() == NodeType::Element,
            "text()" => child.node_type() == NodeType::Text,
            "comment()" => child.node_type() == NodeType::Comment,
            name => {
                child.node_type() == NodeType::Element
                    && child.name().is_some_and(|q| q.local_part == name)
            }
        };
        if keep {
            out.push(child);
        }
    }
}

fn pattern_matches<'a, N: SourceNode<'a>>(pattern: &str, node: N) -> bool {
    if pattern.contains('|') {
        return pattern
            .split('|')
            .any(|alt| pattern_matches(alt.trim(), node));
    }
    match node.node_type() {
        NodeType::Root => pattern == "/",
        NodeType::Element => {
            if pattern == "*" || pattern == "node()" {
                return true;
            }
            let Some(qname) = node.name() else {
                return false;
            };
            let name = qname.local_part;
            if pattern == name {
                return true;
            }
            if let Some((parent_part, last)) = pattern.rsplit_once('/') {
                let parent_ok = node
                    .parent()
                    .is_some_and(|p| pattern_matches(parent_part, p));
                return parent_ok && (last == name || last == "*");
            }
            false
        }
        NodeType::Text => pattern == "text()" || pattern == "node()",
        NodeType::Attribute => pattern
            .strip_prefix('@')
            .is_some_and(|p| p == "*" || node.name().is_some_and(|q| q.local_part == p)),
        NodeType::Comment => pattern == "comment()" || pattern == "node()",
        NodeType::ProcessingInstruction => {
            pattern == "processing-instruction()" || pattern == "node()"
        }
    }
}

fn quoted(src: &str) -> Option<&str> {
    let src = src.trim();
    if src.len() >= 2 && src.starts_with('\'') && src.ends_with('\'') {
        Some(&src[1..src.len() - 1])
    } else {
        None
    }
}

/// Splits `name(args)` into its parts; `None` when `src` is not a call.
fn function_form(src: &str) -> Option<(&str, &str)> {
    let open = src.find('(')?;
    if !src.ends_with(')') {
        return None;
    }
    let name = &src[..open];
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ':')
    {
        return None;
    }
    Some((name, &src[open + 1..src.len() - 1]))
}

/// Splits a comma-separated argument list at top level, respecting
/// quotes and nested parentheses.
fn split_args(src: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0usize;
    for (i, c) in src.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            ',' if !in_quote && depth == 0 => {
                args.push(src[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = src[start..].trim();
    if !last.is_empty() {
        args.push(last);
    }
    args
}

fn require_arg<'s>(args: &[&'s str], index: usize, fname: &str) -> Result<&'s str, EvalError> {
    args.get(index).copied().ok_or_else(|| {
        EvalError::Type(format!("{}() is missing argument {}", fname, index + 1))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::DecimalFormat;

    struct EmptyScope;

    impl<'a, N: SourceNode<'a>> Scope<'a, N> for EmptyScope {
        fn variable(&mut self, name: &str) -> Result<Value<N>, EvalError> {
            Err(EvalError::UndeclaredVariable(name.to_string()))
        }
        fn key(&mut self, name: &str, _reference: &Value<N>) -> Result<Vec<N>, EvalError> {
            Err(EvalError::UndeclaredKey(name.to_string()))
        }
        fn current_group(&self) -> Vec<String> {
            Vec::new()
        }
        fn call_function(&mut self, name: &str, _args: &[Value<N>]) -> Result<Value<N>, EvalError> {
            Err(EvalError::UnknownFunction(name.to_string()))
        }
        fn decimal_format(&mut self, _name: Option<&str>) -> DecimalFormat {
            DecimalFormat::default()
        }
    }

    fn eval<'a>(src: &str, node: MockNode<'a>) -> Value<MockNode<'a>> {
        let mut scope = EmptyScope;
        let mut ctx = EvalContext::new(node, 1, 1, &mut scope);
        eval_str(src, &mut ctx).expect("evaluation failed")
    }

    #[test]
    fn literals_and_context() {
        let tree = create_test_tree();
        let root = tree.root();
        assert_eq!(eval("'hi'", root).to_string(), "hi");
        assert_eq!(eval("2.5", root).to_number(), 2.5);
        assert!(eval("true()", root).to_bool());
        assert_eq!(eval("position()", root).to_number(), 1.0);
    }

    #[test]
    fn path_selection() {
        let tree = create_test_tree();
        let root = tree.root();
        let Value::NodeSet(paras) = eval("para", root) else {
            panic!("expected node-set");
        };
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].string_value(), "Hello");

        let Value::NodeSet(attrs) = eval("para/@id", root) else {
            panic!("expected node-set");
        };
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].string_value(), "p1");
    }

    #[test]
    fn string_functions() {
        let tree = create_test_tree();
        let root = tree.root();
        assert_eq!(eval("concat('a', 'b')", root).to_string(), "ab");
        assert_eq!(eval("count(para)", root).to_number(), 2.0);
        assert!(!eval("not(true())", root).to_bool());
    }

    #[test]
    fn patterns() {
        let tree = create_test_tree();
        let root = tree.root();
        let para = tree.node(1);
        assert!(pattern_matches("/", root));
        assert!(pattern_matches("para", para));
        assert!(pattern_matches("div | para", para));
        assert!(pattern_matches("*", para));
        assert!(!pattern_matches("div", para));
        assert!(pattern_matches("@id", tree.node(2)));
    }
}
