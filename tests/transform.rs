//! Workspace integration tests: whole transformations against the mock
//! collaborators, plus the shared-stylesheet concurrency contract.

use std::sync::Arc;
use weft_engine::ast::{InstructionKind, SortKey};
use weft_engine::extensions::{ExtensionError, FnHandler};
use weft_engine::testkit::{avt, expr, name, pattern, run, run_with};
use weft_engine::{EngineConfig, Interpreter, StylesheetBuilder};
use weft_model::mock::{CollectingDiagnostics, MockEvaluator, MockTree, RecordingSink};

/// <catalog>
///   <book genre="sf"><title>Solaris</title></book>
///   <book genre="sf"><title>Dune</title></book>
///   <book genre="history"><title>SPQR</title></book>
/// </catalog>
fn catalog_tree() -> MockTree {
    let mut tree = MockTree::new();
    let root = tree.root_id();
    let catalog = tree.element(root, "catalog");
    for (genre, title) in [("sf", "Solaris"), ("sf", "Dune"), ("history", "SPQR")] {
        let book = tree.element(catalog, "book");
        tree.attribute(book, "genre", genre);
        let t = tree.element(book, "title");
        tree.text(t, title);
    }
    tree
}

#[test]
fn catalog_report_end_to_end() {
    weft::init_logging();

    let mut b = StylesheetBuilder::new();
    b.global(name("heading"), expr("'Catalog'"));
    b.key(name("by-genre"), pattern("book"), expr("string(@genre)"))
        .unwrap();

    // Attribute set shared by the emitted entries.
    let set = b
        .instr(
            None,
            InstructionKind::AttributeSet {
                name: name("entry-style"),
                use_sets: Vec::new(),
            },
        )
        .unwrap();
    let class = b
        .instr(Some(set), InstructionKind::Attribute { name: avt("class") })
        .unwrap();
    b.instr(Some(class), InstructionKind::Text("entry".into()))
        .unwrap();
    b.attribute_set(set).unwrap();

    // Named template rendering one book title.
    let entry = b.instr(None, InstructionKind::Template).unwrap();
    b.instr(
        Some(entry),
        InstructionKind::Param {
            name: name("prefix"),
            slot: 0,
            select: Some(expr("'- '")),
        },
    )
    .unwrap();
    let item = b
        .instr(
            Some(entry),
            InstructionKind::Element {
                name: avt("entry"),
                use_sets: vec![name("entry-style")],
            },
        )
        .unwrap();
    b.instr(
        Some(item),
        InstructionKind::ValueOf {
            select: expr("$prefix"),
        },
    )
    .unwrap();
    b.instr(
        Some(item),
        InstructionKind::ValueOf {
            select: expr("string(title)"),
        },
    )
    .unwrap();
    b.named_template(name("render-book"), entry).unwrap();

    // Rule for book elements: call the named template with a parameter.
    let book_body = b.instr(None, InstructionKind::Template).unwrap();
    let call = b
        .instr(
            Some(book_body),
            InstructionKind::call_template(name("render-book")),
        )
        .unwrap();
    b.instr(
        Some(call),
        InstructionKind::WithParam {
            name: name("prefix"),
            select: expr("'* '"),
        },
    )
    .unwrap();
    b.rule(pattern("book"), None, 0.0, 0, book_body);

    // Root rule: heading, then the books sorted by title.
    let root_body = b.instr(None, InstructionKind::Template).unwrap();
    let report = b
        .instr(
            Some(root_body),
            InstructionKind::Element {
                name: avt("report"),
                use_sets: Vec::new(),
            },
        )
        .unwrap();
    b.instr(
        Some(report),
        InstructionKind::ValueOf {
            select: expr("$heading"),
        },
    )
    .unwrap();
    b.instr(
        Some(report),
        InstructionKind::ApplyTemplates {
            select: Some(expr("catalog/book")),
            mode: None,
            sort_keys: vec![SortKey::text(expr("string(title)"))],
        },
    )
    .unwrap();
    b.rule(pattern("/"), None, 0.0, 0, root_body);
    let sheet = b.build();

    let tree = catalog_tree();
    let out = run(&sheet, &tree);
    assert!(out.result.is_ok(), "transform failed: {:?}", out.result);
    assert_eq!(
        out.rendered,
        "<report>Catalog\
         <entry class=\"entry\">* Dune</entry>\
         <entry class=\"entry\">* SPQR</entry>\
         <entry class=\"entry\">* Solaris</entry>\
         </report>"
    );
}

#[test]
fn key_lookup_drives_selection() {
    let mut b = StylesheetBuilder::new();
    b.key(name("by-genre"), pattern("book"), expr("string(@genre)"))
        .unwrap();
    let body = b.instr(None, InstructionKind::Template).unwrap();
    let for_each = b
        .instr(
            Some(body),
            InstructionKind::ForEach {
                select: expr("key('by-genre', 'sf')"),
                sort_keys: Vec::new(),
            },
        )
        .unwrap();
    b.instr(
        Some(for_each),
        InstructionKind::ValueOf {
            select: expr("string(title)"),
        },
    )
    .unwrap();
    b.instr(Some(for_each), InstructionKind::Text(";".into()))
        .unwrap();
    b.rule(pattern("/"), None, 0.0, 0, body);
    let sheet = b.build();

    let tree = catalog_tree();
    let out = run(&sheet, &tree);
    assert!(out.result.is_ok());
    assert_eq!(out.rendered, "Solaris;Dune;");
}

#[test]
fn extension_with_fallback_inside_report() {
    let mut b = StylesheetBuilder::new();
    let body = b.instr(None, InstructionKind::Template).unwrap();
    let call = b
        .instr(
            Some(body),
            InstructionKind::ExtensionCall {
                namespace: "urn:chart".into(),
                local_name: "histogram".into(),
                attributes: Vec::new(),
            },
        )
        .unwrap();
    let fallback = b.instr(Some(call), InstructionKind::Fallback).unwrap();
    b.instr(
        Some(fallback),
        InstructionKind::Text("(chart unavailable)".into()),
    )
    .unwrap();
    b.rule(pattern("/"), None, 0.0, 0, body);
    let sheet = b.build();

    let tree = catalog_tree();
    let out = run_with(&sheet, &tree, |registry| {
        registry.register_handler(
            "urn:chart",
            Arc::new(FnHandler(
                |_: &weft_engine::extensions::ExtensionInvocation,
                 _,
                 _: &mut dyn weft_model::sink::EventSink| {
                    Err(ExtensionError::new("renderer not installed"))
                },
            )),
        );
    });
    assert!(out.result.is_ok());
    assert_eq!(out.rendered, "(chart unavailable)");
}

#[test]
fn one_stylesheet_serves_concurrent_runs() {
    let mut b = StylesheetBuilder::new();
    let body = b.instr(None, InstructionKind::Template).unwrap();
    let for_each = b
        .instr(
            Some(body),
            InstructionKind::ForEach {
                select: expr("catalog/book"),
                sort_keys: Vec::new(),
            },
        )
        .unwrap();
    b.instr(
        Some(for_each),
        InstructionKind::ValueOf {
            select: expr("string(title)"),
        },
    )
    .unwrap();
    b.rule(pattern("/"), None, 0.0, 0, body);
    let sheet = b.build();

    let tree_a = catalog_tree();
    let tree_b = catalog_tree();
    let evaluator = MockEvaluator;

    let (left, right) = std::thread::scope(|scope| {
        let sheet = &sheet;
        let left = scope.spawn(|| {
            let diagnostics = CollectingDiagnostics::new();
            let mut sink = RecordingSink::new();
            let mut interp =
                Interpreter::new(sheet, &evaluator, &diagnostics, EngineConfig::default());
            interp.transform(tree_a.root(), &mut sink).unwrap();
            sink.render()
        });
        let right = scope.spawn(|| {
            let diagnostics = CollectingDiagnostics::new();
            let mut sink = RecordingSink::new();
            let mut interp =
                Interpreter::new(sheet, &evaluator, &diagnostics, EngineConfig::default());
            interp.transform(tree_b.root(), &mut sink).unwrap();
            sink.render()
        });
        (left.join().unwrap(), right.join().unwrap())
    });

    assert_eq!(left, "SolarisDuneSPQR");
    assert_eq!(left, right);
}
