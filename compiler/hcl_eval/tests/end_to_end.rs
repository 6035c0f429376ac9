//! End-to-end runs of the interpreter over hand-built documents.
//!
//! Each test builds a root context the way an embedding would: bind the
//! top-level block types, register functions, then hand over the module.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hcl_eval::errors::stanza_error;
use hcl_eval::{
    register_builtin_functions, register_builtin_stanzas, BlockState, Context, EvalErrorKind,
    EvalResult, FunctionRef, Interpreter, Signature, Stanza, StanzaOpener, StanzaRecords,
    StanzaSchema, Value,
};
use hcl_ir::{BinaryOp, Block, Expr, Module, Span, TemplatePart};
use pretty_assertions::assert_eq;

/// Records every `name` it sees into a caller-owned list.
struct Greet {
    names: Rc<RefCell<Vec<String>>>,
}

impl Stanza for Greet {
    fn attribute(&mut self, _ctx: &Context<'_>, name: &str, value: Value) -> EvalResult<()> {
        match (name, value.as_str()) {
            ("name", Some(s)) => {
                self.names.borrow_mut().push(s.to_string());
                Ok(())
            }
            ("name", None) => Err(stanza_error(format!(
                "`name` must be a string, got {}",
                value.type_name()
            ))),
            _ => Err(stanza_error(format!("greet does not take `{name}`"))),
        }
    }
}

fn bind_greet(root: &Context<'_>) -> Rc<RefCell<Vec<String>>> {
    let names: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = Rc::clone(&names);
    root.bind_stanza(
        "greet",
        StanzaOpener::unlabeled("greet", move || Greet {
            names: Rc::clone(&sink),
        }),
    )
    .unwrap();
    names
}

#[test]
fn greet_blocks_record_names_in_order() {
    let root = Context::new();
    let names = bind_greet(&root);
    let module = Module::default()
        .block(Block::new("greet").attr("name", Expr::string("a")))
        .block(Block::new("greet").attr("name", Expr::string("b")));

    Interpreter::new().execute(&module, &root).unwrap();

    assert_eq!(*names.borrow(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn unknown_block_type_yields_one_error() {
    let root = Context::new();
    let names = bind_greet(&root);
    let module = Module::default()
        .block(Block::new("greet").attr("name", Expr::string("a")))
        .block(Block::new("farewell").with_span(Span::new(30, 50)))
        .block(Block::new("greet").attr("name", Expr::string("b")));

    let report = Interpreter::new().run(&module, &root);

    assert_eq!(report.errors.len(), 1);
    let err = &report.errors[0];
    assert_eq!(
        err.kind,
        EvalErrorKind::UnknownStanza {
            name: "farewell".to_string()
        }
    );
    assert_eq!(err.span, Some(Span::new(30, 50)));
    assert_eq!(*names.borrow(), vec!["a".to_string(), "b".to_string()]);
    let states: Vec<BlockState> = report.outcomes.iter().map(|o| o.state).collect();
    assert_eq!(
        states,
        vec![BlockState::Closed, BlockState::Errored, BlockState::Closed]
    );
}

/// Counts hook calls into shared state.
struct Counting {
    attributes: Rc<RefCell<Vec<(String, u32)>>>,
    counter: Rc<Cell<u32>>,
    closes: Rc<Cell<u32>>,
}

impl Stanza for Counting {
    fn attribute(&mut self, _ctx: &Context<'_>, name: &str, _value: Value) -> EvalResult<()> {
        self.counter.set(self.counter.get() + 1);
        self.attributes
            .borrow_mut()
            .push((name.to_string(), self.counter.get()));
        Ok(())
    }

    fn close(&mut self, _ctx: &Context<'_>) -> EvalResult<()> {
        self.closes.set(self.closes.get() + 1);
        Ok(())
    }
}

#[test]
fn attributes_are_processed_in_document_order() {
    let attributes: Rc<RefCell<Vec<(String, u32)>>> = Rc::default();
    let counter = Rc::new(Cell::new(0));
    let closes = Rc::new(Cell::new(0));
    let root = Context::new();
    {
        let (attributes, counter, closes) =
            (Rc::clone(&attributes), Rc::clone(&counter), Rc::clone(&closes));
        root.bind_stanza(
            "count",
            StanzaOpener::unlabeled("count", move || Counting {
                attributes: Rc::clone(&attributes),
                counter: Rc::clone(&counter),
                closes: Rc::clone(&closes),
            }),
        )
        .unwrap();
    }
    let module = Module::default().block(
        Block::new("count")
            .attr("a", Expr::number(1.0))
            .attr("b", Expr::number(2.0))
            .attr("c", Expr::number(3.0)),
    );

    Interpreter::new().execute(&module, &root).unwrap();

    assert_eq!(
        *attributes.borrow(),
        vec![
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("c".to_string(), 3)
        ]
    );
    assert_eq!(closes.get(), 1);
}

#[test]
fn close_runs_exactly_once_when_body_fails() {
    let attributes: Rc<RefCell<Vec<(String, u32)>>> = Rc::default();
    let counter = Rc::new(Cell::new(0));
    let closes = Rc::new(Cell::new(0));
    let root = Context::new();
    {
        let (attributes, counter, closes) =
            (Rc::clone(&attributes), Rc::clone(&counter), Rc::clone(&closes));
        root.bind_stanza(
            "count",
            StanzaOpener::unlabeled("count", move || Counting {
                attributes: Rc::clone(&attributes),
                counter: Rc::clone(&counter),
                closes: Rc::clone(&closes),
            }),
        )
        .unwrap();
    }
    let module = Module::default()
        .block(
            Block::new("count")
                .attr("a", Expr::number(1.0))
                .attr("b", Expr::ident("undefined"))
                .attr("c", Expr::number(3.0)),
        )
        .block(Block::new("count").block(Block::new("nowhere")));

    let report = Interpreter::new().run(&module, &root);

    assert_eq!(report.errors.len(), 2);
    assert_eq!(report.errors[0].code(), "E1001");
    assert_eq!(report.errors[1].code(), "E1003");
    assert_eq!(*attributes.borrow(), vec![("a".to_string(), 1)]);
    assert_eq!(closes.get(), 2);
}

#[test]
fn short_circuit_never_calls_the_right_operand() {
    let root = Context::new();
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    root.register_function(
        "explode",
        FunctionRef::new("explode", Signature::new([]), move |_| {
            seen.set(seen.get() + 1);
            Err(stanza_error("explode() was called"))
        }),
    )
    .unwrap();
    let records = StanzaRecords::new();
    root.bind_stanza(
        "check",
        StanzaSchema::new()
            .attribute("a")
            .attribute("b")
            .opener("check", records.clone()),
    )
    .unwrap();

    let module = Module::default().block(
        Block::new("check")
            .attr(
                "a",
                Expr::binary(BinaryOp::And, Expr::bool(false), Expr::call("explode", vec![])),
            )
            .attr(
                "b",
                Expr::binary(BinaryOp::Or, Expr::bool(true), Expr::call("explode", vec![])),
            ),
    );
    Interpreter::new().execute(&module, &root).unwrap();

    assert_eq!(calls.get(), 0);
    assert_eq!(records.values("a"), vec![Value::Bool(false)]);
    assert_eq!(records.values("b"), vec![Value::Bool(true)]);
}

#[test]
fn object_literal_last_write_wins() {
    let root = Context::new();
    let records = StanzaRecords::new();
    root.bind_stanza(
        "obj",
        StanzaSchema::new().attribute("value").opener("obj", records.clone()),
    )
    .unwrap();
    let module = Module::default().block(Block::new("obj").attr(
        "value",
        Expr::object([("a", Expr::number(1.0)), ("a", Expr::number(2.0))]),
    ));

    Interpreter::new().execute(&module, &root).unwrap();

    assert_eq!(
        records.values("value"),
        vec![Value::map([("a".to_string(), Value::Number(2.0))])]
    );
}

#[test]
fn fail_fast_stops_after_first_failing_block() {
    let root = Context::new();
    let names = bind_greet(&root);
    let module = Module::default()
        .block(Block::new("greet").attr("name", Expr::string("a")))
        .block(Block::new("greet").attr("name", Expr::number(1.0)))
        .block(Block::new("greet").attr("name", Expr::string("c")));

    let mut interpreter = Interpreter::builder().fail_fast().build();
    let errors = interpreter.execute(&module, &root).unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().message(), "`name` must be a string, got number");
    assert_eq!(errors.first().block_path.as_deref(), Some("greet"));
    assert_eq!(*names.borrow(), vec!["a".to_string()]);
}

#[test]
fn best_effort_collects_every_failure_in_order() {
    let root = Context::new();
    let names = bind_greet(&root);
    let module = Module::default()
        .block(Block::new("greet").attr("name", Expr::number(1.0)))
        .block(Block::new("greet").attr("name", Expr::string("ok")))
        .block(Block::new("greet").attr("nickname", Expr::string("x")));

    let errors = Interpreter::new().execute(&module, &root).unwrap_err();

    let messages: Vec<String> = errors.iter().map(|e| e.message()).collect();
    assert_eq!(
        messages,
        vec![
            "`name` must be a string, got number".to_string(),
            "greet does not take `nickname`".to_string(),
        ]
    );
    assert_eq!(*names.borrow(), vec!["ok".to_string()]);
    assert!(errors.to_string().starts_with("evaluation failed with 2 errors"));
}

#[test]
fn project_with_nested_types_matrix_and_builtins() {
    let root = Context::new();
    register_builtin_functions(&root).unwrap();
    register_builtin_stanzas(&root).unwrap();

    let targets = StanzaRecords::new();
    let projects = StanzaRecords::new();
    let project = StanzaSchema::new()
        .required("name")
        .with_default("version", Value::string("0.1.0"))
        .nested(
            "target",
            StanzaSchema::new()
                .required("triple")
                .attribute("artifact")
                .opener("target", targets.clone()),
        );
    root.bind_stanza("project", project.opener("project", projects.clone()))
        .unwrap();

    let artifact = Expr::template(vec![
        TemplatePart::Interp(Expr::ident("name")),
        TemplatePart::Text("-".to_string()),
        TemplatePart::Interp(Expr::ident("version")),
        TemplatePart::Text("-".to_string()),
        TemplatePart::Interp(Expr::call("lower", vec![Expr::ident("os")])),
    ]);
    let module = Module::default()
        .attr("prefix", Expr::string("tool"))
        .block(
            Block::new("project")
                .attr(
                    "name",
                    Expr::binary(BinaryOp::Add, Expr::ident("prefix"), Expr::string("kit")),
                )
                .block(
                    Block::new("matrix")
                        .attr(
                            "os",
                            Expr::tuple(vec![Expr::string("Linux"), Expr::string("Darwin")]),
                        )
                        .block(
                            Block::new("target")
                                .attr(
                                    "triple",
                                    Expr::conditional(
                                        Expr::binary(
                                            BinaryOp::Eq,
                                            Expr::ident("os"),
                                            Expr::string("Linux"),
                                        ),
                                        Expr::string("x86_64-unknown-linux-gnu"),
                                        Expr::string("aarch64-apple-darwin"),
                                    ),
                                )
                                .attr("artifact", artifact),
                        ),
                ),
        );

    Interpreter::new().execute(&module, &root).unwrap();

    assert_eq!(
        targets.values("triple"),
        vec![
            Value::string("x86_64-unknown-linux-gnu"),
            Value::string("aarch64-apple-darwin"),
        ]
    );
    assert_eq!(
        targets.values("artifact"),
        vec![
            Value::string("toolkit-0.1.0-linux"),
            Value::string("toolkit-0.1.0-darwin"),
        ]
    );
    assert_eq!(projects.values("name"), vec![Value::string("toolkit")]);
    // Nothing declared inside a block leaks into the root scope.
    assert!(root.lookup("name").is_err());
    assert!(root.lookup("os").is_err());
    assert_eq!(root.lookup("prefix"), Ok(Value::string("tool")));
}
