#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use std::cell::RefCell;
use std::rc::Rc;

use hcl_ir::{BinaryOp, Span};
use pretty_assertions::assert_eq;

use super::*;
use crate::errors::stanza_error;
use crate::{EvalErrorKind, StanzaOpener};

type Log = Rc<RefCell<Vec<String>>>;

/// Logs every hook call as `type:hook[:detail]`.
struct Tracer {
    name: String,
    log: Log,
    fail_open: bool,
    fail_attribute: Option<&'static str>,
    fail_close: bool,
}

impl Tracer {
    fn push(&self, entry: String) {
        self.log.borrow_mut().push(entry);
    }
}

impl Stanza for Tracer {
    fn open<'c>(&mut self, ctx: &'c Context<'_>, _block: &Block) -> EvalResult<Context<'c>> {
        self.push(format!("{}:open", self.name));
        if self.fail_open {
            return Err(stanza_error("open refused"));
        }
        Ok(ctx.child())
    }

    fn attribute(&mut self, ctx: &Context<'_>, name: &str, value: Value) -> EvalResult<()> {
        self.push(format!("{}:attr:{name}={value}", self.name));
        if self.fail_attribute == Some(name) {
            return Err(stanza_error(format!("bad {name}")));
        }
        ctx.declare(name, value)
    }

    fn close(&mut self, _ctx: &Context<'_>) -> EvalResult<()> {
        self.push(format!("{}:close", self.name));
        if self.fail_close {
            return Err(stanza_error("close failed"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Default)]
struct Faults {
    open: bool,
    attribute: Option<&'static str>,
    close: bool,
}

fn bind(ctx: &Context<'_>, name: &'static str, log: &Log, faults: Faults) {
    let log = Rc::clone(log);
    let opener = StanzaOpener::new(move |_labels: &[Value]| {
        Ok(Tracer {
            name: name.to_string(),
            log: Rc::clone(&log),
            fail_open: faults.open,
            fail_attribute: faults.attribute,
            fail_close: faults.close,
        })
    });
    ctx.bind_stanza(name, opener).unwrap();
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

#[test]
fn test_protocol_order() {
    let log = Log::default();
    let root = Context::new();
    bind(&root, "outer", &log, Faults::default());
    bind(&root, "inner", &log, Faults::default());

    let module = Module::default().block(
        Block::new("outer")
            .block(Block::new("inner").attr("x", Expr::number(1.0)))
            .attr("a", Expr::number(1.0))
            .attr("b", Expr::number(2.0)),
    );
    let report = Interpreter::new().run(&module, &root);

    assert!(report.is_success());
    assert_eq!(
        entries(&log),
        vec![
            "outer:open",
            "inner:open",
            "inner:attr:x=1",
            "inner:close",
            "outer:attr:a=1",
            "outer:attr:b=2",
            "outer:close",
        ]
    );
    assert_eq!(report.outcomes[0].state, BlockState::Closed);
}

#[test]
fn test_nested_block_between_attributes_runs_in_place() {
    let log = Log::default();
    let root = Context::new();
    bind(&root, "outer", &log, Faults::default());
    bind(&root, "inner", &log, Faults::default());

    let module = Module::default().block(
        Block::new("outer")
            .attr("a", Expr::number(1.0))
            .block(Block::new("inner").attr("x", Expr::number(1.0)))
            .attr("c", Expr::number(3.0)),
    );
    Interpreter::new().execute(&module, &root).unwrap();

    assert_eq!(
        entries(&log),
        vec![
            "outer:open",
            "outer:attr:a=1",
            "inner:open",
            "inner:attr:x=1",
            "inner:close",
            "outer:attr:c=3",
            "outer:close",
        ]
    );
}

#[test]
fn test_nested_block_cannot_see_later_attributes() {
    let log = Log::default();
    let root = Context::new();
    bind(&root, "outer", &log, Faults::default());
    bind(&root, "inner", &log, Faults::default());

    let module = Module::default().block(
        Block::new("outer")
            .block(Block::new("inner").attr("y", Expr::ident("later")))
            .attr("later", Expr::number(1.0)),
    );
    let report = Interpreter::new().run(&module, &root);

    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[0].kind,
        EvalErrorKind::UnresolvedReference {
            name: "later".to_string()
        }
    );
    assert_eq!(report.errors[0].block_path.as_deref(), Some("outer > inner"));
    assert!(entries(&log).contains(&"outer:attr:later=1".to_string()));
}

#[test]
fn test_attribute_failure_skips_later_nested_blocks_only() {
    let log = Log::default();
    let root = Context::new();
    bind(
        &root,
        "outer",
        &log,
        Faults {
            attribute: Some("b"),
            ..Faults::default()
        },
    );
    bind(&root, "first", &log, Faults::default());
    bind(&root, "second", &log, Faults::default());

    let module = Module::default().block(
        Block::new("outer")
            .block(Block::new("first"))
            .attr("b", Expr::number(2.0))
            .block(Block::new("second")),
    );
    let report = Interpreter::new().run(&module, &root);

    assert_eq!(
        entries(&log),
        vec![
            "outer:open",
            "first:open",
            "first:close",
            "outer:attr:b=2",
            "outer:close",
        ]
    );
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn test_nested_block_sees_parent_attributes() {
    let log = Log::default();
    let root = Context::new();
    bind(&root, "outer", &log, Faults::default());
    bind(&root, "inner", &log, Faults::default());

    let module = Module::default().block(
        Block::new("outer").attr("a", Expr::number(2.0)).block(
            Block::new("inner").attr(
                "doubled",
                Expr::binary(BinaryOp::Mul, Expr::ident("a"), Expr::number(2.0)),
            ),
        ),
    );
    Interpreter::new().execute(&module, &root).unwrap();
    assert!(entries(&log).contains(&"inner:attr:doubled=4".to_string()));
    // The body scope is gone once the block closes.
    assert!(root.lookup("a").is_err());
}

#[test]
fn test_close_runs_after_attribute_failure() {
    let log = Log::default();
    let root = Context::new();
    bind(
        &root,
        "svc",
        &log,
        Faults {
            attribute: Some("b"),
            ..Faults::default()
        },
    );
    bind(&root, "inner", &log, Faults::default());

    let module = Module::default().block(
        Block::new("svc")
            .attr("a", Expr::number(1.0))
            .attr("b", Expr::number(2.0))
            .attr("c", Expr::number(3.0))
            .block(Block::new("inner")),
    );
    let report = Interpreter::new().run(&module, &root);

    assert_eq!(
        entries(&log),
        vec!["svc:open", "svc:attr:a=1", "svc:attr:b=2", "svc:close"]
    );
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].message(), "bad b");
    assert_eq!(report.errors[0].block_path.as_deref(), Some("svc"));
    assert_eq!(report.outcomes[0].state, BlockState::Errored);
}

#[test]
fn test_close_not_called_when_open_fails() {
    let log = Log::default();
    let root = Context::new();
    bind(
        &root,
        "svc",
        &log,
        Faults {
            open: true,
            ..Faults::default()
        },
    );
    let module = Module::default().block(Block::new("svc").attr("a", Expr::number(1.0)));
    let report = Interpreter::new().run(&module, &root);
    assert_eq!(entries(&log), vec!["svc:open"]);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].block_path.is_none());
}

#[test]
fn test_close_error_becomes_cause_of_body_error() {
    let log = Log::default();
    let root = Context::new();
    bind(
        &root,
        "svc",
        &log,
        Faults {
            attribute: Some("a"),
            close: true,
            ..Faults::default()
        },
    );
    let module = Module::default().block(Block::new("svc").attr("a", Expr::number(1.0)));
    let report = Interpreter::new().run(&module, &root);

    assert_eq!(report.errors.len(), 1);
    let err = &report.errors[0];
    assert_eq!(err.message(), "bad a");
    assert_eq!(err.causes.len(), 1);
    assert_eq!(err.causes[0].message(), "close failed");
}

#[test]
fn test_close_error_alone_fails_block() {
    let log = Log::default();
    let root = Context::new();
    bind(
        &root,
        "svc",
        &log,
        Faults {
            close: true,
            ..Faults::default()
        },
    );
    let module = Module::default().block(Block::new("svc").with_span(Span::new(0, 9)));
    let report = Interpreter::new().run(&module, &root);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].span, Some(Span::new(0, 9)));
}

#[test]
fn test_unknown_stanza_is_isolated() {
    let log = Log::default();
    let root = Context::new();
    bind(&root, "known", &log, Faults::default());

    let module = Module::default()
        .block(Block::new("known"))
        .block(Block::new("mystery").with_span(Span::new(10, 20)))
        .block(Block::new("known"));
    let report = Interpreter::new().run(&module, &root);

    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[0].kind,
        EvalErrorKind::UnknownStanza {
            name: "mystery".to_string()
        }
    );
    assert_eq!(report.errors[0].span, Some(Span::new(10, 20)));
    assert_eq!(report.count(BlockState::Closed), 2);
    assert_eq!(report.count(BlockState::Errored), 1);
}

#[test]
fn test_nested_failure_does_not_stop_siblings_in_best_effort() {
    let log = Log::default();
    let root = Context::new();
    bind(&root, "outer", &log, Faults::default());
    bind(&root, "ok", &log, Faults::default());

    let module = Module::default().block(
        Block::new("outer")
            .block(Block::new("missing"))
            .block(Block::new("ok")),
    );
    let report = Interpreter::new().run(&module, &root);

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].block_path.as_deref(), Some("outer"));
    assert!(entries(&log).contains(&"ok:close".to_string()));
    assert_eq!(report.outcomes[0].state, BlockState::Errored);
}

#[test]
fn test_fail_fast_aborts_run_and_still_closes() {
    let log = Log::default();
    let root = Context::new();
    bind(&root, "outer", &log, Faults::default());
    bind(&root, "ok", &log, Faults::default());

    let module = Module::default()
        .block(
            Block::new("outer")
                .block(Block::new("missing"))
                .block(Block::new("ok")),
        )
        .block(Block::new("ok"));
    let mut interpreter = Interpreter::builder().fail_fast().build();
    let report = interpreter.run(&module, &root);

    assert_eq!(report.errors.len(), 1);
    assert_eq!(entries(&log), vec!["outer:open", "outer:close"]);
    assert_eq!(report.outcomes.len(), 1);
}

#[test]
fn test_module_attributes_are_declared_in_root() {
    let log = Log::default();
    let root = Context::new();
    bind(&root, "svc", &log, Faults::default());
    let module = Module::default()
        .attr("region", Expr::string("eu"))
        .block(Block::new("svc").attr("where", Expr::ident("region")));
    Interpreter::new().execute(&module, &root).unwrap();
    assert_eq!(root.lookup("region"), Ok(Value::string("eu")));
    assert!(entries(&log).contains(&"svc:attr:where=\"eu\"".to_string()));
}

#[test]
fn test_module_attribute_redeclaration_is_recorded() {
    let root = Context::new();
    let module = Module::default()
        .attr("x", Expr::number(1.0))
        .attr("x", Expr::number(2.0));
    let errors = Interpreter::new().execute(&module, &root).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().code(), "E1020");
}

#[test]
fn test_block_filters() {
    let log = Log::default();
    let root = Context::new();
    for name in ["a", "b", "c"] {
        bind(&root, name, &log, Faults::default());
    }
    let module = Module::default()
        .block(Block::new("a").block(Block::new("c")))
        .block(Block::new("b"))
        .block(Block::new("c"));

    let mut interpreter = Interpreter::builder()
        .enable_blocks(["a", "b", "c"])
        .disable_blocks(["c"])
        .build();
    let report = interpreter.run(&module, &root);

    assert!(report.is_success());
    assert_eq!(
        entries(&log),
        vec!["a:open", "a:close", "b:open", "b:close"]
    );
    assert_eq!(report.outcomes.len(), 2);
}

#[test]
fn test_max_nesting() {
    let log = Log::default();
    let root = Context::new();
    bind(&root, "n", &log, Faults::default());
    let module = Module::default().block(
        Block::new("n").block(Block::new("n").block(Block::new("n"))),
    );

    let mut interpreter = Interpreter::builder().max_nesting(2).build();
    let report = interpreter.run(&module, &root);

    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[0].kind,
        EvalErrorKind::NestingTooDeep { limit: 2 }
    );
    assert_eq!(report.errors[0].block_path.as_deref(), Some("n > n"));
    assert_eq!(
        entries(&log),
        vec!["n:open", "n:open", "n:close", "n:close"]
    );
}

#[test]
fn test_labels_are_evaluated_in_enclosing_scope() {
    let seen: Rc<RefCell<Vec<Value>>> = Rc::default();
    let root = Context::new();
    root.declare("env", Value::string("prod")).unwrap();
    let sink = Rc::clone(&seen);
    let opener = StanzaOpener::new(move |labels: &[Value]| {
        sink.borrow_mut().extend(labels.iter().cloned());
        Ok(Labelled)
    });
    root.bind_stanza("deploy", opener).unwrap();

    struct Labelled;
    impl Stanza for Labelled {}

    let module = Module::default().block(
        Block::new("deploy")
            .label(Expr::string("web"))
            .label(Expr::ident("env")),
    );
    Interpreter::new().execute(&module, &root).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![Value::string("web"), Value::string("prod")]
    );
}

#[test]
fn test_default_attribute_hook_rejects() {
    struct Bare;
    impl Stanza for Bare {}

    let root = Context::new();
    root.bind_stanza("bare", StanzaOpener::unlabeled("bare", || Bare))
        .unwrap();
    let module = Module::default().block(Block::new("bare").attr("x", Expr::null()));
    let errors = Interpreter::new().execute(&module, &root).unwrap_err();
    assert_eq!(errors.first().message(), "unexpected attribute `x`");

    let labelled = Module::default().block(Block::new("bare").label(Expr::string("l")));
    let errors = Interpreter::new().execute(&labelled, &root).unwrap_err();
    assert_eq!(
        errors.first().message(),
        "`bare` blocks take no labels, got 1"
    );
}

#[test]
fn test_run_resets_between_calls() {
    let root = Context::new();
    let mut interpreter = Interpreter::new();
    let module = Module::default().block(Block::new("missing"));
    assert_eq!(interpreter.run(&module, &root).errors.len(), 1);
    assert_eq!(interpreter.run(&module, &root).errors.len(), 1);
    assert!(interpreter.errors().is_empty());
}
