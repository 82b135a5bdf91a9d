#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use super::*;
use crate::{buffer_handler, ErrorCategory, EvalError, EvalErrorKind, ExecStrategy, InterpreterBuilder};
use pretty_assertions::assert_eq;
use sjs_ir::{AstBuilder, StringInterner};

/// Line the call site under test is stamped with.
const SITE: u32 = 10;

fn run_linked(
    cache_depth: usize,
    build: impl FnOnce(&AstBuilder<'_>) -> Vec<Expr>,
) -> (String, Result<(), EvalError>, LinkedProgram) {
    let interner = StringInterner::new();
    let b = AstBuilder::new(&interner);
    let script = b.script(build(&b));
    let program = link(&script, cache_depth);
    let handler = buffer_handler();
    let result = InterpreterBuilder::new(&interner)
        .print_handler(handler.clone())
        .strategy(ExecStrategy::InlineCache)
        .cache_depth(cache_depth)
        .build()
        .run_linked(&program);
    (handler.get_output(), result, program)
}

fn site_under_test(program: &LinkedProgram) -> &CallSite {
    let mut sites = program.sites_at(SITE);
    let site = sites.next().unwrap();
    assert!(sites.next().is_none(), "more than one site on line {SITE}");
    site
}

/// `function call(g) { return g(1); }` with `g(1)` on the site line.
fn caller(b: &AstBuilder<'_>) -> Expr {
    let call = b.at(SITE).call_named("g", vec![b.int(1)]);
    b.at(1).fun("call", &["g"], vec![b.ret(call)])
}

/// `function name(x) { print(tag, x); }`
fn tagged(b: &AstBuilder<'_>, name: &str, tag: &str) -> Expr {
    b.fun(
        name,
        &["x"],
        vec![b.call_named("print", vec![b.string(tag), b.var("x")])],
    )
}

fn call_with(b: &AstBuilder<'_>, callee: &str) -> Expr {
    b.call_named("call", vec![b.var(callee)])
}

// Linking

#[test]
fn every_call_gets_its_own_site() {
    let (_, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        vec![
            b.fun("f", &["x"], vec![b.ret(b.var("x"))]),
            b.call_named(
                "print",
                vec![b.call_named("f", vec![b.binary("+", b.int(1), b.int(2))])],
            ),
        ]
    });
    result.unwrap();
    let argcs: Vec<_> = program.call_sites().iter().map(|site| site.argc()).collect();
    assert_eq!(argcs, vec![1, 1, 2]);
    assert!(program
        .call_sites()
        .iter()
        .all(|site| site.max_depth() == DEFAULT_CACHE_DEPTH));
}

#[test]
fn fresh_sites_are_uninitialized() {
    let interner = StringInterner::new();
    let b = AstBuilder::new(&interner);
    let program = link(&b.script(vec![b.call_named("print", vec![])]), 2);
    let site = &program.call_sites()[0];
    assert_eq!(site.state_kind(), CacheStateKind::Uninitialized);
    assert_eq!(site.depth(), 0);
    assert_eq!(site.stats(), CallSiteStats::default());
}

// State transitions

#[test]
fn repeated_callee_hits_monomorphic_entry() {
    let (out, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        vec![
            caller(b),
            tagged(b, "f", "f"),
            call_with(b, "f"),
            call_with(b, "f"),
            call_with(b, "f"),
        ]
    });
    result.unwrap();
    assert_eq!(out, "f 1\nf 1\nf 1\n");
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Monomorphic);
    assert_eq!(site.stats(), CallSiteStats { hits: 2, misses: 1 });
}

#[test]
fn site_widens_then_goes_megamorphic() {
    let expected = [
        (1, CacheStateKind::Monomorphic, 1),
        (2, CacheStateKind::Polymorphic, 2),
        (3, CacheStateKind::Polymorphic, 3),
        (4, CacheStateKind::Megamorphic, 3),
    ];
    for (count, kind, depth) in expected {
        let names: Vec<String> = (0..count).map(|i| format!("f{i}")).collect();
        let (_, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
            let mut instrs = vec![caller(b)];
            instrs.extend(names.iter().map(|name| tagged(b, name, name)));
            instrs.extend(names.iter().map(|name| call_with(b, name)));
            instrs
        });
        result.unwrap();
        let site = site_under_test(&program);
        assert_eq!(site.state_kind(), kind, "{count} distinct callees");
        assert_eq!(site.depth(), depth, "{count} distinct callees");
        assert_eq!(site.stats().hits, 0);
        assert_eq!(site.stats().misses as usize, count);
    }
}

#[test]
fn megamorphic_site_keeps_its_frozen_chain() {
    let order = ["a", "b", "c", "d", "a", "a", "a", "d", "c"];
    let (out, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        let mut instrs = vec![caller(b)];
        instrs.extend(["a", "b", "c", "d"].map(|name| tagged(b, name, name)));
        instrs.extend(order.map(|name| call_with(b, name)));
        instrs
    });
    result.unwrap();
    let expected: String = order.iter().map(|name| format!("{name} 1\n")).collect();
    assert_eq!(out, expected);
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Megamorphic);
    assert_eq!(site.depth(), DEFAULT_CACHE_DEPTH);
    // `a` and `c` stay cached after overflow; `d` never gets in.
    assert_eq!(site.stats(), CallSiteStats { hits: 4, misses: 5 });
}

#[test]
fn polymorphic_chain_hits_older_entries() {
    let (out, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        vec![
            caller(b),
            tagged(b, "a", "a"),
            tagged(b, "b", "b"),
            call_with(b, "a"),
            call_with(b, "b"),
            call_with(b, "a"),
        ]
    });
    result.unwrap();
    assert_eq!(out, "a 1\nb 1\na 1\n");
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Polymorphic);
    assert_eq!(site.stats(), CallSiteStats { hits: 1, misses: 2 });
}

#[test]
fn depth_one_skips_polymorphic() {
    let (_, result, program) = run_linked(1, |b| {
        vec![
            caller(b),
            tagged(b, "a", "a"),
            tagged(b, "b", "b"),
            call_with(b, "a"),
            call_with(b, "b"),
            call_with(b, "a"),
            call_with(b, "b"),
        ]
    });
    result.unwrap();
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Megamorphic);
    assert_eq!(site.depth(), 1);
    assert_eq!(site.stats(), CallSiteStats { hits: 1, misses: 3 });
}

#[test]
fn depth_zero_never_caches() {
    let (out, result, program) = run_linked(0, |b| {
        vec![caller(b), tagged(b, "a", "a"), call_with(b, "a"), call_with(b, "a")]
    });
    result.unwrap();
    assert_eq!(out, "a 1\na 1\n");
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Megamorphic);
    assert_eq!(site.depth(), 0);
    assert_eq!(site.stats(), CallSiteStats { hits: 0, misses: 2 });
}

// Identity

#[test]
fn closures_from_one_literal_share_sites() {
    let (out, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        let add = b.at(SITE).binary("+", b.var("x"), b.var("k"));
        vec![
            b.at(1).fun(
                "make",
                &["k"],
                vec![b.ret(b.lambda(&["x"], vec![b.ret(add)]))],
            ),
            b.declare("one", b.call_named("make", vec![b.int(1)])),
            b.declare("two", b.call_named("make", vec![b.int(2)])),
            b.call_named(
                "print",
                vec![
                    b.call_named("one", vec![b.int(1)]),
                    b.call_named("two", vec![b.int(1)]),
                ],
            ),
        ]
    });
    result.unwrap();
    assert_eq!(out, "2 3\n");
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Monomorphic);
    assert_eq!(site.stats(), CallSiteStats { hits: 1, misses: 1 });
}

#[test]
fn distinct_closure_instances_are_distinct_callees() {
    let (_, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        vec![
            caller(b),
            b.fun(
                "make",
                &[],
                vec![b.ret(b.lambda(&["x"], vec![b.ret(b.var("x"))]))],
            ),
            b.call_named("call", vec![b.call_named("make", vec![])]),
            b.call_named("call", vec![b.call_named("make", vec![])]),
        ]
    });
    result.unwrap();
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Polymorphic);
    assert_eq!(site.depth(), 2);
}

#[test]
fn rebinding_an_operator_misses_the_guard() {
    let (out, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        let sum = b.at(SITE).binary("+", b.var("a"), b.var("b"));
        vec![
            b.at(1).fun("add", &["a", "b"], vec![b.ret(sum)]),
            b.call_named("print", vec![b.call_named("add", vec![b.int(1), b.int(2)])]),
            b.assign(
                "+",
                b.lambda(&["a", "b"], vec![b.ret(b.binary("*", b.var("a"), b.var("b")))]),
            ),
            b.call_named("print", vec![b.call_named("add", vec![b.int(2), b.int(3)])]),
        ]
    });
    result.unwrap();
    assert_eq!(out, "3\n6\n");
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Polymorphic);
    assert_eq!(site.stats(), CallSiteStats { hits: 0, misses: 2 });
}

#[test]
fn method_sites_key_on_the_field_function() {
    let (out, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        let get = b.at(SITE).method(b.var("o"), "get", vec![]);
        let record = |value: i32| {
            b.new_record(vec![(
                "get",
                b.lambda(&[], vec![b.ret(b.int(value))]),
            )])
        };
        vec![
            b.at(1).fun("poke", &["o"], vec![b.ret(get)]),
            b.declare("first", record(1)),
            b.declare("second", record(2)),
            b.call_named(
                "print",
                vec![
                    b.call_named("poke", vec![b.var("first")]),
                    b.call_named("poke", vec![b.var("first")]),
                    b.call_named("poke", vec![b.var("second")]),
                ],
            ),
        ]
    });
    result.unwrap();
    assert_eq!(out, "1 1 2\n");
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Polymorphic);
    assert_eq!(site.stats(), CallSiteStats { hits: 1, misses: 2 });
}

// Errors

#[test]
fn failed_resolution_installs_nothing() {
    let (_, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        vec![
            caller(b),
            b.fun("two", &["a", "b"], vec![]),
            call_with(b, "two"),
        ]
    });
    let error = result.unwrap_err();
    assert_eq!(
        error.kind,
        EvalErrorKind::ArityMismatch {
            name: "two".to_string(),
            expected: 2,
            got: 1,
        }
    );
    assert_eq!(error.line, Some(SITE));
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Uninitialized);
    assert_eq!(site.stats(), CallSiteStats { hits: 0, misses: 1 });
}

#[test]
fn non_callable_is_rejected_before_the_cache() {
    let (_, result, program) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        vec![
            b.declare("x", b.int(3)),
            b.at(SITE).call_named("x", vec![]),
        ]
    });
    assert_eq!(result.unwrap_err().category(), ErrorCategory::TypeError);
    assert_eq!(site_under_test(&program).stats(), CallSiteStats::default());
}

#[test]
fn errors_carry_backtraces() {
    let (_, result, _) = run_linked(DEFAULT_CACHE_DEPTH, |b| {
        vec![
            b.at(1).fun(
                "inner",
                &[],
                vec![b.at(2).ret(b.binary("%", b.int(1), b.int(0)))],
            ),
            b.at(3).fun("outer", &[], vec![b.at(4).call_named("inner", vec![])]),
            b.at(6).call_named("outer", vec![]),
        ]
    });
    let error = result.unwrap_err();
    assert_eq!(error.kind, EvalErrorKind::DivisionByZero);
    assert_eq!(error.line, Some(2));
    let lines: Vec<_> = error.backtrace.frames().iter().map(|f| f.line).collect();
    assert_eq!(lines, vec![4, 6]);
}

// Persistence

#[test]
fn caches_stay_warm_across_runs() {
    let interner = StringInterner::new();
    let b = AstBuilder::new(&interner);
    let sum = b.at(SITE).binary("+", b.int(1), b.int(2));
    let script = b.script(vec![b.at(1).call_named("print", vec![sum])]);
    let program = link(&script, DEFAULT_CACHE_DEPTH);
    let handler = buffer_handler();
    let mut interp = InterpreterBuilder::new(&interner)
        .print_handler(handler.clone())
        .strategy(ExecStrategy::InlineCache)
        .build();
    interp.run_linked(&program).unwrap();
    interp.run_linked(&program).unwrap();
    assert_eq!(handler.get_output(), "3\n3\n");
    let site = site_under_test(&program);
    assert_eq!(site.state_kind(), CacheStateKind::Monomorphic);
    assert_eq!(site.stats(), CallSiteStats { hits: 1, misses: 1 });
}

#[test]
fn run_links_when_strategy_is_inline_cache() {
    let interner = StringInterner::new();
    let b = AstBuilder::new(&interner);
    let handler = buffer_handler();
    let script = b.script(vec![
        b.fun("f", &["x"], vec![b.ret(b.binary("+", b.var("x"), b.int(1)))]),
        b.call_named("print", vec![b.call_named("f", vec![b.int(41)])]),
    ]);
    InterpreterBuilder::new(&interner)
        .print_handler(handler.clone())
        .strategy(ExecStrategy::InlineCache)
        .build()
        .run(&script)
        .unwrap();
    assert_eq!(handler.get_output(), "42\n");
}
