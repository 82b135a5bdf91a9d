//! Property tests: the inline cache never changes what a program does.
//!
//! Random call sequences drive a single call site through every cache
//! state; random integer expressions exercise the primitives (including
//! their failures) from inside a function called twice, so the second
//! evaluation runs entirely on warm sites.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
#![allow(
    clippy::doc_markdown,
    clippy::needless_pass_by_value,
    reason = "Proptest macros generate code with these patterns"
)]

use proptest::prelude::*;
use sjs_ir::{AstBuilder, Expr, StringInterner};
use sjsc::{run_captured, ExecStrategy, Outcome, RunOptions};

const CALLEES: usize = 6;

fn outcomes(cache_depth: usize, build: impl Fn(&AstBuilder<'_>) -> Vec<Expr>) -> (Outcome, Outcome) {
    let run = |strategy| {
        let interner = StringInterner::new();
        let b = AstBuilder::new(&interner);
        let script = b.script(build(&b));
        let options = RunOptions {
            strategy,
            cache_depth,
            ..RunOptions::default()
        };
        run_captured(&script, &interner, &options)
    };
    (run(ExecStrategy::TreeWalk), run(ExecStrategy::InlineCache))
}

/// `function call(g, x) { return g(x); }`, one tagged callee per index,
/// then a call through `call` for every entry of `sequence`.
fn call_sequence(b: &AstBuilder<'_>, sequence: &[usize]) -> Vec<Expr> {
    let mut instrs = vec![b.fun(
        "call",
        &["g", "x"],
        vec![b.ret(b.call_named("g", vec![b.var("x")]))],
    )];
    for i in 0..CALLEES {
        let tag = format!("f{i}");
        instrs.push(b.fun(
            &tag,
            &["x"],
            vec![
                b.call_named("print", vec![b.string(&tag), b.var("x")]),
                b.ret(b.var("x")),
            ],
        ));
    }
    for (step, &callee) in sequence.iter().enumerate() {
        let arg = i32::try_from(step).unwrap();
        instrs.push(b.call_named(
            "call",
            vec![b.var(&format!("f{callee}")), b.int(arg)],
        ));
    }
    instrs
}

#[derive(Clone, Debug)]
enum Arith {
    Lit(i32),
    Var,
    Op(&'static str, Box<Arith>, Box<Arith>),
}

fn arith_strategy() -> impl Strategy<Value = Arith> {
    let leaf = prop_oneof![(-20i32..20).prop_map(Arith::Lit), Just(Arith::Var)];
    leaf.prop_recursive(4, 24, 2, |inner| {
        (
            prop::sample::select(vec!["+", "-", "*", "/", "%", "<", ">=", "==", "!="]),
            inner.clone(),
            inner,
        )
            .prop_map(|(op, lhs, rhs)| Arith::Op(op, Box::new(lhs), Box::new(rhs)))
    })
}

fn lower(b: &AstBuilder<'_>, expr: &Arith) -> Expr {
    match expr {
        Arith::Lit(n) => b.int(*n),
        Arith::Var => b.var("v"),
        Arith::Op(op, lhs, rhs) => b.binary(op, lower(b, lhs), lower(b, rhs)),
    }
}

/// `function f(v) { return <expr>; }  print(f(a)); print(f(b));`
fn arith_program(b: &AstBuilder<'_>, expr: &Arith, a: i32, second: i32) -> Vec<Expr> {
    vec![
        b.fun("f", &["v"], vec![b.ret(lower(b, expr))]),
        b.call_named("print", vec![b.call_named("f", vec![b.int(a)])]),
        b.call_named("print", vec![b.call_named("f", vec![b.int(second)])]),
    ]
}

proptest! {
    #[test]
    fn call_sequences_agree(
        sequence in prop::collection::vec(0..CALLEES, 1..24),
        cache_depth in 0usize..5,
    ) {
        let (tree, cached) = outcomes(cache_depth, |b| call_sequence(b, &sequence));
        prop_assert!(tree.error.is_none());
        prop_assert_eq!(tree, cached);
    }

    #[test]
    fn arithmetic_agrees(
        expr in arith_strategy(),
        a in -5i32..5,
        second in -5i32..5,
        cache_depth in 0usize..4,
    ) {
        let (tree, cached) = outcomes(cache_depth, |b| arith_program(b, &expr, a, second));
        prop_assert_eq!(tree, cached);
    }
}
