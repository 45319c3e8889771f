//! Arithmetic expression grammar (spec §8 scenario 2): left-associative
//! `+`/`-` over `*`/`/` over parenthesized sub-expressions, evaluated by a
//! small tree-walk over the parsed result — value factories fold a single
//! child's value (spec §9's `Map(Return(child, v), f) = Return(child,
//! f(v))` law), not a whole recursive-descent evaluator, so arithmetic
//! reduction belongs to the caller walking the tree, the same way a
//! consumer of `apollo-parser`'s CST writes its own visitor.

use parsegraph::ast::NodeView;
use parsegraph::build::{build, BuildFlags, Grammar};
use parsegraph::rule::build::{BuildableRule, BuildableRuleBody, RuleRef};
use parsegraph::rule::ChoiceMode;
use parsegraph::token::build::BuildableToken;
use parsegraph::token::{CaseSensitivity, LiteralSet, NumberFlags, NumberTarget};
use parsegraph::Parser;

fn skip_ws(token: BuildableToken) -> BuildableToken {
    BuildableToken::SkipWhitespaces(token.into())
}

fn number_token() -> BuildableToken {
    skip_ws(BuildableToken::Number(NumberFlags::integer(), NumberTarget::Integer))
}

fn op_token(choices: &[&str]) -> BuildableToken {
    skip_ws(BuildableToken::LiteralChoice(LiteralSet::new(choices.iter().copied(), CaseSensitivity::Sensitive)))
}

fn arithmetic_parser() -> Parser {
    let grammar = Grammar::new("expr")
        .rule(BuildableRule::new(
            "term",
            BuildableRuleBody::Choice(
                ChoiceMode::First,
                vec![
                    RuleRef::InlineToken(number_token()),
                    RuleRef::InlineRule(Box::new(BuildableRule::new(
                        "paren",
                        BuildableRuleBody::Sequence(vec![
                            RuleRef::InlineToken(skip_ws(BuildableToken::LiteralChar('('))),
                            RuleRef::Alias("expr".to_string()),
                            RuleRef::InlineToken(skip_ws(BuildableToken::LiteralChar(')'))),
                        ]),
                    ))),
                ],
            ),
        ))
        .rule(BuildableRule::new(
            "mul_term",
            BuildableRuleBody::Sequence(vec![RuleRef::InlineToken(op_token(&["*", "/"])), RuleRef::Alias("term".to_string())]),
        ))
        .rule(BuildableRule::new(
            "factor_tail",
            BuildableRuleBody::Repeat { child: RuleRef::Alias("mul_term".to_string()), min: 0, max: None },
        ))
        .rule(BuildableRule::new(
            "factor",
            BuildableRuleBody::Sequence(vec![RuleRef::Alias("term".to_string()), RuleRef::Alias("factor_tail".to_string())]),
        ))
        .rule(BuildableRule::new(
            "add_factor",
            BuildableRuleBody::Sequence(vec![RuleRef::InlineToken(op_token(&["+", "-"])), RuleRef::Alias("factor".to_string())]),
        ))
        .rule(BuildableRule::new(
            "expr_tail",
            BuildableRuleBody::Repeat { child: RuleRef::Alias("add_factor".to_string()), min: 0, max: None },
        ))
        .rule(BuildableRule::new(
            "expr",
            BuildableRuleBody::Sequence(vec![RuleRef::Alias("factor".to_string()), RuleRef::Alias("expr_tail".to_string())]),
        ));

    build(grammar, BuildFlags::default()).expect("arithmetic grammar builds")
}

fn eval_term(node: NodeView<'_>) -> i64 {
    match node.occurrence() {
        Some(0) => node.child(0).unwrap().value().and_then(|v| v.as_int()).expect("number leaf"),
        Some(1) => eval_expr(node.child(0).unwrap().child(1).unwrap()),
        other => panic!("unexpected term branch {other:?}"),
    }
}

fn eval_factor(node: NodeView<'_>) -> i64 {
    let mut acc = eval_term(node.child(0).unwrap());
    for mul_term in node.child(1).unwrap().children() {
        let op = mul_term.child(0).unwrap().value().and_then(|v| v.as_str().map(str::to_string)).expect("op token");
        let rhs = eval_term(mul_term.child(1).unwrap());
        acc = if op == "*" { acc * rhs } else { acc / rhs };
    }
    acc
}

fn eval_expr(node: NodeView<'_>) -> i64 {
    let mut acc = eval_factor(node.child(0).unwrap());
    for add_factor in node.child(1).unwrap().children() {
        let op = add_factor.child(0).unwrap().value().and_then(|v| v.as_str().map(str::to_string)).expect("op token");
        let rhs = eval_factor(add_factor.child(1).unwrap());
        acc = if op == "+" { acc + rhs } else { acc - rhs };
    }
    acc
}

#[test]
fn respects_precedence_and_parentheses() {
    let parser = arithmetic_parser();
    let input = "1 + 2 * (3 - 4)";
    let tree = parser.parse(input).expect("parses");
    assert_eq!(eval_expr(tree.root_view(input)), -1);
}

#[test]
fn left_associates_same_precedence_operators() {
    let parser = arithmetic_parser();
    let input = "10 - 2 - 3";
    let tree = parser.parse(input).expect("parses");
    assert_eq!(eval_expr(tree.root_view(input)), 5);
}
