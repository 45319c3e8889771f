//! `Choice(Longest)` picking the longest matching arm (spec §8 scenario 5
//! and boundary behavior "`LongestChoice` over `{pre, prefix,
//! prefix_longer}`"): `{'+', '++', '+='}` against `++` must pick `++`, not
//! the shorter `+` that also matches as a prefix.

use parsegraph::build::{build, BuildFlags, Grammar};
use parsegraph::rule::build::{BuildableRule, BuildableRuleBody, RuleRef};
use parsegraph::rule::ChoiceMode;
use parsegraph::token::build::BuildableToken;
use parsegraph::token::CaseSensitivity;
use parsegraph::Parser;

fn operator_parser() -> Parser {
    let grammar = Grammar::new("operator").rule(BuildableRule::new(
        "operator",
        BuildableRuleBody::Choice(
            ChoiceMode::Longest,
            vec![
                RuleRef::InlineToken(BuildableToken::Literal("+".into(), CaseSensitivity::Sensitive)),
                RuleRef::InlineToken(BuildableToken::Literal("++".into(), CaseSensitivity::Sensitive)),
                RuleRef::InlineToken(BuildableToken::Literal("+=".into(), CaseSensitivity::Sensitive)),
            ],
        ),
    ));
    build(grammar, BuildFlags::default()).expect("operator grammar builds")
}

#[test]
fn picks_the_longest_matching_arm() {
    let parser = operator_parser();
    let tree = parser.parse("++").expect("parses");
    assert_eq!(tree.root_view("++").text(), "++");
    assert_eq!(tree.root_view("++").occurrence(), Some(1));
}

#[test]
fn falls_back_to_the_only_matching_arm() {
    let parser = operator_parser();
    let tree = parser.parse("+=").expect("parses");
    assert_eq!(tree.root_view("+=").text(), "+=");
    assert_eq!(tree.root_view("+=").occurrence(), Some(2));
}

#[test]
fn matches_the_sole_candidate_when_longer_arms_dont_apply() {
    let parser = operator_parser();
    let tree = parser.parse("+ x").expect("parses the leading operator only");
    assert_eq!(tree.root_view("+ x").text(), "+");
    assert_eq!(tree.root_view("+ x").occurrence(), Some(0));
}
