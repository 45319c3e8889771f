//! `Recovery::SkipAfter` dropping a garbled statement (spec §8 scenario 4).
//!
//! `BuildableRule.recovery` stores an already-resolved `RecoveryStrategy`
//! with a raw `RuleElement` anchor baked in — there is no `RuleRef`-style
//! late binding for it (spec §4.6 step 7 resolves everything else through
//! aliases, but recovery strategies are copied into `RuleMeta` verbatim).
//! A grammar that wants to recover on a token it only introduces in the same
//! breath therefore has to learn that token's id from a first, recovery-less
//! build before it can describe the strategy — the same two-phase shape
//! `Parser::token_by_alias` exists for.

use parsegraph::build::{build, BuildFlags, Grammar};
use parsegraph::parser::recovery::RecoveryStrategy;
use parsegraph::rule::build::{BuildableRule, BuildableRuleBody, RuleRef};
use parsegraph::rule::RuleElement;
use parsegraph::token::build::{BuildableToken, TokenRef};
use parsegraph::token::{predicate, CaseSensitivity};
use parsegraph::Parser;

fn skip_ws(token: BuildableToken) -> BuildableToken {
    BuildableToken::SkipWhitespaces(token.into())
}

fn ident_token() -> BuildableToken {
    skip_ws(BuildableToken::Identifier { start: predicate::identifier_start(), cont: predicate::identifier_continue(), min_len: 1 })
}

/// Builds the `var ident = ident;` grammar, optionally attaching `recovery`
/// to `stmt` once its anchor token's id is known.
fn var_statements_grammar(recovery: Option<RecoveryStrategy>) -> Grammar {
    let mut stmt = BuildableRule::new(
        "stmt",
        BuildableRuleBody::Sequence(vec![
            RuleRef::InlineToken(skip_ws(BuildableToken::Keyword("var".into(), CaseSensitivity::Sensitive, Some(predicate::identifier_continue())))),
            RuleRef::InlineToken(ident_token()),
            RuleRef::InlineToken(skip_ws(BuildableToken::LiteralChar('='))),
            RuleRef::InlineToken(ident_token()),
            RuleRef::InlineToken(BuildableToken::SkipWhitespaces(TokenRef::Alias("semi".to_string()))),
        ]),
    );
    stmt.recovery = recovery;

    Grammar::new("program")
        .token("semi", BuildableToken::LiteralChar(';'))
        .rule(stmt)
        .rule(BuildableRule::new(
            "program",
            BuildableRuleBody::Repeat { child: RuleRef::Alias("stmt".to_string()), min: 1, max: None },
        ))
}

fn recovering_parser() -> Parser {
    let bootstrap = build(var_statements_grammar(None), BuildFlags::default()).expect("bootstrap build succeeds");
    let semi = bootstrap.token_by_alias("semi").expect("`semi` is referenced via TokenRef::Alias, so it's registered");

    let recovery = RecoveryStrategy::SkipAfter { anchor: RuleElement::Token(semi), stop: None, repeat: true };
    build(var_statements_grammar(Some(recovery)), BuildFlags::default()).expect("final build succeeds")
}

#[test]
fn skips_garbage_and_resumes_after_the_next_semicolon() {
    let parser = recovering_parser();
    let input = "var a = b; garbage; var c = d;";
    let tree = parser.parse(input).expect("recovery turns the mid-stream failure into a full parse");

    let statements: Vec<_> = tree.root_view(input).children().collect();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].text().trim(), "var a = b;");
    assert_eq!(statements[1].text().trim(), "var c = d;");
}

#[test]
fn without_recovery_garbage_aborts_the_whole_parse() {
    let parser = build(var_statements_grammar(None), BuildFlags::default()).expect("builds");
    let input = "var a = b; garbage; var c = d;";
    assert!(parser.parse(input).is_err());
}

#[test]
fn recovery_gives_up_once_no_further_anchor_remains() {
    let parser = recovering_parser();
    let input = "var a = b; garbage with no terminator";
    let tree = parser.parse(input).expect("the first statement alone still satisfies min=1");
    let statements: Vec<_> = tree.root_view(input).children().collect();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].text().trim(), "var a = b;");
}
