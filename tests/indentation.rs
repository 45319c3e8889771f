//! Indentation-sensitive block (spec §8 scenario 3). There is no literal
//! INDENT/DEDENT token type; per spec §4.8/§6 a barrier is just a synthetic
//! "do not cross" position a pre-pass tokenizer computes, so a dedent is
//! modeled by placing one barrier right at the column-0 line that closes the
//! block. `stmt+`'s `Repeat` keeps matching while there's room before the
//! barrier and stops the moment a further attempt's window collapses to
//! nothing — the same mechanism `token::match_empty` enforces for a bare
//! `Empty` token, and `parser::barrier`'s own unit tests exercise directly.
//!
//! A single barrier only bounds matches that *start* before it; nothing can
//! resume scanning from a position sitting exactly on a barrier (that
//! position's own window is empty too), so the statement after a dedent is
//! parsed as its own top-level call, the way a real indentation-sensitive
//! parser's outer statement loop restarts after each DEDENT rather than
//! threading one barrier through the whole file.

use parsegraph::build::{build, BuildFlags, Grammar};
use parsegraph::parser::barrier::BarrierStream;
use parsegraph::rule::build::{BuildableRule, BuildableRuleBody, RuleRef};
use parsegraph::token::build::BuildableToken;
use parsegraph::token::predicate;
use parsegraph::{ParseOptions, Parser};

fn skip_ws(token: BuildableToken) -> BuildableToken {
    BuildableToken::SkipWhitespaces(token.into())
}

fn ident_token() -> BuildableToken {
    skip_ws(BuildableToken::Identifier { start: predicate::identifier_start(), cont: predicate::identifier_continue(), min_len: 1 })
}

fn block_parser() -> Parser {
    let stmt = BuildableRule::new(
        "stmt",
        BuildableRuleBody::Sequence(vec![
            RuleRef::InlineToken(ident_token()),
            RuleRef::InlineToken(skip_ws(BuildableToken::LiteralChar('='))),
            RuleRef::InlineToken(ident_token()),
            RuleRef::InlineToken(skip_ws(BuildableToken::LiteralChar(';'))),
        ]),
    );
    let grammar = Grammar::new("block")
        .rule(stmt)
        .rule(BuildableRule::new(
            "block",
            BuildableRuleBody::Repeat { child: RuleRef::Alias("stmt".to_string()), min: 1, max: None },
        ));
    build(grammar, BuildFlags::default()).expect("block grammar builds")
}

const SOURCE: &str = "def a():\n    b = c;\n    c = a;\na = p;";

#[test]
fn block_contains_exactly_two_statements_before_the_dedent() {
    let parser = block_parser();
    let header_end = SOURCE.find('\n').unwrap() + 1;
    let dedent_position = SOURCE.find("a = p;").unwrap();

    let body = &SOURCE[header_end..];
    let barrier = dedent_position - header_end;
    let opts = ParseOptions { barriers: Some(BarrierStream::new(vec![barrier])), ..Default::default() };

    let tree = parser.parse_with(body, opts).expect("block parses up to the barrier");
    let statements: Vec<_> = tree.root_view(body).children().collect();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].text().trim(), "b = c;");
    assert_eq!(statements[1].text().trim(), "c = a;");

    let stmt_rule = parser.rule_by_alias("stmt").expect("stmt is a named rule");
    let trailer = &SOURCE[dedent_position..];
    let trailer_tree = parser.parse_rule(stmt_rule, trailer, ParseOptions::default()).expect("the dedented line parses as its own statement");
    assert_eq!(trailer_tree.root_view(trailer).text(), "a = p;");
}

#[test]
fn without_a_barrier_the_block_swallows_every_statement() {
    let parser = block_parser();
    let header_end = SOURCE.find('\n').unwrap() + 1;
    let body = &SOURCE[header_end..];

    let tree = parser.parse(body).expect("all three lines are syntactically valid statements");
    let statements: Vec<_> = tree.root_view(body).children().collect();
    assert_eq!(statements.len(), 3);
}
