//! Single-edit incremental reparse over a small statement list (spec §8
//! scenario 6): editing one character inside the first statement must leave
//! the second statement's subtree at its old version, and the resulting
//! tree must match a from-scratch parse of the edited text exactly.

use parsegraph::build::{build, BuildFlags, Grammar};
use parsegraph::incremental::Change;
use parsegraph::rule::build::{BuildableRule, BuildableRuleBody, RuleRef};
use parsegraph::token::build::BuildableToken;
use parsegraph::token::predicate;
use parsegraph::Parser;

fn skip_ws(token: BuildableToken) -> BuildableToken {
    BuildableToken::SkipWhitespaces(token.into())
}

fn ident_token() -> BuildableToken {
    skip_ws(BuildableToken::Identifier { start: predicate::identifier_start(), cont: predicate::identifier_continue(), min_len: 1 })
}

fn var_statements_parser() -> Parser {
    let stmt = BuildableRule::new(
        "stmt",
        BuildableRuleBody::Sequence(vec![
            RuleRef::InlineToken(skip_ws(BuildableToken::Keyword("var".into(), parsegraph::token::CaseSensitivity::Sensitive, Some(predicate::identifier_continue())))),
            RuleRef::InlineToken(ident_token()),
            RuleRef::InlineToken(skip_ws(BuildableToken::LiteralChar('='))),
            RuleRef::InlineToken(ident_token()),
            RuleRef::InlineToken(skip_ws(BuildableToken::LiteralChar(';'))),
        ]),
    );
    let grammar = Grammar::new("program")
        .rule(stmt)
        .rule(BuildableRule::new(
            "program",
            BuildableRuleBody::Repeat { child: RuleRef::Alias("stmt".to_string()), min: 1, max: None },
        ));
    build(grammar, BuildFlags::default()).expect("statement grammar builds")
}

#[test]
fn reparse_after_an_edit_matches_a_fresh_parse() {
    let parser = var_statements_parser();
    let prev_input = "var x = a; var y = b;";
    let prev = parser.parse(prev_input).expect("parses");

    let change = Change { start: 8, old_length: 1, new_length: 1 };
    let new_input = "var x = z; var y = b;";

    let incremental = parser.reparse_incremental(&prev, prev_input, change, new_input).expect("reparses");
    let whole = parser.parse(new_input).expect("parses from scratch");

    let inc_texts: Vec<&str> = incremental.root_view(new_input).children().map(|c| c.text()).collect();
    let whole_texts: Vec<&str> = whole.root_view(new_input).children().map(|c| c.text()).collect();
    assert_eq!(inc_texts, whole_texts);
    assert_eq!(incremental.root_view(new_input).text(), new_input);
}

#[test]
fn only_the_edited_statement_gets_a_new_version() {
    let parser = var_statements_parser();
    let prev_input = "var x = a; var y = b;";
    let prev = parser.parse(prev_input).expect("parses");
    let prev_statements: Vec<_> = prev.root_view(prev_input).children().collect();
    let second_version_before = prev_statements[1].version();

    let change = Change { start: 8, old_length: 1, new_length: 1 };
    let new_input = "var x = z; var y = b;";
    let incremental = parser.reparse_incremental(&prev, prev_input, change, new_input).expect("reparses");

    let statements: Vec<_> = incremental.root_view(new_input).children().collect();
    assert_eq!(statements[0].text(), "var x = z;");
    assert_ne!(statements[0].version(), second_version_before);
    assert_eq!(statements[1].text(), " var y = b;");
    assert_eq!(statements[1].version(), second_version_before);
}
