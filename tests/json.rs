//! End-to-end JSON value parse (spec §8 scenario 1): a grammar built
//! entirely from the public authoring API, exercising `Between`,
//! `EscapedText`, `SkipWhitespaces`, `Return` and `SeparatedRepeat` together.

use expect_test::expect;
use pretty_assertions::assert_eq;
use unindent::unindent;

use parsegraph::build::{build, BuildFlags, Grammar};
use parsegraph::rule::build::{BuildableRule, BuildableRuleBody, RuleRef};
use parsegraph::rule::ChoiceMode;
use parsegraph::token::build::BuildableToken;
use parsegraph::token::{CaseSensitivity, EscapeMap, LiteralSet, NumberFlags, NumberTarget};
use parsegraph::value::IntermediateValue;
use parsegraph::Parser;

fn punctuation(c: char) -> BuildableToken {
    BuildableToken::SkipWhitespaces(BuildableToken::LiteralChar(c).into())
}

fn keyword_value(word: &str, value: IntermediateValue) -> BuildableToken {
    BuildableToken::SkipWhitespaces(
        BuildableToken::Return(BuildableToken::Keyword(word.into(), CaseSensitivity::Sensitive, None).into(), value).into(),
    )
}

pub fn json_parser() -> Parser {
    let string_token = BuildableToken::SkipWhitespaces(
        BuildableToken::Between(
            BuildableToken::LiteralChar('"').into(),
            BuildableToken::EscapedText {
                escapes: EscapeMap::new([("\\\"", "\""), ("\\\\", "\\"), ("\\/", "/"), ("\\n", "\n"), ("\\t", "\t"), ("\\r", "\r")]),
                terminators: LiteralSet::new(["\""], CaseSensitivity::Sensitive),
            }
            .into(),
            BuildableToken::LiteralChar('"').into(),
        )
        .into(),
    );

    let grammar = Grammar::new("value")
        .rule(BuildableRule::new("string", BuildableRuleBody::Token(string_token)))
        .rule(BuildableRule::new(
            "number",
            BuildableRuleBody::Token(BuildableToken::SkipWhitespaces(
                BuildableToken::Number(NumberFlags::scientific(), NumberTarget::Float).into(),
            )),
        ))
        .rule(BuildableRule::new("true", BuildableRuleBody::Token(keyword_value("true", IntermediateValue::Bool(true)))))
        .rule(BuildableRule::new("false", BuildableRuleBody::Token(keyword_value("false", IntermediateValue::Bool(false)))))
        .rule(BuildableRule::new("null", BuildableRuleBody::Token(keyword_value("null", IntermediateValue::Unit))))
        .rule(BuildableRule::new("lbrace", BuildableRuleBody::Token(punctuation('{'))))
        .rule(BuildableRule::new("rbrace", BuildableRuleBody::Token(punctuation('}'))))
        .rule(BuildableRule::new("lbracket", BuildableRuleBody::Token(punctuation('['))))
        .rule(BuildableRule::new("rbracket", BuildableRuleBody::Token(punctuation(']'))))
        .rule(BuildableRule::new("colon", BuildableRuleBody::Token(punctuation(':'))))
        .rule(BuildableRule::new("comma", BuildableRuleBody::Token(punctuation(','))))
        .rule(BuildableRule::new(
            "member",
            BuildableRuleBody::Sequence(vec![
                RuleRef::Alias("string".to_string()),
                RuleRef::Alias("colon".to_string()),
                RuleRef::Alias("value".to_string()),
            ]),
        ))
        .rule(BuildableRule::new(
            "members",
            BuildableRuleBody::SeparatedRepeat {
                element: RuleRef::Alias("member".to_string()),
                separator: RuleRef::Alias("comma".to_string()),
                min: 0,
                max: None,
                allow_trailing: false,
                include_sep: false,
            },
        ))
        .rule(BuildableRule::new(
            "object",
            BuildableRuleBody::Sequence(vec![
                RuleRef::Alias("lbrace".to_string()),
                RuleRef::Alias("members".to_string()),
                RuleRef::Alias("rbrace".to_string()),
            ]),
        ))
        .rule(BuildableRule::new(
            "elements",
            BuildableRuleBody::SeparatedRepeat {
                element: RuleRef::Alias("value".to_string()),
                separator: RuleRef::Alias("comma".to_string()),
                min: 0,
                max: None,
                allow_trailing: false,
                include_sep: false,
            },
        ))
        .rule(BuildableRule::new(
            "array",
            BuildableRuleBody::Sequence(vec![
                RuleRef::Alias("lbracket".to_string()),
                RuleRef::Alias("elements".to_string()),
                RuleRef::Alias("rbracket".to_string()),
            ]),
        ))
        .rule(BuildableRule::new(
            "value",
            BuildableRuleBody::Choice(
                ChoiceMode::First,
                vec![
                    RuleRef::Alias("object".to_string()),
                    RuleRef::Alias("array".to_string()),
                    RuleRef::Alias("string".to_string()),
                    RuleRef::Alias("number".to_string()),
                    RuleRef::Alias("true".to_string()),
                    RuleRef::Alias("false".to_string()),
                    RuleRef::Alias("null".to_string()),
                ],
            ),
        ));

    build(grammar, BuildFlags::default()).expect("json grammar builds")
}

#[test]
fn parses_an_object_with_a_number_and_an_array() {
    let parser = json_parser();
    let input = r#"{"a":1,"b":[true,null]}"#;
    let tree = parser.parse(input).expect("parses");
    let root = tree.root_view(input);
    assert_eq!(root.text(), input);

    let object = root.child(0).expect("value wraps object");
    let members: Vec<_> = object.child(1).expect("object has a members list").children().collect();
    assert_eq!(members.len(), 2);

    let member_a = &members[0];
    let key_a = member_a.child(0).unwrap();
    assert_eq!(key_a.value().and_then(|v| v.as_str()), Some("a"));
    let value_a = member_a.child(2).unwrap().child(0).unwrap();
    assert_eq!(value_a.value().and_then(|v| v.as_float()), Some(1.0));

    let member_b = &members[1];
    let key_b = member_b.child(0).unwrap();
    assert_eq!(key_b.value().and_then(|v| v.as_str()), Some("b"));
    let array = member_b.child(2).unwrap().child(0).unwrap();
    let elements: Vec<_> = array.child(1).unwrap().children().collect();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].child(0).unwrap().value().and_then(|v| v.as_bool()), Some(true));
    assert_eq!(elements[1].child(0).unwrap().value(), Some(&IntermediateValue::Unit));
}

#[test]
fn rejects_an_unterminated_string() {
    let parser = json_parser();
    assert!(parser.parse(r#"{"a":"#).is_err());
}

#[test]
fn skip_whitespaces_tolerates_pretty_printed_input() {
    let parser = json_parser();
    let input = unindent(
        r#"
        {
            "a": 1,
            "b": [true, null]
        }
        "#,
    );
    let input = input.trim();
    let tree = parser.parse(input).expect("whitespace around every token is skipped");
    let members: Vec<_> = tree.root_view(input).child(0).unwrap().child(1).unwrap().children().collect();
    assert_eq!(members.len(), 2);
}

#[test]
fn array_of_two_elements_has_the_expected_shape() {
    let parser = json_parser();
    let input = r#"[true,null]"#;
    let tree = parser.parse(input).expect("parses");
    let elements: Vec<_> = tree.root_view(input).child(0).unwrap().child(1).unwrap().children().collect();
    let shape: Vec<&str> = elements.iter().map(|e| e.text()).collect();
    expect![[r#"["true", "null"]"#]].assert_eq(&format!("{shape:?}"));
}
