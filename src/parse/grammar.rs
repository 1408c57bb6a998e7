use std::sync::Arc;

use winnow::ascii::{dec_int, till_line_ending};
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::types::{Condition, Params, Response, Scope, Trigger, Value, IF_NAME};
use crate::Rule;

use super::parser::ParsedRules;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Names ------------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn keyword<'i>(input: &mut &'i str, word: &str) -> ModalResult<&'i str> {
    ws.parse_next(input)?;
    ident.verify(|w: &str| w == word).parse_next(input)
}

fn else_keyword(input: &mut &str) -> ModalResult<()> {
    keyword(input, "else").map(|_| ())
}

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

/// A node name or parameter key: bare identifier or quoted string.
fn name(input: &mut &str) -> ModalResult<String> {
    alt((string_literal, ident.map(str::to_owned))).parse_next(input)
}

// -- Values -----------------------------------------------------------------

fn number(input: &mut &str) -> ModalResult<Value> {
    let digits = |c: char| c.is_ascii_digit();
    let text = (
        opt('-'),
        take_while(1.., digits),
        opt(('.', take_while(1.., digits))),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), take_while(1.., digits))),
    )
        .take()
        .parse_next(input)?;
    if text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ErrMode::from_input(input).cut())
    } else {
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ErrMode::from_input(input).cut())
    }
}

fn keyword_value(input: &mut &str) -> ModalResult<Value> {
    ident
        .verify_map(|w| match w {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            "null" => Some(Value::Null),
            _ => None,
        })
        .parse_next(input)
}

fn list(input: &mut &str) -> ModalResult<Value> {
    '['.parse_next(input)?;
    let items: Vec<Value> = separated(0.., value, (ws, ',')).parse_next(input)?;
    (ws, cut_err(']')).parse_next(input)?;
    Ok(Value::List(items))
}

fn entry(input: &mut &str) -> ModalResult<(String, Value)> {
    ws.parse_next(input)?;
    let key = name.parse_next(input)?;
    // No cut before ':' so `if (condition)` can fall back from argument parsing.
    (ws, ':').parse_next(input)?;
    let value = cut_err(value).parse_next(input)?;
    Ok((key, value))
}

fn entries(input: &mut &str) -> ModalResult<Params> {
    let pairs: Vec<(String, Value)> = separated(0.., entry, (ws, ',')).parse_next(input)?;
    Ok(pairs.into_iter().collect())
}

fn map(input: &mut &str) -> ModalResult<Value> {
    '{'.parse_next(input)?;
    let params = entries.parse_next(input)?;
    (ws, cut_err('}')).parse_next(input)?;
    Ok(Value::Map(params))
}

/// `(key: value, ...)` after a node name.
fn args(input: &mut &str) -> ModalResult<Params> {
    delimited('(', entries, (ws, ')')).parse_next(input)
}

fn expression(input: &mut &str) -> ModalResult<Value> {
    '$'.parse_next(input)?;
    let expression_type = cut_err(name).parse_next(input)?;
    let params = cut_err(args)
        .context(StrContext::Expected(StrContextValue::Description(
            "expression arguments",
        )))
        .parse_next(input)?;
    Ok(Value::Expression {
        expression_type,
        params,
    })
}

fn value(input: &mut &str) -> ModalResult<Value> {
    ws.parse_next(input)?;
    alt((
        string_literal.map(Value::String),
        list,
        map,
        expression,
        number,
        keyword_value,
    ))
    .context(StrContext::Expected(StrContextValue::Description("value")))
    .parse_next(input)
}

// -- Nodes ------------------------------------------------------------------

/// `name [@behavior_id] [(params)]`, shared by every node kind.
struct Head {
    name: String,
    behavior_id: Option<i64>,
    params: Params,
}

impl Head {
    fn dress(self, node: Response) -> Response {
        let node = node.with_params(self.params);
        match self.behavior_id {
            Some(id) => node.with_behavior_id(id),
            None => node,
        }
    }
}

fn head(input: &mut &str) -> ModalResult<Head> {
    ws.parse_next(input)?;
    let name = name.parse_next(input)?;
    let behavior_id = opt(preceded('@', cut_err(dec_int::<_, i64, _>))).parse_next(input)?;
    let params = opt(preceded(ws, args)).parse_next(input)?.unwrap_or_default();
    Ok(Head {
        name,
        behavior_id,
        params,
    })
}

fn condition(input: &mut &str) -> ModalResult<Condition> {
    let head = head.parse_next(input)?;
    Ok(Condition {
        name: head.name,
        behavior_id: head.behavior_id,
        params: head.params,
    })
}

fn trigger(input: &mut &str) -> ModalResult<Trigger> {
    let head = head.parse_next(input)?;
    Ok(Trigger {
        name: head.name,
        behavior_id: head.behavior_id,
        params: head.params,
    })
}

/// `{ response [;] ... }`. An empty block is `None`.
fn block(input: &mut &str) -> ModalResult<Option<Arc<Response>>> {
    (ws, '{').parse_next(input)?;
    let mut nodes = Vec::new();
    loop {
        ws.parse_next(input)?;
        if opt('}').parse_next(input)?.is_some() {
            break;
        }
        let node = cut_err(response)
            .context(StrContext::Expected(StrContextValue::Description(
                "response or '}'",
            )))
            .parse_next(input)?;
        nodes.push(node);
        let _ = opt((ws, ';')).parse_next(input)?;
    }
    Ok(Response::link(nodes))
}

/// Mandated branches written as `{}` hold the `none` placeholder.
fn or_empty(head: Option<Arc<Response>>) -> Arc<Response> {
    head.unwrap_or_else(|| Arc::new(Response::empty()))
}

fn if_rest(head: Head, input: &mut &str) -> ModalResult<Response> {
    let condition = opt(preceded(
        ws,
        delimited('(', condition, (ws, cut_err(')'))),
    ))
    .parse_next(input)?;
    let then = cut_err(block)
        .context(StrContext::Expected(StrContextValue::Description("'{'")))
        .parse_next(input)?;
    let otherwise = opt(preceded(else_keyword, cut_err(block)))
        .parse_next(input)?
        .flatten();

    let mut node = Response::if_then(or_empty(then)).with_else(otherwise);
    if let Some(condition) = condition {
        node = node.with_condition(condition);
    }
    Ok(head.dress(node))
}

fn response(input: &mut &str) -> ModalResult<Response> {
    let head = head.parse_next(input)?;
    if head.name == IF_NAME {
        return if_rest(head, input);
    }
    if let Some(scope) = Scope::from_name(&head.name) {
        let body = cut_err(block)
            .context(StrContext::Expected(StrContextValue::Description("'{'")))
            .parse_next(input)?;
        return Ok(head.dress(Response::scoped(scope, or_empty(body))));
    }
    let node = Response::action(&head.name).map_err(|_| ErrMode::from_input(input).cut())?;
    Ok(head.dress(node))
}

// -- Rules ------------------------------------------------------------------

fn rule(input: &mut &str) -> ModalResult<Rule> {
    keyword(input, "when")?;
    let trigger = opt(trigger).parse_next(input)?;
    let response = cut_err(block)
        .context(StrContext::Expected(StrContextValue::Description("'{'")))
        .parse_next(input)?;
    Ok(Rule { trigger, response })
}

pub fn parse_rules(input: &mut &str) -> ModalResult<ParsedRules> {
    let rules: Vec<Rule> = repeat(0.., rule).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(ParsedRules { rules })
}

#[cfg(test)]
mod tests {
    use crate::parse::parse;
    use crate::types::ResponseKind;

    use super::*;

    fn one(input: &str) -> Rule {
        let mut parsed = parse(input).unwrap();
        assert_eq!(parsed.rules.len(), 1);
        parsed.rules.remove(0)
    }

    #[test]
    fn parse_trigger_and_actions() {
        let rule = one("when collide { wait; \"move toward\"(speed: 2) }");
        assert_eq!(rule.trigger_name(), Some("collide"));
        assert_eq!(rule.top_level_names(), vec!["wait", "move toward"]);
        let second = rule.response.as_ref().unwrap().next().unwrap();
        assert_eq!(second.params().get("speed"), Some(&Value::Int(2)));
    }

    #[test]
    fn parse_empty_rule() {
        let rule = one("when {}");
        assert!(rule.trigger.is_none());
        assert!(rule.has_no_responses());
    }

    #[test]
    fn parse_if_with_condition_and_else() {
        let rule = one(
            r#"when tap {
                if@16 ("random chance"(probability: 0.5)) {
                    jump
                } else {
                    none
                }
            }"#,
        );
        let node = rule.response.unwrap();
        assert_eq!(node.behavior_id(), Some(16));
        let condition = node.condition().unwrap();
        assert_eq!(condition.name, "random chance");
        assert_eq!(condition.params.get("probability"), Some(&Value::Float(0.5)));
        assert_eq!(node.then_branch().unwrap().chain_names(), vec!["jump"]);
        assert!(node.else_branch().unwrap().is_empty());
    }

    #[test]
    fn parse_if_params_before_condition() {
        let rule = one("when { if(note: \"x\") (is_colliding) { a } }");
        let node = rule.response.unwrap();
        assert_eq!(node.params().len(), 1);
        assert_eq!(node.condition().unwrap().name, "is_colliding");
    }

    #[test]
    fn parse_if_without_condition() {
        let rule = one("when { if { a } }");
        let node = rule.response.unwrap();
        assert!(node.condition().is_none());
        assert!(node.else_branch().is_none());
    }

    #[test]
    fn parse_scopes() {
        let rule = one(r#"when { repeat(count: 3) { a; b } "act on other" { } }"#);
        let head = rule.response.unwrap();
        assert!(matches!(head.kind(), ResponseKind::Scoped { scope: Scope::Repeat, .. }));
        assert_eq!(head.body().unwrap().chain_names(), vec!["a", "b"]);
        let other = head.next().unwrap();
        assert_eq!(other.name(), "act on other");
        assert!(other.body().unwrap().is_empty());
    }

    #[test]
    fn parse_all_value_types() {
        let cases = [
            ("42", Value::Int(42)),
            ("-7", Value::Int(-7)),
            ("3.25", Value::Float(3.25)),
            ("1e-7", Value::Float(1e-7)),
            ("true", Value::Bool(true)),
            ("null", Value::Null),
            (r#""a\"b""#, Value::String("a\"b".into())),
            ("[1, 2]", Value::List(vec![Value::Int(1), Value::Int(2)])),
            ("{ x: 1 }", Value::Map(Params::new().with("x", 1_i64))),
            (
                "$random(min: 1)",
                crate::types::expression("random", Params::new().with("min", 1_i64)),
            ),
        ];
        for (literal, expected) in cases {
            let rule = one(&format!("when {{ wait(v: {literal}) }}"));
            let node = rule.response.unwrap();
            assert_eq!(node.params().get("v"), Some(&expected), "failed for {literal}");
        }
    }

    #[test]
    fn parse_comments_ignored() {
        let rule = one("# header\nwhen tap { # inline\n wait }");
        assert_eq!(rule.top_level_names(), vec!["wait"]);
    }

    #[test]
    fn parse_multiple_rules() {
        let parsed = parse("when tap { a } when collide { b }").unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn scope_requires_block() {
        assert!(parse("when { repeat }").is_err());
    }

    #[test]
    fn unterminated_block_fails() {
        assert!(parse("when { wait").is_err());
    }
}
