//! Const extraction and substitution: `const NAME … end`
//! defines a compile-time integer evaluated by a tiny RPN machine, then
//! every later WORD token matching a defined const's name becomes an INT.

use std::collections::HashMap;

use collver_lex::Token;
use collver_util::{CollverError, CollverResult, Diagnostic, Location, Symbol};

/// Carries the global offset counter across every `const` block of one
/// compilation: an explicit context field, not module state.
#[derive(Default)]
struct ConstContext {
    consts: HashMap<Symbol, i64>,
    offset_counter: i64,
}

pub fn process_consts(tokens: Vec<Token>) -> CollverResult<Vec<Token>> {
    let mut ctx = ConstContext::default();
    let stripped = extract_consts(tokens, &mut ctx)?;
    Ok(substitute(stripped, &ctx.consts))
}

fn extract_consts(tokens: Vec<Token>, ctx: &mut ConstContext) -> CollverResult<Vec<Token>> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        if !matches!(&token, Token::Word(text, _) if text == "const") {
            out.push(token);
            continue;
        }

        let name_token = iter.next().ok_or_else(|| {
            CollverError::Preprocess(Diagnostic::error(
                "`const` must be followed by a name",
                token.location(),
            ))
        })?;
        let Token::Word(name_text, _) = &name_token else {
            return Err(CollverError::Preprocess(Diagnostic::error(
                "`const` must be followed by a name",
                name_token.location(),
            )));
        };
        let name = Symbol::intern(name_text);

        let mut body = Vec::new();
        loop {
            match iter.next() {
                Some(Token::Word(text, _)) if text == "end" => break,
                Some(t) => body.push(t),
                None => {
                    return Err(CollverError::Preprocess(Diagnostic::error(
                        "unterminated `const` block: expected `end`",
                        token.location(),
                    )))
                }
            }
        }

        let value = eval_rpn(&body, ctx, token.location())?;
        ctx.consts.insert(name, value);
    }

    Ok(out)
}

fn eval_rpn(body: &[Token], ctx: &mut ConstContext, owner: Location) -> CollverResult<i64> {
    let mut stack: Vec<i64> = Vec::new();

    for token in body {
        match token {
            Token::Int(value, _) => stack.push(*value),
            Token::Str(_, loc) => {
                return Err(CollverError::Preprocess(Diagnostic::error(
                    "a string literal cannot appear in a const body",
                    *loc,
                )))
            }
            Token::Word(text, loc) => match text.as_str() {
                "+" => binary(&mut stack, *loc, |a, b| a + b)?,
                "-" => binary(&mut stack, *loc, |a, b| b - a)?,
                "*" => binary(&mut stack, *loc, |a, b| a * b)?,
                "offset" => {
                    let n = pop(&mut stack, *loc)?;
                    stack.push(ctx.offset_counter);
                    ctx.offset_counter += n;
                }
                "reset" => {
                    stack.push(ctx.offset_counter);
                    ctx.offset_counter = 0;
                }
                _ => {
                    let name = Symbol::intern(text);
                    match ctx.consts.get(&name) {
                        Some(value) => stack.push(*value),
                        None => {
                            return Err(CollverError::Preprocess(Diagnostic::error(
                                format!("unknown word `{text}` in const body"),
                                *loc,
                            )))
                        }
                    }
                }
            },
        }
    }

    match stack.as_slice() {
        [value] => Ok(*value),
        _ => Err(CollverError::Preprocess(Diagnostic::error(
            format!("const body must evaluate to exactly one integer, got {}", stack.len()),
            owner,
        ))),
    }
}

fn pop(stack: &mut Vec<i64>, loc: Location) -> CollverResult<i64> {
    stack.pop().ok_or_else(|| {
        CollverError::Preprocess(Diagnostic::error("not enough operands on const stack", loc))
    })
}

fn binary(stack: &mut Vec<i64>, loc: Location, op: impl Fn(i64, i64) -> i64) -> CollverResult<()> {
    let a = pop(stack, loc)?;
    let b = pop(stack, loc)?;
    stack.push(op(a, b));
    Ok(())
}

fn substitute(tokens: Vec<Token>, consts: &HashMap<Symbol, i64>) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|token| match &token {
            Token::Word(text, loc) => match consts.get(&Symbol::intern(text)) {
                Some(value) => Token::Int(*value, *loc),
                None => token,
            },
            _ => token,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use collver_lex::lex;

    fn run(src: &str) -> Vec<Token> {
        process_consts(lex("t.collver", src).unwrap()).unwrap()
    }

    #[test]
    fn simple_rpn_const_evaluates() {
        let tokens = run("const N 2 3 + end N");
        assert!(matches!(tokens.as_slice(), [Token::Int(5, _)]));
    }

    #[test]
    fn later_const_may_reference_earlier_one() {
        let tokens = run("const A 2 end const B A A * end B");
        assert!(matches!(tokens.as_slice(), [Token::Int(4, _)]));
    }

    #[test]
    fn offset_accumulates_and_reset_clears() {
        let tokens = run("const A 4 offset end const B 4 offset end const C reset end A B C");
        match tokens.as_slice() {
            [Token::Int(0, _), Token::Int(4, _), Token::Int(8, _)] => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_word_in_const_body_is_an_error() {
        let tokens = lex("t.collver", "const N nonsense end").unwrap();
        let err = process_consts(tokens).unwrap_err();
        assert!(matches!(err, CollverError::Preprocess(_)));
    }

    #[test]
    fn multi_value_body_is_an_error() {
        let tokens = lex("t.collver", "const N 1 2 end").unwrap();
        let err = process_consts(tokens).unwrap_err();
        assert!(matches!(err, CollverError::Preprocess(_)));
    }

    #[test]
    fn no_const_word_survives_substitution() {
        let tokens = run("const N 1 end N N N");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| matches!(t, Token::Int(1, _))));
    }
}
