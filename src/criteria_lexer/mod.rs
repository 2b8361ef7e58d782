//! Lexer for the criteria mini-language.
//!
//! ```text
//! expr   := atom (OP atom)*
//! atom   := KEYVAL | '(' expr ')'
//! OP     := ',' (AND) | '|' (OR)
//! KEYVAL := IDENT [ '=' VALUE ]
//! VALUE  := QUOTED | UNQUOTED-until-one-of(,|()
//! ```
//!
//! Tokenizing is followed by a follow-rule check (which token kinds may
//! succeed which) and a parenthesis-balance check.

pub mod errors;

use nom::branch::alt;
use nom::bytes::complete::{is_not, tag};
use nom::character::complete::{alphanumeric1, char, multispace0};
use nom::combinator::{opt, recognize};
use nom::multi::many0_count;
use nom::sequence::pair;
use nom::{IResult, Parser};

pub use errors::LexError;

/// A single lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LPar,
    RPar,
    And,
    Or,
    KeyVal { key: String, value: String },
}

/// Tag used for diagnostics and the follow-rule table; `Start` is not a
/// real token, only the grammar's initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Start,
    LPar,
    RPar,
    And,
    Or,
    KeyVal,
}

impl Token {
    fn kind(&self) -> Kind {
        match self {
            Token::LPar => Kind::LPar,
            Token::RPar => Kind::RPar,
            Token::And => Kind::And,
            Token::Or => Kind::Or,
            Token::KeyVal { .. } => Kind::KeyVal,
        }
    }
}

fn allowed_next(prev: Kind) -> &'static [Kind] {
    match prev {
        Kind::Start => &[Kind::LPar, Kind::KeyVal],
        Kind::KeyVal => &[Kind::And, Kind::Or, Kind::RPar],
        Kind::And | Kind::Or => &[Kind::KeyVal, Kind::LPar],
        Kind::LPar => &[Kind::KeyVal, Kind::LPar],
        Kind::RPar => &[Kind::And, Kind::Or, Kind::RPar],
    }
}

fn kind_name(kind: Kind) -> &'static str {
    match kind {
        Kind::Start => "start",
        Kind::LPar => "(",
        Kind::RPar => ")",
        Kind::And => "AND",
        Kind::Or => "OR",
        Kind::KeyVal => "key=value",
    }
}

fn ident(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alphanumeric1,
        many0_count(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

/// A single- or double-quoted string, supporting `\`-escaped quotes.
fn quoted(input: &str) -> IResult<&str, String> {
    let (rest, quote) = alt((char('\''), char('"'))).parse(input)?;
    let mut out = String::new();
    let mut chars = rest.char_indices().peekable();
    let mut end = None;
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            if let Some((_, next_c)) = chars.next() {
                out.push(next_c);
                continue;
            }
        }
        if c == quote {
            end = Some(idx + c.len_utf8());
            break;
        }
        out.push(c);
    }
    match end {
        Some(consumed) => Ok((&rest[consumed..], out)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
        ))),
    }
}

fn unquoted(input: &str) -> IResult<&str, &str> {
    is_not(",|()").parse(input)
}

fn value(input: &str) -> IResult<&str, String> {
    alt((quoted, |i| unquoted(i).map(|(r, v)| (r, v.trim_end().to_string())))).parse(input)
}

fn key_val(input: &str) -> IResult<&str, Token> {
    let (rest, key) = ident(input)?;
    let key = key.to_lowercase();
    let (rest, eq) = opt(pair(multispace0, char('='))).parse(rest)?;
    if eq.is_none() {
        return Ok((
            rest,
            Token::KeyVal {
                key,
                value: "True".to_string(),
            },
        ));
    }
    let (rest, _) = multispace0(rest)?;
    let (rest, value) = value(rest)?;
    Ok((rest, Token::KeyVal { key, value }))
}

fn raw_token(input: &str) -> IResult<&str, Token> {
    alt((
        |i| char('(').parse(i).map(|(r, _)| (r, Token::LPar)),
        |i| char(')').parse(i).map(|(r, _)| (r, Token::RPar)),
        |i| char(',').parse(i).map(|(r, _)| (r, Token::And)),
        |i| char('|').parse(i).map(|(r, _)| (r, Token::Or)),
        key_val,
    ))
    .parse(input)
}

/// Tokenize a criteria string, enforcing the follow-token grammar and
/// parenthesis balance. Returns the token stream or a `LexError` carrying
/// the offending position.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut rest = input;
    let mut prev = Kind::Start;
    let mut depth: i32 = 0;

    loop {
        let (after_ws, _) = multispace0::<_, nom::error::Error<&str>>(rest)
            .expect("multispace0 never fails");
        rest = after_ws;
        if rest.is_empty() {
            break;
        }
        let position = input.len() - rest.len();
        let (next_rest, token) = raw_token(rest).map_err(|_| {
            let offending: String = rest.chars().take_while(|c| !c.is_whitespace()).collect();
            LexError::new(format!("invalid token \"{}\"", offending), position)
        })?;

        let kind = token.kind();
        if !allowed_next(prev).contains(&kind) {
            return Err(LexError::new(
                format!(
                    "\"{}\" not allowed after \"{}\"",
                    kind_name(kind),
                    kind_name(prev)
                ),
                position,
            ));
        }
        match kind {
            Kind::LPar => depth += 1,
            Kind::RPar => {
                depth -= 1;
                if depth < 0 {
                    return Err(LexError::new("unbalanced parenthesis", position));
                }
            }
            _ => {}
        }
        tokens.push(token);
        prev = kind;
        rest = next_rest;
    }

    if depth != 0 {
        return Err(LexError::new("unbalanced parenthesis", input.len()));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_simple_keyval() {
        let tokens = tokenize("rating=>=4").unwrap();
        assert_eq!(
            tokens,
            vec![Token::KeyVal {
                key: "rating".into(),
                value: ">=4".into()
            }]
        );
    }

    #[test]
    fn missing_value_defaults_to_true() {
        let tokens = tokenize("videos").unwrap();
        assert_eq!(
            tokens,
            vec![Token::KeyVal {
                key: "videos".into(),
                value: "True".into()
            }]
        );
    }

    #[test]
    fn and_or_and_parens() {
        let tokens = tokenize("(keyword=france | keyword=italy), videos=0").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LPar,
                Token::KeyVal {
                    key: "keyword".into(),
                    value: "france".into()
                },
                Token::Or,
                Token::KeyVal {
                    key: "keyword".into(),
                    value: "italy".into()
                },
                Token::RPar,
                Token::And,
                Token::KeyVal {
                    key: "videos".into(),
                    value: "0".into()
                },
            ]
        );
    }

    #[test]
    fn quoted_value_with_escape() {
        let tokens = tokenize(r#"collection="Bob\"s trip""#).unwrap();
        assert_eq!(
            tokens,
            vec![Token::KeyVal {
                key: "collection".into(),
                value: "Bob\"s trip".into()
            }]
        );
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(tokenize("(rating=5").is_err());
        assert!(tokenize("rating=5)").is_err());
    }

    #[test]
    fn rejects_two_keyvals_in_a_row() {
        let err = tokenize("rating videos=0").unwrap_err();
        assert!(err.reason.contains("not allowed"));
    }

    #[test]
    fn idempotent_under_extra_wrapping_parens() {
        let a = tokenize("rating=5, videos=0").unwrap();
        let b = tokenize("(rating=5, videos=0)").unwrap();
        assert_eq!(a.len() + 2, b.len());
    }
}
