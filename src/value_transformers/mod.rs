//! Per-criterion value transformers.
//!
//! Each transformer takes the raw text after `=` in a `KEYVAL` token and
//! returns the fragment(s) the compiler substitutes into the criterion's
//! `where_template`. Transformers never touch SQL assembly; user text only
//! reaches a query after passing through one of them (or after the lexer's
//! quote stripping, for criteria that take the value verbatim).

pub mod dates;
pub mod enums;
pub mod gps;
pub mod optics;
pub mod text;

use thiserror::Error;

/// A value transformer rejected the raw text (bad date, bad aperture, bad
/// enum spelling).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for criterion \"{criterion}\": {reason}")]
pub struct TransformError {
    pub criterion: &'static str,
    pub reason: String,
}

impl TransformError {
    pub fn new(criterion: &'static str, reason: impl Into<String>) -> Self {
        TransformError {
            criterion,
            reason: reason.into(),
        }
    }
}

/// Comparison operators the DSL accepts ahead of a numeric/date value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oper {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Oper {
    pub fn as_sql(self) -> &'static str {
        match self {
            Oper::Lt => "<",
            Oper::Le => "<=",
            Oper::Gt => ">",
            Oper::Ge => ">=",
            Oper::Eq => "=",
            Oper::Ne => "!=",
        }
    }

    pub fn flip(self) -> Oper {
        match self {
            Oper::Lt => Oper::Gt,
            Oper::Gt => Oper::Lt,
            Oper::Le => Oper::Ge,
            Oper::Ge => Oper::Le,
            other => other,
        }
    }

    fn parse_prefix(text: &str) -> (Option<Oper>, &str) {
        for (token, oper) in [
            ("<=", Oper::Le),
            (">=", Oper::Ge),
            ("==", Oper::Eq),
            ("!=", Oper::Ne),
            ("<", Oper::Lt),
            (">", Oper::Gt),
            ("=", Oper::Eq),
        ] {
            if let Some(rest) = text.strip_prefix(token) {
                return (Some(oper), rest);
            }
        }
        (None, text)
    }
}

/// Split `value` into a leading comparison operator (default `=` when
/// absent) and the remainder.
pub fn split_operator(value: &str) -> (Oper, &str) {
    let (oper, rest) = Oper::parse_prefix(value.trim_start());
    (oper.unwrap_or(Oper::Eq), rest)
}

/// Recognize `true|false|1|0|yes|no` (case-insensitive). `None` when the
/// text matches none of those spellings.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_operator_defaults_to_eq() {
        assert_eq!(split_operator("5.6"), (Oper::Eq, "5.6"));
    }

    #[test]
    fn split_operator_recognizes_all_six() {
        assert_eq!(split_operator(">=4"), (Oper::Ge, "4"));
        assert_eq!(split_operator("<=4"), (Oper::Le, "4"));
        assert_eq!(split_operator("!=4"), (Oper::Ne, "4"));
        assert_eq!(split_operator("==4"), (Oper::Eq, "4"));
        assert_eq!(split_operator("<4"), (Oper::Lt, "4"));
        assert_eq!(split_operator(">4"), (Oper::Gt, "4"));
    }

    #[test]
    fn flip_swaps_only_directional_operators() {
        assert_eq!(Oper::Lt.flip(), Oper::Gt);
        assert_eq!(Oper::Ge.flip(), Oper::Le);
        assert_eq!(Oper::Eq.flip(), Oper::Eq);
    }
}
