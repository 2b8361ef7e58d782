//! `aperture` and `speed` transformers.
//!
//! The catalog stores both in Apex-style log2 units: aperture as
//! `2 * log2(f_number)`, shutter speed as `log2(1/seconds)`. The
//! `formatter` module holds the inverse conversions.

use super::{Oper, TransformError};

fn split_leading_oper(value: &str) -> (&str, &str) {
    match value.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => (&value[..idx], &value[idx..]),
        None => (value, ""),
    }
}

fn exact_oper(token: &str) -> Option<Oper> {
    match token {
        "<=" => Some(Oper::Le),
        ">=" => Some(Oper::Ge),
        "==" => Some(Oper::Eq),
        "!=" => Some(Oper::Ne),
        "<" => Some(Oper::Lt),
        ">" => Some(Oper::Gt),
        "=" | "" => Some(Oper::Eq),
        _ => None,
    }
}

/// `aperture` criterion: `F8`, `=5.6`, `<F2.8` convert to the LR-stored
/// `2*log2(N)`, wrapped in `ROUND(..., 6)` so equality lands on the stored
/// double.
pub fn aperture_clause(value: &str) -> Result<Vec<String>, TransformError> {
    let (oper_prefix, number_text) = split_leading_oper(value);
    let oper_prefix = if oper_prefix
        .chars()
        .last()
        .map(|c| c.eq_ignore_ascii_case(&'F'))
        .unwrap_or(false)
    {
        &oper_prefix[..oper_prefix.len() - oper_prefix.chars().last().unwrap().len_utf8()]
    } else {
        oper_prefix
    };
    let oper = exact_oper(oper_prefix)
        .ok_or_else(|| TransformError::new("aperture", format!("invalid operator \"{}\"", oper_prefix)))?;

    let number_text = number_text.trim_start_matches(['F', 'f']);
    let f_number: f64 = number_text
        .parse()
        .map_err(|_| TransformError::new("aperture", "invalid aperture value"))?;
    if f_number <= 0.0 {
        return Err(TransformError::new("aperture", "invalid aperture value"));
    }
    let av = 2.0 * f_number.log2();
    Ok(vec![format!("{} ROUND({:.6}, 6)", oper.as_sql(), av)])
}

/// `speed` criterion: a fraction `1/1000` or whole seconds, convert to
/// `log2(1/seconds)`; `<`/`>` are inverted because a faster shutter is a
/// *larger* stored value.
pub fn speed_clause(value: &str) -> Result<Vec<String>, TransformError> {
    let (oper_prefix, number_text) = split_leading_oper(value);
    let oper = exact_oper(oper_prefix)
        .ok_or_else(|| TransformError::new("speed", format!("invalid operator \"{}\"", oper_prefix)))?;

    let seconds: f64 = if let Some((num, den)) = number_text.split_once('/') {
        let num: f64 = num
            .trim()
            .parse()
            .map_err(|_| TransformError::new("speed", "invalid speed value"))?;
        let den: f64 = den
            .trim()
            .parse()
            .map_err(|_| TransformError::new("speed", "invalid speed value"))?;
        if den == 0.0 {
            return Err(TransformError::new("speed", "invalid speed value"));
        }
        num / den
    } else {
        number_text
            .parse()
            .map_err(|_| TransformError::new("speed", "invalid speed value"))?
    };
    if seconds <= 0.0 {
        return Err(TransformError::new("speed", "invalid speed value"));
    }

    let av = (1.0 / seconds).log2();
    let oper = match oper {
        Oper::Lt | Oper::Gt => oper.flip(),
        other => other,
    };
    Ok(vec![format!("{} ROUND({:.6}, 6)", oper.as_sql(), av)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aperture_defaults_to_eq() {
        let frag = aperture_clause("5.6").unwrap();
        assert_eq!(frag, vec!["= ROUND(4.977280, 6)".to_string()]);
    }

    #[test]
    fn aperture_strips_leading_f() {
        let frag = aperture_clause("F8").unwrap();
        assert_eq!(frag, vec!["= ROUND(6.000000, 6)".to_string()]);
    }

    #[test]
    fn aperture_keeps_operator_before_f() {
        let frag = aperture_clause("<F2.8").unwrap();
        assert!(frag[0].starts_with("< ROUND("));
    }

    #[test]
    fn speed_parses_fraction_and_inverts_lt() {
        let frag = speed_clause("<1/1000").unwrap();
        assert!(frag[0].starts_with(">"), "{}", frag[0]);
    }

    #[test]
    fn speed_parses_whole_seconds() {
        let frag = speed_clause("5").unwrap();
        assert_eq!(frag, vec!["= ROUND(-2.321928, 6)".to_string()]);
    }

    #[test]
    fn speed_rejects_zero() {
        assert!(speed_clause("0").is_err());
    }
}
