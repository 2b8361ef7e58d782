//! Enum- and null-aware transformers: booleans that flip an operator,
//! null-or-literal dispatch, ratings, pick flags, metadata sync states,
//! stack membership, publish-service membership, and collection types.

use super::{parse_bool, split_operator, Oper, TransformError};

/// `videos` criterion: a boolean flips the criterion's own `=`/`!=`.
pub fn bool_to_equal(value: &str) -> Result<&'static str, TransformError> {
    match parse_bool(value) {
        Some(true) => Ok("="),
        Some(false) => Ok("!="),
        None => Err(TransformError::new(
            "videos",
            format!("invalid boolean \"{}\"", value),
        )),
    }
}

/// `vcopies` criterion: `null|false` → `IS NULL`, `!null|true` → `NOT NULL`,
/// anything else is an equality literal.
pub fn value_or_null(value: &str) -> Vec<String> {
    match value.to_lowercase().as_str() {
        "null" | "false" => vec!["IS NULL".to_string()],
        "!null" | "true" => vec!["NOT NULL".to_string()],
        other => vec![format!("= \"{}\"", other)],
    }
}

/// `caption` criterion: same null handling, but a literal value becomes
/// `LIKE` instead of `=`.
pub fn like_value_or_null(value: &str) -> Vec<String> {
    match value.to_lowercase().as_str() {
        "null" | "false" => vec!["IS NULL".to_string()],
        "!null" | "true" => vec!["NOT NULL".to_string()],
        other => vec![format!("LIKE \"{}\"", other)],
    }
}

/// `colorlabel` criterion: a boolean asks "is any label set"; otherwise the
/// value compares by equality against the label name.
pub fn value_or_not_equal(value: &str) -> Vec<String> {
    match parse_bool(value) {
        Some(true) => vec!["<>".to_string(), "\"\"".to_string()],
        Some(false) => vec!["==".to_string(), "\"\"".to_string()],
        None => vec!["=".to_string(), format!("\"{}\"", value)],
    }
}

/// `rating` criterion: unrated photos store `NULL`, so `<N` and `>=0` must
/// also match the NULL case, and `=0` means strictly unrated. A bare value
/// with no leading operator (`rating=5`) defaults to `=`.
pub fn rating_clause(value: &str) -> Vec<String> {
    let (oper, num) = split_operator(value);
    let cmp = format!("{} {}", oper.as_sql(), num);
    if oper == Oper::Lt || cmp == ">= 0" {
        vec![format!("(i.rating IS NULL OR i.rating {})", cmp)]
    } else if cmp == "= 0" {
        vec!["i.rating IS NULL".to_string()]
    } else {
        vec![format!("i.rating {}", cmp)]
    }
}

/// `flag` column/criterion: maps `flagged|unflagged|rejected|1|0|-1` to the
/// stored pick values `1|0|-1`.
pub fn flag_clause(value: &str) -> Result<Vec<String>, TransformError> {
    let pick = match value.to_lowercase().as_str() {
        "flagged" | "1" => "1",
        "unflagged" | "0" => "0",
        "rejected" | "-1" => "-1",
        _ => return Err(TransformError::new("flag", format!("invalid flag value \"{}\"", value))),
    };
    Ok(vec![format!("= {}", pick)])
}

/// `metastatus` criterion: the five XMP-vs-catalog sync states.
pub fn metastatus_clause(value: &str) -> Result<Vec<String>, TransformError> {
    let frag = match value {
        "unknown" => "am.externalXmpIsDirty = 0 AND i.sidecarStatus = 2.0",
        "changedondisk" => "am.externalXmpIsDirty = 1 AND (i.sidecarStatus = 2.0 OR i.sidecarStatus = 0.0)",
        "hasbeenchanged" => "am.externalXmpIsDirty = 0 AND i.sidecarStatus = 1.0",
        "conflict" => "am.externalXmpIsDirty = 1 AND i.sidecarStatus = 1.0",
        "uptodate" => "am.externalXmpIsDirty = 0 AND i.sidecarStatus = 0.0",
        other => {
            return Err(TransformError::new(
                "metastatus",
                format!("invalid metastatus value \"{}\"", other),
            ))
        }
    };
    Ok(vec![frag.to_string()])
}

/// `stacks` criterion: `yes|all|true` selects any stacked image,
/// `no|none|false` images outside any stack, `top|first|only` the stack
/// head, `no+top|one` either of the last two, and a bare integer one exact
/// stack by its `fsi.stack` id.
pub fn stacks_clause(value: &str) -> Result<Vec<String>, TransformError> {
    let frag = match value.to_lowercase().as_str() {
        "yes" | "all" | "true" => "fsi.image IS NOT NULL".to_string(),
        "no" | "none" | "false" => "fsi.image IS NULL".to_string(),
        "top" | "first" | "only" => "fsi.position = 1.0".to_string(),
        "no+top" | "one" => "(fsi.image IS NULL OR fsi.position = 1.0)".to_string(),
        other => match other.parse::<i64>() {
            Ok(n) => format!("fsi.stack = {}", n),
            Err(_) => {
                return Err(TransformError::new(
                    "stacks",
                    format!("invalid stacks value \"{}\"", value),
                ))
            }
        },
    };
    Ok(vec![frag])
}

/// `hasGPSData` / `flashFired` / `colorMode` / `treatment`: a bare boolean
/// filling a `col = %s` template with the literal `1`/`0`.
pub fn zero_or_one(criterion: &'static str, value: &str) -> Result<Vec<String>, TransformError> {
    match parse_bool(value) {
        Some(true) => Ok(vec!["1".to_string()]),
        Some(false) => Ok(vec!["0".to_string()]),
        None => Err(TransformError::new(criterion, format!("invalid boolean \"{}\"", value))),
    }
}

/// `pubcollection` criterion: presence of any publish-service membership, or
/// a case-insensitive collection-name match.
pub fn published_clause(value: &str) -> Result<Vec<String>, TransformError> {
    match parse_bool(value) {
        Some(true) => Ok(vec!["pc.name IS NOT NULL".to_string()]),
        Some(false) => Ok(vec!["pc.name IS NULL".to_string()]),
        None => Ok(vec![format!("pc.name = \"{}\" COLLATE NOCASE", value)]),
    }
}

/// Collection `type` criterion: `standard`/`smart`/`all`, or an explicit
/// `creationId` (the catalog stores the owning module's reverse-DNS name
/// there). Fills the whole template.
pub fn collection_type_clause(value: &str) -> Result<Vec<String>, TransformError> {
    let frag = match value.to_lowercase().as_str() {
        "smart" => "col.creationId = \"com.adobe.ag.library.smart_collection\"".to_string(),
        "standard" => "col.creationId = \"com.adobe.ag.library.collection\"".to_string(),
        "all" => "(col.creationId = \"com.adobe.ag.library.smart_collection\" \
                   OR col.creationId = \"com.adobe.ag.library.collection\")"
            .to_string(),
        other => format!("col.creationId = \"{}\"", other),
    };
    Ok(vec![frag])
}
