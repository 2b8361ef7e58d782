//! `exifindex`, `title` and `haskeywords` transformers.
//!
//! `AgMetadataSearchIndex` stores its searchable words tab-delimited, so
//! word matches wrap the term in `\t` markers. A value splits on `&` (AND),
//! `|` (OR), or whitespace (AND).

use super::TransformError;

fn split_join(value: &str, column: &str) -> String {
    let (joiner, parts): (&str, Vec<&str>) = if value.contains('&') {
        (" AND ", value.split('&').collect())
    } else if value.contains('|') {
        (" OR ", value.split('|').collect())
    } else {
        (" AND ", value.split_whitespace().collect())
    };
    parts
        .into_iter()
        .map(|part| format!("{} LIKE \"%\t{}\t%\"", column, part.trim()))
        .collect::<Vec<_>>()
        .join(joiner)
}

/// `exifindex` criterion: search `AgMetadataSearchIndex.exifSearchIndex`.
pub fn exifindex_clause(value: &str) -> Vec<String> {
    vec![split_join(value, "msi.exifSearchIndex")]
}

/// `title` criterion: search `AgMetadataSearchIndex.otherSearchIndex`.
pub fn titleindex_clause(value: &str) -> Vec<String> {
    vec![split_join(value, "msi.otherSearchIndex")]
}

/// `haskeywords` criterion: presence/absence of any keyword assignment. The
/// absent case references a `kwi1` alias, so it returns the join it needs
/// alongside the fragment; the present case is a self-contained subquery.
pub fn haskeywords_clause(
    value: &str,
) -> Result<(Vec<String>, Vec<&'static str>), TransformError> {
    match value {
        "True" | "1" => Ok((
            vec!["i.id_local IN (SELECT DISTINCT kwi.image FROM AgLibraryKeywordImage kwi)".to_string()],
            Vec::new(),
        )),
        "False" | "0" => Ok((
            vec!["kwi1.image IS NULL".to_string()],
            vec!["LEFT JOIN AgLibraryKeywordImage kwi1 ON i.id_local = kwi1.image"],
        )),
        other => Err(TransformError::new(
            "haskeywords",
            format!("invalid haskeywords value \"{}\"", other),
        )),
    }
}
