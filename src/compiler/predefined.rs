//! Predefined query shapes recognised in the columns position, ahead of
//! ordinary column parsing.

use super::CompileResult;

/// Recognises `count_by_date(...)` and `duplicated_names(*)`; anything else
/// falls through to the ordinary columns/criteria compilation path.
pub fn try_compile(columns: &str) -> Option<CompileResult> {
    let columns = columns.trim();
    if columns == "duplicated_names(*)" {
        return Some(duplicated_names());
    }
    if let Some(inner) = columns.strip_prefix("count_by_date(").and_then(|s| s.strip_suffix(')')) {
        return Some(count_by_date(inner));
    }
    None
}

fn duplicated_names() -> CompileResult {
    let sql = "SELECT UPPER(fi.baseName) AS name, COUNT(*) AS n \
               FROM Adobe_images i \
               LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local \
               WHERE i.fileFormat != \"VIDEO\" \
               GROUP BY UPPER(fi.baseName) HAVING COUNT(*) > 1"
        .to_string();
    CompileResult { sql, column_names: vec!["name".to_string(), "n".to_string()] }
}

fn date_precision(text: &str) -> usize {
    text.matches('-').count() + 1
}

fn date_expr_for(precision: usize) -> &'static str {
    match precision {
        1 => "strftime('%Y', datetime(i.captureTime))",
        2 => "strftime('%Y-%m', datetime(i.captureTime))",
        _ => "strftime('%Y-%m-%d', datetime(i.captureTime))",
    }
}

fn count_by_date(args: &str) -> CompileResult {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let from = parts.first().copied().unwrap_or("");
    let to = parts.get(1).copied();
    let expr = date_expr_for(date_precision(from));

    let mut sql = format!(
        "SELECT {expr} AS capturedate, COUNT(*) AS n FROM Adobe_images i WHERE DATE(i.captureTime) >= DATE(\"{from}\")",
        expr = expr,
        from = from
    );
    if let Some(to) = to {
        sql.push_str(&format!(" AND DATE(i.captureTime) <= DATE(\"{}\")", to));
    }
    sql.push_str(&format!(" GROUP BY {}", expr));

    CompileResult { sql, column_names: vec!["capturedate".to_string(), "n".to_string()] }
}
