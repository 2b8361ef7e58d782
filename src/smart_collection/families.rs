//! Per-criterion SQL emission, grouped by operation family (numeric,
//! string, boolean, date, enum-value, has-adjustments) rather than one
//! handler per criterion.
//!
//! Every criterion in the closed set gets its own dispatch arm in
//! `translate_node`, but the actual SQL text is produced by a small number
//! of shared family helpers. A smart node is a single standalone criterion,
//! so join aliases are numbered per whitespace-separated value within the
//! node, starting at `1` — no cross-criterion occurrence counter is needed
//! the way the generic compiler needs one for repeated DSL key-vals.

use crate::config::Config;
use crate::value_transformers::{dates, enums, parse_bool};

use super::errors::SmartError;
use super::{KeywordIndex, KeywordMatch, Node};

pub struct SqlFragment {
    pub joins: Vec<String>,
    pub where_sql: String,
}

const NUMERIC_OPS: &[&str] = &["==", "!=", ">", "<", ">=", "<="];

fn numeric_clause(node: &Node, column: &str) -> Result<String, SmartError> {
    match node.operation.as_str() {
        "in" => {
            let v2 = node
                .value2
                .as_deref()
                .ok_or_else(|| SmartError::new(node.criteria.as_str(), "operation \"in\" requires value2"))?;
            Ok(format!("{} BETWEEN {} AND {}", column, node.value, v2))
        }
        op if NUMERIC_OPS.contains(&op) => Ok(format!("{} {} {}", column, op, node.value)),
        other => Err(SmartError::new(
            node.criteria.as_str(),
            format!("unsupported operation \"{}\" for a numeric criterion", other),
        )),
    }
}

fn boolean_clause(node: &Node, column: &str) -> Result<String, SmartError> {
    let truth = match node.operation.as_str() {
        "isTrue" => true,
        "isFalse" => false,
        "==" | "!=" => {
            let v = parse_bool(&node.value)
                .ok_or_else(|| SmartError::new(node.criteria.as_str(), format!("invalid boolean value \"{}\"", node.value)))?;
            if node.operation == "==" { v } else { !v }
        }
        other => {
            return Err(SmartError::new(
                node.criteria.as_str(),
                format!("unsupported operation \"{}\" for a boolean criterion", other),
            ))
        }
    };
    Ok(format!("{} == {}", column, if truth { 1 } else { 0 }))
}

fn strip_sign(word: &str) -> &str {
    word.strip_prefix('+').or_else(|| word.strip_prefix('!')).unwrap_or(word)
}

fn like_term(column: &str, word: &str) -> String {
    if let Some(negated) = word.strip_prefix('!') {
        format!("{} NOT LIKE \"%{}%\"", column, negated)
    } else {
        format!("{} LIKE \"%{}%\"", column, strip_sign(word))
    }
}

fn string_clause(node: &Node, column: &str) -> Result<String, SmartError> {
    let words: Vec<&str> = node.value.split_whitespace().collect();
    match node.operation.as_str() {
        "==" => Ok(format!("{} == \"{}\"", column, node.value)),
        "!=" => Ok(format!("{} != \"{}\"", column, node.value)),
        // `any` ORs plain words together, but a `+word` or `!word` is
        // required regardless of what the optional group matches.
        "any" => {
            let mut required = Vec::new();
            let mut optional = Vec::new();
            for w in &words {
                if let Some(neg) = w.strip_prefix('!') {
                    required.push(format!("{} NOT LIKE \"%{}%\"", column, neg));
                } else if let Some(plus) = w.strip_prefix('+') {
                    required.push(format!("{} LIKE \"%{}%\"", column, plus));
                } else {
                    optional.push(format!("{} LIKE \"%{}%\"", column, w));
                }
            }
            if !optional.is_empty() {
                required.push(format!("({})", optional.join(" OR ")));
            }
            if required.is_empty() {
                return Err(SmartError::new(node.criteria.as_str(), "empty value for \"any\""));
            }
            Ok(required.join(" AND "))
        }
        "all" => Ok(words.iter().map(|w| like_term(column, w)).collect::<Vec<_>>().join(" AND ")),
        "noneOf" => Ok(words
            .iter()
            .map(|w| format!("{} NOT LIKE \"%{}%\"", column, strip_sign(w)))
            .collect::<Vec<_>>()
            .join(" AND ")),
        "beginsWith" => Ok(words
            .iter()
            .map(|w| format!("{} LIKE \"%\t{}%\"", column, w))
            .collect::<Vec<_>>()
            .join(" AND ")),
        "endsWith" => Ok(words
            .iter()
            .map(|w| format!("{} LIKE \"%{}\t%\"", column, w))
            .collect::<Vec<_>>()
            .join(" AND ")),
        "words" => Ok(words
            .iter()
            .map(|w| format!("{} LIKE \"%\t{}\t%\"", column, w))
            .collect::<Vec<_>>()
            .join(" AND ")),
        other => Err(SmartError::new(
            node.criteria.as_str(),
            format!("unsupported operation \"{}\" for a string criterion", other),
        )),
    }
}

fn seconds_per_unit(units: &str) -> f64 {
    match units {
        "week" => 7.0 * 86400.0,
        "month" => 30.0 * 86400.0,
        "year" => 365.0 * 86400.0,
        _ => 86400.0,
    }
}

fn capture_date_clause(node: &Node) -> Result<String, SmartError> {
    match node.operation.as_str() {
        "in" => {
            let v2 = node
                .value2
                .as_deref()
                .ok_or_else(|| SmartError::new(node.criteria.as_str(), "operation \"in\" requires value2"))?;
            Ok(format!(
                "i.captureTime >= \"{}\" AND i.captureTime < DATE(\"{}\", \"+1 day\")",
                node.value, v2
            ))
        }
        "inLast" => {
            let units = node.units.as_deref().unwrap_or("day");
            Ok(format!("i.captureTime >= DATE('now', '-{} {}')", node.value, units))
        }
        "==" | "!=" | ">" | "<" => Ok(format!("i.captureTime {} \"{}\"", node.operation, node.value)),
        other => Err(SmartError::new(
            node.criteria.as_str(),
            format!("unsupported operation \"{}\" for captureTime", other),
        )),
    }
}

/// `touchTime`: same operation vocabulary as `captureTime` but compared as
/// Lightroom-epoch seconds, with a 24h end-of-day offset on the upper
/// bound.
fn touch_date_clause(node: &Node, cfg: &Config) -> Result<String, SmartError> {
    let stamp = |text: &str| {
        dates::date_to_lrstamp(text, cfg.day_first_dates, true)
            .map_err(|e| SmartError::new(node.criteria.as_str(), e.reason))
    };
    match node.operation.as_str() {
        "in" => {
            let v2 = node
                .value2
                .as_deref()
                .ok_or_else(|| SmartError::new(node.criteria.as_str(), "operation \"in\" requires value2"))?;
            let from = stamp(&node.value)?;
            let to = stamp(v2)? + 86400.0;
            Ok(format!("i.touchtime >= {} AND i.touchtime < {}", from, to))
        }
        "inLast" => {
            let units = node.units.as_deref().unwrap_or("day");
            let secs: f64 = node
                .value
                .parse::<f64>()
                .map_err(|_| SmartError::new(node.criteria.as_str(), "invalid inLast value"))?
                * seconds_per_unit(units);
            Ok(format!("i.touchtime > (strftime('%s', 'now') - 978307200 - {})", secs))
        }
        "<" => {
            let upper = stamp(&node.value)? + 86400.0;
            Ok(format!("i.touchtime < {} AND i.touchtime > 0", upper))
        }
        "==" | "!=" | ">" => {
            let s = stamp(&node.value)?;
            Ok(format!("i.touchtime {} {}", node.operation, s))
        }
        other => Err(SmartError::new(
            node.criteria.as_str(),
            format!("unsupported operation \"{}\" for touchTime", other),
        )),
    }
}

fn aspect_ratio_clause(node: &Node) -> Result<String, SmartError> {
    if node.operation != "==" && node.operation != "!=" {
        return Err(SmartError::new(
            node.criteria.as_str(),
            format!("unsupported operation \"{}\" for aspectRatio", node.operation),
        ));
    }
    let (eq_oper, ne_oper) = match node.value.as_str() {
        "square" => ("=", "!="),
        "portrait" => ("<", ">="),
        "landscape" => (">", "<="),
        other => return Err(SmartError::new(node.criteria.as_str(), format!("unsupported aspectRatio value \"{}\"", other))),
    };
    let oper = if node.operation == "==" { eq_oper } else { ne_oper };
    Ok(format!("i.aspectRatioCache {} 1", oper))
}

fn rating_clause(node: &Node) -> Result<String, SmartError> {
    if !NUMERIC_OPS.contains(&node.operation.as_str()) {
        return Err(SmartError::new(
            node.criteria.as_str(),
            format!("unsupported operation \"{}\" for rating", node.operation),
        ));
    }
    let include_null = node.operation == "<" || (node.operation == "==" && node.value == "0");
    let cmp = format!("i.rating {} {}", node.operation, node.value);
    Ok(if include_null { format!("(i.rating IS NULL OR {})", cmp) } else { cmp })
}

fn has_adjustments_clause(node: &Node) -> Result<String, SmartError> {
    match node.operation.as_str() {
        "isTrue" => Ok("ids.hasDevelopAdjustmentsEx = 1".to_string()),
        "isFalse" => Ok("ids.hasDevelopAdjustmentsEx != 1".to_string()),
        other => Err(SmartError::new(
            node.criteria.as_str(),
            format!("unsupported operation \"{}\" for hasAdjustments", other),
        )),
    }
}

fn treatment_clause(node: &Node) -> Result<String, SmartError> {
    if node.value != "grayscale" {
        return Err(SmartError::new(node.criteria.as_str(), format!("unsupported treatment value \"{}\"", node.value)));
    }
    match node.operation.as_str() {
        "==" => Ok("ids.grayscale = 1".to_string()),
        "!=" => Ok("ids.grayscale != 1".to_string()),
        other => Err(SmartError::new(node.criteria.as_str(), format!("unsupported operation \"{}\" for treatment", other))),
    }
}

/// `collection`: one `ci{n}`/`col{n}` join alias per whitespace-separated
/// value, 1-based, the clauses AND'd together. `any` matches through a
/// single `IN` subquery over collection membership instead; `noneOf` is the
/// same subquery negated — same row set as an `EXCEPT` of two selects, and
/// it keeps the whole criterion inside one WHERE fragment.
fn collection_clause(node: &Node, joins: &mut Vec<String>) -> Result<String, SmartError> {
    let values: Vec<&str> = node.value.split_whitespace().collect();
    if values.is_empty() {
        return Err(SmartError::new(node.criteria.as_str(), "empty collection value"));
    }

    if node.operation == "any" || node.operation == "noneOf" {
        let names = values
            .iter()
            .map(|v| format!("col.name LIKE \"%{}%\"", v))
            .collect::<Vec<_>>()
            .join(" OR ");
        let membership = format!(
            "(SELECT ci.image FROM AgLibraryCollectionimage ci \
             JOIN AgLibraryCollection col ON col.id_local = ci.Collection WHERE {})",
            names
        );
        let not = if node.operation == "noneOf" { " NOT" } else { "" };
        return Ok(format!("i.id_local{} IN {}", not, membership));
    }

    let pattern_for = |value: &str| match node.operation.as_str() {
        "all" => Some(format!("%{}%", value)),
        "beginsWith" => Some(format!("{}%", value)),
        "endsWith" => Some(format!("%{}", value)),
        _ => None,
    };

    let mut clauses = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let n = i + 1;
        let pattern = pattern_for(value).ok_or_else(|| {
            SmartError::new(
                node.criteria.as_str(),
                format!("unsupported operation \"{}\" for collection", node.operation),
            )
        })?;
        joins.push(format!("LEFT JOIN AgLibraryCollectionimage ci{0} ON ci{0}.image = i.id_local", n));
        joins.push(format!("LEFT JOIN AgLibraryCollection col{0} ON col{0}.id_local = ci{0}.Collection", n));
        clauses.push(format!("col{}.name LIKE \"{}\"", n, pattern));
    }
    Ok(clauses.join(" AND "))
}

/// `keywords`: a name selects its whole subtree. With a real
/// `KeywordIndex` wired, each whitespace-
/// separated value resolves to an `IN` clause over `AgLibraryKeyword`
/// ids including every transitive child id — one `kwi{n}` alias per value
/// under `all`/`words`/`beginsWith`/`endsWith`, a single merged `IN` under
/// `any`, the negated subquery under `noneOf`. Without an index
/// (`NullKeywordIndex`), falls back to a direct `LIKE` on the keyword name
/// with no hierarchy — the degraded mode a pure function gets without a
/// live catalog handle.
fn keywords_clause(node: &Node, joins: &mut Vec<String>, index: &dyn KeywordIndex) -> Result<String, SmartError> {
    if node.operation == "empty" {
        joins.push("LEFT JOIN AgLibraryKeywordImage kwi1 ON i.id_local = kwi1.image".to_string());
        return Ok("kwi1.image IS NULL".to_string());
    }
    if node.operation == "notEmpty" {
        return Ok("i.id_local IN (SELECT DISTINCT kwi.image FROM AgLibraryKeywordImage kwi)".to_string());
    }

    let mode = match node.operation.as_str() {
        "words" => KeywordMatch::WholeWord,
        "beginsWith" => KeywordMatch::Prefix,
        "endsWith" => KeywordMatch::Suffix,
        "all" | "any" | "noneOf" => KeywordMatch::Substring,
        other => return Err(SmartError::new(node.criteria.as_str(), format!("unsupported operation \"{}\" for keywords", other))),
    };
    let values: Vec<&str> = node.value.split_whitespace().collect();
    if values.is_empty() {
        return Err(SmartError::new(node.criteria.as_str(), "empty keywords value"));
    }

    if let Some(first_ids) = index.hierarchical_ids(values[0], mode) {
        let mut per_value: Vec<Vec<i64>> = vec![first_ids];
        for value in &values[1..] {
            per_value.push(index.hierarchical_ids(value, mode).unwrap_or_default());
        }

        match node.operation.as_str() {
            "any" | "noneOf" => {
                let merged: Vec<String> =
                    per_value.iter().flatten().map(i64::to_string).collect();
                if merged.is_empty() {
                    return Ok(if node.operation == "noneOf" { "1=1" } else { "1=0" }.to_string());
                }
                let list = merged.join(",");
                if node.operation == "noneOf" {
                    return Ok(format!(
                        "i.id_local NOT IN (SELECT kwi.image FROM AgLibraryKeywordImage kwi WHERE kwi.tag IN ({}))",
                        list
                    ));
                }
                joins.push("LEFT JOIN AgLibraryKeywordImage kwi1 ON i.id_local = kwi1.image".to_string());
                Ok(format!("kwi1.tag IN ({})", list))
            }
            _ => {
                let mut clauses = Vec::with_capacity(per_value.len());
                for (i, ids) in per_value.iter().enumerate() {
                    let n = i + 1;
                    if ids.is_empty() {
                        clauses.push("1=0".to_string());
                        continue;
                    }
                    joins.push(format!("LEFT JOIN AgLibraryKeywordImage kwi{0} ON i.id_local = kwi{0}.image", n));
                    let list = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
                    clauses.push(format!("kwi{}.tag IN ({})", n, list));
                }
                Ok(clauses.join(" AND "))
            }
        }
    } else {
        // No index wired: direct name match, no hierarchy.
        if node.operation == "noneOf" {
            let names = values
                .iter()
                .map(|v| format!("kw.name LIKE \"%{}%\"", v))
                .collect::<Vec<_>>()
                .join(" OR ");
            return Ok(format!(
                "i.id_local NOT IN (SELECT kwi.image FROM AgLibraryKeywordImage kwi \
                 JOIN AgLibraryKeyword kw ON kw.id_local = kwi.tag WHERE {})",
                names
            ));
        }
        let pattern_for = |value: &str| match node.operation.as_str() {
            "any" | "all" => format!("%{}%", value),
            "beginsWith" => format!("{}%", value),
            "endsWith" => format!("%{}", value),
            _ => format!("%\t{}\t%", value),
        };
        if node.operation == "any" {
            let names = values
                .iter()
                .map(|v| format!("kw1.name LIKE \"{}\"", pattern_for(v)))
                .collect::<Vec<_>>()
                .join(" OR ");
            joins.push("LEFT JOIN AgLibraryKeywordImage kwi1 ON i.id_local = kwi1.image".to_string());
            joins.push("LEFT JOIN AgLibraryKeyword kw1 ON kw1.id_local = kwi1.tag".to_string());
            return Ok(format!("({})", names));
        }
        let mut clauses = Vec::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            let n = i + 1;
            joins.push(format!("LEFT JOIN AgLibraryKeywordImage kwi{0} ON i.id_local = kwi{0}.image", n));
            joins.push(format!("LEFT JOIN AgLibraryKeyword kw{0} ON kw{0}.id_local = kwi{0}.tag", n));
            clauses.push(format!("kw{}.name LIKE \"{}\"", n, pattern_for(value)));
        }
        Ok(clauses.join(" AND "))
    }
}

/// `all` / `metadata`: union of LIKE predicates across every free-text
/// surface a photo carries — metadata search index, filename, folder path,
/// creator, caption, copyright, colour profile name, collection name, and
/// keyword ids — one keyword/collection alias set per searched word.
fn all_criterion_clause(node: &Node, joins: &mut Vec<String>, index: &dyn KeywordIndex) -> Result<String, SmartError> {
    if node.operation != "all" && node.operation != "any" {
        return Err(SmartError::new(
            node.criteria.as_str(),
            format!("unsupported operation \"{}\" for \"{}\"", node.operation, node.criteria),
        ));
    }
    joins.push("LEFT JOIN AgMetadataSearchIndex msi ON i.id_local = msi.image".to_string());
    joins.push("LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local".to_string());
    joins.push("LEFT JOIN AgLibraryFolder fo ON fi.folder = fo.id_local".to_string());
    joins.push("LEFT JOIN AgLibraryRootFolder rf ON fo.rootFolder = rf.id_local".to_string());
    joins.push("LEFT JOIN AgHarvestedIptcMetadata im ON i.id_local = im.image".to_string());
    joins.push("LEFT JOIN AgInternedIptcCreator iic ON im.creatorRef = iic.id_local".to_string());
    joins.push("LEFT JOIN AgLibraryIPTC liptc ON liptc.image = i.id_local".to_string());
    joins.push("LEFT JOIN AgSourceColorProfileConstants scpc ON scpc.image = i.id_local".to_string());

    let glue = if node.operation == "all" { " AND " } else { " OR " };
    let words: Vec<&str> = node.value.split_whitespace().collect();
    let mut predicates = Vec::with_capacity(words.len());
    for (n, word) in words.iter().enumerate() {
        joins.push(format!("LEFT JOIN AgLibraryKeywordImage kwi{0} ON i.id_local = kwi{0}.image", n));
        joins.push(format!("LEFT JOIN AgLibraryKeyword kw{0} ON kw{0}.id_local = kwi{0}.tag", n));
        joins.push(format!("LEFT JOIN AgLibraryCollectionimage ci{0} ON ci{0}.image = i.id_local", n));
        joins.push(format!("LEFT JOIN AgLibraryCollection col{0} ON col{0}.id_local = ci{0}.Collection", n));

        let keyword_predicate = match index.hierarchical_ids(word, KeywordMatch::Substring) {
            Some(ids) if !ids.is_empty() => {
                format!("kw{}.id_local IN ({})", n, ids.iter().map(i64::to_string).collect::<Vec<_>>().join(","))
            }
            Some(_) => "1=0".to_string(),
            None => format!("kw{}.name LIKE \"%{}%\"", n, word),
        };

        predicates.push(format!(
            "(msi.exifSearchIndex LIKE \"%{0}%\" OR msi.otherSearchIndex LIKE \"%{0}%\" \
             OR fi.lc_idx_filename LIKE \"%{0}%\" OR fo.pathFromRoot LIKE \"%{0}%\" \
             OR rf.absolutePath LIKE \"%{0}%\" OR iic.value LIKE \"%{0}%\" \
             OR liptc.caption LIKE \"%{0}%\" OR liptc.copyright LIKE \"%{0}%\" \
             OR scpc.profileName LIKE \"%{0}%\" OR col{1}.name LIKE \"%{0}%\" OR {2})",
            word, n, keyword_predicate
        ));
    }
    Ok(predicates.join(glue))
}

const EXIF_JOIN: &str = "LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image";
const IDS_JOIN: &str = "LEFT JOIN Adobe_imageDevelopSettings ids ON ids.image = i.id_local";
const FILE_JOIN: &str = "LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local";
const MSI_JOIN: &str = "LEFT JOIN AgMetadataSearchIndex msi ON i.id_local = msi.image";
const CAMERA_JOINS: &[&str] = &[
    "LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image",
    "LEFT JOIN AgInternedExifCameraModel cm ON cm.id_local = em.cameraModelRef",
];
const LENS_JOINS: &[&str] = &[
    "LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image",
    "LEFT JOIN AgInternedExifLens el ON el.id_local = em.lensRef",
];
const CREATOR_JOINS: &[&str] = &[
    "LEFT JOIN AgHarvestedIptcMetadata im ON i.id_local = im.image",
    "LEFT JOIN AgInternedIptcCreator iic ON im.creatorRef = iic.id_local",
];

pub fn translate_node(node: &Node, cfg: &Config, keywords: &dyn KeywordIndex) -> Result<SqlFragment, SmartError> {
    let mut joins: Vec<String> = Vec::new();
    let where_sql = match node.criteria.as_str() {
        "all" | "metadata" => all_criterion_clause(node, &mut joins, keywords)?,
        "aperture" => {
            joins.push(EXIF_JOIN.to_string());
            numeric_clause(node, "em.aperture")?
        }
        "isoSpeedRating" => {
            joins.push(EXIF_JOIN.to_string());
            numeric_clause(node, "em.isoSpeedRating")?
        }
        "focalLength" => {
            joins.push(EXIF_JOIN.to_string());
            numeric_clause(node, "em.focalLength")?
        }
        "shutterSpeed" => {
            joins.push(EXIF_JOIN.to_string());
            let flipped = flip_numeric_operator(node);
            numeric_clause(&flipped, "em.shutterSpeed")?
        }
        "widthCropped" => {
            joins.push(IDS_JOIN.to_string());
            numeric_clause(node, "CAST(substr(dims, 1, instr(dims, \"x\")-1) AS int)")?
        }
        "heightCropped" => {
            joins.push(IDS_JOIN.to_string());
            numeric_clause(node, "CAST(substr(dims, instr(dims, \"x\")+1) AS int)")?
        }
        "aspectRatio" => aspect_ratio_clause(node)?,
        "rating" => rating_clause(node)?,
        "hasGPSData" => {
            joins.push(EXIF_JOIN.to_string());
            boolean_clause(node, "em.hasGps")?
        }
        "flashFired" => {
            joins.push(EXIF_JOIN.to_string());
            boolean_clause(node, "em.flashFired")?
        }
        "hasAdjustments" => {
            joins.push(IDS_JOIN.to_string());
            has_adjustments_clause(node)?
        }
        "treatment" => {
            joins.push(IDS_JOIN.to_string());
            treatment_clause(node)?
        }
        "colorMode" => numeric_clause(node, "i.colorMode")?,
        "captureTime" => capture_date_clause(node)?,
        "touchTime" => touch_date_clause(node, cfg)?,
        "metadataStatus" => {
            joins.push("LEFT JOIN Adobe_AdditionalMetadata am ON i.id_local = am.image".to_string());
            enums::metastatus_clause(&node.value.to_lowercase()).map_err(|e| SmartError::new(node.criteria.as_str(), e.reason))?
                .into_iter()
                .next()
                .unwrap()
        }
        "filename" => {
            joins.push(FILE_JOIN.to_string());
            string_clause(node, "UPPER(fi.baseName)")?
        }
        "fileFormat" => file_format_clause(node)?,
        "exif" => {
            joins.push(MSI_JOIN.to_string());
            string_clause(node, "msi.exifSearchIndex")?
        }
        "iptc" => {
            joins.push(MSI_JOIN.to_string());
            string_clause(node, "msi.iptcSearchIndex")?
        }
        "creator" => {
            joins.extend(CREATOR_JOINS.iter().map(|s| s.to_string()));
            string_clause(node, "iic.value")?
        }
        "camera" => {
            joins.extend(CAMERA_JOINS.iter().map(|s| s.to_string()));
            camera_or_lens_clause(node, "cm.value", "cm.searchIndex")?
        }
        "lens" => {
            joins.extend(LENS_JOINS.iter().map(|s| s.to_string()));
            camera_or_lens_clause(node, "el.value", "el.searchIndex")?
        }
        "labelColor" | "labelText" => {
            // "none" means the empty label string.
            let value = if node.value == "none" { "" } else { node.value.as_str() };
            let oper = if node.operation == "!=" { "!=" } else { "=" };
            format!("i.colorlabels {} \"{}\"", oper, value)
        }
        "collection" => collection_clause(node, &mut joins)?,
        "keywords" => keywords_clause(node, &mut joins, keywords)?,
        other => {
            return Err(SmartError::new(other, "criterion not in the supported smart-collection set"));
        }
    };
    Ok(SqlFragment { joins, where_sql })
}

fn flip_numeric_operator(node: &Node) -> Node {
    let operation = match node.operation.as_str() {
        "<" => ">".to_string(),
        ">" => "<".to_string(),
        other => other.to_string(),
    };
    Node { operation, ..node.clone() }
}

/// `fileFormat`: whole-format equality on the `Adobe_images` column itself
/// (`DNG`, `RAW`, `VIDEO`), never a LIKE.
fn file_format_clause(node: &Node) -> Result<String, SmartError> {
    match node.operation.as_str() {
        "==" | "!=" => Ok(format!("i.fileFormat {} \"{}\"", node.operation, node.value)),
        other => Err(SmartError::new(
            node.criteria.as_str(),
            format!("unsupported operation \"{}\" for fileFormat", other),
        )),
    }
}

/// `camera`/`lens`: `!=` means "different camera, or none recorded at all"
/// — the interned ref column is NULL when no camera was harvested, and a
/// plain `!=` on the joined value would drop those rows. Word-style
/// operations search the interned value's tab-delimited `searchIndex`
/// column, not the display value.
fn camera_or_lens_clause(node: &Node, column: &str, search_index: &str) -> Result<String, SmartError> {
    match node.operation.as_str() {
        "!=" => Ok(format!("({} IS NULL OR {} != \"{}\")", column, column, node.value)),
        "==" => Ok(format!("{} = \"{}\"", column, node.value)),
        "any" | "all" | "words" | "beginsWith" | "endsWith" | "noneOf" => {
            string_clause(node, search_index)
        }
        other => Err(SmartError::new(node.criteria.as_str(), format!("unsupported operation \"{}\"", other))),
    }
}
