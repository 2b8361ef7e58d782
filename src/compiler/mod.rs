//! Generic compiler: turns a columns string and a criteria string into SQL
//! against one main table (photos or collections).
//!
//! The criteria walk keeps the user's parenthesization exactly as written,
//! dedups joins by text, and numbers the join aliases of repeated criteria
//! by occurrence so two `keyword=` clauses never collide.

pub mod predefined;

use std::collections::HashMap;

use log::{debug, info};

use crate::config::Config;
use crate::criteria_lexer::{self, Token};
use crate::error::Result;
use crate::geocoder::{Geocode, NullGeocoder, PhotoLocator};
use crate::schema::{self, CriterionKind, CriterionSpec, TableKind, UnknownKeyError};
use crate::value_transformers::{dates, enums, gps, optics, text};

/// Per-query compilation switches.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub distinct: bool,
    pub print_only: bool,
    pub sql_only: bool,
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct CompileResult {
    pub sql: String,
    pub column_names: Vec<String>,
}

#[derive(Debug, Default)]
struct MetaOptions {
    /// `(column, ascending)`.
    order_by: Option<(String, bool)>,
    distinct: bool,
    group_by: Option<String>,
    /// `count=col` pairs with a `countby(col)` column in the select list.
    having: Option<String>,
}

fn is_meta_key(key: &str) -> bool {
    matches!(key, "sort" | "distinct" | "groupby" | "count")
}

/// Pulls `sort`/`distinct`/`groupby`/`count` key-vals out of the token
/// stream — they drive clauses outside WHERE, not a WHERE fragment — then
/// repairs the remaining boolean glue.
fn extract_meta(tokens: Vec<Token>) -> (Vec<Token>, MetaOptions) {
    let mut meta = MetaOptions::default();
    let mut kept = Vec::with_capacity(tokens.len());
    for tok in tokens {
        match &tok {
            Token::KeyVal { key, value } if is_meta_key(key) => match key.as_str() {
                // A leading `-` asks for ascending order; the plain form
                // sorts descending (newest/largest first).
                "sort" => {
                    let ascending = value.starts_with('-');
                    meta.order_by = Some((value.trim_start_matches('-').to_string(), ascending));
                }
                "distinct" => meta.distinct = true,
                "groupby" => meta.group_by = Some(value.clone()),
                "count" => meta.having = Some(format!("count_{} > 0", value)),
                _ => unreachable!(),
            },
            _ => kept.push(tok),
        }
    }
    (normalize_connectors(kept), meta)
}

/// Drops leading/trailing/doubled `AND`/`OR` tokens and now-empty `()`
/// pairs left behind once meta key-vals are removed.
fn normalize_connectors(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        let is_connector = matches!(tok, Token::And | Token::Or);
        if is_connector {
            match out.last() {
                None => continue,
                Some(Token::LPar) => continue,
                Some(Token::And) | Some(Token::Or) => {
                    out.pop();
                    out.push(tok);
                    continue;
                }
                _ => {}
            }
        }
        if matches!(tok, Token::RPar) {
            if matches!(out.last(), Some(Token::And) | Some(Token::Or)) {
                out.pop();
            }
            if matches!(out.last(), Some(Token::LPar)) {
                out.pop();
                continue;
            }
        }
        out.push(tok);
    }
    if matches!(out.last(), Some(Token::And) | Some(Token::Or)) {
        out.pop();
    }
    out
}

fn column_expr_without_alias(sql: &str) -> &str {
    sql.split(" AS ").next().unwrap_or(sql)
}

/// Drops one pair of matching single or double quotes around a `var:` column
/// expression, the way the criteria lexer dequotes values.
fn strip_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[bytes.len() - 1] == bytes[0] {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

struct ParsedColumns {
    select_sql: Vec<String>,
    names: Vec<String>,
    joins: Vec<String>,
    implicit_group_by: Option<String>,
}

/// Binds the generic compiler to one main table (photos or collections).
pub struct Compiler<'a> {
    table: TableKind,
    cfg: &'a Config,
    geocoder: &'a dyn Geocode,
    photos: &'a dyn PhotoLocator,
}

impl<'a> Compiler<'a> {
    pub fn photo(cfg: &'a Config) -> Self {
        Compiler { table: TableKind::Photo, cfg, geocoder: &NullGeocoder, photos: &NullGeocoder }
    }

    pub fn collection(cfg: &'a Config) -> Self {
        Compiler { table: TableKind::Collection, cfg, geocoder: &NullGeocoder, photos: &NullGeocoder }
    }

    /// Plugs a real geocoder/photo-locator in for `gps=town+km` style
    /// criteria; the defaults always fail with `GeoFailure`.
    pub fn with_geocoder(mut self, geocoder: &'a dyn Geocode, photos: &'a dyn PhotoLocator) -> Self {
        self.geocoder = geocoder;
        self.photos = photos;
        self
    }

    fn main_table_clause(&self) -> &'static str {
        match self.table {
            TableKind::Photo => "Adobe_images i",
            TableKind::Collection => "AgLibraryCollection col",
        }
    }

    pub fn compile(&self, columns: &str, criteria: &str, options: &CompileOptions) -> Result<CompileResult> {
        info!("compile(\"{}\", \"{}\")", columns, criteria);
        if self.table == TableKind::Photo {
            if let Some(result) = predefined::try_compile(columns) {
                return Ok(result);
            }
        }

        let tokens = criteria_lexer::tokenize(criteria)?;
        let (where_sql, criteria_joins, meta) = self.walk_criteria(tokens)?;
        let cols = self.parse_columns(columns)?;

        let mut joins: Vec<String> = Vec::new();
        for j in cols.joins.iter().chain(criteria_joins.iter()) {
            if !joins.contains(j) {
                joins.push(j.clone());
            }
        }

        let distinct = options.distinct || meta.distinct;
        let mut sql = String::from("SELECT ");
        if distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&cols.select_sql.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(self.main_table_clause());
        for j in &joins {
            sql.push(' ');
            sql.push_str(j);
        }
        sql.push_str(" WHERE ");
        sql.push_str(if where_sql.is_empty() { "1=1" } else { &where_sql });

        if let Some(g) = meta.group_by.as_deref().or(cols.implicit_group_by.as_deref()) {
            sql.push_str(" GROUP BY ");
            sql.push_str(g);
        }
        if let Some(h) = &meta.having {
            sql.push_str(" HAVING ");
            sql.push_str(h);
        }
        if let Some((col, ascending)) = &meta.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(col);
            sql.push_str(if *ascending { " ASC" } else { " DESC" });
        }

        info!("SQL = {}", sql);
        Ok(CompileResult { sql, column_names: cols.names })
    }

    /// Assembles a `SELECT ... FROM ... WHERE ...` from an already-built
    /// WHERE fragment and join list, reusing only the columns machinery.
    /// This is the seam `smart_collection` splices into.
    pub fn assemble(&self, columns: &str, where_sql: &str, extra_joins: &[String]) -> Result<CompileResult> {
        let cols = self.parse_columns(columns)?;
        let mut joins: Vec<String> = Vec::new();
        for j in cols.joins.iter().chain(extra_joins.iter()) {
            if !joins.contains(j) {
                joins.push(j.clone());
            }
        }
        let mut sql = String::from("SELECT ");
        sql.push_str(&cols.select_sql.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(self.main_table_clause());
        for j in &joins {
            sql.push(' ');
            sql.push_str(j);
        }
        sql.push_str(" WHERE ");
        sql.push_str(if where_sql.is_empty() { "1=1" } else { where_sql });
        Ok(CompileResult { sql, column_names: cols.names })
    }

    fn walk_criteria(&self, tokens: Vec<Token>) -> Result<(String, Vec<String>, MetaOptions)> {
        let (tokens, meta) = extract_meta(tokens);
        let mut occurrence: HashMap<String, u32> = HashMap::new();
        let mut joins: Vec<String> = Vec::new();
        let mut sql = String::new();
        for tok in tokens {
            match tok {
                Token::LPar => sql.push('('),
                Token::RPar => sql.push(')'),
                Token::And => sql.push_str(" AND "),
                Token::Or => sql.push_str(" OR "),
                Token::KeyVal { key, value } => {
                    let (frag, frag_joins) = self.render_criterion(&key, &value, &mut occurrence)?;
                    sql.push_str(&frag);
                    for j in frag_joins {
                        if !joins.contains(&j) {
                            joins.push(j);
                        }
                    }
                }
            }
        }
        Ok((sql, joins, meta))
    }

    fn render_criterion(
        &self,
        key: &str,
        value: &str,
        occurrence: &mut HashMap<String, u32>,
    ) -> Result<(String, Vec<String>)> {
        let spec: &CriterionSpec = schema::lookup_criterion(self.table, key)
            .ok_or_else(|| UnknownKeyError::criterion(self.table, key.to_string()))?;

        let counter = occurrence.entry(spec.name.to_string()).or_insert(0);
        *counter += 1;
        let n = *counter;

        let mut joins: Vec<String> = spec.joins.iter().map(|j| j.replace("{n}", &n.to_string())).collect();
        let template = spec.where_template.replace("{n}", &n.to_string());

        let (fragments, transform_joins) = self.transform(spec, value)?;
        joins.extend(transform_joins);
        let mut frag = template;
        for piece in &fragments {
            frag = frag.replacen("%s", piece, 1);
        }
        debug!("criterion {}={} -> {}", spec.name, value, frag);
        Ok((frag, joins))
    }

    /// Maps the registry's `CriterionKind` tag to the matching transformer.
    /// Returns the template substitution pieces plus any join the transform
    /// itself requires (only `haskeywords` uses the second half).
    fn transform(&self, spec: &CriterionSpec, value: &str) -> Result<(Vec<String>, Vec<String>)> {
        use CriterionKind::*;
        let no_joins = Vec::new;
        Ok(match spec.kind {
            Raw => (vec![value.to_string()], no_joins()),
            OperParseDate => (dates::date_capture_clause(value, self.cfg.day_first_dates)?, no_joins()),
            OperLocalDateToLrstamp => {
                (dates::oper_localdate_to_lrstamp(value, self.cfg.day_first_dates)?, no_joins())
            }
            OperUtcDateToLrstamp => {
                (dates::oper_utcdate_to_lrstamp(value, self.cfg.day_first_dates)?, no_joins())
            }
            BoolToEqual => (vec![enums::bool_to_equal(value)?.to_string()], no_joins()),
            ValueOrNull => (enums::value_or_null(value), no_joins()),
            LikeValueOrNull => (enums::like_value_or_null(value), no_joins()),
            ValueOrNotEqual => (enums::value_or_not_equal(value), no_joins()),
            Rating => (enums::rating_clause(value), no_joins()),
            Flag => (enums::flag_clause(value)?, no_joins()),
            MetaStatus => (enums::metastatus_clause(value)?, no_joins()),
            Stacks => (enums::stacks_clause(value)?, no_joins()),
            Aperture => (optics::aperture_clause(value)?, no_joins()),
            Speed => (optics::speed_clause(value)?, no_joins()),
            Gps => (gps::gps_clause(value, self.geocoder, self.photos)?, no_joins()),
            ZeroOrOne => (enums::zero_or_one(spec.name, value)?, no_joins()),
            HasKeywords => {
                let (frags, joins) = text::haskeywords_clause(value)?;
                (frags, joins.into_iter().map(str::to_string).collect())
            }
            ExifIndex => (text::exifindex_clause(value), no_joins()),
            TitleIndex => (text::titleindex_clause(value), no_joins()),
            Published => (enums::published_clause(value)?, no_joins()),
            CollectionType => (enums::collection_type_clause(value)?, no_joins()),
        })
    }

    fn default_columns(&self) -> &'static str {
        match self.table {
            TableKind::Photo => "name=basext",
            TableKind::Collection => "name",
        }
    }

    fn parse_columns(&self, columns: &str) -> Result<ParsedColumns> {
        let raw = columns.trim();
        let raw = if raw.is_empty() { self.default_columns() } else { raw };
        let items: Vec<&str> = raw.split(',').map(str::trim).collect();

        let mut out = ParsedColumns {
            select_sql: Vec::new(),
            names: Vec::new(),
            joins: Vec::new(),
            implicit_group_by: None,
        };

        for item in items {
            if let Some(inner) = item.strip_prefix("count(").and_then(|s| s.strip_suffix(')')) {
                self.push_aggregate(inner, false, &mut out)?;
                continue;
            }
            if let Some(inner) = item.strip_prefix("countby(").and_then(|s| s.strip_suffix(')')) {
                self.push_aggregate(inner, true, &mut out)?;
                continue;
            }

            let (name, variant_key) = item.split_once('=').unwrap_or((item, "True"));

            if let Some(user_expr) = variant_key.strip_prefix("var:") {
                let spec = schema::lookup_column(self.table, name)
                    .ok_or_else(|| UnknownKeyError::column(self.table, name.to_string()))?;
                if let Some(var_joins) = spec.var_joins {
                    out.joins.extend(var_joins.iter().map(|s| s.to_string()));
                    out.select_sql.push(format!("{} AS {}", strip_quotes(user_expr), name));
                    out.names.push(name.to_string());
                    continue;
                }
            }

            let spec = schema::lookup_column(self.table, name)
                .ok_or_else(|| UnknownKeyError::column(self.table, name.to_string()))?;
            let variant = spec
                .variants
                .iter()
                .find(|v| v.key == variant_key)
                .ok_or_else(|| UnknownKeyError::column(self.table, format!("{}={}", name, variant_key)))?;
            out.select_sql.push(variant.sql.to_string());
            out.names.push(name.to_string());
            out.joins.extend(variant.joins.iter().map(|s| s.to_string()));
        }

        Ok(out)
    }

    fn push_aggregate(&self, inner: &str, group: bool, out: &mut ParsedColumns) -> Result<()> {
        let spec = schema::lookup_column(self.table, inner)
            .ok_or_else(|| UnknownKeyError::column(self.table, inner.to_string()))?;
        let variant = spec
            .variants
            .iter()
            .find(|v| v.key == "True")
            .ok_or_else(|| UnknownKeyError::column(self.table, inner.to_string()))?;
        let expr = column_expr_without_alias(variant.sql).to_string();
        out.select_sql.push(format!("count({}) AS count_{}", expr, inner));
        out.names.push(format!("count_{}", inner));
        out.joins.extend(variant.joins.iter().map(|s| s.to_string()));
        if group {
            out.implicit_group_by = Some(expr);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_rating_and_videos_criteria() {
        let cfg = Config::new("catalog.lrcat");
        let compiler = Compiler::photo(&cfg);
        let result = compiler
            .compile("name, datecapt", "rating=>=4, videos=0", &CompileOptions::default())
            .unwrap();
        assert!(result.sql.starts_with(
            "SELECT fi.baseName || \".\" || fi.extension AS name, i.captureTime AS datecapt FROM Adobe_images i"
        ));
        assert!(result.sql.contains("i.rating >= 4 AND i.fileFormat != \"VIDEO\""));
        assert_eq!(result.column_names, vec!["name".to_string(), "datecapt".to_string()]);
    }

    #[test]
    fn repeated_keyword_criterion_gets_distinct_aliases() {
        let cfg = Config::new("catalog.lrcat");
        let compiler = Compiler::photo(&cfg);
        let result = compiler
            .compile("name", "keyword=france, keyword=mountain", &CompileOptions::default())
            .unwrap();
        assert!(result.sql.contains("kwi1 ON i.id_local = kwi1.image"));
        assert!(result.sql.contains("kwi2 ON i.id_local = kwi2.image"));
        assert!(result.sql.contains("kw1.name LIKE \"france\" AND kw2.name LIKE \"mountain\""));
    }

    #[test]
    fn aperture_criterion_emits_rounded_stored_value() {
        let cfg = Config::new("catalog.lrcat");
        let compiler = Compiler::photo(&cfg);
        let result = compiler.compile("name", "aperture==5.6", &CompileOptions::default()).unwrap();
        assert!(result.sql.contains("em.aperture = ROUND(4.977280, 6)"), "{}", result.sql);
    }

    #[test]
    fn empty_columns_fall_back_to_the_per_table_default() {
        let cfg = Config::new("catalog.lrcat");
        let photos = Compiler::photo(&cfg);
        let result = photos.compile("", "rating=5", &CompileOptions::default()).unwrap();
        assert!(result.sql.starts_with("SELECT fi.baseName || \".\" || fi.extension AS name"));

        let collections = Compiler::collection(&cfg);
        let result = collections.compile("", "type=smart", &CompileOptions::default()).unwrap();
        assert!(result.sql.starts_with("SELECT col.name AS name"));
        assert!(result.sql.contains("col.creationId = \"com.adobe.ag.library.smart_collection\""));
    }

    #[test]
    fn haskeywords_false_joins_and_checks_null() {
        let cfg = Config::new("catalog.lrcat");
        let compiler = Compiler::photo(&cfg);
        let result = compiler.compile("name", "haskeywords=0", &CompileOptions::default()).unwrap();
        assert!(result.sql.contains("LEFT JOIN AgLibraryKeywordImage kwi1"));
        assert!(result.sql.contains("kwi1.image IS NULL"));
    }

    #[test]
    fn exif_var_column_injects_the_user_expression() {
        let cfg = Config::new("catalog.lrcat");
        let compiler = Compiler::photo(&cfg);
        let result = compiler.compile("exif=var:hasgps", "", &CompileOptions::default()).unwrap();
        assert!(result.sql.starts_with("SELECT hasgps AS exif"));
        assert!(result.sql.contains("AgHarvestedExifMetadata em"));
    }

    #[test]
    fn extra_wrapping_parens_preserve_the_same_where_clause_shape() {
        let cfg = Config::new("catalog.lrcat");
        let compiler = Compiler::photo(&cfg);
        let a = compiler.compile("name", "rating=5, videos=0", &CompileOptions::default()).unwrap();
        let b = compiler.compile("name", "(rating=5, videos=0)", &CompileOptions::default()).unwrap();
        assert_eq!(a.sql.replace('(', "").replace(')', ""), b.sql.replace('(', "").replace(')', ""));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let cfg = Config::new("catalog.lrcat");
        let compiler = Compiler::photo(&cfg);
        assert!(compiler.compile("bogus", "", &CompileOptions::default()).is_err());
    }

    #[test]
    fn meta_keys_are_stripped_from_the_where_clause() {
        let cfg = Config::new("catalog.lrcat");
        let compiler = Compiler::photo(&cfg);
        let result = compiler
            .compile("name", "rating=5, sort=datecapt", &CompileOptions::default())
            .unwrap();
        assert!(!result.sql.contains("sort"));
        assert!(result.sql.ends_with("ORDER BY datecapt DESC"));
    }

    #[test]
    fn sort_minus_prefix_asks_for_ascending_order() {
        let cfg = Config::new("catalog.lrcat");
        let compiler = Compiler::photo(&cfg);
        let result = compiler
            .compile("name", "rating=5, sort=-datecapt", &CompileOptions::default())
            .unwrap();
        assert!(result.sql.ends_with("ORDER BY datecapt ASC"));
    }
}
