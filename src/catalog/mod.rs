//! Catalog facade: opens a Lightroom `.lrcat` file read-only and exposes
//! the handful of SQL shapes that don't fit the columns/criteria DSL —
//! duplicates, imports, per-date counts, smart-collection blobs, collection
//! listings, and the keyword hierarchy.
//!
//! The connection is opened via a `file:` URI with `immutable=1` so a
//! running Lightroom holding the same file never blocks us (and we can
//! never block it).

use std::collections::{HashMap, HashSet};

use log::info;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use thiserror::Error;

use crate::compiler::Compiler;
use crate::config::Config;
use crate::geocoder::{GeoError, PhotoLocator};
use crate::smart_collection::{KeywordIndex, KeywordMatch};

/// The catalog file is missing, or sqlite refused to open or run against
/// it.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file not found: {0}")]
    NotFound(String),
    #[error("could not open catalog: {0}")]
    OpenFailed(#[source] rusqlite::Error),
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::QueryFailed(err.to_string())
    }
}

/// Which collection types `collections()` retrieves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    All,
    Standard,
    Smart,
}

/// A result set detached from the borrowed `rusqlite::Statement` that
/// produced it, so callers (the formatter, tests) can hold it past the
/// query call.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug)]
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Opens `path` read-only, refusing to write to or lock a catalog a
    /// running Lightroom instance might have open. `mode_flags` overrides
    /// the default `mode=ro&cache=private&immutable=1` URI query string when
    /// given.
    pub fn open(path: &str, mode_flags: Option<&str>) -> Result<Self, CatalogError> {
        if !std::path::Path::new(path).exists() {
            return Err(CatalogError::NotFound(path.to_string()));
        }
        let flags = mode_flags.unwrap_or("mode=ro&cache=private&immutable=1");
        let uri = format!("file:{}?{}", path, flags);
        let conn = Connection::open_with_flags(
            &uri,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(CatalogError::OpenFailed)?;
        let catalog = Catalog { conn };
        match catalog.db_version() {
            Some(version) => info!("catalog \"{}\" opened, Adobe DB version {}", path, version),
            None => info!("catalog \"{}\" opened", path),
        }
        Ok(catalog)
    }

    /// The catalog's `Adobe_DBversion` variable, when present.
    pub fn db_version(&self) -> Option<String> {
        self.conn
            .query_row(
                "SELECT value FROM Adobe_variablesTable WHERE name = \"Adobe_DBversion\"",
                [],
                |row| row.get(0),
            )
            .ok()
    }

    /// Runs an arbitrary, already-built SELECT and materializes every row.
    /// Used both for ad hoc compiler output and for the canned shapes
    /// below. The SQL is never rewritten.
    pub fn execute(&self, sql: &str) -> Result<QueryResult, CatalogError> {
        let mut stmt = self.conn.prepare(sql)?;
        let column_names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = column_names.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width).map(|i| row.get::<_, Value>(i)).collect::<rusqlite::Result<Vec<Value>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(QueryResult { column_names, rows })
    }

    /// Photos sharing a basename, case-insensitively, excluding videos and
    /// anything already flagged as a virtual copy's master.
    pub fn duplicates_sql(&self) -> String {
        "SELECT * FROM ( \
            SELECT rf.absolutePath || fo.pathFromRoot || fi.baseName || \".\" || fi.extension AS FullName, \
                   COUNT(fi.baseName) AS Nombre \
            FROM Adobe_images i \
            JOIN AgLibraryFile fi ON i.rootFile = fi.id_local \
            JOIN AgLibraryFolder fo ON fi.folder = fo.id_local \
            JOIN AgLibraryRootFolder rf ON fo.rootFolder = rf.id_local \
            WHERE i.masterImage IS NULL AND i.fileFormat != \"VIDEO\" \
            GROUP BY UPPER(fi.baseName)) \
        WHERE Nombre > 1"
            .to_string()
    }

    pub fn duplicates(&self) -> Result<QueryResult, CatalogError> {
        self.execute(&self.duplicates_sql())
    }

    /// One import's date and photo count, or every import ordered by date
    /// when `import_id` is `None`.
    pub fn imports_sql(&self, import_id: Option<i64>) -> String {
        match import_id {
            Some(id) => format!(
                "SELECT id_local, importDate, \
                    (SELECT COUNT(ii.import) FROM AgLibraryImport i \
                     JOIN AgLibraryImportImage ii ON i.id_local = ii.import \
                     WHERE i.id_local = {id}) AS count \
                 FROM AgLibraryImport WHERE id_local = {id}",
                id = id
            ),
            None => "SELECT id_local, importDate, \
                    (SELECT COUNT(ii.import) FROM AgLibraryImport i \
                     JOIN AgLibraryImportImage ii ON i.id_local = ii.import \
                     WHERE i0.id_local = i.id_local) AS count \
                 FROM AgLibraryImport i0 ORDER BY importDate ASC"
                .to_string(),
        }
    }

    pub fn imports(&self, import_id: Option<i64>) -> Result<QueryResult, CatalogError> {
        self.execute(&self.imports_sql(import_id))
    }

    /// Photo counts grouped by day, month, or year of capture time, from
    /// `from` onward (both bounds `YYYY[-MM[-DD]]`). Omitting `to` leaves
    /// the range open-ended.
    pub fn count_by_date_sql(&self, mode: &str, from: &str, to: Option<&str>) -> Result<String, CatalogError> {
        let (unit, label) = match mode {
            "by_day" | "dates_by_day" => ("%Y-%m-%d", "start of day"),
            "by_month" | "dates_by_month" => ("%Y-%m", "start of month"),
            "by_year" | "dates_by_year" => ("%Y", "start of year"),
            other => return Err(CatalogError::QueryFailed(format!("unknown count-by-date mode \"{}\"", other))),
        };
        let mut sql = format!(
            "SELECT strftime(\"{unit}\", DATE(captureTime, \"{label}\")) AS d, COUNT(captureTime) \
             FROM Adobe_images WHERE d >= \"{from}\"",
            unit = unit,
            label = label,
            from = from
        );
        if let Some(to) = to {
            sql.push_str(&format!(" AND d < \"{}\"", to));
        }
        sql.push_str(&format!(" GROUP BY DATE(captureTime, \"{}\")", label));
        Ok(sql)
    }

    pub fn count_by_date(&self, mode: &str, from: &str, to: Option<&str>) -> Result<QueryResult, CatalogError> {
        let sql = self.count_by_date_sql(mode, from, to)?;
        self.execute(&sql)
    }

    /// Fetches a smart collection's persisted criteria tree as raw bytes.
    /// `name_or_id` is tried as a numeric `id_local` first, then as a
    /// (possibly `%`-wildcarded) name. The stored blob is prefixed with a
    /// 4-byte `s = ` header; pass `raw = true` to keep it, otherwise it's
    /// stripped before returning so the bytes are ready for a Lua-table
    /// decoder.
    pub fn smart_blob(&self, name_or_id: &str, raw: bool) -> Result<Option<Vec<u8>>, CatalogError> {
        let content: Option<String> = if let Ok(id) = name_or_id.parse::<i64>() {
            self.conn
                .query_row(
                    "SELECT cont.content FROM AgLibraryCollectionContent cont \
                     JOIN AgLibraryCollection col ON col.id_local = cont.collection \
                     WHERE col.id_local = ?1 AND cont.owningModule = \"ag.library.smart_collection\"",
                    [id],
                    |row| row.get(0),
                )
                .optional()?
        } else {
            self.conn
                .query_row(
                    "SELECT cont.content FROM AgLibraryCollectionContent cont \
                     JOIN AgLibraryCollection col ON col.id_local = cont.collection \
                     WHERE col.name LIKE ?1 AND cont.owningModule = \"ag.library.smart_collection\"",
                    [name_or_id],
                    |row| row.get(0),
                )
                .optional()?
        };
        Ok(content.map(|s| {
            let bytes = s.into_bytes();
            if raw {
                bytes
            } else {
                bytes.get(4..).map(<[u8]>::to_vec).unwrap_or_default()
            }
        }))
    }

    /// Standard and/or smart collections, optionally filtered by name
    /// (`%`-wildcarded for a `LIKE` match, exact otherwise).
    pub fn collections(&self, what: CollectionKind, name: Option<&str>) -> Result<Vec<(i64, String, String)>, CatalogError> {
        let creation = match what {
            CollectionKind::Standard => "creationId = \"com.adobe.ag.library.collection\"".to_string(),
            CollectionKind::Smart => "creationId = \"com.adobe.ag.library.smart_collection\"".to_string(),
            CollectionKind::All => {
                "(creationId = \"com.adobe.ag.library.smart_collection\" OR creationId = \"com.adobe.ag.library.collection\")"
                    .to_string()
            }
        };
        let mut where_sql = creation;
        if let Some(name) = name {
            let oper = if name.contains('%') { "LIKE" } else { "=" };
            where_sql.push_str(&format!(" AND name {} \"{}\"", oper, name.replace('"', "")));
        }
        let sql = format!(
            "SELECT id_local, name, creationId FROM AgLibraryCollection WHERE {} ORDER BY name ASC",
            where_sql
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every keyword as `(id, name, parent_id)`, the raw material
    /// `CatalogKeywordIndex` walks to expand a name match into its whole
    /// subtree.
    pub fn keyword_tree(&self) -> Result<Vec<(i64, String, Option<i64>)>, CatalogError> {
        let mut stmt = self.conn.prepare("SELECT id_local, name, parent FROM AgLibraryKeyword ORDER BY id_local")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// The master image and every virtual copy of it, ordered by id — the
    /// row set export tooling keys off of to tell a copy from its master.
    pub fn virtual_copies_of(&self, cfg: &Config, master: i64, columns: &str) -> Result<QueryResult, CatalogError> {
        let compiler = Compiler::photo(cfg);
        let where_sql = format!("i.masterImage = {} OR i.id_local = {}", master, master);
        let built = compiler
            .assemble(columns, &where_sql, &[])
            .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;
        self.execute(&format!("{} ORDER BY i.id_local", built.sql))
    }

    /// Raw `AgHarvestedExifMetadata` columns for one photo, looked up by
    /// `id_local` or by basename.
    pub fn exif_metadata_columns(&self, name_or_id: &str, fields: &str) -> Result<QueryResult, CatalogError> {
        let sql = if let Ok(id) = name_or_id.parse::<i64>() {
            format!("SELECT {} FROM AgHarvestedExifMetadata WHERE image = {}", fields, id)
        } else {
            format!(
                "SELECT {} FROM Adobe_images i \
                 JOIN AgHarvestedExifMetadata em ON i.id_local = em.image \
                 JOIN AgLibraryFile fi ON i.rootFile = fi.id_local \
                 WHERE fi.baseName = \"{}\"",
                fields,
                name_or_id.replace('"', "")
            )
        };
        self.execute(&sql)
    }
}

/// A `PhotoLocator` answering `gps=photo:NAME+km` criteria from the open
/// catalog with a nested latitude/longitude select for the named photo.
pub struct CatalogPhotoLocator<'a> {
    catalog: &'a Catalog,
}

impl<'a> CatalogPhotoLocator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        CatalogPhotoLocator { catalog }
    }
}

impl PhotoLocator for CatalogPhotoLocator<'_> {
    fn locate(&self, name: &str) -> Result<(f64, f64), GeoError> {
        let sql = format!(
            "SELECT em.gpsLatitude, em.gpsLongitude FROM Adobe_images i \
             LEFT JOIN AgLibraryFile fi ON i.rootFile = fi.id_local \
             LEFT JOIN AgHarvestedExifMetadata em ON i.id_local = em.image \
             WHERE UPPER(fi.baseName) LIKE \"{}\"",
            name.replace('"', "").to_uppercase()
        );
        let result = self.catalog.execute(&sql).map_err(|e| GeoError::new(name, e.to_string()))?;
        let row = result
            .rows
            .first()
            .ok_or_else(|| GeoError::new(name, "photo not in the catalog"))?;
        let coord = |v: &Value| match v {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        };
        match (row.first().and_then(coord), row.get(1).and_then(coord)) {
            (Some(lat), Some(lon)) => Ok((lat, lon)),
            _ => Err(GeoError::new(name, "photo is not geolocalized")),
        }
    }
}

/// A `KeywordIndex` backed by a loaded `keyword_tree()` snapshot: name
/// matching finds the root set, then every descendant is pulled in by
/// walking `parent` links, so a keyword name selects its whole subtree.
pub struct CatalogKeywordIndex {
    rows: Vec<(i64, String, Option<i64>)>,
}

impl CatalogKeywordIndex {
    pub fn load(catalog: &Catalog) -> Result<Self, CatalogError> {
        Ok(CatalogKeywordIndex { rows: catalog.keyword_tree()? })
    }
}

impl KeywordIndex for CatalogKeywordIndex {
    fn hierarchical_ids(&self, pattern: &str, mode: KeywordMatch) -> Option<Vec<i64>> {
        let pattern = pattern.to_lowercase();
        let matches = |name: &str| {
            let name = name.to_lowercase();
            match mode {
                KeywordMatch::WholeWord => name == pattern,
                KeywordMatch::Prefix => name.starts_with(&pattern),
                KeywordMatch::Suffix => name.ends_with(&pattern),
                KeywordMatch::Substring => name.contains(&pattern),
            }
        };

        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for (id, _, parent) in &self.rows {
            if let Some(parent) = parent {
                children.entry(*parent).or_default().push(*id);
            }
        }

        let mut stack: Vec<i64> =
            self.rows.iter().filter(|(_, name, _)| matches(name)).map(|(id, _, _)| *id).collect();
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            ids.push(id);
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().copied());
            }
        }
        Some(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_catalog() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.lrcat");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE AgLibraryKeyword (id_local INTEGER PRIMARY KEY, name TEXT, parent INTEGER);
             INSERT INTO AgLibraryKeyword VALUES (1, 'Nature', NULL);
             INSERT INTO AgLibraryKeyword VALUES (2, 'Forest', 1);
             INSERT INTO AgLibraryKeyword VALUES (3, 'Oak', 2);
             INSERT INTO AgLibraryKeyword VALUES (4, 'Portrait', NULL);",
        )
        .unwrap();
        (dir, path.to_string_lossy().into_owned())
    }

    #[test]
    fn open_rejects_a_missing_file() {
        let err = Catalog::open("/no/such/catalog.lrcat", None).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn opens_read_only_and_lists_keywords() {
        let (_dir, path) = seed_catalog();
        let cat = Catalog::open(&path, None).unwrap();
        let tree = cat.keyword_tree().unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree[0], (1, "Nature".to_string(), None));
    }

    #[test]
    fn keyword_index_pulls_in_descendants_transitively() {
        let (_dir, path) = seed_catalog();
        let cat = Catalog::open(&path, None).unwrap();
        let index = CatalogKeywordIndex::load(&cat).unwrap();
        let mut ids = index.hierarchical_ids("nature", KeywordMatch::WholeWord).unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn keyword_index_prefix_match_excludes_unrelated_roots() {
        let (_dir, path) = seed_catalog();
        let cat = Catalog::open(&path, None).unwrap();
        let index = CatalogKeywordIndex::load(&cat).unwrap();
        let ids = index.hierarchical_ids("port", KeywordMatch::Prefix).unwrap();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn photo_locator_reports_a_missing_photo() {
        let (_dir, path) = seed_catalog();
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE Adobe_images (id_local INTEGER PRIMARY KEY, rootFile INTEGER);
             CREATE TABLE AgLibraryFile (id_local INTEGER PRIMARY KEY, baseName TEXT);
             CREATE TABLE AgHarvestedExifMetadata (image INTEGER, gpsLatitude REAL, gpsLongitude REAL);",
        )
        .unwrap();
        drop(conn);
        let cat = Catalog::open(&path, None).unwrap();
        let locator = CatalogPhotoLocator::new(&cat);
        assert!(locator.locate("IMG_0001").is_err());
    }

    #[test]
    fn photo_locator_returns_stored_coordinates() {
        let (_dir, path) = seed_catalog();
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE Adobe_images (id_local INTEGER PRIMARY KEY, rootFile INTEGER);
             CREATE TABLE AgLibraryFile (id_local INTEGER PRIMARY KEY, baseName TEXT);
             CREATE TABLE AgHarvestedExifMetadata (image INTEGER, gpsLatitude REAL, gpsLongitude REAL);
             INSERT INTO Adobe_images VALUES (1, 10);
             INSERT INTO AgLibraryFile VALUES (10, 'IMG_0001');
             INSERT INTO AgHarvestedExifMetadata VALUES (1, 45.7, 4.8);",
        )
        .unwrap();
        drop(conn);
        let cat = Catalog::open(&path, None).unwrap();
        let locator = CatalogPhotoLocator::new(&cat);
        assert_eq!(locator.locate("IMG_0001").unwrap(), (45.7, 4.8));
    }

    #[test]
    fn count_by_date_sql_rejects_an_unknown_mode() {
        let (_dir, path) = seed_catalog();
        let cat = Catalog::open(&path, None).unwrap();
        assert!(cat.count_by_date_sql("by_fortnight", "2020", None).is_err());
    }

    #[test]
    fn count_by_date_sql_groups_by_month() {
        let (_dir, path) = seed_catalog();
        let cat = Catalog::open(&path, None).unwrap();
        let sql = cat.count_by_date_sql("by_month", "2020-01", Some("2020-06")).unwrap();
        assert!(sql.contains("strftime(\"%Y-%m\""));
        assert!(sql.contains(">= \"2020-01\""));
        assert!(sql.contains("< \"2020-06\""));
    }

    #[test]
    fn count_by_date_sql_leaves_the_range_open_without_an_end() {
        let (_dir, path) = seed_catalog();
        let cat = Catalog::open(&path, None).unwrap();
        let sql = cat.count_by_date_sql("by_year", "2020", None).unwrap();
        assert!(!sql.contains("d < "));
    }

    #[test]
    fn db_version_is_absent_in_a_bare_database() {
        let (_dir, path) = seed_catalog();
        let cat = Catalog::open(&path, None).unwrap();
        assert!(cat.db_version().is_none());
    }
}
