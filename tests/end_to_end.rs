//! End-to-end checks exercised through the public API rather than
//! module-internal unit tests.

use lrquery::compiler::{CompileOptions, Compiler};
use lrquery::config::Config;
use lrquery::formatter::{self, FormatOptions};
use lrquery::lua_decode::{LuaKey, LuaValue};
use lrquery::smart_collection::{self, SmartTree};

fn cfg() -> Config {
    Config::new("catalog.lrcat")
}

/// Rating/videos criteria on the photo table.
#[test]
fn rating_and_not_video_compile_together() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    let result = compiler
        .compile("name, datecapt", "rating=>=4, videos=0", &CompileOptions::default())
        .unwrap();
    assert!(result.sql.starts_with(
        "SELECT fi.baseName || \".\" || fi.extension AS name, i.captureTime AS datecapt FROM Adobe_images i"
    ));
    assert!(result.sql.contains("AgLibraryFile fi ON i.rootFile=fi.id_local") || result.sql.contains("AgLibraryFile fi"));
    assert!(result.sql.contains("i.rating >= 4"));
    assert!(result.sql.contains("i.fileFormat != \"VIDEO\""));
}

/// A repeated keyword criterion gets two distinct join aliases.
#[test]
fn repeated_keyword_gets_distinct_aliases() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    let result = compiler
        .compile("name", "keyword=france, keyword=mountain", &CompileOptions::default())
        .unwrap();
    assert!(result.sql.contains("kwi1"));
    assert!(result.sql.contains("kwi2"));
    assert!(result.sql.contains("kw1.name LIKE \"france\""));
    assert!(result.sql.contains("kw2.name LIKE \"mountain\""));
}

/// A GPS point-plus-radius value compiles to a bounded rectangle.
#[test]
fn gps_rectangle_has_normalized_bounds() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    let result = compiler
        .compile("name, latitude, longitude", "gps=\"45.7;4.8+10\"", &CompileOptions::default())
        .unwrap();
    assert!(result.sql.contains("em.hasGps = 1"));
    assert!(result.sql.contains("em.gpsLatitude BETWEEN"));
    assert!(result.sql.contains("em.gpsLongitude BETWEEN"));
}

/// Aperture equality compiles to the rounded stored Av value.
#[test]
fn aperture_equality_rounds_to_six_places() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    let result = compiler.compile("name", "aperture==5.6", &CompileOptions::default()).unwrap();
    assert!(result.sql.contains("em.aperture = ROUND(4.977280, 6)"), "{}", result.sql);
}

/// A smart tree intersecting a collection-name match with a GPS-presence
/// check.
#[test]
fn smart_tree_intersects_collection_and_gps() {
    let table = LuaValue::Table(vec![
        (
            LuaKey::Index(0),
            LuaValue::Table(vec![
                (LuaKey::Field("criteria".to_string()), LuaValue::Str("collection".to_string())),
                (LuaKey::Field("operation".to_string()), LuaValue::Str("beginsWith".to_string())),
                (LuaKey::Field("value".to_string()), LuaValue::Str("Holiday".to_string())),
            ]),
        ),
        (
            LuaKey::Index(1),
            LuaValue::Table(vec![
                (LuaKey::Field("criteria".to_string()), LuaValue::Str("hasGPSData".to_string())),
                (LuaKey::Field("operation".to_string()), LuaValue::Str("==".to_string())),
                (LuaKey::Field("value".to_string()), LuaValue::Str("false".to_string())),
            ]),
        ),
        (LuaKey::Field("combine".to_string()), LuaValue::Str("intersect".to_string())),
    ]);
    let tree = SmartTree::from_lua(&table).unwrap();
    let sql = smart_collection::translate(&tree, &cfg()).unwrap();
    assert!(sql.contains("col1.name LIKE \"Holiday%\""), "{}", sql);
    assert!(sql.contains("em.hasGps == 0"), "{}", sql);
    assert!(sql.contains(" INTERSECT "), "{}", sql);
}

/// Requesting `filesize` implicitly adds `name=full` to the compiled
/// columns, and the formatter emits a trailing total line.
#[test]
fn filesize_implies_name_full_and_prints_a_total() {
    let requested = "filesize";
    let compiled_columns = formatter::ensure_name_full_for_filesize(requested);
    assert_eq!(compiled_columns, "name=full");

    let config = cfg();
    let compiler = Compiler::photo(&config);
    let result = compiler.compile(&compiled_columns, "rating=>=5", &CompileOptions::default()).unwrap();
    assert_eq!(result.column_names, vec!["name".to_string()]);

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("a.jpg");
    std::fs::write(&file_path, [0u8; 10]).unwrap();

    // max_lines: 0 suppresses every row; only the dataset total is printed.
    let rows = vec![vec![rusqlite::types::Value::Text(file_path.to_string_lossy().into_owned())]];
    let options = FormatOptions { header: false, max_lines: 0, ..Default::default() };
    let table = formatter::format_table(
        &["filesize".to_string()],
        &["name".to_string()],
        &rows,
        &options,
    )
    .unwrap();
    assert_eq!(table.trim(), "Total filesize: 10 B");
}

/// Wrapping the whole criteria string in one extra pair of parens yields
/// the same WHERE shape modulo the parens themselves.
#[test]
fn extra_wrapping_parens_preserve_where_shape() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    let a = compiler.compile("name", "rating=5, videos=0", &CompileOptions::default()).unwrap();
    let b = compiler.compile("name", "(rating=5, videos=0)", &CompileOptions::default()).unwrap();
    assert_eq!(a.sql.replace(['(', ')'], ""), b.sql.replace(['(', ')'], ""));
}

/// A criterion used k times yields k pairwise-distinct alias suffixes.
#[test]
fn repeated_criterion_yields_distinct_suffixes() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    let result = compiler
        .compile("name", "keyword=alpha, keyword=beta, keyword=gamma", &CompileOptions::default())
        .unwrap();
    for n in 1..=3 {
        assert!(result.sql.contains(&format!("kwi{}", n)), "{}", result.sql);
        assert!(result.sql.contains(&format!("kw{}.name", n)), "{}", result.sql);
    }
}

/// A query whose columns and criteria both need the same auxiliary tables
/// joins each of them exactly once.
#[test]
fn shared_joins_are_deduplicated() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    let result = compiler
        .compile("name=full, aperture", "folder=2023%, aperture=<8", &CompileOptions::default())
        .unwrap();
    assert_eq!(result.sql.matches("LEFT JOIN AgLibraryFile fi").count(), 1, "{}", result.sql);
    assert_eq!(result.sql.matches("LEFT JOIN AgLibraryFolder fo").count(), 1, "{}", result.sql);
    assert_eq!(result.sql.matches("LEFT JOIN AgHarvestedExifMetadata em").count(), 1, "{}", result.sql);
}

/// A smart rating leaf and the equivalent DSL expression compile to the
/// same WHERE comparison.
#[test]
fn smart_and_dsl_rating_agree() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    let dsl = compiler.compile("id", "rating=>=4", &CompileOptions::default()).unwrap();

    let table = LuaValue::Table(vec![
        (LuaKey::Field("criteria".to_string()), LuaValue::Str("rating".to_string())),
        (LuaKey::Field("operation".to_string()), LuaValue::Str(">=".to_string())),
        (LuaKey::Field("value".to_string()), LuaValue::Str("4".to_string())),
    ]);
    let tree = SmartTree::from_lua(&table).unwrap();
    let smart = smart_collection::translate(&tree, &cfg()).unwrap();

    assert!(dsl.sql.contains("i.rating >= 4"), "{}", dsl.sql);
    assert!(smart.contains("i.rating >= 4"), "{}", smart);
}

/// Output column order follows the user's column string.
#[test]
fn column_order_matches_request() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    let result = compiler.compile("datecapt, name, rating", "", &CompileOptions::default()).unwrap();
    assert_eq!(result.column_names, vec!["datecapt".to_string(), "name".to_string(), "rating".to_string()]);
}

/// Stored aperture values render back to the F-number they were compiled
/// from.
#[test]
fn aperture_round_trips_for_common_f_numbers() {
    for n in [1.0f64, 1.4, 2.0, 2.8, 4.0, 5.6, 8.0, 11.0, 16.0] {
        let av = (2.0 * n.log2() * 1_000_000.0).round() / 1_000_000.0;
        let rows = vec![vec![rusqlite::types::Value::Real(av)]];
        let table = formatter::format_table(
            &["aperture".to_string()],
            &["aperture".to_string()],
            &rows,
            &FormatOptions { header: false, max_lines: -1, indent: 0, ..Default::default() },
        )
        .unwrap();
        let rendered = table.trim();
        let expected = format!("F{:.1}", n);
        assert!(rendered.contains(&expected), "n={} rendered={}", n, rendered);
    }
}

/// No compiled SQL contains a mutating statement keyword.
#[test]
fn compiled_sql_never_mutates() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    let forbidden = ["INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ATTACH", "PRAGMA"];
    let cases = [
        ("name, datecapt", "rating=>=4, videos=0"),
        ("name", "keyword=france, keyword=mountain"),
        ("name, latitude, longitude", "gps=\"45.7;4.8+10\""),
        ("name", "aperture==5.6"),
    ];
    for (columns, criteria) in cases {
        let result = compiler.compile(columns, criteria, &CompileOptions::default()).unwrap();
        let upper = result.sql.to_uppercase();
        for kw in forbidden {
            assert!(!upper.contains(kw), "sql {} unexpectedly contains {}", result.sql, kw);
        }
    }
}

/// Unknown criteria and columns are rejected rather than silently ignored.
#[test]
fn unknown_criterion_and_column_are_rejected() {
    let config = cfg();
    let compiler = Compiler::photo(&config);
    assert!(compiler.compile("name", "bogus=1", &CompileOptions::default()).is_err());
    assert!(compiler.compile("bogus", "", &CompileOptions::default()).is_err());
}
