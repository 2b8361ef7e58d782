//! `lrq`: a thin CLI front end over the `lrquery` library.
//!
//! Owns config loading, logger initialization, and catalog opening, then
//! calls straight into the compiler, smart-collection translator, and
//! formatter. The library itself never reads files, prints, or initializes
//! logging.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;
use rusqlite::types::Value;

use lrquery::catalog::{Catalog, CatalogKeywordIndex, CatalogPhotoLocator};
use lrquery::compiler::{CompileOptions, Compiler};
use lrquery::config::Config;
use lrquery::formatter::{self, FormatOptions};
use lrquery::geocoder::NullGeocoder;
use lrquery::lua_decode::StubDecoder;
use lrquery::smart_collection;

#[derive(Parser)]
#[command(author, version, about = "Read-only query tool for Adobe Lightroom catalogs", long_about = None)]
struct Cli {
    /// Path to the .lrcat file; overrides the config file's default_catalog_path.
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the compiled SQL instead of running it.
    #[arg(long, global = true)]
    sql_only: bool,

    /// Print only the matching row count.
    #[arg(long, global = true)]
    count: bool,

    /// 0 prints nothing, negative prints every row, positive caps it.
    #[arg(long, global = true, default_value_t = -1)]
    max_lines: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile and run a columns/criteria query against the photo table.
    Photos {
        #[arg(long, default_value = "name")]
        columns: String,
        #[arg(long, default_value = "")]
        criteria: String,
        #[arg(long)]
        distinct: bool,
    },
    /// Compile and run a persisted smart collection by name or id.
    Smart {
        #[arg(long)]
        name: String,
        /// Dump the raw, un-decoded Lua-table bytes instead of compiling.
        #[arg(long)]
        raw: bool,
    },
}

fn load_config(path: Option<&PathBuf>, catalog_override: Option<&str>) -> anyhow::Result<Config> {
    let mut cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)?;
            Config::from_yaml(&text)?
        }
        None => Config::new("catalog.lrcat"),
    };
    if let Some(catalog) = catalog_override {
        cfg.default_catalog_path = catalog.to_string();
    }
    Ok(cfg)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = load_config(cli.config.as_ref(), cli.catalog.as_deref())?;

    let catalog = Catalog::open(&cfg.default_catalog_path, None)?;

    match &cli.command {
        Command::Photos { columns, criteria, distinct } => {
            let compile_columns = formatter::ensure_name_full_for_filesize(columns);
            let locator = CatalogPhotoLocator::new(&catalog);
            let compiler = Compiler::photo(&cfg).with_geocoder(&NullGeocoder, &locator);
            let options = CompileOptions { distinct: *distinct, ..Default::default() };
            let result = compiler.compile(&compile_columns, criteria, &options)?;
            info!("compiled photos query: {}", result.sql);

            let requested: Vec<String> = columns
                .split(',')
                .map(|s| s.trim().split('=').next().unwrap_or("").to_string())
                .filter(|s| !s.is_empty())
                .collect();
            let requested = if requested.is_empty() { result.column_names.clone() } else { requested };

            print_or_run(&catalog, &result.sql, &requested, &result.column_names, &cli)
        }
        Command::Smart { name, raw } => {
            if *raw {
                let blob = catalog
                    .smart_blob(name, true)?
                    .ok_or_else(|| anyhow::anyhow!("no smart collection named \"{}\"", name))?;
                println!("{}", String::from_utf8_lossy(&blob));
                return Ok(());
            }
            let blob = catalog
                .smart_blob(name, false)?
                .ok_or_else(|| anyhow::anyhow!("no smart collection named \"{}\"", name))?;
            let index = CatalogKeywordIndex::load(&catalog)?;
            let sql = smart_collection::translate_blob(&blob, &StubDecoder, &cfg, &index)?;
            info!("compiled smart collection \"{}\": {}", name, sql);

            let columns = vec!["id_local".to_string()];
            print_or_run(&catalog, &sql, &columns, &columns, &cli)
        }
    }
}

fn print_or_run(catalog: &Catalog, sql: &str, requested_columns: &[String], sql_columns: &[String], cli: &Cli) -> anyhow::Result<()> {
    if cli.sql_only {
        println!("{}", sql);
        return Ok(());
    }

    if cli.count {
        let wrapped = format!("SELECT COUNT(*) AS n FROM ({}) subq", sql);
        let result = catalog.execute(&wrapped)?;
        let n = result.rows.first().and_then(|row| row.first()).map(value_as_i64).unwrap_or(0);
        println!("{}", n);
        return Ok(());
    }

    let result = catalog.execute(sql)?;
    info!("{} row(s)", result.rows.len());
    let options = FormatOptions { max_lines: cli.max_lines, ..Default::default() };
    let table = formatter::format_table(requested_columns, sql_columns, &result.rows, &options)?;
    print!("{}", table);
    Ok(())
}

fn value_as_i64(value: &Value) -> i64 {
    match value {
        Value::Integer(i) => *i,
        Value::Real(f) => *f as i64,
        Value::Text(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}
