use std::path::Path;

use claimlens::cli::app::{Cli, Command};
use clap::Parser;

#[test]
fn parses_global_runtime_flags_for_render() {
    let cli = Cli::parse_from([
        "claimlens",
        "--home-dir",
        "/home/tester",
        "--cwd",
        "/work/repo",
        "--warehouse",
        "/tmp/warehouse.sqlite",
        "render",
        "--catalog-filter",
        "cla",
        "--table",
        "claims_enriched",
        "--json",
    ]);

    assert_eq!(
        cli.runtime.home_dir.as_deref(),
        Some(Path::new("/home/tester"))
    );
    assert_eq!(cli.runtime.cwd.as_deref(), Some(Path::new("/work/repo")));
    assert_eq!(
        cli.runtime.warehouse.as_deref(),
        Some(Path::new("/tmp/warehouse.sqlite"))
    );

    match cli.command {
        Command::Render(args) => {
            assert_eq!(args.catalog_filter, "cla");
            assert_eq!(args.schema_filter, "");
            assert_eq!(args.table_filter, "");
            assert!(args.catalog.is_none());
            assert!(args.schema.is_none());
            assert_eq!(args.table.as_deref(), Some("claims_enriched"));
            assert!(args.json);
        }
        other => panic!("expected render command, got {other:?}"),
    }
}

#[test]
fn render_args_map_onto_input_state() {
    let cli = Cli::parse_from([
        "claimlens",
        "render",
        "--schema-filter",
        "mai",
        "--catalog",
        "claims",
        "--schema",
        "main",
    ]);

    let Command::Render(args) = cli.command else {
        panic!("expected render command");
    };
    let inputs = args.input_state();
    assert_eq!(inputs.catalog_filter, "");
    assert_eq!(inputs.schema_filter, "mai");
    assert_eq!(inputs.table_filter, "");
    assert_eq!(inputs.catalog_select.as_deref(), Some("claims"));
    assert_eq!(inputs.schema_select.as_deref(), Some("main"));
    assert!(inputs.table_select.is_none());
}

#[test]
fn parses_sql_statement_and_row_cap() {
    let cli = Cli::parse_from([
        "claimlens",
        "sql",
        "SELECT * FROM \"claims.main.claims_enriched\"",
        "--row-cap",
        "25",
    ]);

    match cli.command {
        Command::Sql(args) => {
            assert_eq!(args.sql, "SELECT * FROM \"claims.main.claims_enriched\"");
            assert_eq!(args.row_cap, 25);
        }
        other => panic!("expected sql command, got {other:?}"),
    }
}

#[test]
fn sql_row_cap_defaults_to_one_thousand() {
    let cli = Cli::parse_from(["claimlens", "sql", "SELECT 1"]);

    match cli.command {
        Command::Sql(args) => assert_eq!(args.row_cap, 1_000),
        other => panic!("expected sql command, got {other:?}"),
    }
}

#[test]
fn seed_defaults_target_the_demo_namespace() {
    let cli = Cli::parse_from(["claimlens", "seed"]);

    match cli.command {
        Command::Seed(args) => {
            assert_eq!(args.catalog, "claims");
            assert_eq!(args.schema, "main");
            assert_eq!(args.table, "claims_enriched");
            assert!(args.claims.is_none());
            assert!(!args.json);
        }
        other => panic!("expected seed command, got {other:?}"),
    }
}

#[test]
fn parses_seed_claims_file_and_json_flag() {
    let cli = Cli::parse_from([
        "claimlens",
        "seed",
        "--catalog",
        "payers",
        "--claims",
        "fixtures/claims.jsonl",
        "--json",
    ]);

    match cli.command {
        Command::Seed(args) => {
            assert_eq!(args.catalog, "payers");
            assert_eq!(args.claims.as_deref(), Some(Path::new("fixtures/claims.jsonl")));
            assert!(args.json);
        }
        other => panic!("expected seed command, got {other:?}"),
    }
}

#[test]
fn global_flags_parse_after_the_subcommand() {
    let cli = Cli::parse_from([
        "claimlens",
        "sql",
        "SELECT 1",
        "--warehouse",
        "/tmp/alt.sqlite",
    ]);

    assert_eq!(
        cli.runtime.warehouse.as_deref(),
        Some(Path::new("/tmp/alt.sqlite"))
    );
}
