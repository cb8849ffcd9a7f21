use std::{
    cell::Cell,
    io::{self, Write},
    path::PathBuf,
    rc::Rc,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{Level, info};
use valuetable_engine::{
    ChangeOutcome, KeyShape, Keyed, Ranged, RecomposeScope, TableOptions, ValueTable, decompose, recompose,
};
use valuetable_types::{Field, FieldInput, KeyKind, TableKind, ValueKind};
use valuetable_util::{TableSettings, default_settings_path, load_mapping, load_settings, save_mapping};

#[derive(Debug, Parser)]
#[command(name = "valuetable", version, about = "Edit keyed and ranged value table documents")]
struct Cli {
    /// Table shape: `map` (discrete keys) or `range` (`from~to` keys)
    #[arg(long, global = true, value_parser = parse_table_kind)]
    kind: Option<TableKind>,
    /// Value type: string, boolean or color
    #[arg(long = "value-type", global = true)]
    value_type: Option<ValueKind>,
    /// Key comparator kind: number or string
    #[arg(long = "key-type", alias = "range-type", global = true)]
    key_type: Option<KeyKind>,
    /// Settings file (defaults to the config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the row list of a document
    Rows { file: PathBuf },
    /// Add or replace an entry through the new row
    Set {
        file: PathBuf,
        /// Key, or lower bound for range tables
        #[arg(long)]
        key: String,
        /// Upper bound (range tables only)
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        value: String,
    },
    /// Commit a change to one field of one row
    Edit {
        file: PathBuf,
        #[arg(long)]
        row: usize,
        #[arg(long)]
        field: Field,
        #[arg(long)]
        input: String,
    },
    /// Delete the entry stored under an encoded key
    Delete {
        file: PathBuf,
        #[arg(long)]
        key: String,
    },
    /// Sort entries descending by key, default last
    Sort { file: PathBuf },
    /// Resolve a query value against a document
    Lookup { file: PathBuf, query: String },
    /// Rewrite a document in its recomposed form
    Normalize { file: PathBuf },
}

impl Command {
    fn file(&self) -> &PathBuf {
        match self {
            Self::Rows { file }
            | Self::Set { file, .. }
            | Self::Edit { file, .. }
            | Self::Delete { file, .. }
            | Self::Sort { file }
            | Self::Lookup { file, .. }
            | Self::Normalize { file } => file,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let options = TableOptions {
        value_kind: settings.value_type,
        key_kind: Some(settings.key_kind()),
    };
    info!(kind = %settings.kind, value_type = %options.value_kind, key_type = %settings.key_kind(), "opening table");

    let mut stdout = io::stdout().lock();
    match settings.kind {
        TableKind::Map => run::<Keyed>(&cli.command, options, &mut stdout),
        TableKind::Range => run::<Ranged>(&cli.command, options, &mut stdout),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_table_kind(raw: &str) -> Result<TableKind, String> {
    TableKind::from_property_type(raw).ok_or_else(|| format!("unknown table kind '{raw}'; expected 'map' or 'range'"))
}

// Flags override the settings file.
fn resolve_settings(cli: &Cli) -> Result<TableSettings> {
    let path = cli.settings.clone().unwrap_or_else(default_settings_path);
    let mut settings =
        load_settings(&path).with_context(|| format!("Failed to load settings from {}", path.display()))?;
    if let Some(kind) = cli.kind {
        if kind != settings.kind {
            settings.key_type = None;
        }
        settings.kind = kind;
    }
    if let Some(value_type) = cli.value_type {
        settings.value_type = value_type;
    }
    if let Some(key_type) = cli.key_type {
        settings.key_type = Some(key_type);
    }
    Ok(settings)
}

fn run<S: KeyShape>(command: &Command, options: TableOptions, out: &mut impl Write) -> Result<()> {
    let file = command.file();
    let mapping = load_mapping(file).with_context(|| format!("Failed to read document {}", file.display()))?;
    let table = ValueTable::<S>::with_value(mapping, options);

    let changed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&changed);
    table.subscribe(move |event| {
        info!(cause = ?event.cause, entries = event.mapping.len(), "table changed");
        flag.set(true);
    });

    match command {
        Command::Rows { .. } => {
            writeln!(out, "{}", serde_json::to_string_pretty(&row_listing(&table))?)?;
        }
        Command::Set { key, to, value, .. } => {
            let new_row = table.new_row_index();
            table.edit(new_row, S::primary_field(), key.as_str())?;
            if let Some(to) = to {
                let Some(&upper) = S::KEY_FIELDS.get(1) else {
                    bail!("--to only applies to range tables");
                };
                table.edit(new_row, upper, to.as_str())?;
            }
            let outcome = table.commit(new_row, Field::Value, value_input(value, options.value_kind))?;
            if outcome != ChangeOutcome::Appended {
                bail!("entry was not added (outcome: {outcome:?})");
            }
        }
        Command::Edit { row, field, input, .. } => {
            let input = match field {
                Field::Value => value_input(input, options.value_kind),
                _ => FieldInput::Text(input.clone()),
            };
            let outcome = table.commit(*row, *field, input)?;
            writeln!(out, "{outcome:?}")?;
        }
        Command::Delete { key, .. } => {
            let index = table.find_row(key).with_context(|| format!("no entry stored under '{key}'"))?;
            table.delete(index)?;
        }
        Command::Sort { .. } => {
            table.sort();
        }
        Command::Lookup { query, .. } => {
            writeln!(out, "{}", serde_json::to_string(&table.resolve(query))?)?;
        }
        Command::Normalize { .. } => {
            let rows = decompose::<S>(&table.value(), options.value_kind);
            let normalized = recompose::<S>(&rows, RecomposeScope::Committed, options.value_kind);
            save_mapping(file, &normalized).with_context(|| format!("Failed to write document {}", file.display()))?;
            return Ok(());
        }
    }

    if changed.get() {
        save_mapping(file, &table.value()).with_context(|| format!("Failed to write document {}", file.display()))?;
    }
    Ok(())
}

/// Rows with their position and the input variant each field is edited with.
fn row_listing<S: KeyShape>(table: &ValueTable<S>) -> Value {
    let input = table.options().value_kind.input_kind();
    let rows: Vec<Value> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            json!({
                "index": index,
                "kind": row.kind,
                "key": row.key,
                "value": row.value,
                "input": input,
                "deletable": row.is_deletable(),
            })
        })
        .collect();
    Value::Array(rows)
}

// Checkbox tables take `true`/`false`; anything else is text.
fn value_input(raw: &str, kind: ValueKind) -> FieldInput {
    match kind {
        ValueKind::Boolean => FieldInput::Checked(!(raw.is_empty() || raw == "false")),
        ValueKind::String | ValueKind::Color => FieldInput::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::tempdir;
    use valuetable_types::InputKind;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "valuetable",
            "--kind",
            "range",
            "--value-type",
            "color",
            "--settings",
            "/nonexistent/valuetable/settings.json",
            "sort",
            "ranges.json",
        ]);
        let settings = resolve_settings(&cli).expect("settings");
        assert_eq!(settings.kind, TableKind::Range);
        assert_eq!(settings.value_type, ValueKind::Color);
        assert_eq!(settings.key_kind(), KeyKind::Number);
    }

    #[test]
    fn boolean_values_parse_as_checkbox_state() {
        assert_eq!(value_input("false", ValueKind::Boolean), FieldInput::Checked(false));
        assert_eq!(value_input("true", ValueKind::Boolean), FieldInput::Checked(true));
        assert_eq!(value_input("false", ValueKind::String), FieldInput::Text("false".into()));
    }

    #[test]
    fn set_then_sort_writes_range_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ranges.json");
        let options = TableOptions::default();
        let mut out = Vec::new();

        for (from, to, value) in [("0", "10", "low"), ("10", "20", "mid")] {
            let set = Command::Set {
                file: path.clone(),
                key: from.to_string(),
                to: Some(to.to_string()),
                value: value.to_string(),
            };
            run::<Ranged>(&set, options, &mut out).unwrap();
        }
        run::<Ranged>(&Command::Sort { file: path.clone() }, options, &mut out).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let document: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(document, json!({"10~20": "mid", "0~10": "low", "default": ""}));
        let high = written.find("\"10~20\"").unwrap();
        let low = written.find("\"0~10\"").unwrap();
        let default = written.find("\"default\"").unwrap();
        assert!(high < low && low < default, "unexpected order: {written}");
    }

    #[test]
    fn set_rejects_upper_bound_on_key_tables() {
        let dir = tempdir().unwrap();
        let set = Command::Set {
            file: dir.path().join("map.json"),
            key: "a".to_string(),
            to: Some("b".to_string()),
            value: "x".to_string(),
        };
        assert!(run::<Keyed>(&set, TableOptions::default(), &mut Vec::new()).is_err());
    }

    #[test]
    fn rows_listing_reports_input_variant() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flags.json");
        fs::write(&path, r#"{"visible": true, "default": false}"#).unwrap();
        let options = TableOptions::default().with_value_kind(ValueKind::Boolean);
        let mut out = Vec::new();

        run::<Keyed>(&Command::Rows { file: path }, options, &mut out).unwrap();

        let listing: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let rows = listing.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["key"], "visible");
        assert_eq!(rows[0]["value"], true);
        assert_eq!(rows[0]["input"], json!(InputKind::Checkbox));
        assert_eq!(rows[0]["deletable"], true);
        assert_eq!(rows[2]["kind"], "default");
        assert_eq!(rows[2]["deletable"], false);
    }
}
