//! fieldmap CLI - check mapper configurations and clean NDJSON records
//!
//! Schemas and mappers are read from YAML files; records are read one JSON
//! object per line.

use clap::{Parser, Subcommand};
use fieldmap::serialization::{NdjsonReader, OutputFormat, RecordWriter};
use fieldmap::{
    assignable_fields, load_mapper, load_schema, EntitySchema, MapperType, Record, RecordValue,
};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fieldmap")]
#[command(
    version,
    about = "Declarative mapping of raw records onto entity schemas",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Finalize a mapper and print the fields it cleans
    Check {
        /// Path to the entity schema YAML
        #[arg(short, long)]
        schema: PathBuf,

        /// Path to the mapper YAML
        #[arg(short, long)]
        mapper: PathBuf,
    },

    /// Print the assignable fields of a schema
    Fields {
        /// Path to the entity schema YAML
        #[arg(short, long)]
        schema: PathBuf,

        /// Comma-separated fields to exclude
        #[arg(short, long, value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// Clean every record of an NDJSON file
    Clean {
        /// Path to the entity schema YAML
        #[arg(short, long)]
        schema: PathBuf,

        /// Path to the mapper YAML
        #[arg(short, long)]
        mapper: PathBuf,

        /// NDJSON input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "ndjson")]
        format: OutputFormat,

        /// Build entity instances instead of printing cleaned data
        #[arg(short, long)]
        build: bool,

        /// Override a field when building, as field=<json>
        #[arg(long = "set", value_name = "FIELD=JSON", value_parser = parse_override)]
        overrides: Vec<(String, RecordValue)>,
    },
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check { schema, mapper } => check_mapper(schema, mapper),
        Commands::Fields { schema, exclude } => list_fields(schema, exclude),
        Commands::Clean {
            schema,
            mapper,
            input,
            output,
            format,
            build,
            overrides,
        } => clean_records(schema, mapper, input, output, format, build, overrides),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Parse `field=<json>`; a value that is not valid JSON is taken as a string
fn parse_override(arg: &str) -> Result<(String, RecordValue), String> {
    let (field, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=JSON, got '{}'", arg))?;
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", arg));
    }
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => RecordValue::from(json),
        Err(_) => RecordValue::string(raw),
    };
    Ok((field.to_string(), value))
}

fn load_mapper_type(schema_path: &Path, mapper_path: &Path) -> Result<MapperType, String> {
    let schema = load_schema(schema_path)?;
    load_mapper(mapper_path, schema)
        .and_then(|declaration| declaration.finalize())
        .map_err(|e| format!("Invalid mapper {}: {}", mapper_path.display(), e))
}

fn check_mapper(schema: PathBuf, mapper: PathBuf) -> Result<(), String> {
    println!("🔍 Checking {}...", mapper.display());

    let mapper_type = load_mapper_type(&schema, &mapper)?;

    println!(
        "  ✓ {} maps {} field(s) of {}",
        mapper_type.name(),
        mapper_type.fields().len(),
        mapper_type.schema().name
    );
    for field in mapper_type.fields() {
        let parsers = mapper_type.parser_names(field);
        if parsers.is_empty() {
            println!("    {} <- {}", field, mapper_type.source_key(field));
        } else {
            println!(
                "    {} <- {} [{}]",
                field,
                mapper_type.source_key(field),
                parsers.join(", ")
            );
        }
    }

    println!("✅ Mapper configuration is valid!");
    Ok(())
}

fn list_fields(schema: PathBuf, exclude: Vec<String>) -> Result<(), String> {
    let schema: EntitySchema = load_schema(&schema)?;
    for field in assignable_fields(&schema, &exclude) {
        println!("{}", field);
    }
    Ok(())
}

fn clean_records(
    schema: PathBuf,
    mapper: PathBuf,
    input: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    build: bool,
    overrides: Vec<(String, RecordValue)>,
) -> Result<(), String> {
    let mapper_type = load_mapper_type(&schema, &mapper)?;
    let overrides: Record = overrides.into_iter().collect();

    let file = File::open(&input)
        .map_err(|e| format!("Failed to open {}: {}", input.display(), e))?;
    let reader = NdjsonReader::new(BufReader::new(file));

    let sink: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path).map_err(|e| format!("Failed to create {}: {}", path.display(), e))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = RecordWriter::new(sink, format).map_err(|e| e.to_string())?;

    let mut count = 0usize;
    for item in reader {
        let (line, record) = item.map_err(|e| format!("{}: {}", input.display(), e))?;
        let at_line = |e: fieldmap::MapperError| format!("{}:{}: {}", input.display(), line, e);

        let mut instance = mapper_type.mapper(record).map_err(at_line)?;
        instance.clean().map_err(at_line)?;

        let written = if build {
            let entity = instance.build(overrides.clone()).map_err(at_line)?;
            writer.write(&entity)
        } else {
            writer.write(instance.cleaned_data().map_err(at_line)?)
        };
        written.map_err(|e| e.to_string())?;
        count += 1;
    }

    writer.finish().map_err(|e| e.to_string())?;
    tracing::info!(records = count, mapper = %mapper_type.name(), "records cleaned");
    Ok(())
}
