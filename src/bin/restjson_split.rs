//! restjson-split: Split JSON objects into declared fields and residual keys
//!
//! Applies the same key matching as the catch-all decoder (exact name,
//! lower-first-character name, explicit rename) to a field list given on the
//! command line.
//!
//! Usage:
//!   # Declare fields Id and Name, with Name also accepted as "nm"
//!   restjson-split --field Id --field Name=nm data.json
//!
//!   # Process NDJSON from stdin with compact output
//!   cat events.jsonl | restjson-split --ndjson --compact --field Id
//!
//!   # See which keys were captured
//!   RUST_LOG=restjson=trace restjson-split --field Id data.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use restjson::{partition, JsonOptions, KnownField, Partition};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{stdin, BufRead, BufReader, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "restjson-split")]
#[command(about = "Split JSON objects into declared fields and residual keys", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Declared field, as NAME or NAME=RENAME (repeatable)
    #[arg(long = "field", short = 'f', value_name = "NAME[=RENAME]", value_parser = parse_field)]
    fields: Vec<KnownField>,

    /// Process newline-delimited JSON (one JSON object per line)
    #[arg(long)]
    ndjson: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,

    /// Maximum nesting depth accepted in values
    #[arg(long, default_value_t = restjson::reader::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

fn parse_field(arg: &str) -> Result<KnownField, String> {
    let (name, rename) = match arg.split_once('=') {
        Some((name, rename)) => (name.trim(), Some(rename.trim())),
        None => (arg.trim(), None),
    };
    if name.is_empty() {
        return Err(format!("empty field name in {arg:?}"));
    }

    let field = KnownField::new(name);
    Ok(match rename {
        Some(rename) if !rename.is_empty() => field.with_rename(rename),
        _ => field,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = JsonOptions::new().with_max_depth(args.max_depth);

    let mut reader: Box<dyn BufRead> = if let Some(file_path) = &args.input {
        let file = File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?;
        Box::new(BufReader::new(file))
    } else {
        Box::new(BufReader::new(stdin()))
    };

    let mut count = 0;
    if args.ndjson {
        for (index, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read line")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let part = partition(line, &args.fields, &options)
                .with_context(|| format!("Failed to split line {}", index + 1))?;
            print_part(part, args.compact)?;
            count += 1;
        }
    } else {
        let mut content = String::new();
        reader.read_to_string(&mut content).context("Failed to read input")?;
        if !content.trim().is_empty() {
            let part = partition(&content, &args.fields, &options).context("Failed to split input")?;
            print_part(part, args.compact)?;
            count += 1;
        }
    }

    if count == 0 {
        eprintln!("Warning: No JSON objects found in input");
    }

    Ok(())
}

fn print_part(part: Option<Partition>, compact: bool) -> Result<()> {
    let value = match part {
        Some(part) => json!({
            "known": Value::Object(part.known),
            "rest": part.rest,
        }),
        None => Value::Null,
    };

    let output = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        let field = parse_field("Name=nm").unwrap();
        assert_eq!(field.name(), "Name");
        assert_eq!(field.rename(), Some("nm"));

        let field = parse_field(" Id ").unwrap();
        assert_eq!(field.name(), "Id");
        assert_eq!(field.rename(), None);

        assert!(parse_field("=x").is_err());
    }
}
