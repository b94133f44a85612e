use crate::{
    commands::{InputArgs, TargetArgs},
    error::CliError,
};
use connectors::file::csv::{
    metadata::CsvMetadata,
    source::{CsvOptions, CsvTableReader},
};
use engine_runtime::options::LoadOptions;
use model::records::table::Table;
use tracing::info;

/// Reads the CSV file named by the input arguments.
pub fn read_input(args: &InputArgs) -> Result<(CsvMetadata, Table), CliError> {
    if !args.delimiter.is_ascii() {
        return Err(CliError::InvalidArgument(format!(
            "delimiter '{}' must be a single ASCII character",
            args.delimiter
        )));
    }

    let options = CsvOptions::default()
        .with_delimiter(args.delimiter as u8)
        .with_header(!args.no_header);
    let (metadata, table) = CsvTableReader::new(&args.file, options).read()?;

    info!(
        file = %args.file,
        rows = table.height(),
        columns = table.width(),
        "Read CSV input"
    );
    Ok((metadata, table))
}

/// Builds load options from the optional JSON file, then applies flags.
pub fn resolve_options(args: &TargetArgs) -> Result<LoadOptions, CliError> {
    let mut options = match &args.options {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => LoadOptions::default(),
    };

    if let Some(schema) = &args.schema {
        options.schema = schema.clone();
    }
    if let Some(policy) = &args.if_exists {
        options.if_exists = policy.parse()?;
    }
    if let Some(size) = args.batch_size {
        options.batch_size = size;
    }
    if args.reset_identity {
        options.reset_identity = true;
    }
    if let Some(workers) = args.workers {
        options.worker_count = workers;
    }
    if let Some(depth) = args.prefetch {
        options.prefetch_depth = depth;
    }
    for pair in &args.string_sizes {
        let (column, length) = parse_string_size(pair)?;
        options.string_sizes.insert(column, length);
    }

    options.validate()?;
    Ok(options)
}

fn parse_string_size(pair: &str) -> Result<(String, usize), CliError> {
    let invalid = || CliError::InvalidArgument(format!("expected COLUMN=LENGTH, got '{pair}'"));

    let (column, length) = pair.split_once('=').ok_or_else(invalid)?;
    let column = column.trim();
    if column.is_empty() {
        return Err(invalid());
    }
    let length = length.trim().parse::<usize>().map_err(|_| invalid())?;
    Ok((column.to_string(), length))
}
