//! tabconv - CSV/xlsx conversion and Wikipedia summary handlers

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tabconv::config::StoreConfig;
use tabconv::format::{detect_format, Format};
use tabconv::handler::{AppendHandler, ConvertHandler, Handler, Request, SummaryHandler};
use tabconv::remote::{DirectoryStore, WikipediaClient};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    Csv,
    Xlsx,
}

impl From<CliFormat> for Format {
    fn from(f: CliFormat) -> Self {
        match f {
            CliFormat::Csv => Format::DelimitedText,
            CliFormat::Xlsx => Format::Spreadsheet,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliHandler {
    Convert,
    Append,
    Summary,
}

/// CSV/xlsx conversion and Wikipedia summary handlers
#[derive(Parser, Debug)]
#[command(name = "tabconv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a local CSV file to xlsx, or an xlsx file to CSV
    Convert {
        /// File to convert
        input: PathBuf,

        /// Where to write the result (defaults to the input with the new extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source format (detected from extension or content when omitted)
        #[arg(long, value_enum)]
        from: Option<CliFormat>,
    },

    /// Run a handler on a JSON event and print the JSON response
    Invoke {
        /// Handler to run
        #[arg(value_enum)]
        handler: CliHandler,

        /// Event file; reads stdin when omitted or "-"
        event: Option<PathBuf>,

        /// Directory holding one sub-directory per bucket (append only)
        #[arg(long, default_value = ".")]
        store_dir: PathBuf,

        /// Bucket name, instead of BUCKET_NAME (append only)
        #[arg(long)]
        bucket: Option<String>,

        /// Bucket region, instead of BUCKET_REGION (append only)
        #[arg(long)]
        region: Option<String>,

        /// Object key, instead of FILE_KEY (append only)
        #[arg(long)]
        file_key: Option<String>,

        /// Print the response on one line
        #[arg(long)]
        compact: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Command::Convert {
            input,
            output,
            from,
        } => convert_file(input, output, from),
        Command::Invoke {
            handler,
            event,
            store_dir,
            bucket,
            region,
            file_key,
            compact,
        } => {
            let handler: Box<dyn Handler> = match handler {
                CliHandler::Convert => Box::new(ConvertHandler::new()),
                CliHandler::Summary => Box::new(SummaryHandler::new(WikipediaClient::new())),
                CliHandler::Append => {
                    let config = store_config(bucket, region, file_key)?;
                    Box::new(AppendHandler::new(
                        config,
                        WikipediaClient::new(),
                        DirectoryStore::new(store_dir),
                    ))
                }
            };
            invoke(handler.as_ref(), event, compact)
        }
    }
}

fn convert_file(input: PathBuf, output: Option<PathBuf>, from: Option<CliFormat>) -> Result<ExitCode> {
    let bytes =
        fs::read(&input).with_context(|| format!("Failed to read file: {}", input.display()))?;

    let from = from
        .map(Format::from)
        .or_else(|| Format::from_path(&input))
        .unwrap_or_else(|| detect_format(&bytes));

    let converted = tabconv::convert(&bytes, from)
        .with_context(|| format!("Failed to convert {} as {}", input.display(), from))?;

    let output = output.unwrap_or_else(|| input.with_extension(converted.format.extension()));
    fs::write(&output, &converted.bytes)
        .with_context(|| format!("Failed to write file: {}", output.display()))?;

    println!(
        "Wrote {} ({} bytes, {})",
        output.display(),
        converted.bytes.len(),
        converted.format
    );
    Ok(ExitCode::SUCCESS)
}

fn store_config(
    bucket: Option<String>,
    region: Option<String>,
    file_key: Option<String>,
) -> Result<StoreConfig> {
    let mut config = match bucket {
        Some(bucket) => StoreConfig::new(bucket),
        None => StoreConfig::from_env()?,
    };
    if let Some(region) = region {
        config = config.with_region(region);
    }
    if let Some(file_key) = file_key {
        config = config.with_file_key(file_key);
    }
    Ok(config)
}

fn invoke(handler: &dyn Handler, event: Option<PathBuf>, compact: bool) -> Result<ExitCode> {
    let raw = match event {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read event: {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };

    let request: Request = serde_json::from_str(&raw).context("Failed to parse event JSON")?;
    let response = handler.handle(&request);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if compact {
        serde_json::to_writer(&mut out, &response)?;
    } else {
        serde_json::to_writer_pretty(&mut out, &response)?;
    }
    writeln!(out)?;

    if response.status_code < 400 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
