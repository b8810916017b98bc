//! CLI tool for streaming a CSV file through a typed schema.
//!
//! Each decoded record is printed as one JSON line on stdout; a summary goes
//! to stderr. Decoding stops at the first invalid row.
//!
//! # Usage
//!
//! ```bash
//! # Stream records one at a time
//! csvpeek --input customers.csv --schema first_name:string:1:10 --schema age:int
//!
//! # Chunks of 100 records, skipping the first column, semicolon separated
//! csvpeek -i data.csv -s name:string -s score:float --skip-col 0 --delimiter ';' \
//!     --mode chunks --chunk-size 100
//!
//! # Read from stdin, stop after 5 records
//! cat customers.csv | csvpeek -s first_name:string -s age:int --limit 5
//! ```

use std::{
    fs::File,
    io::{BufWriter, Write, stdin, stdout},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use csvstream::{
    Canceller, Client, CsvFileSource, CsvReaderSource, DynamicRecord, Options, PipelineState,
    RowSource, Stream, StreamError,
};
use serde::Serialize;
use tracing::{debug, error, info};

/// Stream a CSV file through a typed schema and print records as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "csvpeek")]
#[command(version, about)]
struct Args {
    /// Input file path. If not specified, reads from stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Field declaration, in column order. Repeat for each field.
    #[arg(short = 's', long = "schema", value_name = "NAME:KIND[:MIN[:MAX]]", required = true)]
    fields: Vec<String>,

    /// Column separator.
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Zero-based column to ignore. Repeatable.
    #[arg(long = "skip-col", value_name = "INDEX")]
    skip_columns: Vec<usize>,

    /// Treat the first row as data.
    #[arg(long)]
    no_header: bool,

    /// Delivery mode.
    #[arg(long, value_enum, default_value_t = Mode::Rows)]
    mode: Mode,

    /// Records per chunk in chunks mode. 0 means one chunk for the whole input.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Stop after this many pulls and release the pipeline.
    #[arg(long)]
    limit: Option<usize>,

    /// Pause after each pull, simulating a slow consumer.
    #[arg(long, value_name = "MILLIS")]
    delay_ms: Option<u64>,

    /// JSON file with pipeline options. Command-line flags take precedence.
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One record per line.
    Rows,
    /// One JSON array per chunk.
    Chunks,
    /// Read everything first, print only if the whole input is valid.
    All,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let options = args.pipeline_options()?;
    let schema = DynamicRecord::schema(&args.fields).context("Invalid schema")?;

    let canceller = Canceller::new();
    let handler = canceller.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, stopping");
        handler.cancel();
    })
    .context("Failed to set Ctrl+C handler")?;

    let out = BufWriter::new(stdout().lock());
    let summary = match &args.input {
        Some(path) => {
            let client = Client::with_schema(schema, CsvFileSource::new(path), &options)
                .context("Invalid configuration")?
                .cancel_with(&canceller);
            peek(client, &args, out)?
        }
        None => {
            let client = Client::with_schema(schema, CsvReaderSource::new(stdin()), &options)
                .context("Invalid configuration")?
                .cancel_with(&canceller);
            peek(client, &args, out)?
        }
    };

    eprintln!("{summary}");
    Ok(())
}

impl Args {
    /// Options file (if any) overridden by command-line flags.
    fn pipeline_options(&self) -> Result<Options> {
        let mut options = match &self.options {
            Some(path) => load_options(path)?,
            None => Options::default(),
        };

        if let Some(delimiter) = self.delimiter {
            options.delimiter = delimiter;
        }
        if !self.skip_columns.is_empty() {
            options.skip_columns.clone_from(&self.skip_columns);
        }
        if self.no_header {
            options.skip_header = false;
        }
        if let Some(chunk_size) = self.chunk_size {
            options.chunk_size = chunk_size;
        }

        debug!(?options, "pipeline options");
        Ok(options)
    }
}

fn load_options(path: &Path) -> Result<Options> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open options file: {}", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse options file: {}", path.display()))
}

/// What was printed.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    records: usize,
    chunks: Option<usize>,
    interrupted: bool,
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Read {} record(s)", self.records)?;
        if let Some(chunks) = self.chunks {
            write!(f, " in {chunks} chunk(s)")?;
        }
        if self.interrupted {
            write!(f, " (stopped early)")?;
        }
        Ok(())
    }
}

fn peek<S: RowSource, W: Write>(
    client: Client<DynamicRecord, S>,
    args: &Args,
    mut out: W,
) -> Result<Summary> {
    let delay = args.delay_ms.map(Duration::from_millis);

    let summary = match args.mode {
        Mode::Rows => {
            let (records, interrupted) = drain(client.rows(), &mut out, args.limit, delay)?;
            Summary { records, chunks: None, interrupted }
        }
        Mode::Chunks => {
            let mut records = 0;
            let (chunks, interrupted) = drain_with(
                client.chunks(),
                &mut out,
                args.limit,
                delay,
                |chunk: &Vec<DynamicRecord>| records += chunk.len(),
            )?;
            Summary { records, chunks: Some(chunks), interrupted }
        }
        Mode::All => match client.read_all() {
            Ok(records) => {
                for record in &records {
                    write_line(&mut out, record)?;
                }
                Summary { records: records.len(), chunks: None, interrupted: false }
            }
            Err(StreamError::Cancelled) => Summary { records: 0, chunks: None, interrupted: true },
            Err(err) => return Err(err).context("Failed to read input"),
        },
    };

    out.flush().context("Failed to flush output")?;
    Ok(summary)
}

/// Pulls until end of data, the limit, or cancellation. Returns the number of
/// items printed and whether pulling stopped before the end.
fn drain<U, W>(
    stream: Stream<U>,
    out: &mut W,
    limit: Option<usize>,
    delay: Option<Duration>,
) -> Result<(usize, bool)>
where
    U: Serialize + Send + 'static,
    W: Write,
{
    drain_with(stream, out, limit, delay, |_| {})
}

fn drain_with<U, W, F>(
    mut stream: Stream<U>,
    out: &mut W,
    limit: Option<usize>,
    delay: Option<Duration>,
    mut on_item: F,
) -> Result<(usize, bool)>
where
    U: Serialize + Send + 'static,
    W: Write,
    F: FnMut(&U),
{
    let mut printed = 0;

    while stream.has_more() {
        if limit.is_some_and(|limit| printed >= limit) {
            stream.close();
            return Ok((printed, true));
        }

        let Some(item) = stream.pull().into_result().context("Failed to read input")? else {
            break;
        };
        write_line(out, &item)?;
        on_item(&item);
        printed += 1;

        if let Some(delay) = delay {
            thread::sleep(delay);
        }
    }

    // A cancelled stream ends as released rather than done.
    Ok((printed, matches!(stream.state(), PipelineState::Released)))
}

fn write_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("Failed to serialize record")?;
    writeln!(out).context("Failed to write output")
}
