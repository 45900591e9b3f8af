//! Command-line front end for RDES: encode, decode, inspect, compare ratios.

use clap::{ArgAction, Args, Parser, Subcommand};
use log::{debug, info};
use rand::Rng;
use rdes::bits::byte_to_str;
use rdes::{inspect, CodecConfig, Compressor, Decompressor, Encoded, Variant};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rdes")]
#[command(about = "Delta-encode tables of 31-bit sensor readings")]
#[command(after_help = "CSV FORMAT:\n  \
    One row per line, values separated by commas\n  \
    - Lines starting with # are comments\n  \
    - Empty lines are skipped\n  \
    - Signed columns (--signed) may hold negative values\n\n\
CONFIGURATION:\n  \
    Either --config <file.json> or --columns (plus optional flags).\n  \
    Example JSON: {\"variant\": 3, \"columns\": 2, \"signed_columns\": [1]}")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a CSV table
    Encode {
        /// Input CSV file
        input: PathBuf,
        /// Output file for the compressed stream
        output: PathBuf,
        /// Also write the codec configuration as JSON
        #[arg(long)]
        save_config: Option<PathBuf>,
        #[command(flatten)]
        codec: CodecArgs,
    },
    /// Decompress a stream back to CSV
    Decode {
        /// Compressed input file
        input: PathBuf,
        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        codec: CodecArgs,
    },
    /// List every encoded value with its byte layout
    Inspect {
        /// Compressed input file
        input: PathBuf,
        #[command(flatten)]
        codec: CodecArgs,
    },
    /// Print compression ratios of all variants on synthetic data
    Ratio {
        /// Rows per workload
        #[arg(short, long, default_value = "10000")]
        rows: usize,
    },
}

/// Codec settings, from a JSON file or individual flags
#[derive(Args)]
struct CodecArgs {
    /// JSON file holding a codec configuration
    #[arg(long, conflicts_with_all = ["variant", "columns", "signed", "refresh", "framed"])]
    config: Option<PathBuf>,

    /// Variant: 1, 2 or 3
    #[arg(long, default_value = "3")]
    variant: Variant,

    /// Values per row
    #[arg(long)]
    columns: Option<usize>,

    /// Comma-separated indices of signed columns
    #[arg(long, value_delimiter = ',')]
    signed: Vec<usize>,

    /// Force a raw row after this many delta rows (0 = never)
    #[arg(long, default_value = "0")]
    refresh: u32,

    /// Prefix the stream with a self-describing header
    #[arg(long)]
    framed: bool,
}

impl CodecArgs {
    fn resolve(&self) -> Result<CodecConfig, String> {
        let config = if let Some(path) = &self.config {
            let text = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
            serde_json::from_str(&text).map_err(|e| format!("Invalid config {}: {e}", path.display()))?
        } else {
            let columns = self
                .columns
                .ok_or_else(|| "either --config or --columns is required".to_owned())?;
            CodecConfig::new(self.variant, columns)
                .with_signed_columns(self.signed.iter().copied())
                .with_refresh_interval(self.refresh)
                .with_framing(self.framed)
        };
        config.validate().map_err(|e| e.to_string())?;
        debug!("codec configuration: {config:?}");
        Ok(config)
    }
}

/// Read comma-separated rows from a CSV file
fn read_csv(path: &Path, columns: usize) -> Result<Vec<Vec<i64>>, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open CSV: {e}"))?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let row = trimmed
            .split(',')
            .map(|field| {
                field
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| format!("Line {}: invalid value '{}': {}", line_num + 1, field.trim(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if row.len() != columns {
            return Err(format!(
                "Line {}: expected {} values, got {}",
                line_num + 1,
                columns,
                row.len()
            ));
        }
        rows.push(row);
    }

    Ok(rows)
}

fn encode(input: &Path, output: &Path, save_config: Option<&Path>, config: CodecConfig) -> Result<(), String> {
    let rows = read_csv(input, config.columns)?;
    info!("read {} rows from {}", rows.len(), input.display());

    let mut comp = Compressor::with_capacity(config.clone(), rows.len()).map_err(|e| e.to_string())?;
    for (i, row) in rows.iter().enumerate() {
        comp.write_signed_row(row).map_err(|e| format!("Row {}: {e}", i + 1))?;
    }
    fs::write(output, comp.compressed_data()).map_err(|e| format!("Failed to write output: {e}"))?;

    if let Some(path) = save_config {
        let json = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| format!("Failed to write config: {e}"))?;
    }

    println!("Encoded {} rows with {}", comp.rows_written(), config.variant);
    println!("Output: {} ({} bytes)", output.display(), comp.compressed_size());
    match comp.compression_ratio() {
        Ok(ratio) => println!("Compression: {ratio:.3}x"),
        Err(e) => println!("Compression: {e}"),
    }
    Ok(())
}

fn decode(input: &Path, output: Option<&Path>, config: CodecConfig) -> Result<(), String> {
    let bytes = fs::read(input).map_err(|e| format!("Failed to read {}: {e}", input.display()))?;
    let mut deco = Decompressor::new(config).map_err(|e| e.to_string())?;
    let rows = deco.decompress(&bytes).map_err(|e| e.to_string())?;
    info!("decoded {} rows from {} bytes", rows.len(), bytes.len());

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).map_err(|e| format!("Failed to create output file: {e}"))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for row in &rows {
        let line: Vec<String> = row.iter().map(ToString::to_string).collect();
        writeln!(out, "{}", line.join(",")).map_err(|e| format!("Failed to write row: {e}"))?;
    }
    out.flush().map_err(|e| format!("Failed to write output: {e}"))
}

fn inspect_file(input: &Path, config: &CodecConfig) -> Result<(), String> {
    let bytes = fs::read(input).map_err(|e| format!("Failed to read {}: {e}", input.display()))?;
    let values = inspect(config, &bytes).map_err(|e| e.to_string())?;

    println!("{:>8}  {:>6}  {:>3}  {:<12}  {:<10}  {:>10}", "offset", "row", "col", "lead", "kind", "value");
    for v in &values {
        let kind = match v.encoded {
            Encoded::Raw(_) => "raw".to_owned(),
            Encoded::Delta { level, delta } => format!("{}B {:+}", level.bytes(), delta.signed()),
        };
        println!(
            "{:>8}  {:>6}  {:>3}  {:<12}  {:<10}  {:>10}",
            v.offset,
            v.row,
            v.column,
            byte_to_str(v.bytes[0]),
            kind,
            v.value
        );
    }
    println!("{} values in {} bytes ({})", values.len(), bytes.len(), config.variant);
    Ok(())
}

/// Ratio of every variant after feeding the same single-column sequence
fn ratios(values: &[u32]) -> Result<Vec<f64>, String> {
    Variant::ALL
        .iter()
        .map(|&variant| {
            let mut comp = Compressor::with_capacity(CodecConfig::new(variant, 1), values.len()).map_err(|e| e.to_string())?;
            for &v in values {
                comp.write_row(&[v]).map_err(|e| e.to_string())?;
            }
            comp.compression_ratio().map_err(|e| e.to_string())
        })
        .collect()
}

fn print_ratio_row(label: u32, ratios: &[f64]) {
    let cells: Vec<String> = ratios.iter().map(|r| format!("{r:>8.3}")).collect();
    println!("{label:>13}{}", cells.join(""));
}

/// Linear and random workloads over increments 2^4 .. 2^24
fn ratio(rows: usize) -> Result<(), String> {
    let increments: Vec<u32> = (4..=24).map(|x| 1u32 << x).collect();
    let header: String = Variant::ALL.iter().map(|v| format!("{:>8}", v.to_string())).collect();

    println!("COMPRESSION RATIO: LINEAR ({rows} rows)");
    println!("{:>13}{header}", "Increment");
    for &incr in &increments {
        let values: Vec<u32> = (0..rows).map(|i| if i % 2 == 0 { incr } else { 0 }).collect();
        print_ratio_row(incr, &ratios(&values)?);
    }

    let mut rng = rand::rng();
    println!();
    println!("COMPRESSION RATIO: RANDOM ({rows} rows)");
    println!("{:>13}{header}", "Max increment");
    for &max in &increments {
        let values: Vec<u32> = (0..rows).map(|_| rng.random_range(0..max)).collect();
        print_ratio_row(max, &ratios(&values)?);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Encode {
            input,
            output,
            save_config,
            codec,
        } => encode(&input, &output, save_config.as_deref(), codec.resolve()?),
        Command::Decode { input, output, codec } => decode(&input, output.as_deref(), codec.resolve()?),
        Command::Inspect { input, codec } => inspect_file(&input, &codec.resolve()?),
        Command::Ratio { rows } => ratio(rows),
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
