use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use polars::prelude::*;

use primerplate::barcodes::{self, BarcodeTable};
use primerplate::columns::ColumnMap;
use primerplate::well::PlateFormat;
use primerplate::{heatmap, reference, transfer, PlanConfig};

/// primerplate CLI
#[derive(Parser)]
#[command(name = "primerplate")]
#[command(version)]
#[command(about = "Unique primer-pair plate planning, Echo transfer lists and barcode sample sheets", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Plate options shared by `assign` and `batch`.
#[derive(Args, Clone)]
struct PlateArgs {
    /// Primer source plate format (96 or 384)
    #[arg(long, default_value = "384", value_parser = parse_format)]
    source_format: PlateFormat,
    /// Destination plate format (96 or 384)
    #[arg(long, default_value = "384", value_parser = parse_format)]
    dest_format: PlateFormat,
    /// Leading primers per pool reserved for controls
    #[arg(long, default_value_t = primerplate::pool::DEFAULT_OFFSET)]
    offset: usize,
    /// Transfer volume in nL
    #[arg(long, default_value_t = primerplate::plan::DEFAULT_VOLUME_NL)]
    volume: f64,
}

impl PlateArgs {
    fn config(&self, seed: u64, deterministic: bool) -> PlanConfig {
        PlanConfig {
            source: self.source_format,
            destination: self.dest_format,
            offset: self.offset,
            volume: self.volume,
            seed,
            deterministic,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Assign a unique forward/reverse primer pair to every destination well
    Assign {
        #[command(flatten)]
        plate: PlateArgs,
        /// Random seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Ignore --seed and draw from OS entropy
        #[arg(long)]
        random: bool,
        /// Output CSV (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Plan one plate per seed in parallel
    Batch {
        #[command(flatten)]
        plate: PlateArgs,
        /// Comma-separated seeds (e.g. "1,2,3")
        #[arg(long)]
        seeds: String,
        /// Directory receiving one CSV per seed
        #[arg(long)]
        out_dir: PathBuf,
        /// Threads (0/None = all)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Sequential 1:1 Echo transfer of the first N wells
    Transfer {
        /// Number of primers to transfer
        #[arg(short = 'n', long, default_value_t = 384)]
        num_primers: usize,
        /// Source plate format (96 or 384)
        #[arg(short, long, default_value = "96", value_parser = parse_format)]
        source_format: PlateFormat,
        /// Destination plate format (96 or 384)
        #[arg(short, long, default_value = "384", value_parser = parse_format)]
        dest_format: PlateFormat,
        /// Transfer volume in nL
        #[arg(long, default_value_t = 100.0)]
        volume: f64,
        /// Output CSV filename
        #[arg(short, long, default_value = "echo_primer_transfer.csv")]
        output: PathBuf,
    },

    /// Join a transfer CSV with a barcode sequence table into a per-sample index sheet
    Join {
        /// Echo transfer CSV
        transfers: PathBuf,
        /// Barcode sequence table (CSV)
        barcodes: PathBuf,
        /// JSON file with column header synonyms
        #[arg(long)]
        columns: Option<PathBuf>,
        /// Write the sheet as CSV instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a minimap2-compatible TSV (and optional FASTA) from a barcode layout
    Minimap {
        /// Layout CSV with well, barcode name and sequence columns
        input: PathBuf,
        /// Output TSV filename
        #[arg(short, long, default_value = "barcodes_minimap.tsv")]
        output: PathBuf,
        /// Include the well in each reference name (e.g. BC01_A1)
        #[arg(short = 'w', long)]
        include_well: bool,
        /// Also write FASTA to this path
        #[arg(short, long)]
        fasta: Option<PathBuf>,
        /// JSON file with column header synonyms
        #[arg(long)]
        columns: Option<PathBuf>,
    },

    /// Build heatmap coordinates (and optional plate matrix) from a barcode layout
    Heatmap {
        /// Layout CSV with well and barcode name columns
        input: PathBuf,
        /// Output mapping CSV
        #[arg(short, long, default_value = "heatmap_mapping.csv")]
        output: PathBuf,
        /// Also write a plate-shaped matrix to this path
        #[arg(short, long)]
        matrix: Option<PathBuf>,
        /// Plate format for the matrix (96 or 384)
        #[arg(short, long, default_value = "384", value_parser = parse_format)]
        plate_format: PlateFormat,
        /// JSON file with column header synonyms
        #[arg(long)]
        columns: Option<PathBuf>,
    },

    /// List the wells of a plate format
    Wells {
        /// Plate format (96 or 384)
        #[arg(default_value = "384", value_parser = parse_format)]
        format: PlateFormat,
    },
}

fn parse_format(s: &str) -> std::result::Result<PlateFormat, String> {
    s.parse::<PlateFormat>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    match cli.command {
        Commands::Assign { plate, seed, random, output } => {
            let records = primerplate::plan_plate(&plate.config(seed, !random))?;
            match output {
                Some(path) => {
                    transfer::write_transfers(create(&path)?, &records)?;
                    log::info!("wrote {} transfers to {}", records.len(), path.display());
                }
                None => transfer::write_transfers(io::stdout().lock(), &records)?,
            }
        }

        Commands::Batch { plate, seeds, out_dir, threads } => {
            let seeds = parse_seeds(&seeds)?;
            let threads = threads.filter(|&t| t > 0);
            std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
            let plans = primerplate::plan_many(&plate.config(0, true), &seeds, threads)?;
            for (seed, records) in plans {
                let path = out_dir.join(format!("plate_seed{seed}.csv"));
                transfer::write_transfers(create(&path)?, &records)?;
                println!("{}\t{}", seed, path.display());
            }
        }

        Commands::Transfer { num_primers, source_format, dest_format, volume, output } => {
            let records = transfer::sequential_transfers(num_primers, source_format, dest_format, volume)?;
            transfer::write_transfers(create(&output)?, &records)?;
            println!("Generated Echo CSV: {}", output.display());
            println!("  Transfers: {}", records.len());
            println!("  Volume: {} nL per transfer", volume);
        }

        Commands::Join { transfers, barcodes, columns, output } => {
            cmd_join(&transfers, &barcodes, &load_columns(columns.as_deref())?, output.as_deref())?;
        }

        Commands::Minimap { input, output, include_well, fasta, columns } => {
            let layout = reference::read_positions(open(&input)?, &load_columns(columns.as_deref())?)?;
            reference::write_minimap_tsv(create(&output)?, &layout, include_well)?;
            println!("Generated minimap TSV: {}", output.display());
            println!("  Barcodes: {}", layout.len());
            if let Some(fasta) = fasta {
                reference::write_fasta(create(&fasta)?, &layout, include_well)?;
                println!("Generated FASTA file: {}", fasta.display());
            }
        }

        Commands::Heatmap { input, output, matrix, plate_format, columns } => {
            let entries = heatmap::read_named_wells(open(&input)?, &load_columns(columns.as_deref())?)?;
            heatmap::write_mapping(create(&output)?, &entries)?;
            println!("Generated heatmap mapping: {}", output.display());
            println!("  Barcodes: {}", entries.len());
            if let Some(matrix) = matrix {
                let grid = heatmap::plate_matrix(&entries, plate_format);
                heatmap::write_matrix(create(&matrix)?, &grid)?;
                println!("Generated plate layout matrix: {}", matrix.display());
                println!("  Format: {}-well plate ({}x{})", plate_format, plate_format.rows(), plate_format.columns());
            }
        }

        Commands::Wells { format } => {
            cmd_wells(format)?;
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("opening {}", path.display()))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(f))
}

fn load_columns(path: Option<&Path>) -> Result<ColumnMap> {
    match path {
        Some(p) => ColumnMap::from_json_path(p).with_context(|| format!("loading column map {}", p.display())),
        None => Ok(ColumnMap::default()),
    }
}

fn parse_seeds(s: &str) -> Result<Vec<u64>> {
    let seeds = s
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<u64>().with_context(|| format!("invalid seed {t:?}")))
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        anyhow::bail!("no seeds given");
    }
    Ok(seeds)
}

fn configure_polars_display() {
    // Read by the Polars pretty-printer.
    std::env::set_var("POLARS_FMT_TABLE_FORMATTING", "UTF8_FULL");
    std::env::set_var("POLARS_FMT_MAX_COLS", "100000");
    std::env::set_var("POLARS_FMT_MAX_ROWS", "1000000");
    std::env::set_var("POLARS_FMT_STR_LEN", "100000");
    std::env::set_var("POLARS_TABLE_WIDTH", "65535");
}

fn cmd_join(transfers_path: &Path, table_path: &Path, columns: &ColumnMap, output: Option<&Path>) -> Result<()> {
    let records = transfer::read_transfers(open(transfers_path)?)?;
    let table = BarcodeTable::from_csv(open(table_path)?, columns)?;
    let sheet = primerplate::sample_sheet(&records, &table)?;
    let mut df = barcodes::pivot_frame(&sheet)?;

    match output {
        Some(path) => {
            let mut w = create(path)?;
            CsvWriter::new(&mut w).include_header(true).finish(&mut df)?;
            w.flush()?;
            log::info!("wrote {} samples to {}", sheet.len(), path.display());
        }
        None => {
            configure_polars_display();
            println!("{}", df);
        }
    }
    Ok(())
}

fn cmd_wells(format: PlateFormat) -> Result<()> {
    let rows = primerplate::well_rows(format);
    let df = df!(
        "well" => rows.iter().map(|r| r.0.clone()).collect::<Vec<_>>(),
        "row" => rows.iter().map(|r| r.1.to_string()).collect::<Vec<_>>(),
        "column" => rows.iter().map(|r| r.2 as u64).collect::<Vec<_>>(),
    )?;

    configure_polars_display();
    println!("{}", df);
    Ok(())
}
