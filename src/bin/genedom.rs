use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use genedom::{
    barcodes::{BarcodeOrder, BarcodeSettings, BarcodesCollection, DistanceMetric},
    batch::{batch_domesticate, BatchSummary, DomesticatorSelector},
    constraint_solver::{SolverSettings, TieBreak},
    dna_sequence::DNAsequence,
    domestication_result::Flank,
    domesticator::{DomesticationOptions, PartDomesticator},
    enzymes::{load_restriction_enzymes_from_path, Enzymes},
    records::{load_records, write_domesticated_fasta, write_summary_csv},
    reports,
    site_pattern::ForbiddenSiteSet,
    standards::{BuiltinStandard, StandardDomesticatorsSet, STANDARDS_VERSION},
    ENZYMES, STANDARDS,
};
use genedom_protocol::{Capabilities, CAPABILITIES_SCHEMA};
use log::info;
use serde::Serialize;
use std::{fs, fs::File, path::PathBuf};

#[derive(Parser, Debug)]
#[command(version, about = "Domesticate DNA parts and design barcodes")]
struct Cli {
    /// Restriction enzyme catalog (JSON) replacing the builtin one
    #[arg(long, global = true)]
    enzymes_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove forbidden sites from every record of a FASTA or GenBank file
    Domesticate(DomesticateArgs),
    /// Generate a set of distance-separated barcodes
    Barcodes(BarcodesArgs),
    /// List forbidden site occurrences in every record of a file
    Sites(SitesArgs),
    /// Describe the builtin assembly standards
    Standards(StandardsArgs),
    /// Machine-readable list of commands, enzymes and standards
    Capabilities,
}

#[derive(Args, Debug)]
struct DomesticateArgs {
    /// FASTA or GenBank file, optionally gzipped
    #[arg(short, long)]
    input: PathBuf,

    /// Builtin standard; the slot is the record id up to the first '_'
    #[arg(long, conflicts_with_all = ["standard_file", "enzymes"])]
    standard: Option<String>,

    /// Standard table (CSV) to use instead of a builtin one
    #[arg(long, conflicts_with = "enzymes")]
    standard_file: Option<PathBuf>,

    /// Sites to remove, by enzyme name, for a single custom domesticator
    #[arg(long, value_delimiter = ',')]
    enzymes: Vec<String>,

    /// Left flank of the custom domesticator
    #[arg(long, requires = "enzymes")]
    left_flank: Option<String>,

    /// Right flank of the custom domesticator
    #[arg(long, requires = "enzymes")]
    right_flank: Option<String>,

    /// Treat every record as coding, overriding the domesticator default
    #[arg(long, conflicts_with = "non_coding")]
    cds: bool,

    /// Treat every record as non-coding
    #[arg(long)]
    non_coding: bool,

    /// Only check; fail records that would need edits
    #[arg(long)]
    no_edits: bool,

    /// Barcode added left of every domesticated part
    #[arg(long)]
    barcode: Option<String>,

    #[arg(long, default_value = "AA")]
    barcode_spacer: String,

    #[arg(long, default_value_t = 1000)]
    max_mutations: usize,

    #[arg(long, value_enum, default_value_t = TieBreakArg::PositionThenBase)]
    tie_break: TieBreakArg,

    /// Directory receiving domesticated.fa and summary.csv
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Appended to record ids in the output FASTA
    #[arg(long, default_value = "")]
    suffix: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TieBreakArg {
    PositionThenBase,
    BaseThenPosition,
}

impl From<TieBreakArg> for TieBreak {
    fn from(value: TieBreakArg) -> Self {
        match value {
            TieBreakArg::PositionThenBase => TieBreak::PositionThenBase,
            TieBreakArg::BaseThenPosition => TieBreak::BaseThenPosition,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricArg {
    Hamming,
    Levenshtein,
}

#[derive(Args, Debug)]
struct BarcodesArgs {
    #[arg(short = 'n', long, default_value_t = 96)]
    count: usize,

    #[arg(short, long, default_value_t = 20)]
    length: usize,

    #[arg(short = 'd', long, default_value_t = 3)]
    min_distance: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = MetricArg::Hamming)]
    metric: MetricArg,

    /// Enzymes whose sites must not occur in any barcode
    #[arg(long, value_delimiter = ',', default_value = "BsaI,BsmBI,BbsI")]
    exclude: Vec<String>,

    #[arg(long, requires = "gc_max")]
    gc_min: Option<f32>,

    #[arg(long, requires = "gc_min")]
    gc_max: Option<f32>,

    /// Lowest melting temperature (°C) of a barcode
    #[arg(long, requires = "tm_max")]
    tm_min: Option<f32>,

    #[arg(long, requires = "tm_min")]
    tm_max: Option<f32>,

    /// Longest stretch two barcodes may share, on either strand
    #[arg(long)]
    max_homology: Option<usize>,

    /// Appended to every barcode
    #[arg(long)]
    spacer: Option<String>,

    #[arg(long, default_value = "B_%03d")]
    names_template: String,

    /// Sort barcodes by sequence instead of draw order
    #[arg(long)]
    sorted: bool,

    #[arg(long, default_value_t = 10_000)]
    max_retries: usize,

    /// Print FASTA instead of JSON
    #[arg(long)]
    fasta: bool,
}

#[derive(Args, Debug)]
struct SitesArgs {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(long, value_delimiter = ',', default_value = "BsaI,BsmBI,BbsI")]
    enzymes: Vec<String>,
}

#[derive(Args, Debug)]
struct StandardsArgs {
    /// Only this standard
    name: Option<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn domesticate(args: DomesticateArgs, enzymes: &Enzymes) -> Result<()> {
    let records = load_records(&args.input)?;
    let mut options = DomesticationOptions {
        is_cds: match (args.cds, args.non_coding) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        allow_edits: !args.no_edits,
        barcode_spacer: args.barcode_spacer,
        solver: SolverSettings {
            max_mutations: args.max_mutations,
            tie_break: args.tie_break.into(),
        },
        ..DomesticationOptions::default()
    };
    if let Some(barcode) = &args.barcode {
        options = options.with_barcode(barcode)?;
    }

    let custom: PartDomesticator;
    let loaded: StandardDomesticatorsSet;
    let selector = if !args.enzymes.is_empty() {
        let left = args.left_flank.as_deref().map(|s| Flank::left("left flank", s)).transpose()?;
        let right = args.right_flank.as_deref().map(|s| Flank::right("right flank", s)).transpose()?;
        custom = PartDomesticator::new("custom", enzymes.forbidden_sites(&args.enzymes)?)
            .with_flanks(left, right);
        DomesticatorSelector::Single(&custom)
    } else if let Some(path) = &args.standard_file {
        loaded = StandardDomesticatorsSet::from_path(path, enzymes)?;
        DomesticatorSelector::Standard(&loaded)
    } else {
        let name = args.standard.as_deref().unwrap_or(BuiltinStandard::MocloPlant.name());
        DomesticatorSelector::Standard(STANDARDS.by_name(name)?)
    };

    let results = batch_domesticate(&records, &selector, &options);
    let summary = BatchSummary::from_results(&results);
    if summary.failed > 0 {
        log::warn!("Failed records: {}", BatchSummary::failed_ids(&results));
    }

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
        write_domesticated_fasta(File::create(dir.join("domesticated.fa"))?, &results, &args.suffix)?;
        write_summary_csv(File::create(dir.join("summary.csv"))?, &results)?;
        info!("Wrote {} domesticated record(s) to {}", summary.succeeded, dir.display());
    }
    print_json(&reports::batch_report(&results))
}

fn barcodes(args: BarcodesArgs, enzymes: &Enzymes) -> Result<()> {
    let settings = BarcodeSettings {
        length: args.length,
        count: args.count,
        min_distance: args.min_distance,
        seed: args.seed,
        metric: match args.metric {
            MetricArg::Hamming => DistanceMetric::Hamming,
            MetricArg::Levenshtein => DistanceMetric::Levenshtein,
        },
        gc_window: args.gc_min.zip(args.gc_max),
        tm_window: args.tm_min.zip(args.tm_max),
        max_homology_length: args.max_homology,
        max_retries: args.max_retries,
        spacer: args.spacer,
        names_template: args.names_template,
        order: match args.sorted {
            true => BarcodeOrder::Sorted,
            false => BarcodeOrder::Drawn,
        },
    };
    let exclude = match args.exclude.is_empty() {
        true => None,
        false => Some(enzymes.forbidden_sites(&args.exclude)?),
    };
    let collection = BarcodesCollection::from_settings(&settings, exclude.as_ref())?;
    if args.fasta {
        print!("{}", collection.to_fasta());
        return Ok(());
    }
    print_json(&reports::barcode_report(&settings, &collection))
}

fn sites(args: SitesArgs, enzymes: &Enzymes) -> Result<()> {
    let forbidden: ForbiddenSiteSet = enzymes.forbidden_sites(&args.enzymes)?;
    let mut out = vec![];
    for record in load_records(&args.input)? {
        let seq = DNAsequence::from_sequence(&record.sequence)
            .map_err(|e| anyhow!("Record {}: {e}", record.id))?;
        let found = genedom::find_sites(&seq, &forbidden);
        out.push(reports::sites_report(&record.id, seq.len(), &found));
    }
    print_json(&out)
}

fn standards(args: StandardsArgs) -> Result<()> {
    match args.name {
        Some(name) => print_json(&reports::standard_report(STANDARDS.by_name(&name)?)),
        None => {
            let all: Vec<_> = STANDARDS.all().map(reports::standard_report).collect();
            print_json(&all)
        }
    }
}

fn capabilities(enzymes: &Enzymes) -> Result<()> {
    print_json(&Capabilities {
        schema: CAPABILITIES_SCHEMA.to_string(),
        version: format!("{} (standards {STANDARDS_VERSION})", env!("CARGO_PKG_VERSION")),
        commands: ["domesticate", "barcodes", "sites", "standards", "capabilities"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        enzymes: enzymes
            .restriction_enzymes()
            .iter()
            .map(|re| re.name.to_owned())
            .collect(),
        standards: BuiltinStandard::ALL.iter().map(|s| s.name().to_string()).collect(),
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let custom_enzymes = match &cli.enzymes_file {
        Some(path) => {
            let Some(path) = path.to_str() else {
                bail!("Enzyme file path is not valid UTF-8");
            };
            Some(load_restriction_enzymes_from_path(path)?)
        }
        None => None,
    };
    let enzymes: &Enzymes = custom_enzymes.as_ref().unwrap_or(&*ENZYMES);

    match cli.command {
        Command::Domesticate(args) => domesticate(args, enzymes),
        Command::Barcodes(args) => barcodes(args, enzymes),
        Command::Sites(args) => sites(args, enzymes),
        Command::Standards(args) => standards(args),
        Command::Capabilities => capabilities(enzymes),
    }
}
