use clap::{error::ErrorKind, Parser, ValueEnum};
use shardplan::file::OutputFile;
use shardplan::{read_seqlens, read_vcf_contigs, ShardError, ShardPlanner, ShardWriter};
use std::path::Path;
use tracing_subscriber::EnvFilter;

const INFO: &str = "\
shardplan: pick evenly-spaced shard boundaries over a genome
usage: shardplan [--help] <nshards> <input-file>

The contig names and lengths are read from the ##contig lines of the
input's VCF header. Each output line is one shard: a tab-separated
sequence of contig, start (1-based, inclusive), end (1-based, inclusive)
triplets.
";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// A VCF (or gVCF), plain or gzip-compressed; contigs come from its header
    Vcf,
    /// A headerless TSV genome file of contig names and lengths
    Seqlens,
}

#[derive(Parser)]
#[clap(name = "shardplan")]
#[clap(version)]
#[clap(about = INFO)]
struct Cli {
    /// Increase logging on standard error (-d for info, -dd for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// The number of shards to cut the genome into
    #[arg(required = true)]
    nshards: usize,

    /// The file to read contig names and lengths from
    #[arg(required = true)]
    input: String,

    /// How to read the input file
    #[arg(long, value_enum, default_value_t = InputFormat::Vcf)]
    format: InputFormat,

    /// The output file path (if not set, uses standard out; `.gz` paths are compressed)
    #[arg(short, long)]
    output: Option<String>,

    /// Verify that the plan covers every base exactly once before writing it
    #[arg(long, default_value_t = false)]
    check: bool,
}

fn init_logging(debug: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match debug {
        0 => EnvFilter::new("shardplan=warn"),
        1 => EnvFilter::new("shardplan=info"),
        _ => EnvFilter::new("shardplan=debug"),
    });

    // standard out carries the plan
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), ShardError> {
    let contigs = match cli.format {
        InputFormat::Vcf => read_vcf_contigs(&cli.input)?,
        InputFormat::Seqlens => read_seqlens(&cli.input)?,
    };
    let planner = ShardPlanner::new(&contigs, cli.nshards)?;

    if cli.check {
        let plan = planner.plan()?;
        plan.check_coverage(&contigs)?;
        return plan.write_tsv(cli.output.as_deref());
    }

    // stream shards out as they close
    let output = OutputFile::new(cli.output.as_deref().map(Path::new));
    let mut writer = ShardWriter::new(output.writer()?);
    for shard in planner {
        writer.write_shard(&shard?)?;
    }
    writer.into_inner()?.finish()?;
    Ok(())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => std::process::exit(0),
                _ => std::process::exit(1),
            }
        }
    };
    init_logging(cli.debug);

    match run(&cli) {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
