use clap::Parser;
use shardplan::prelude::*;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the sequence lengths file
    #[clap(long, value_parser)]
    seqlens: String,

    /// The number of shards
    #[clap(value_parser)]
    nshards: usize,
}

fn main() -> Result<(), ShardError> {
    let args = Args::parse();
    let contigs = read_seqlens(&args.seqlens)?;
    let plan = ShardPlanner::new(&contigs, args.nshards)?.plan()?;

    for (i, shard) in plan.iter().enumerate() {
        let (contig, start) = shard.start().unwrap_or_default();
        println!("{}\t{}:{}\t{}", i, contig, start, shard.len());
    }

    Ok(())
}
