//! Functionality for partitioning a genome into evenly-sized shards.
//!
//! A genome is described by its ordered [`Contigs`], usually read from the
//! `##contig=<ID=...,length=...>` lines of a VCF header with
//! [`read_vcf_contigs`], or from a TSV "genome file" of names and lengths
//! with [`read_seqlens`]. The [`ShardPlanner`] then walks the concatenated
//! genome and cuts it into the requested number of [`Shard`]s. Each shard is
//! a run of 1-based, inclusive [`Interval`]s, and may span the tail of one
//! contig and the head of the next.
//!
//! ```no_run
//! use shardplan::prelude::*;
//! let contigs = read_vcf_contigs("sample.g.vcf.gz")
//!                   .expect("could not read VCF header");
//!
//! for shard in ShardPlanner::new(&contigs, 20000).expect("invalid shard count") {
//!     let shard = shard.expect("planning failed");
//!     println!("{} bases starting at {:?}", shard.len(), shard.start());
//! }
//! ```
//!
//! Plans are written as TSV, one shard per line, each interval contributing
//! `contig<TAB>start<TAB>end`, and can be read back with
//! [`ShardPlan::read_tsv`].

pub mod error;
pub mod file;
pub mod genome;
pub mod header;
pub mod shard;

pub use error::ShardError;
pub use genome::{read_seqlens, Contig, Contigs, Position};
pub use header::read_vcf_contigs;
pub use shard::{Interval, Shard, ShardPlan, ShardPlanner, ShardWriter};

pub mod prelude {
    pub use crate::error::ShardError;
    pub use crate::genome::{read_seqlens, Contig, Contigs, Position};
    pub use crate::header::read_vcf_contigs;
    pub use crate::shard::{Interval, Shard, ShardPlan, ShardPlanner, ShardWriter};
}
