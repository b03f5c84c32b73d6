//! Contig declarations from VCF headers.
//!
//! A VCF header declares its reference sequences as
//!
//! ```text
//! ##contig=<ID=chr1,length=248956422>
//! ##contig=<ID=HLA-DRB1*15:01:01:01, length=11080>
//! ```
//!
//! Only the ID and length are used. Any further fields after the length
//! (`md5=`, `assembly=`, ...) are accepted and ignored.
use std::io::BufRead;
use tracing::debug;

use crate::error::ShardError;
use crate::file::InputFile;
use crate::genome::{Contig, Contigs, Position};

const META_PREFIX: &str = "#";
const CONTIG_PREFIX: &str = "##contig=";

/// Read the contigs declared in the header of a (possibly gzipped) VCF file.
///
/// Reading stops at the first line that is not a comment, so the variant
/// records themselves are never scanned.
pub fn read_vcf_contigs(filepath: &str) -> Result<Contigs, ShardError> {
    let reader = InputFile::new(filepath).reader()?;
    let contigs = parse_vcf_header(reader)?;
    debug!("read {} contigs from header of {}", contigs.len(), filepath);
    Ok(contigs)
}

/// Collect the contig declarations from the leading metadata lines of `reader`.
pub fn parse_vcf_header<R: BufRead>(reader: R) -> Result<Contigs, ShardError> {
    let mut contigs = Contigs::new();
    for line in reader.lines() {
        let line = line?;
        if !line.starts_with(META_PREFIX) {
            break;
        }
        if line.starts_with(CONTIG_PREFIX) {
            contigs.push(parse_contig_line(&line)?)?;
        }
    }
    Ok(contigs)
}

/// Parse a single `##contig=<ID=NAME,length=LEN>` line.
pub fn parse_contig_line(line: &str) -> Result<Contig, ShardError> {
    let malformed = || ShardError::ParseError(line.to_string());

    let fields = line
        .strip_prefix(CONTIG_PREFIX)
        .and_then(|s| s.strip_prefix("<ID="))
        .ok_or_else(malformed)?;
    let (name, rest) = fields.split_once(',').ok_or_else(malformed)?;
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let rest = rest.strip_prefix("length=").ok_or_else(malformed)?;

    // the length runs up to the closing bracket or the next field
    let end = rest.find(|c: char| c == '>' || c == ',').ok_or_else(malformed)?;
    if !rest[end..].contains('>') {
        return Err(malformed());
    }
    let length: Position = rest[..end].parse().map_err(|_| malformed())?;

    if name.is_empty() {
        return Err(malformed());
    }
    Ok(Contig::new(name, length))
}
