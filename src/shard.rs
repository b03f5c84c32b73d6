use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ShardError;
use crate::file::{InputFile, OutputFile};
use crate::genome::{Contigs, Position};

/// A closed, 1-based genomic range on a single contig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub contig: String,
    /// First base, 1-based, inclusive.
    pub start: Position,
    /// Last base, 1-based, inclusive.
    pub end: Position,
}

impl Interval {
    pub fn new(contig: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            contig: contig.into(),
            start,
            end,
        }
    }

    /// The number of bases covered.
    pub fn len(&self) -> Position {
        self.end - self.start + 1
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

/// A unit of downstream work: an ordered run of intervals in genome order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub intervals: Vec<Interval>,
}

impl Shard {
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    /// Total number of bases in this shard.
    pub fn len(&self) -> Position {
        self.intervals.iter().map(Interval::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// The first base of the shard, as `(contig, position)`.
    pub fn start(&self) -> Option<(&str, Position)> {
        self.intervals
            .first()
            .map(|interval| (interval.contig.as_str(), interval.start))
    }

    /// The flattened `contig, start, end, contig, start, end, ...` fields.
    fn fields(&self) -> Vec<String> {
        self.intervals
            .iter()
            .flat_map(|interval| {
                [
                    interval.contig.clone(),
                    interval.start.to_string(),
                    interval.end.to_string(),
                ]
            })
            .collect()
    }
}

/// Walks the concatenated genome and cuts it into `nshards` shards.
///
/// Every shard except the last holds `total_length / nshards` bases; the last
/// one absorbs the remainder of the integer division. Shards are produced
/// lazily, so only the shard being built is held in memory.
///
/// ```
/// use shardplan::prelude::*;
/// let contigs = Contigs::try_from(vec![Contig::new("chr1", 100), Contig::new("chr2", 50)])?;
/// let plan = ShardPlanner::new(&contigs, 3)?.plan()?;
/// assert_eq!(plan.shards[1].intervals, vec![Interval::new("chr1", 51, 100)]);
/// # Ok::<(), ShardError>(())
/// ```
pub struct ShardPlanner<'a> {
    contigs: &'a Contigs,
    nshards: usize,
    total_length: Position,
    target_shard_length: Position,
    /// Index of the contig the cursor is on.
    contig_index: usize,
    /// Next unconsumed base on the current contig.
    cursor: Position,
    /// Bases still needed to close the current shard.
    remaining_in_shard: Position,
    shards_emitted: usize,
    bases_emitted: Position,
    done: bool,
}

impl<'a> ShardPlanner<'a> {
    /// Create a planner, checking that `nshards` shards of at least one base
    /// each can be cut from `contigs`.
    pub fn new(contigs: &'a Contigs, nshards: usize) -> Result<Self, ShardError> {
        if nshards < 1 {
            return Err(ShardError::InvalidInput(
                "the number of shards must be at least 1".to_string(),
            ));
        }
        if contigs.is_empty() {
            return Err(ShardError::InvalidInput("no contigs found".to_string()));
        }
        let total_length = contigs.total_length();
        let target_shard_length = total_length / nshards as Position;
        if target_shard_length < 1 {
            return Err(ShardError::InvalidInput(format!(
                "cannot cut {} shards from a genome of {} bases",
                nshards, total_length
            )));
        }
        debug!(
            "planning {} shards of {} bases over {} contigs ({} bases)",
            nshards,
            target_shard_length,
            contigs.len(),
            total_length
        );

        let mut planner = Self {
            contigs,
            nshards,
            total_length,
            target_shard_length,
            contig_index: 0,
            cursor: 1,
            remaining_in_shard: 0,
            shards_emitted: 0,
            bases_emitted: 0,
            done: false,
        };
        planner.remaining_in_shard = planner.next_quota();
        Ok(planner)
    }

    /// The nominal size of every shard but the last.
    pub fn target_shard_length(&self) -> Position {
        self.target_shard_length
    }

    pub fn total_length(&self) -> Position {
        self.total_length
    }

    /// Run the planner to completion.
    pub fn plan(self) -> Result<ShardPlan, ShardError> {
        let total_length = self.total_length;
        let shards = self.collect::<Result<Vec<_>, _>>()?;
        let plan = ShardPlan { shards };
        info!(
            "planned {} shards covering {} bases",
            plan.len(),
            total_length
        );
        Ok(plan)
    }

    /// The size of the shard that starts now: the final shard takes
    /// everything not yet assigned.
    fn next_quota(&self) -> Position {
        if self.shards_emitted + 1 == self.nshards {
            self.total_length - self.bases_emitted
        } else {
            self.target_shard_length
        }
    }
}

impl<'a> Iterator for ShardPlanner<'a> {
    type Item = Result<Shard, ShardError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let contigs = self.contigs;
        let mut intervals = Vec::new();
        while let Some((name, length)) = contigs.get_index(self.contig_index) {
            if self.cursor > length {
                self.contig_index += 1;
                self.cursor = 1;
                continue;
            }
            let available = length - self.cursor + 1;
            if available < self.remaining_in_shard {
                // the rest of this contig doesn't fill the shard
                intervals.push(Interval::new(name, self.cursor, length));
                self.remaining_in_shard -= available;
                self.bases_emitted += available;
                self.contig_index += 1;
                self.cursor = 1;
            } else {
                let end = self.cursor + self.remaining_in_shard - 1;
                intervals.push(Interval::new(name, self.cursor, end));
                self.bases_emitted += self.remaining_in_shard;
                self.cursor = end + 1;
                self.shards_emitted += 1;
                self.remaining_in_shard = self.next_quota();
                debug!("closed shard {} at {}:{}", self.shards_emitted, name, end);
                return Some(Ok(Shard::new(intervals)));
            }
        }
        self.done = true;
        if intervals.is_empty() {
            None
        } else {
            // The last shard's quota is exactly what is left of the genome,
            // so it always closes on the final base.
            Some(Err(ShardError::InternalError(format!(
                "{} bases left unassigned after {} of {} shards",
                intervals.iter().map(Interval::len).sum::<Position>(),
                self.shards_emitted,
                self.nshards
            ))))
        }
    }
}

/// Streams shards as TSV lines, one shard per line.
pub struct ShardWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ShardWriter<W> {
    pub fn new(writer: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(writer);
        Self { writer }
    }

    pub fn write_shard(&mut self, shard: &Shard) -> Result<(), ShardError> {
        self.writer.write_record(shard.fields())?;
        Ok(())
    }

    /// Flush the buffered lines and return the underlying writer.
    pub fn into_inner(self) -> Result<W, ShardError> {
        self.writer
            .into_inner()
            .map_err(|e| ShardError::IOError(e.into_error()))
    }
}

/// An ordered partition of a genome into shards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardPlan {
    pub shards: Vec<Shard>,
}

impl ShardPlan {
    /// Return the number of shards in the plan.
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shard> {
        self.shards.iter()
    }

    /// Total number of bases over all shards.
    pub fn total_length(&self) -> Position {
        self.shards.iter().map(Shard::len).sum()
    }

    /// The first base of each shard: the cut points between shards.
    pub fn starts(&self) -> Vec<(&str, Position)> {
        self.shards.iter().filter_map(Shard::start).collect()
    }

    /// Check that the plan covers `contigs` exactly once, in order, from the
    /// first to the last base of each contig, with no empty shards.
    pub fn check_coverage(&self, contigs: &Contigs) -> Result<(), ShardError> {
        let mut expected = contigs.iter().peekable();
        let mut cursor: Position = 1;
        for (i, shard) in self.shards.iter().enumerate() {
            if shard.is_empty() {
                return Err(ShardError::InvalidInput(format!("shard {} is empty", i)));
            }
            for interval in &shard.intervals {
                let Some(&(name, length)) = expected.peek() else {
                    return Err(ShardError::InvalidInput(format!(
                        "shard {}: {} lies past the end of the genome",
                        i, interval
                    )));
                };
                if interval.contig != name || interval.start != cursor {
                    return Err(ShardError::InvalidInput(format!(
                        "shard {}: expected an interval starting at {}:{}, found {}",
                        i, name, cursor, interval
                    )));
                }
                if interval.end < interval.start || interval.end > length {
                    return Err(ShardError::InvalidInput(format!(
                        "shard {}: {} is outside of {} (length {})",
                        i, interval, name, length
                    )));
                }
                if interval.end == length {
                    expected.next();
                    cursor = 1;
                } else {
                    cursor = interval.end + 1;
                }
            }
        }
        if let Some((name, _)) = expected.next() {
            return Err(ShardError::InvalidInput(format!(
                "{}:{} onwards is not covered by any shard",
                name, cursor
            )));
        }
        Ok(())
    }

    /// Read a plan from a (possibly gzipped) TSV file.
    ///
    /// Each line is a tab-separated sequence of `contig, start, end` triplets.
    /// Lines starting with `#` and empty lines are skipped.
    pub fn read_tsv(filepath: &str) -> Result<ShardPlan, ShardError> {
        let reader = InputFile::new(filepath).reader()?;
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut shards = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let fields: Vec<&str> = record.iter().collect();
            let line = || fields.join("\t");
            if fields.is_empty() || fields.len() % 3 != 0 {
                return Err(ShardError::ParseError(format!(
                    "expected fields in groups of 3, got {}: {}",
                    fields.len(),
                    line()
                )));
            }
            let mut intervals = Vec::with_capacity(fields.len() / 3);
            for triplet in fields.chunks(3) {
                let parse = |field: &str| -> Result<Position, ShardError> {
                    field.parse().map_err(|_| {
                        ShardError::ParseError(format!(
                            "failed to parse position '{}': {}",
                            field,
                            line()
                        ))
                    })
                };
                if triplet[0].is_empty() {
                    return Err(ShardError::ParseError(format!(
                        "empty contig name: {}",
                        line()
                    )));
                }
                let start = parse(triplet[1])?;
                let end = parse(triplet[2])?;
                if start < 1 || end < start {
                    return Err(ShardError::ParseError(format!(
                        "improper interval {}:{}-{}: {}",
                        triplet[0],
                        start,
                        end,
                        line()
                    )));
                }
                intervals.push(Interval::new(triplet[0], start, end));
            }
            shards.push(Shard::new(intervals));
        }
        debug!("read {} shards from {}", shards.len(), filepath);
        Ok(ShardPlan { shards })
    }

    /// Write the plan as TSV, one shard per line.
    ///
    /// # Arguments
    ///  * `filepath`: the file to write to. If it has a `.gz` extension, the
    ///  output will be gzip compressed. If `None`, the plan is written to
    ///  standard out.
    pub fn write_tsv(&self, filepath: Option<&str>) -> Result<(), ShardError> {
        let output = OutputFile::new(filepath.map(Path::new));
        let mut writer = ShardWriter::new(output.writer()?);
        for shard in &self.shards {
            writer.write_shard(shard)?;
        }
        writer.into_inner()?.finish()?;
        Ok(())
    }
}
