use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::ShardError;
use crate::file::InputFile;

/// The integer type for genomic positions and lengths.
pub type Position = u64;

/// A named reference sequence and its length in bases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Contig {
    pub name: String,
    pub length: Position,
}

impl Contig {
    pub fn new(name: impl Into<String>, length: Position) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// The ordered set of contigs of a genome.
///
/// Insertion order is genome coordinate order. Names are unique and every
/// length is at least one base. The total genome length always fits in a
/// [`Position`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contigs {
    seqlens: IndexMap<String, Position>,
    total_length: Position,
}

impl Contigs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a contig to the end of the genome.
    pub fn push(&mut self, contig: Contig) -> Result<(), ShardError> {
        if contig.length == 0 {
            return Err(ShardError::InvalidInput(format!(
                "contig '{}' has zero length",
                contig.name
            )));
        }
        if self.seqlens.contains_key(&contig.name) {
            return Err(ShardError::InvalidInput(format!(
                "contig '{}' is declared more than once",
                contig.name
            )));
        }
        self.total_length = self
            .total_length
            .checked_add(contig.length)
            .ok_or_else(|| {
                ShardError::InvalidInput(format!(
                    "genome length overflows at contig '{}' (length {})",
                    contig.name, contig.length
                ))
            })?;
        self.seqlens.insert(contig.name, contig.length);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seqlens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqlens.is_empty()
    }

    /// Length of the named contig, if present.
    pub fn get(&self, name: &str) -> Option<Position> {
        self.seqlens.get(name).copied()
    }

    /// The contig at position `index` in genome order.
    pub fn get_index(&self, index: usize) -> Option<(&str, Position)> {
        self.seqlens
            .get_index(index)
            .map(|(name, &length)| (name.as_str(), length))
    }

    /// Iterate over contig name and length tuples, in genome order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Position)> {
        self.seqlens
            .iter()
            .map(|(name, &length)| (name.as_str(), length))
    }

    /// Sum of all contig lengths.
    pub fn total_length(&self) -> Position {
        self.total_length
    }
}

impl TryFrom<Vec<Contig>> for Contigs {
    type Error = ShardError;

    fn try_from(contigs: Vec<Contig>) -> Result<Self, Self::Error> {
        let mut seqlens = Contigs::new();
        for contig in contigs {
            seqlens.push(contig)?;
        }
        Ok(seqlens)
    }
}

/// Read a tab-delimited *genome file* of sequence (i.e. chromosome) names and their lengths.
///
/// Gzip-compressed genome files are also supported.
pub fn read_seqlens(filepath: &str) -> Result<Contigs, ShardError> {
    let reader = InputFile::new(filepath).reader()?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut seqlens = Contigs::new();
    for result in rdr.deserialize() {
        let record: Contig = result?;
        seqlens.push(record)?;
    }
    debug!("read {} contigs from genome file {}", seqlens.len(), filepath);
    Ok(seqlens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_order_is_preserved() {
        let contigs = Contigs::try_from(vec![
            Contig::new("chr2", 50),
            Contig::new("chr1", 100),
            Contig::new("chrM", 16),
        ])
        .unwrap();
        let names: Vec<_> = contigs.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["chr2", "chr1", "chrM"]);
        assert_eq!(contigs.total_length(), 166);
        assert_eq!(contigs.get_index(1), Some(("chr1", 100)));
        assert_eq!(contigs.get("chrM"), Some(16));
    }

    #[test]
    fn test_duplicate_contig() {
        let result = Contigs::try_from(vec![Contig::new("chr1", 10), Contig::new("chr1", 20)]);
        assert!(matches!(result, Err(ShardError::InvalidInput(_))));
    }

    #[test]
    fn test_zero_length_contig() {
        let mut contigs = Contigs::new();
        assert!(matches!(
            contigs.push(Contig::new("chr1", 0)),
            Err(ShardError::InvalidInput(_))
        ));
        assert!(contigs.is_empty());
    }

    #[test]
    fn test_total_length_overflow() {
        let mut contigs = Contigs::new();
        contigs.push(Contig::new("chr1", u64::MAX)).unwrap();
        let result = contigs.push(Contig::new("chr2", 2));
        assert!(matches!(result, Err(ShardError::InvalidInput(_))));
        assert_eq!(contigs.len(), 1);
        assert_eq!(contigs.total_length(), u64::MAX);
    }

    #[test]
    fn test_read_seqlens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("genome.tsv");
        std::fs::write(&path, "chr1\t248956422\nchr2\t242193529\nchrM\t16569\n").unwrap();

        let contigs = read_seqlens(path.to_str().unwrap()).unwrap();
        assert_eq!(contigs.len(), 3);
        assert_eq!(contigs.get("chr2"), Some(242193529));
    }

    #[test]
    fn test_read_seqlens_bad_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("genome.tsv");
        std::fs::write(&path, "chr1\tlots\n").unwrap();

        let result = read_seqlens(path.to_str().unwrap());
        assert!(matches!(result, Err(ShardError::TsvError(_))));
    }
}
