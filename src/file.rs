//! Plaintext and gzip-compressed file input and output.
//!
//! VCF files are very often bgzipped (`.g.vcf.gz`), so [`InputFile`]
//! sniffs the gzip magic bytes rather than trusting the extension.
//! [`OutputFile`] compresses when the output path ends in `.gz`.
//!
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("could not open '{path}': {source}")]
    OpenError { path: PathBuf, source: io::Error },
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check if a file is gzipped by looking for the magic numbers.
///
/// Files shorter than the magic number are never gzipped.
fn is_gzipped_file(file_path: &Path) -> io::Result<bool> {
    let file = File::open(file_path)?;
    let mut buffer = Vec::with_capacity(GZIP_MAGIC.len());
    file.take(GZIP_MAGIC.len() as u64).read_to_end(&mut buffer)?;
    Ok(buffer == GZIP_MAGIC)
}

/// An input file that may or may not be gzip-compressed.
pub struct InputFile {
    pub filepath: PathBuf,
}

impl InputFile {
    pub fn new(filepath: impl AsRef<Path>) -> Self {
        Self {
            filepath: filepath.as_ref().to_path_buf(),
        }
    }

    /// Opens the file and returns a buffered reader, decompressing if needed.
    ///
    /// `MultiGzDecoder` is used so that bgzip files (a series of gzip members)
    /// are read through to the end.
    pub fn reader(&self) -> Result<BufReader<Box<dyn Read>>, FileError> {
        let open_error = |source| FileError::OpenError {
            path: self.filepath.clone(),
            source,
        };
        let file = File::open(&self.filepath).map_err(open_error)?;
        let is_gzipped = is_gzipped_file(&self.filepath).map_err(open_error)?;
        let reader: Box<dyn Read> = if is_gzipped {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(BufReader::new(reader))
    }
}

/// An output destination: a (possibly gzip-compressed) file, or standard out.
pub struct OutputFile {
    pub filepath: Option<PathBuf>,
}

impl OutputFile {
    /// Constructs a new `OutputFile`. `None` means standard out.
    pub fn new(filepath: Option<&Path>) -> Self {
        Self {
            filepath: filepath.map(Path::to_path_buf),
        }
    }

    /// Opens the destination and returns a buffered writer.
    ///
    /// If the file path ends with ".gz", output is gzip-compressed. Call
    /// [`OutputWriter::finish`] once done writing.
    pub fn writer(&self) -> Result<OutputWriter, FileError> {
        let Some(outfile) = &self.filepath else {
            return Ok(OutputWriter::Stdout(BufWriter::new(io::stdout())));
        };
        let file = File::create(outfile).map_err(|source| FileError::OpenError {
            path: outfile.clone(),
            source,
        })?;
        let is_gzip = outfile.extension().map_or(false, |ext| ext == "gz");
        let writer = if is_gzip {
            OutputWriter::Gzip(BufWriter::new(GzEncoder::new(file, Compression::default())))
        } else {
            OutputWriter::File(BufWriter::new(file))
        };
        Ok(writer)
    }
}

/// The writer behind an [`OutputFile`].
pub enum OutputWriter {
    Stdout(BufWriter<io::Stdout>),
    File(BufWriter<File>),
    Gzip(BufWriter<GzEncoder<File>>),
}

impl OutputWriter {
    /// Flush all buffered output and, for gzip output, write the trailer.
    ///
    /// Errors here mean the output is truncated.
    pub fn finish(self) -> io::Result<()> {
        match self {
            OutputWriter::Stdout(mut writer) => writer.flush(),
            OutputWriter::File(mut writer) => writer.flush(),
            OutputWriter::Gzip(writer) => {
                let encoder = writer.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?;
                Ok(())
            }
        }
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputWriter::Stdout(writer) => writer.write(buf),
            OutputWriter::File(writer) => writer.write(buf),
            OutputWriter::Gzip(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputWriter::Stdout(writer) => writer.flush(),
            OutputWriter::File(writer) => writer.flush(),
            OutputWriter::Gzip(writer) => writer.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use tempfile::tempdir;

    #[test]
    fn test_plain_and_gzip_input() {
        let dir = tempdir().unwrap();
        let plain = dir.path().join("plain.txt");
        let gz = dir.path().join("compressed.txt.gz");
        std::fs::write(&plain, "##contig=<ID=chr1,length=10>\n").unwrap();

        let mut writer = OutputFile::new(Some(gz.as_path())).writer().unwrap();
        writeln!(writer, "##contig=<ID=chr1,length=10>").unwrap();
        writer.finish().unwrap();

        for path in [&plain, &gz] {
            let mut line = String::new();
            InputFile::new(path)
                .reader()
                .unwrap()
                .read_line(&mut line)
                .unwrap();
            assert_eq!(line, "##contig=<ID=chr1,length=10>\n");
        }
        assert!(is_gzipped_file(&gz).unwrap());
        assert!(!is_gzipped_file(&plain).unwrap());
    }

    #[test]
    fn test_finished_gzip_is_complete() {
        let dir = tempdir().unwrap();
        let gz = dir.path().join("shards.tsv.gz");
        let mut writer = OutputFile::new(Some(gz.as_path())).writer().unwrap();
        assert!(matches!(writer, OutputWriter::Gzip(_)));
        for i in 0..1000 {
            writeln!(writer, "chr1\t{}\t{}", i * 10 + 1, i * 10 + 10).unwrap();
        }
        writer.finish().unwrap();

        // a single-member decoder fails on a missing trailer
        let mut contents = String::new();
        flate2::read::GzDecoder::new(File::open(&gz).unwrap())
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents.lines().count(), 1000);
        assert_eq!(contents.lines().last(), Some("chr1\t9991\t10000"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_gzip_finish_reports_write_errors() {
        let full = File::options().write(true).open("/dev/full").unwrap();
        let mut writer =
            OutputWriter::Gzip(BufWriter::new(GzEncoder::new(full, Compression::default())));
        writeln!(writer, "chr1\t1\t10").unwrap();
        assert!(writer.finish().is_err());
    }

    #[test]
    fn test_short_file_is_not_gzipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny");
        std::fs::write(&path, "#").unwrap();
        assert!(!is_gzipped_file(&path).unwrap());
    }

    #[test]
    fn test_missing_file() {
        let result = InputFile::new("/nonexistent/input.vcf").reader();
        assert!(matches!(result, Err(FileError::OpenError { .. })));
    }
}
