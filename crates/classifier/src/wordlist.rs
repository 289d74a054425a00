//! Newline-delimited word lists.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ClassifyError;

/// Read one entry per line. Blank lines are dropped; everything else is
/// kept verbatim so validation (and its counters) happen in the classifier.
pub fn read_words<R: BufRead>(reader: R) -> Result<Vec<String>, ClassifyError> {
    let mut words = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            words.push(line);
        }
    }
    Ok(words)
}

pub fn read_words_from_path(path: &Path) -> Result<Vec<String>, ClassifyError> {
    let file = File::open(path)?;
    let words = read_words(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), count = words.len(), "word_list_loaded");
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn skips_blank_lines() {
        let input = Cursor::new("tea\n\n  \neat\r\nit's\n");
        let words = read_words(input).unwrap();
        assert_eq!(words, vec!["tea", "eat", "it's"]);
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen").unwrap();
        writeln!(file, "silent").unwrap();
        let words = read_words_from_path(file.path()).unwrap();
        assert_eq!(words, vec!["listen", "silent"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_words_from_path(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ClassifyError::Io(_)));
    }
}
