use crate::domain::model::{criteria_matches, Criteria, Posting, POSTING_FIELDS};
use crate::domain::ports::PostingStore;
use crate::utils::error::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Opens `path` for reading; a missing file is an empty store.
fn open_existing(path: &Path) -> Result<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Comma-separated file with a `title,link,salary,date` header.
#[derive(Debug, Clone)]
pub struct CsvPostingStore {
    path: PathBuf,
}

impl CsvPostingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<Posting>> {
        let Some(file) = open_existing(&self.path)? else {
            return Ok(Vec::new());
        };

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut postings = Vec::new();
        for row in reader.deserialize() {
            let posting: Posting = row?;
            postings.push(posting);
        }
        Ok(postings)
    }
}

impl PostingStore for CsvPostingStore {
    fn add_posting(&self, posting: &Posting) -> Result<()> {
        ensure_parent(&self.path)?;
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_empty)
            .from_writer(file);
        writer.serialize(posting)?;
        writer.flush()?;
        Ok(())
    }

    fn query_postings(&self, criteria: &Criteria) -> Result<Vec<Posting>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|posting| criteria_matches(posting, criteria))
            .collect())
    }

    fn remove_posting(&self, posting: &Posting) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        let rows = self.read_all()?;
        let before = rows.len();

        // 整個檔案重寫，表頭一定保留
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        writer.write_record(POSTING_FIELDS)?;
        let mut kept = 0;
        for row in rows.iter().filter(|row| *row != posting) {
            writer.serialize(row)?;
            kept += 1;
        }
        writer.flush()?;

        let removed = before - kept;
        tracing::debug!("Removed {} row(s) from {}", removed, self.path.display());
        Ok(removed)
    }
}

/// One JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonLinesPostingStore {
    path: PathBuf,
}

impl JsonLinesPostingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_lines(&self) -> Result<Vec<String>> {
        let Some(file) = open_existing(&self.path)? else {
            return Ok(Vec::new());
        };

        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }
}

impl PostingStore for JsonLinesPostingStore {
    fn add_posting(&self, posting: &Posting) -> Result<()> {
        ensure_parent(&self.path)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let line = serde_json::to_string(posting)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn query_postings(&self, criteria: &Criteria) -> Result<Vec<Posting>> {
        let mut postings = Vec::new();
        for line in self.read_lines()? {
            let posting: Posting = serde_json::from_str(&line)?;
            if criteria_matches(&posting, criteria) {
                postings.push(posting);
            }
        }
        Ok(postings)
    }

    fn remove_posting(&self, posting: &Posting) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        let lines = self.read_lines()?;
        let mut kept = Vec::with_capacity(lines.len());
        for line in &lines {
            let stored: Posting = serde_json::from_str(line)?;
            if &stored != posting {
                kept.push(line.as_str());
            }
        }

        let mut file = File::create(&self.path)?;
        for line in &kept {
            writeln!(file, "{}", line)?;
        }

        let removed = lines.len() - kept.len();
        tracing::debug!("Removed {} line(s) from {}", removed, self.path.display());
        Ok(removed)
    }
}
