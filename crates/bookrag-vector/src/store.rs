//! On-disk layout of a corpus.
//!
//! ```text
//! <index_dir>/flat_l2.index     serialized VectorIndex
//! <index_dir>/metadatas.jsonl   {"source": .., "start_char": ..} per line
//! <chunk_dir>/chunks.jsonl      {"content": ..} per line
//! ```
//!
//! Line `i` of both JSONL files and vector id `i` belong to the same chunk.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use bookrag_core::config::RagConfig;
use bookrag_core::traits::VectorIndex;
use bookrag_core::types::{Chunk, ChunkMetadata};
use bookrag_core::{Error, Result};

use crate::corpus::{Corpus, CorpusOrigin};

pub const INDEX_FILE: &str = "flat_l2.index";
pub const METADATA_FILE: &str = "metadatas.jsonl";
pub const CHUNKS_FILE: &str = "chunks.jsonl";

#[derive(Serialize)]
struct ContentRef<'a> {
    content: &'a str,
}

#[derive(Deserialize)]
struct ContentRecord {
    content: String,
}

#[derive(Debug, Clone)]
pub struct CorpusStore {
    index_path: PathBuf,
    metadata_path: PathBuf,
    chunks_path: PathBuf,
}

impl CorpusStore {
    pub fn new(index_dir: &Path, chunk_dir: &Path) -> Self {
        Self {
            index_path: index_dir.join(INDEX_FILE),
            metadata_path: index_dir.join(METADATA_FILE),
            chunks_path: chunk_dir.join(CHUNKS_FILE),
        }
    }

    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(&config.index_dir, &config.chunk_dir)
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn chunks_path(&self) -> &Path {
        &self.chunks_path
    }

    /// Whether a persisted corpus appears to be present.
    ///
    /// Only the index blob is checked. It is renamed into place last, so it
    /// exists only after a save ran to completion; a blob next to missing or
    /// damaged JSONL files is still reported by [`CorpusStore::load`].
    pub fn exists(&self) -> bool {
        self.index_path.is_file()
    }

    /// Write all three components. Each is staged in a temp file next to its
    /// target and renamed into place. Any previous index blob is removed before
    /// the first rename and the new blob goes in last, so the blob only exists
    /// alongside a complete set of JSONL files.
    pub fn save<I: VectorIndex>(&self, corpus: &Corpus<I>) -> Result<()> {
        let blob = corpus.index().serialize()?;

        let chunks_tmp = stage(&self.chunks_path, |w| {
            for chunk in corpus.chunks() {
                write_json_line(w, &ContentRef { content: &chunk.content })?;
            }
            Ok(())
        })?;
        let metadata_tmp = stage(&self.metadata_path, |w| {
            for chunk in corpus.chunks() {
                write_json_line(w, &chunk.metadata)?;
            }
            Ok(())
        })?;
        let index_tmp = stage(&self.index_path, |w| w.write_all(&blob))?;

        self.commit(vec![
            (chunks_tmp, self.chunks_path.as_path()),
            (metadata_tmp, self.metadata_path.as_path()),
            (index_tmp, self.index_path.as_path()),
        ])?;

        info!(
            chunks = corpus.len(),
            index = %self.index_path.display(),
            "Saved corpus"
        );
        Ok(())
    }

    /// Drop the current index blob, then rename each staged file into place
    /// in order. The blob is the last entry, so it marks a finished save.
    fn commit(&self, staged: Vec<(NamedTempFile, &Path)>) -> Result<()> {
        remove_if_present(&self.index_path)?;
        for (tmp, target) in staged {
            persist(tmp, target)?;
        }
        Ok(())
    }

    /// Read all three components back and check that they line up.
    pub fn load<I: VectorIndex>(&self) -> Result<Corpus<I>> {
        let blob = match fs::read(&self.index_path) {
            Ok(blob) => blob,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(missing(&self.index_path)),
            Err(e) => return Err(e.into()),
        };
        let index = I::deserialize(&blob)?;
        let metadata: Vec<ChunkMetadata> = read_json_lines(&self.metadata_path)?;
        let contents: Vec<ContentRecord> = read_json_lines(&self.chunks_path)?;
        debug!(
            vectors = index.len(),
            metadata = metadata.len(),
            contents = contents.len(),
            "Read corpus components"
        );

        if metadata.len() != contents.len() || index.len() != contents.len() {
            return Err(Error::IndexCorruption(format!(
                "component counts disagree: {} vectors, {} metadata records, {} chunk records",
                index.len(),
                metadata.len(),
                contents.len()
            )));
        }

        let chunks = contents
            .into_iter()
            .zip(metadata)
            .map(|(record, metadata)| Chunk { content: record.content, metadata })
            .collect();
        let corpus = Corpus::new(chunks, index, CorpusOrigin::Loaded)?;
        info!(chunks = corpus.len(), "Loaded corpus from {}", self.index_path.display());
        Ok(corpus)
    }
}

fn missing(path: &Path) -> Error {
    Error::IndexCorruption(format!("missing component {}", path.display()))
}

fn write_json_line<T: Serialize>(w: &mut dyn Write, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *w, value).map_err(io::Error::from)?;
    w.write_all(b"\n")
}

fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(missing(path)),
        Err(e) => return Err(e.into()),
    };
    let mut records = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            Error::IndexCorruption(format!("{}:{}: {e}", path.display(), line_no + 1))
        })?;
        records.push(record);
    }
    Ok(records)
}

fn stage<F>(target: &Path, write: F) -> Result<NamedTempFile>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn persist(tmp: NamedTempFile, target: &Path) -> Result<()> {
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
