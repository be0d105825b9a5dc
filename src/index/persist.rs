//! On-disk bundle: index, raw vectors, metadata table and an alignment manifest.

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use ndarray::Array2;
use polars::prelude::{CsvWriter, DataFrame, NamedFrom, SerWriter, Series};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::{
    data::store::ensure_parent,
    error::IndexError,
    index::{FlatL2Index, Neighbor},
};

pub const FORMAT_VERSION: u32 = 1;
const INDEX_MAGIC: [u8; 4] = *b"RIDX";
const VECTORS_MAGIC: [u8; 4] = *b"RVEC";
const METADATA_HEADER: [&str; 3] = ["review_text", "topic", "sentiment"];

/// Where each artefact of the bundle lives.
#[derive(Debug, Clone)]
pub struct BundlePaths {
    pub index: PathBuf,
    pub embeddings: PathBuf,
    pub metadata: PathBuf,
    pub manifest: PathBuf,
}

/// Human-readable fields needed to render a search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub review_text: String,
    pub topic: String,
    pub sentiment: String,
}

/// SHA-256 of each persisted artefact, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    pub index: String,
    pub embeddings: String,
    pub metadata: String,
}

/// Records the row count and dimension every artefact must agree on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub rows: usize,
    pub dim: usize,
    pub backend: String,
    pub created_at: DateTime<Utc>,
    pub checksums: Checksums,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    index: FlatL2Index,
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorFile {
    version: u32,
    vectors: Array2<f32>,
}

/// A search hit resolved against the metadata table.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub neighbor: Neighbor,
    pub record: &'a MetadataRecord,
}

/// Index, vectors and metadata held with their positional alignment.
#[derive(Debug, Clone)]
pub struct IndexBundle {
    pub backend: String,
    pub index: FlatL2Index,
    pub metadata: Vec<MetadataRecord>,
}

impl IndexBundle {
    /// Pair an index with row-aligned metadata.
    pub fn new(
        backend: &str,
        index: FlatL2Index,
        metadata: Vec<MetadataRecord>,
    ) -> Result<Self, IndexError> {
        if index.len() != metadata.len() {
            return Err(IndexError::AlignmentMismatch(format!(
                "{} vectors but {} metadata rows",
                index.len(),
                metadata.len()
            )));
        }
        Ok(Self {
            backend: backend.to_string(),
            index,
            metadata,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>, IndexError> {
        Ok(self
            .index
            .search(query, k)?
            .into_iter()
            .map(|neighbor| SearchHit {
                neighbor,
                record: &self.metadata[neighbor.position],
            })
            .collect())
    }

    /// Write all artefacts, then the manifest describing them.
    pub fn save(&self, paths: &BundlePaths) -> Result<IndexManifest, IndexError> {
        let index_bytes = encode(
            INDEX_MAGIC,
            &IndexFile {
                version: FORMAT_VERSION,
                index: self.index.clone(),
            },
        )?;
        let vector_bytes = encode(
            VECTORS_MAGIC,
            &VectorFile {
                version: FORMAT_VERSION,
                vectors: self.index.vectors().clone(),
            },
        )?;

        write_bytes(&paths.index, &index_bytes)?;
        write_bytes(&paths.embeddings, &vector_bytes)?;
        write_metadata(&self.metadata, &paths.metadata)?;
        let metadata_bytes = std::fs::read(&paths.metadata)?;

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            rows: self.len(),
            dim: self.index.dim(),
            backend: self.backend.clone(),
            created_at: Utc::now(),
            checksums: Checksums {
                index: sha256_hex(&index_bytes),
                embeddings: sha256_hex(&vector_bytes),
                metadata: sha256_hex(&metadata_bytes),
            },
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)
            .map_err(|err| IndexError::Metadata(err.to_string()))?;
        write_bytes(&paths.manifest, &manifest_json)?;

        info!(
            index = %paths.index.display(),
            rows = manifest.rows,
            dim = manifest.dim,
            "saved vector index bundle"
        );
        Ok(manifest)
    }

    /// Reload a bundle, refusing it unless every artefact matches the manifest.
    pub fn load(paths: &BundlePaths) -> Result<(Self, IndexManifest), IndexError> {
        let manifest_text = std::fs::read_to_string(&paths.manifest)?;
        let manifest: IndexManifest = serde_json::from_str(&manifest_text)
            .map_err(|err| IndexError::Metadata(err.to_string()))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(IndexError::AlignmentMismatch(format!(
                "unsupported format version {}",
                manifest.format_version
            )));
        }

        let index_bytes = read_verified(&paths.index, &manifest.checksums.index)?;
        let vector_bytes = read_verified(&paths.embeddings, &manifest.checksums.embeddings)?;
        let metadata_bytes = read_verified(&paths.metadata, &manifest.checksums.metadata)?;

        let index_file: IndexFile = decode(INDEX_MAGIC, &index_bytes, &paths.index)?;
        let vector_file: VectorFile = decode(VECTORS_MAGIC, &vector_bytes, &paths.embeddings)?;
        let metadata = read_metadata(&metadata_bytes)?;

        let index = index_file.index;
        let vectors = vector_file.vectors;
        let agree = index.len() == manifest.rows
            && vectors.nrows() == manifest.rows
            && metadata.len() == manifest.rows
            && index.dim() == manifest.dim
            && vectors.ncols() == manifest.dim;
        if !agree {
            return Err(IndexError::AlignmentMismatch(format!(
                "manifest {}x{}, index {}x{}, vectors {}x{}, metadata {} rows",
                manifest.rows,
                manifest.dim,
                index.len(),
                index.dim(),
                vectors.nrows(),
                vectors.ncols(),
                metadata.len()
            )));
        }
        if index.vectors() != &vectors {
            return Err(IndexError::AlignmentMismatch(
                "vector array differs from indexed vectors".into(),
            ));
        }

        let bundle = Self::new(&manifest.backend, index, metadata)?;
        Ok((bundle, manifest))
    }
}

fn encode<T: Serialize>(magic: [u8; 4], value: &T) -> Result<Vec<u8>, IndexError> {
    let mut bytes = magic.to_vec();
    bytes.extend(bincode::serialize(value)?);
    Ok(bytes)
}

fn decode<T: DeserializeOwned>(magic: [u8; 4], bytes: &[u8], path: &Path) -> Result<T, IndexError> {
    match bytes.strip_prefix(&magic[..]) {
        Some(body) => Ok(bincode::deserialize(body)?),
        None => Err(IndexError::BadFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    ensure_parent(path)?;
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}

fn read_verified(path: &Path, expected: &str) -> Result<Vec<u8>, IndexError> {
    let bytes = std::fs::read(path)?;
    if sha256_hex(&bytes) != expected {
        return Err(IndexError::ChecksumMismatch {
            path: path.to_path_buf(),
        });
    }
    Ok(bytes)
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn write_metadata(records: &[MetadataRecord], path: &Path) -> Result<(), IndexError> {
    ensure_parent(path)?;
    let texts: Vec<String> = records.iter().map(|r| r.review_text.clone()).collect();
    let topics: Vec<String> = records.iter().map(|r| r.topic.clone()).collect();
    let sentiments: Vec<String> = records.iter().map(|r| r.sentiment.clone()).collect();
    let mut df = DataFrame::new(vec![
        Series::new(METADATA_HEADER[0].into(), texts),
        Series::new(METADATA_HEADER[1].into(), topics),
        Series::new(METADATA_HEADER[2].into(), sentiments),
    ])
    .map_err(|err| IndexError::Metadata(err.to_string()))?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .map_err(|err| IndexError::Metadata(err.to_string()))?;
    Ok(())
}

fn read_metadata(bytes: &[u8]) -> Result<Vec<MetadataRecord>, IndexError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|err| IndexError::Metadata(err.to_string()))?;
    if headers.iter().ne(METADATA_HEADER) {
        return Err(IndexError::Metadata(format!(
            "unexpected metadata columns {headers:?}"
        )));
    }
    reader
        .deserialize()
        .collect::<Result<Vec<MetadataRecord>, _>>()
        .map_err(|err| IndexError::Metadata(err.to_string()))
}
