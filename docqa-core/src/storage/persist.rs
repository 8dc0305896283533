//! Index persistence
//!
//! A saved index is a directory holding:
//! - `vectors.parquet` — chunk ids and normalized vectors (ZSTD)
//! - `chunks.json` — chunk texts in index order
//! - `metadata.json` — chunk metadata in index order
//! - `manifest.json` — dimension, record count and model id, written last

use super::index::VectorIndex;
use super::manifest::IndexManifest;
use super::{IndexError, Result};
use crate::embeddings::chunker::ChunkMetadata;
use arrow::array::{Array, ArrayRef, FixedSizeListArray, Float32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ndarray::Array2;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const VECTORS_FILE: &str = "vectors.parquet";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const METADATA_FILE: &str = "metadata.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Model id recorded for indexes loaded without a manifest
const UNKNOWN_MODEL: &str = "unknown";

impl VectorIndex {
    /// Write the index to `dir`, creating it if needed
    ///
    /// A failed save leaves `self` untouched and searchable.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| persistence(dir, e))?;

        // a stale manifest must not vouch for a half-rewritten index
        let manifest_path = dir.join(MANIFEST_FILE);
        match fs::remove_file(&manifest_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(persistence(&manifest_path, e)),
        }

        self.write_vectors(&dir.join(VECTORS_FILE))?;
        write_json(&dir.join(CHUNKS_FILE), self.texts())?;
        write_json(&dir.join(METADATA_FILE), self.metadata())?;

        let manifest = IndexManifest::new(self.dimension(), self.len(), self.model_id());
        write_json(&manifest_path, &manifest)?;

        log::info!("Saved index ({} vectors) to {}", self.len(), dir.display());
        Ok(())
    }

    /// Save to `primary`, retrying once at `fallback` on a persistence failure
    ///
    /// Returns the directory the index was written to.
    pub fn save_with_fallback(&self, primary: &Path, fallback: &Path) -> Result<PathBuf> {
        match self.save(primary) {
            Ok(()) => Ok(primary.to_path_buf()),
            Err(IndexError::Persistence { path, reason }) => {
                log::warn!(
                    "Could not save index to {} ({}), trying {}",
                    path.display(),
                    reason,
                    fallback.display()
                );
                self.save(fallback)?;
                Ok(fallback.to_path_buf())
            }
            Err(e) => Err(e),
        }
    }

    /// Load an index previously written by [`VectorIndex::save`]
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let vectors_path = dir.join(VECTORS_FILE);
        let chunks_path = dir.join(CHUNKS_FILE);
        let metadata_path = dir.join(METADATA_FILE);
        for path in [&vectors_path, &chunks_path, &metadata_path] {
            if !path.is_file() {
                return Err(IndexError::NotFound(path.clone()));
            }
        }

        let manifest = Self::read_manifest(dir)?;
        let texts: Vec<String> = read_json(&chunks_path)?;
        let metadata: Vec<ChunkMetadata> = read_json(&metadata_path)?;
        let (chunk_ids, vectors) = read_vectors(&vectors_path)?;

        let corrupt = |reason: String| IndexError::Corruption {
            path: dir.to_path_buf(),
            reason,
        };

        if texts.len() != metadata.len() || texts.len() != chunk_ids.len() {
            return Err(corrupt(format!(
                "store lengths differ: {} texts, {} metadata, {} vectors",
                texts.len(),
                metadata.len(),
                chunk_ids.len()
            )));
        }
        if texts.is_empty() {
            return Err(corrupt("index holds no records".to_string()));
        }
        if let Some(pos) = chunk_ids
            .iter()
            .zip(&metadata)
            .position(|(id, meta)| *id != meta.chunk_id)
        {
            return Err(corrupt(format!(
                "chunk id {} at position {} does not match metadata chunk id {}",
                chunk_ids[pos], pos, metadata[pos].chunk_id
            )));
        }

        let model_id = match &manifest {
            Some(manifest) => {
                if manifest.record_count != texts.len() {
                    return Err(corrupt(format!(
                        "manifest records {} entries, stores hold {}",
                        manifest.record_count,
                        texts.len()
                    )));
                }
                if manifest.vector_dimension != vectors.ncols() {
                    return Err(corrupt(format!(
                        "manifest dimension {} does not match stored dimension {}",
                        manifest.vector_dimension,
                        vectors.ncols()
                    )));
                }
                manifest.embedding_model_id.clone()
            }
            None => {
                log::warn!(
                    "No manifest in {}, inferring dimension {} from vectors",
                    dir.display(),
                    vectors.ncols()
                );
                UNKNOWN_MODEL.to_string()
            }
        };

        log::info!("Loaded index ({} vectors) from {}", texts.len(), dir.display());
        Ok(Self::from_parts(model_id, vectors, texts, metadata))
    }

    /// Read the manifest of a saved index, if it has one
    pub fn read_manifest(dir: impl AsRef<Path>) -> Result<Option<IndexManifest>> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn write_vectors(&self, path: &Path) -> Result<()> {
        let dimension = i32::try_from(self.dimension())
            .map_err(|_| persistence(path, "dimension does not fit the vector schema"))?;
        let item = Arc::new(Field::new("item", DataType::Float32, false));
        let schema = Arc::new(Schema::new(vec![
            Field::new("chunk_id", DataType::UInt64, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(item.clone(), dimension),
                false,
            ),
        ]));

        let chunk_ids = UInt64Array::from_iter_values(self.metadata().iter().map(|m| m.chunk_id));
        let values = Float32Array::from_iter_values(self.vectors().iter().copied());
        let embeddings = FixedSizeListArray::try_new(item, dimension, Arc::new(values), None)
            .map_err(|e| persistence(path, e))?;

        let columns: Vec<ArrayRef> = vec![Arc::new(chunk_ids), Arc::new(embeddings)];
        let batch = RecordBatch::try_new(schema.clone(), columns).map_err(|e| persistence(path, e))?;

        let file = File::create(path).map_err(|e| persistence(path, e))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(Default::default()))
            .build();
        let mut writer =
            ArrowWriter::try_new(file, schema, Some(props)).map_err(|e| persistence(path, e))?;
        writer.write(&batch).map_err(|e| persistence(path, e))?;
        writer.close().map_err(|e| persistence(path, e))?;

        Ok(())
    }
}

fn read_vectors(path: &Path) -> Result<(Vec<u64>, Array2<f32>)> {
    let corrupt = |reason: String| IndexError::Corruption {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| corrupt(e.to_string()))?
        .build()
        .map_err(|e| corrupt(e.to_string()))?;

    let mut chunk_ids = Vec::new();
    let mut flat = Vec::new();
    let mut dimension: Option<usize> = None;

    for batch in reader {
        let batch = batch.map_err(|e| corrupt(e.to_string()))?;

        let ids = batch
            .column_by_name("chunk_id")
            .and_then(|c| c.as_any().downcast_ref::<UInt64Array>())
            .ok_or_else(|| corrupt("missing chunk_id column".to_string()))?;
        let embeddings = batch
            .column_by_name("embedding")
            .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
            .ok_or_else(|| corrupt("missing embedding column".to_string()))?;

        let width = embeddings.value_length() as usize;
        match dimension {
            Some(d) if d != width => {
                return Err(corrupt(format!("mixed vector widths {} and {}", d, width)));
            }
            _ => dimension = Some(width),
        }

        chunk_ids.extend(ids.values().iter().copied());
        for row in 0..embeddings.len() {
            let values = embeddings.value(row);
            let values = values
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| corrupt("embedding values are not Float32".to_string()))?;
            flat.extend_from_slice(values.values());
        }
    }

    let dimension = dimension.unwrap_or(0);
    if dimension == 0 {
        return Err(corrupt("no vectors stored".to_string()));
    }
    let vectors = Array2::from_shape_vec((chunk_ids.len(), dimension), flat)
        .map_err(|e| corrupt(e.to_string()))?;

    Ok((chunk_ids, vectors))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| persistence(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| persistence(path, e))?;
    writer.flush().map_err(|e| persistence(path, e))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| IndexError::Corruption {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn persistence(path: &Path, reason: impl ToString) -> IndexError {
    IndexError::Persistence {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
