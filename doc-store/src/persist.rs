//! Atomic persistence of the index blob and its catalog.

use std::path::Path;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::StoreConfig;
use crate::errors::{Result, StoreError};
use crate::index::FlatIndex;

/// Writes blob and catalog (tmp file + rename each).
pub async fn save(cfg: &StoreConfig, index: &FlatIndex, catalog: &Catalog) -> Result<()> {
    tokio::fs::create_dir_all(cfg.index_dir()).await?;
    let blob = index.to_bytes()?;
    let json = serde_json::to_vec_pretty(catalog)?;
    write_atomic(&cfg.index_path(), &blob).await?;
    write_atomic(&cfg.catalog_path(), &json).await?;
    debug!(
        vectors = index.len(),
        documents = catalog.documents.len(),
        path = %cfg.index_path().display(),
        "index persisted"
    );
    Ok(())
}

/// Loads blob and catalog.
///
/// # Errors
/// [`StoreError::IndexUnavailable`] when either file is missing or corrupt, when the catalog
/// and blob disagree, or when the stored dimension differs from `expected_dim`.
pub async fn load(cfg: &StoreConfig, expected_dim: usize) -> Result<(FlatIndex, Catalog)> {
    let blob = read_required(&cfg.index_path()).await?;
    let json = read_required(&cfg.catalog_path()).await?;

    let index = FlatIndex::from_bytes(&blob)?;
    let catalog: Catalog = serde_json::from_slice(&json)
        .map_err(|e| StoreError::IndexUnavailable(format!("corrupt catalog: {e}")))?;

    if index.dim() != expected_dim || catalog.dimension != expected_dim {
        return Err(StoreError::IndexUnavailable(format!(
            "stored dimension {} differs from configured {expected_dim}",
            index.dim()
        )));
    }
    if index.len() != catalog.chunks.len() || index.ids().any(|id| !catalog.chunks.contains_key(id)) {
        return Err(StoreError::IndexUnavailable(
            "index blob and catalog are out of sync".into(),
        ));
    }

    info!(vectors = index.len(), documents = catalog.documents.len(), "index loaded");
    Ok((index, catalog))
}

async fn read_required(path: &Path) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(b) => Ok(b),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::IndexUnavailable(
            format!("{} not found", path.display()),
        )),
        Err(e) => Err(e.into()),
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
