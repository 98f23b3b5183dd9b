//! Content digests of the current sources.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use jinc_core::digest::Digest;
use jinc_core::source::{NodeSource, PathSourceMapper};
use jinc_util::errors::JincError;

/// Digest of one source file; the dirty sentinel when it cannot be read.
pub fn digest_of(path: &Path) -> Digest {
    match Digest::of_file(path) {
        Ok(digest) => digest,
        Err(e) => {
            tracing::warn!("cannot digest {}: {e}; treating it as dirty", path.display());
            Digest::empty()
        }
    }
}

/// Digest every source in parallel, at most `jobs` files at a time.
///
/// Returns only after every digest task has joined.
pub fn digest_all(
    mapper: &PathSourceMapper,
    sources: &BTreeSet<NodeSource>,
    jobs: usize,
) -> miette::Result<BTreeMap<NodeSource, Digest>> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| JincError::Generic {
        message: format!("Failed to create async runtime: {e}"),
    })?;
    rt.block_on(digest_parallel(mapper, sources, jobs))
}

async fn digest_parallel(
    mapper: &PathSourceMapper,
    sources: &BTreeSet<NodeSource>,
    jobs: usize,
) -> miette::Result<BTreeMap<NodeSource, Digest>> {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut join_set = JoinSet::new();

    for source in sources {
        let source = source.clone();
        let path = mapper.to_path(&source);
        let sem = semaphore.clone();
        join_set.spawn(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|e| miette::miette!("Digest worker pool closed: {}", e))?;
            let digest = tokio::task::spawn_blocking(move || digest_of(&path))
                .await
                .map_err(|e| miette::miette!("Digest task failed: {}", e))?;
            Ok::<_, miette::Report>((source, digest))
        });
    }

    let mut digests = BTreeMap::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok((source, digest))) => {
                digests.insert(source, digest);
            }
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(miette::miette!("Background task failed: {}", e)),
        }
    }
    tracing::debug!("digested {} sources", digests.len());
    Ok(digests)
}
