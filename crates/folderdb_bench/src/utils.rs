//! Benchmark utilities.

use folderdb_core::{
    random_id, Folder, FolderHierarchy, FolderSpec, Metadata, SeedPlan, StoredFolder,
};
use folderdb_store::{DocumentPath, DocumentStore, LocalStore, StoreConfig};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Parent identifier the benchmarks query for.
pub const BENCH_PARENT: &str = "bench";

/// Generate random metadata with `entries` keys.
pub fn random_metadata(entries: usize) -> Metadata {
    let mut rng = rand::thread_rng();
    (0..entries)
        .map(|i| {
            let value: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(16)
                .map(char::from)
                .collect();
            (format!("key{i}"), value)
        })
        .collect()
}

/// Generate flat folders under `parent_id`, each with some metadata.
pub fn generate_flat(count: usize, parent_id: &str) -> Vec<FolderSpec> {
    (0..count)
        .map(|_| {
            let mut folder = Folder::new(random_id(), parent_id);
            folder.metadata = Some(random_metadata(4));
            FolderSpec::flat(folder)
        })
        .collect()
}

/// Opens an ephemeral store sized for benchmarking.
pub fn bench_store(page_size: usize) -> LocalStore {
    LocalStore::connect(StoreConfig::new("folderdb-bench").page_size(page_size))
        .expect("Failed to open benchmark store")
}

/// Fills `folders` with `matching` flat and nested children of
/// [`BENCH_PARENT`], plus `noise` flat folders under other parents.
///
/// Returns the parent's document path.
pub fn populate<S: DocumentStore + ?Sized>(
    folders: &FolderHierarchy<'_, S>,
    matching: usize,
    noise: usize,
) -> DocumentPath {
    let parent = folders
        .root_path(BENCH_PARENT)
        .expect("Invalid benchmark parent");
    let mut rng = rand::thread_rng();

    folders
        .seed_random(&SeedPlan::flat(BENCH_PARENT, matching))
        .expect("Failed to seed flat children");
    folders
        .seed_random(&SeedPlan::nested(Some(parent.clone()), matching))
        .expect("Failed to seed nested children");
    let mut written = 0;
    while written < noise {
        let chunk = (noise - written).min(100);
        let other = format!("other{}", rng.gen_range(0..16));
        folders
            .seed_random(&SeedPlan::flat(other, chunk))
            .expect("Failed to seed noise");
        written += chunk;
    }
    parent
}

/// Drains a folder sequence, panicking on error.
pub fn drain_all<I>(iter: I) -> usize
where
    I: Iterator<Item = folderdb_store::StoreResult<StoredFolder>>,
{
    iter.map(|item| item.expect("Iteration failed")).count()
}
