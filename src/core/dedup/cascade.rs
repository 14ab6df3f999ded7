//! Size → first-kilobyte → full-content hash cascade.

use super::DuplicateGroup;
use crate::error::DedupError;
use crate::events::{DedupEvent, DedupStage, Event, EventSender};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

/// Bytes hashed by the cheap second tier
pub const PARTIAL_HASH_BYTES: usize = 1024;

const READ_BUFFER: usize = 64 * 1024;

/// Find files with identical contents below `paths`
pub fn check_duplicates(paths: &[PathBuf]) -> Result<Vec<DuplicateGroup>, DedupError> {
    check_duplicates_with_events(paths, &crate::events::null_sender())
}

/// Find duplicates, reporting each cascade stage on `events`
///
/// Symlinks are resolved so a file reachable under two names is counted once.
/// Files that cannot be read at any stage are dropped from the search.
pub fn check_duplicates_with_events(
    paths: &[PathBuf],
    events: &EventSender,
) -> Result<Vec<DuplicateGroup>, DedupError> {
    if paths.is_empty() {
        return Err(DedupError::NoPaths);
    }
    for path in paths {
        if !path.is_dir() {
            return Err(DedupError::DirectoryNotFound { path: path.clone() });
        }
    }

    let files = collect_files(paths);
    events.send(Event::Dedup(DedupEvent::StageStarted {
        stage: DedupStage::Sizing,
        candidates: files.len(),
    }));
    let by_size = bucket_by_size(files);

    let candidates: Vec<(u64, PathBuf)> = by_size
        .into_iter()
        .filter(|(_, files)| files.len() >= 2)
        .flat_map(|(size, files)| files.into_iter().map(move |f| (size, f)))
        .collect();
    events.send(Event::Dedup(DedupEvent::StageStarted {
        stage: DedupStage::PartialHashing,
        candidates: candidates.len(),
    }));
    let by_partial = bucket_by(candidates, partial_hash);

    let candidates: Vec<(u64, PathBuf)> = by_partial
        .into_iter()
        .filter(|(_, files)| files.len() >= 2)
        .flat_map(|((_, size), files)| files.into_iter().map(move |f| (size, f)))
        .collect();
    events.send(Event::Dedup(DedupEvent::StageStarted {
        stage: DedupStage::FullHashing,
        candidates: candidates.len(),
    }));
    let by_full = bucket_by(candidates, full_hash);

    let mut groups: Vec<DuplicateGroup> = by_full
        .into_iter()
        .filter(|(_, files)| files.len() >= 2)
        .map(|((_, size), files)| DuplicateGroup::new(size, files.into_iter().collect()))
        .collect();
    groups.sort_by(|a, b| a.paths.iter().next().cmp(&b.paths.iter().next()));

    tracing::debug!("found {} duplicate groups", groups.len());
    events.send(Event::Dedup(DedupEvent::Completed {
        groups: groups.len(),
    }));
    Ok(groups)
}

/// Canonical paths of every regular file below `roots`, without repeats
fn collect_files(roots: &[PathBuf]) -> BTreeSet<PathBuf> {
    let mut files = BTreeSet::new();
    for root in roots {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("skipping: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            match fs::canonicalize(entry.path()) {
                Ok(real) if real.is_file() => {
                    files.insert(real);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("skipping {}: {}", entry.path().display(), e),
            }
        }
    }
    files
}

fn bucket_by_size(files: BTreeSet<PathBuf>) -> HashMap<u64, Vec<PathBuf>> {
    let mut buckets: HashMap<u64, Vec<PathBuf>> = HashMap::new();
    for path in files {
        match fs::metadata(&path) {
            Ok(meta) => buckets.entry(meta.len()).or_default().push(path),
            Err(e) => tracing::debug!("skipping {}: {}", path.display(), e),
        }
    }
    buckets
}

/// Hash candidates in parallel and bucket them by (hash, size)
fn bucket_by<H, F>(candidates: Vec<(u64, PathBuf)>, hash: F) -> HashMap<(H, u64), Vec<PathBuf>>
where
    H: Eq + std::hash::Hash + Send,
    F: Fn(&Path) -> io::Result<H> + Sync,
{
    let hashed: Vec<(H, u64, PathBuf)> = candidates
        .into_par_iter()
        .filter_map(|(size, path)| match hash(&path) {
            Ok(digest) => Some((digest, size, path)),
            Err(e) => {
                tracing::debug!("skipping {}: {}", path.display(), e);
                None
            }
        })
        .collect();

    let mut buckets: HashMap<(H, u64), Vec<PathBuf>> = HashMap::new();
    for (digest, size, path) in hashed {
        buckets.entry((digest, size)).or_default().push(path);
    }
    buckets
}

fn partial_hash(path: &Path) -> io::Result<u64> {
    let mut buffer = Vec::with_capacity(PARTIAL_HASH_BYTES);
    File::open(path)?
        .take(PARTIAL_HASH_BYTES as u64)
        .read_to_end(&mut buffer)?;
    Ok(xxh3_64(&buffer))
}

fn full_hash(path: &Path) -> io::Result<u128> {
    let mut file = File::open(path)?;
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; READ_BUFFER];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.digest128())
}
