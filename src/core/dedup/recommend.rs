//! Splits duplicate groups into safe-to-erase backups and sets to review.

use super::DuplicateGroup;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// What to do about a set of duplicate groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Copies that can be deleted without losing anything
    pub erase: Vec<PathBuf>,
    /// Same contents under different names in different folders
    pub check: Vec<Vec<PathBuf>>,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.erase.is_empty() && self.check.is_empty()
    }
}

fn is_sidecar(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("aae"))
        .unwrap_or(false)
}

/// The name a backup copy was made from: `a~~.jpg` → `a.jpg`
fn backup_of(path: &Path) -> PathBuf {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return path.to_path_buf();
    };
    let original = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", stem.trim_end_matches('~'), ext),
        None => stem.trim_end_matches('~').to_string(),
    };
    path.with_file_name(original)
}

/// Existing edit sidecar next to `path`, if any
fn sidecar_of(path: &Path) -> Option<PathBuf> {
    ["aae", "AAE"]
        .iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

struct EraseList {
    paths: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl EraseList {
    fn push(&mut self, path: PathBuf) {
        if self.seen.insert(path.clone()) {
            self.paths.push(path);
        }
    }

    fn push_with_sidecar(&mut self, path: PathBuf) {
        let sidecar = sidecar_of(&path);
        self.push(path);
        if let Some(sidecar) = sidecar {
            self.push(sidecar);
        }
    }

    /// Take back the first member of any group that would lose every copy
    ///
    /// Sidecars are erased alongside their photo, so a group made of sidecars
    /// can be emptied by the other groups.
    fn spare_one_per_group(&mut self, groups: &[DuplicateGroup]) {
        for group in groups {
            if group.paths.iter().all(|path| self.seen.contains(path)) {
                if let Some(survivor) = group.paths.iter().next() {
                    tracing::debug!("keeping {}, the last copy left", survivor.display());
                    self.seen.remove(survivor);
                    self.paths.retain(|path| path != survivor);
                }
            }
        }
    }
}

/// Decide which duplicates are disposable
///
/// Within a group, paths are visited in order and edit sidecars are left
/// alone. A file whose name is a backup (`~` before the extension) of an
/// already kept file is erased together with its sidecar. If everything kept
/// lives in one folder, only the shortest path survives. Otherwise the kept
/// files are listed for review. At least one file of every group survives,
/// sidecar-only groups included.
pub fn recommend_action(groups: &[DuplicateGroup]) -> Recommendation {
    let mut erase = EraseList {
        paths: Vec::new(),
        seen: HashSet::new(),
    };
    let mut check = Vec::new();

    for group in groups {
        let mut keep: Vec<&PathBuf> = Vec::new();
        for path in &group.paths {
            if is_sidecar(path) {
                continue;
            }
            let original = backup_of(path);
            if keep.iter().any(|kept| **kept == original) {
                tracing::debug!("{} is a backup of {}", path.display(), original.display());
                erase.push_with_sidecar(path.clone());
            } else {
                keep.push(path);
            }
        }

        if keep.is_empty() {
            continue;
        }

        let first_dir = keep[0].parent();
        if keep.iter().all(|kept| kept.parent() == first_dir) {
            keep.sort_by(|a, b| {
                a.as_os_str()
                    .len()
                    .cmp(&b.as_os_str().len())
                    .then_with(|| a.cmp(b))
            });
            tracing::debug!("keeping {} (out of {})", keep[0].display(), keep.len());
            for extra in &keep[1..] {
                erase.push_with_sidecar((*extra).clone());
            }
        } else {
            check.push(keep.into_iter().cloned().collect());
        }
    }

    erase.spare_one_per_group(groups);

    Recommendation {
        erase: erase.paths,
        check,
    }
}
