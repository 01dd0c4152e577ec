use std::fs;
use std::path::PathBuf;

use super::size_cache::SizeCache;

/// Totals for the paths selected across both panels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionSummary {
    /// Bytes of every selected file plus every directory whose size is known
    pub total_bytes: u64,
    /// At least one selected directory has no final size yet
    pub pending: bool,
    pub count: usize,
}

/// Aggregate sizes over a sequence of selected paths.
///
/// Each occurrence counts, so a path selected in both panels contributes
/// twice. Files are sized directly. Directories come from `cache` and are
/// left out of the total (setting `pending`) until their walk completes.
pub fn aggregate<'a, I>(paths: I, cache: &SizeCache) -> SelectionSummary
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let mut summary = SelectionSummary::default();

    for path in paths {
        summary.count += 1;
        let Ok(metadata) = fs::metadata(path) else {
            continue;
        };
        if metadata.is_file() {
            summary.total_bytes += metadata.len();
        } else if metadata.is_dir() {
            match cache.size_of(path) {
                Some(size) => summary.total_bytes += size,
                None => summary.pending = true,
            }
        }
    }

    summary
}
