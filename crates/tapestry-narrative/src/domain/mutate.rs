//! Flag mutation.

use tapestry_content::PatchEntry;
use tapestry_core::flags::Flags;
use tracing::warn;

/// Applies `entries` to `flags` in order, as shallow merges.
///
/// A conditional entry is evaluated when it is reached, so it sees every
/// earlier entry of the same list. Keys are only ever added or overwritten.
/// Returns the number of entries that were applied.
pub fn apply_patches(flags: &mut Flags, entries: &[PatchEntry]) -> usize {
    let mut applied = 0;
    for (index, entry) in entries.iter().enumerate() {
        match entry {
            PatchEntry::Plain(patch) => {
                flags.merge(patch);
                applied += 1;
            }
            PatchEntry::Conditional { condition, set } => {
                if !condition.matches(flags) {
                    continue;
                }
                let Some(patch) = set else {
                    warn!(index, "conditional patch entry has no body, skipping");
                    continue;
                };
                flags.merge(patch);
                applied += 1;
            }
        }
    }
    applied
}
