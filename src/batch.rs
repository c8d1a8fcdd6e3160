use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::{
    helix::CatalogClient,
    types::{Clip, TimeRange},
};

/// Page sizes of the successive fetch passes, merged afterwards
pub const PAGE_SIZES: [u8; 2] = [100, 20];

/// Fetch the clips of a channel with one pass per page size, then merge them.
///
/// A failing page only ends its own pass, what was fetched before is kept.
pub fn fetch_all(
    catalog: &CatalogClient<'_>,
    broadcaster_id: &str,
    range: &TimeRange,
    page_sizes: &[u8],
) -> Vec<Clip> {
    let passes = page_sizes
        .iter()
        .map(|&page_size| {
            let mut clips = Vec::new();
            match catalog.fetch_clips(broadcaster_id, range, page_size, &mut clips) {
                Ok(()) => debug!("Pass with page size {page_size}: {} clips", clips.len()),
                Err(err) => warn!(
                    "Pass with page size {page_size} interrupted after {} clips: {err}",
                    clips.len()
                ),
            }
            clips
        })
        .collect();

    let clips = merge(passes);
    info!("{} distinct clips from {range}", clips.len());
    clips
}

/// Concatenate the passes, keep the first clip seen for every id,
/// and sort by creation time.
///
/// Clips without a valid creation time come first. Ties are ordered by id
/// so the result does not depend on the order of the passes.
pub fn merge(passes: Vec<Vec<Clip>>) -> Vec<Clip> {
    let mut seen = HashSet::new();
    let mut clips: Vec<Clip> = passes
        .into_iter()
        .flatten()
        .filter(|clip| seen.insert(clip.id.clone()))
        .collect();

    clips.sort_by_cached_key(|clip| (clip.created_at(), clip.id.clone()));
    clips
}
