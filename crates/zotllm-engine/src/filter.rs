//! Skip filter: tag markers decide what is already done

use zotllm_domain::ScopedItem;

/// Split a scope into items to process and items already carrying `marker`
///
/// With `force` every item is processed. The marker is compared
/// case-insensitively; order is preserved on both sides.
pub fn partition_done(
    items: Vec<ScopedItem>,
    marker: &str,
    force: bool,
) -> (Vec<ScopedItem>, Vec<ScopedItem>) {
    if force {
        return (items, Vec::new());
    }
    items.into_iter().partition(|s| !s.item.has_tag(marker))
}
