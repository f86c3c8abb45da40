//! Outcome of a list call scoped to a single resource

use super::error::{ProviderError, ProviderResult};
use crate::scw::region::Region;

/// `None` when nothing matched, the item when exactly one did
///
/// Several matches mean the filter did not scope the call to one resource.
pub(crate) fn at_most_one<T>(
    items: Vec<T>,
    total_count: u32,
    operation: &'static str,
    region: &Region,
    target: &str,
) -> ProviderResult<Option<T>> {
    if total_count as usize > items.len() {
        tracing::debug!(
            "{} {} in {}: {} results reported, {} returned",
            operation,
            target,
            region,
            total_count,
            items.len()
        );
    }

    let count = items.len();
    let mut items = items.into_iter();
    match (items.next(), count) {
        (None, _) => Ok(None),
        (Some(item), 1) => Ok(Some(item)),
        (Some(_), _) => {
            tracing::error!("{} {} in {} matched {} resources", operation, target, region, count);
            Err(ProviderError::AmbiguousLookup {
                operation,
                region: region.clone(),
                target: target.to_string(),
                count,
            })
        }
    }
}
