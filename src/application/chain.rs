//! Provider chain resolution: filter the configured order by capability,
//! rotate by the request seed, and guarantee a non-empty chain by falling
//! back to a designated lowest-common-denominator provider.

use crate::application::rotation::rotate;
use std::sync::Arc;
use tracing::debug;

/// Resolve the chain for one request.
///
/// `providers` is the operator-configured order. `supports` is the
/// capability predicate for the request shape. `default_id` names the
/// provider used when the filter leaves nothing, so the orchestrator never
/// starts with an empty chain (as long as the default is registered).
pub fn resolve_chain<P: ?Sized, F>(
    providers: &[Arc<P>],
    supports: F,
    seed: &str,
    default_id: &str,
    id_of: impl Fn(&P) -> &str,
) -> Vec<Arc<P>>
where
    F: Fn(&P) -> bool,
{
    let eligible: Vec<Arc<P>> = providers
        .iter()
        .filter(|p| supports(p))
        .cloned()
        .collect();

    if eligible.is_empty() {
        debug!(
            "resolve_chain: no eligible providers, falling back to default '{}'",
            default_id
        );
        return providers
            .iter()
            .filter(|p| id_of(p) == default_id)
            .cloned()
            .collect();
    }

    rotate(&eligible, seed)
}
