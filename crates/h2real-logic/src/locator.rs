//! Reservoir discovery across mechanically connected modules.

use std::hash::Hash;

use crate::connectivity::{find_reachable_modules, MechanicalLinks};
use crate::depletion::ReservoirLevel;

/// What the locator needs to know about a reservoir to filter it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservoirTag<R> {
    pub id: R,
    /// Resource subtype the reservoir is tagged with ("" for default tanks).
    pub subtype: String,
    /// Stockpile reservoirs are excluded from automatic consumption.
    pub reserve_only: bool,
}

/// Host-side view of which reservoirs sit on which module.
pub trait ReservoirCatalog: MechanicalLinks {
    type Reservoir: Copy + Eq + Hash;

    /// Reservoirs mounted on `module`, in host enumeration order.
    fn reservoirs_on(&self, module: Self::Module) -> Vec<ReservoirTag<Self::Reservoir>>;
}

/// Whether a reservoir tagged `subtype` can feed a consumer of `resource`.
///
/// An empty subtype is the host's default tag and always matches.
pub fn subtype_matches(subtype: &str, resource: &str) -> bool {
    subtype.is_empty() || subtype == resource
}

/// Every reservoir of `resource` reachable from `root` that may be drained.
///
/// Reserve-only reservoirs are skipped and a reservoir reachable through
/// several modules is listed once. Order follows the traversal and the host's
/// per-module enumeration; the depletion engine drains in this order.
pub fn find_reservoirs<C: ReservoirCatalog>(
    catalog: &C,
    root: C::Module,
    resource: &str,
) -> Vec<C::Reservoir> {
    let mut found: Vec<C::Reservoir> = Vec::new();
    for module in find_reachable_modules(catalog, root) {
        for tag in catalog.reservoirs_on(module) {
            let usable = subtype_matches(&tag.subtype, resource) && !tag.reserve_only;
            if usable && !found.contains(&tag.id) {
                found.push(tag.id);
            }
        }
    }
    found
}

/// Combined fill fraction (Σ stored / Σ capacity) of a set of reservoirs.
///
/// Returns 0 when there is no capacity at all.
pub fn aggregate_fill_fraction<I>(levels: I) -> f32
where
    I: IntoIterator<Item = ReservoirLevel>,
{
    let (capacity, stored) = levels
        .into_iter()
        .fold((0.0f64, 0.0f64), |(cap, stored), level| {
            (cap + level.capacity, stored + level.stored())
        });
    if capacity <= 0.0 {
        0.0
    } else {
        (stored / capacity) as f32
    }
}
