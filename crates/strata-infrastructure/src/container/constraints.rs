//! Resolution-constraint evaluation
//!
//! Turns a [`Constraints`] bitmask into a lookup decision: which node to
//! start at, whether to ascend, single vs multi lookup, and what to do on a
//! miss.

use strata_domain::error::{Error, Result};
use strata_domain::value_objects::{Constraints, ScopeFilter, ServiceId};

use super::record::Argument;
use super::registry::Registry;

impl Registry {
    /// Resolve `id` under an explicit constraint set
    ///
    /// - `SELF` with `SKIP_SELF` is rejected, as is `SKIP_SELF` on a node
    ///   without a parent.
    /// - The target node is the parent for `SKIP_SELF`, otherwise `self`;
    ///   ascending past the target is allowed unless `SELF` is set.
    /// - A miss yields [`Argument::Missing`] under `OPTIONAL` and
    ///   [`Error::NotFound`] otherwise.
    pub fn resolve_constrained(&self, id: &ServiceId, constraints: Constraints) -> Result<Argument> {
        self.ensure_live()?;

        if constraints.is_contradictory() {
            return Err(Error::invalid_usage(format!(
                "SELF and SKIP_SELF cannot both be requested for {id}"
            )));
        }

        let target = if constraints.contains(Constraints::SKIP_SELF) {
            self.parent().ok_or_else(|| {
                Error::invalid_usage(format!(
                    "SKIP_SELF requested for {id} on registry '{}' which has no parent",
                    self.id()
                ))
            })?
        } else {
            self.clone()
        };

        let recursive = constraints.allows_recursion();
        let many = constraints.contains(Constraints::MANY);
        let filter = if many {
            ScopeFilter::Many
        } else {
            ScopeFilter::Single
        };

        if !target.has(id, recursive, filter)? {
            if constraints.contains(Constraints::OPTIONAL) {
                return Ok(Argument::Missing);
            }
            if let (false, Some(tag)) = (many, id.builtin_type()) {
                return Err(Error::cannot_instantiate_builtin(tag.name()));
            }
            return Err(Error::not_found(id.to_string()));
        }

        if many {
            target.resolve_many_with(id, recursive).map(Argument::Many)
        } else {
            target.resolve_with(id, recursive).map(Argument::Value)
        }
    }
}
