use crate::bail;
use crate::error::{DocSinkResult, ErrorKind};
use crate::types::{Division, EntityId, Organization};

/// Name given to organizations created for divisions that reference an unseen organization.
pub const STUB_ORGANIZATION_NAME: &str = "Unknown";

/// Rules for the reserved organization id range.
///
/// Organization ids below the threshold come from the source, ids at or above it are
/// placeholders synthesized as `threshold + division_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderPolicy {
    threshold: i64,
}

impl PlaceholderPolicy {
    pub fn new(threshold: i64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Returns `true` if `id` lies in the placeholder range.
    pub fn is_placeholder(&self, id: EntityId) -> bool {
        id.into_inner() >= self.threshold
    }

    pub fn is_real(&self, id: EntityId) -> bool {
        !self.is_placeholder(id)
    }

    /// Returns the id of the placeholder organization quarantining `division_id`.
    pub fn placeholder_for(&self, division_id: EntityId) -> DocSinkResult<EntityId> {
        if division_id.into_inner() < 0 {
            bail!(
                ErrorKind::InvalidData,
                "Division id cannot be mapped to a placeholder organization",
                format!("division id {division_id} is negative")
            );
        }

        match self.threshold.checked_add(division_id.into_inner()) {
            Some(id) => Ok(EntityId(id)),
            None => bail!(
                ErrorKind::InvalidData,
                "Division id cannot be mapped to a placeholder organization",
                format!("division id {division_id} overflows the placeholder range")
            ),
        }
    }

    /// Fails if `id` is not usable as the id of an organization observed on the source.
    pub fn ensure_real(&self, id: EntityId) -> DocSinkResult<()> {
        if self.is_placeholder(id) {
            bail!(
                ErrorKind::ReservedIdRange,
                "Organization id lies in the placeholder range",
                format!(
                    "organization id {id} is not below the threshold {}",
                    self.threshold
                )
            );
        }

        Ok(())
    }

    /// Builds the flat index entry of a division known only through its units.
    pub fn placeholder_division(&self, division_id: EntityId) -> Division {
        Division::new(division_id, format!("Division {division_id}"), None, Vec::new())
    }

    /// Builds an empty placeholder organization for `division_id`.
    pub fn placeholder_organization(&self, division_id: EntityId) -> DocSinkResult<Organization> {
        let id = self.placeholder_for(division_id)?;

        Ok(Organization::new(id, format!("Organization {id}")))
    }
}
