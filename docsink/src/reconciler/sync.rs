use crate::reconciler::Reconciler;
use crate::types::{Division, EntityId, Organization, WriteInstruction};

impl Reconciler {
    /// Stores `organization` and copies name and units of each division in `touched` from the
    /// document into the flat index.
    ///
    /// Every path that edits an embedded division goes through here so that the embedded copy
    /// and the flat entry stay equal. The flat entry is only written from the organization that
    /// owns the division, so a stale copy elsewhere never overwrites it.
    pub(super) fn commit_organization(&self, organization: Organization, touched: &[EntityId]) {
        for division_id in touched {
            let Some(embedded) = organization.division(*division_id) else {
                continue;
            };

            match self.store.division(*division_id) {
                Some(mut flat) => {
                    if !self.owns_division(organization.id, &flat) || flat.same_content(embedded) {
                        continue;
                    }

                    flat.name = embedded.name.clone();
                    flat.units = embedded.units.clone();
                    self.store.put_division(flat);
                }
                None => {
                    let organization_id = self
                        .placeholders
                        .is_real(organization.id)
                        .then_some(organization.id);

                    self.store.put_division(Division::new(
                        embedded.id,
                        embedded.name.clone(),
                        organization_id,
                        embedded.units.clone(),
                    ));
                }
            }
        }

        self.store.put_organization(organization);
    }

    /// Returns whether `organization_id` is the owner of the flat division entry.
    ///
    /// A division without back-reference is owned by the placeholder range.
    pub(super) fn owns_division(&self, organization_id: EntityId, flat: &Division) -> bool {
        match flat.organization_id {
            Some(owner) => owner == organization_id,
            None => self.placeholders.is_placeholder(organization_id),
        }
    }

    /// Returns the replace of `organization` unless it is a placeholder, which is never written.
    pub(super) fn replace_if_real(&self, organization: &Organization) -> Option<WriteInstruction> {
        self.placeholders
            .is_real(organization.id)
            .then(|| WriteInstruction::replace(organization.clone()))
    }

    /// Returns the real organization embedding `division_id`, if any.
    pub(super) fn find_real_owner(&self, division_id: EntityId) -> Option<Organization> {
        self.store.organizations().into_iter().find(|organization| {
            self.placeholders.is_real(organization.id) && organization.contains_division(division_id)
        })
    }
}
