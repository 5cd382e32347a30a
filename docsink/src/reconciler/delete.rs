use tracing::{debug, info, warn};

use crate::error::DocSinkResult;
use crate::reconciler::Reconciler;
use crate::types::{EntityId, Organization, WriteInstruction};

impl Reconciler {
    /// Removes organization `id` together with the flat entries of its divisions.
    ///
    /// The delete is always emitted, the document store treats it as idempotent and the
    /// organization may exist there even when it is not cached here.
    pub(super) fn delete_organization(&self, id: EntityId) -> DocSinkResult<Vec<WriteInstruction>> {
        self.placeholders.ensure_real(id)?;

        let removed = self.store.remove_organization(id);
        let division_ids = self.store.division_ids_of(id);
        for division_id in &division_ids {
            self.store.remove_division(*division_id);
        }

        match removed {
            Some(_) => info!(
                organization_id = %id,
                divisions = division_ids.len(),
                "deleted organization"
            ),
            None => warn!(
                organization_id = %id,
                "deleting an organization that is not cached"
            ),
        }

        Ok(vec![WriteInstruction::delete(id)])
    }

    /// Removes division `id` from the flat index and from the organization owning it.
    pub(super) fn delete_division(&self, id: EntityId) -> DocSinkResult<Vec<WriteInstruction>> {
        let owner_id = match self
            .store
            .division(id)
            .and_then(|division| division.organization_id)
        {
            Some(owner_id) => Some(owner_id),
            None => self.find_real_owner(id).map(|owner| owner.id),
        };

        let Some(owner_id) = owner_id else {
            warn!(
                division_id = %id,
                "no organization owns the deleted division, skipping it"
            );
            return Ok(Vec::new());
        };

        self.store.remove_division(id);

        let Some(mut organization) = self.store.organization(owner_id) else {
            warn!(
                division_id = %id,
                organization_id = %owner_id,
                "organization of the deleted division is not cached"
            );
            return Ok(Vec::new());
        };
        organization.remove_division(id);

        debug!(organization_id = %owner_id, division_id = %id, "deleted division");

        let instruction = self.replace_if_real(&organization);
        self.commit_organization(organization, &[]);

        Ok(instruction.into_iter().collect())
    }

    /// Removes unit `id` from every division holding it.
    ///
    /// With a division hint only organizations embedding that division are searched, otherwise
    /// every division of every organization is.
    pub(super) fn delete_unit(
        &self,
        id: EntityId,
        division_hint: Option<EntityId>,
    ) -> DocSinkResult<Vec<WriteInstruction>> {
        let in_scope = |division_id: EntityId| division_hint.is_none_or(|hint| hint == division_id);

        let candidates: Vec<Organization> = self
            .store
            .organizations()
            .into_iter()
            .filter(|organization| {
                organization
                    .divisions
                    .iter()
                    .any(|division| in_scope(division.id) && division.contains_unit(id))
            })
            .collect();

        let mut found = false;
        let mut instructions = Vec::new();

        for mut organization in candidates {
            let touched: Vec<EntityId> = organization
                .divisions
                .iter_mut()
                .filter(|division| in_scope(division.id))
                .filter_map(|division| division.remove_unit(id).then_some(division.id))
                .collect();

            if touched.is_empty() {
                continue;
            }
            found = true;

            debug!(
                organization_id = %organization.id,
                unit_id = %id,
                "deleted unit"
            );

            instructions.extend(self.replace_if_real(&organization));
            self.commit_organization(organization, &touched);
        }

        // Flat entries drop the unit as well, whichever organization embedded it.
        let flat_divisions = match division_hint {
            Some(hint) => self.store.division(hint).into_iter().collect(),
            None => self.store.divisions(),
        };
        for mut division in flat_divisions {
            if division.remove_unit(id) {
                found = true;
                self.store.put_division(division);
            }
        }

        if !found {
            warn!(
                unit_id = %id,
                division_id = ?division_hint,
                "deleted unit was not found in any division, skipping it"
            );
        }

        Ok(instructions)
    }
}
