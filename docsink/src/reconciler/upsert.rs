use tracing::{debug, info};

use crate::error::DocSinkResult;
use crate::reconciler::{Reconciler, STUB_ORGANIZATION_NAME};
use crate::types::{Division, EntityId, Organization, Unit, WriteInstruction};

impl Reconciler {
    /// Rebuilds organization `id` from the flat division index and replaces its document.
    pub(super) fn upsert_organization(
        &self,
        id: EntityId,
        name: &str,
    ) -> DocSinkResult<Vec<WriteInstruction>> {
        self.placeholders.ensure_real(id)?;

        self.drain_placeholders_into(id);

        // Divisions already embedded keep their position, new ones are appended by id.
        let division_ids = self.store.division_ids_of(id);
        let mut ordered: Vec<EntityId> = self
            .store
            .organization(id)
            .map(|prior| {
                prior
                    .divisions
                    .iter()
                    .map(|division| division.id)
                    .filter(|division_id| division_ids.contains(division_id))
                    .collect()
            })
            .unwrap_or_default();
        for division_id in &division_ids {
            if !ordered.contains(division_id) {
                ordered.push(*division_id);
            }
        }

        let mut organization = Organization::new(id, name);
        for division_id in &ordered {
            if let Some(division) = self.store.division(*division_id) {
                organization.upsert_division(&division);
            }
        }

        debug!(
            organization_id = %id,
            divisions = organization.divisions.len(),
            "upserted organization"
        );

        let instruction = WriteInstruction::replace(organization.clone());
        self.commit_organization(organization, &ordered);

        Ok(vec![instruction])
    }

    /// Moves units quarantined in placeholder organizations onto the flat entries of divisions
    /// that now belong to organization `id`.
    fn drain_placeholders_into(&self, id: EntityId) {
        let placeholders = self
            .store
            .organizations()
            .into_iter()
            .filter(|organization| self.placeholders.is_placeholder(organization.id));

        for placeholder in placeholders {
            for embedded in &placeholder.divisions {
                if let Some(mut division) = self.store.division(embedded.id)
                    && division.organization_id == Some(id)
                {
                    let before = division.units.len();
                    division.merge_units(&embedded.units);

                    if division.units.len() != before {
                        debug!(
                            organization_id = %id,
                            placeholder_id = %placeholder.id,
                            division_id = %division.id,
                            "moved quarantined units onto division"
                        );
                        self.store.put_division(division);
                    }
                }
            }
        }
    }

    /// Stores division `id` and embeds it into organization `organization_id`.
    pub(super) fn upsert_division(
        &self,
        id: EntityId,
        name: &str,
        organization_id: EntityId,
    ) -> DocSinkResult<Vec<WriteInstruction>> {
        self.placeholders.ensure_real(organization_id)?;

        let previous = self.store.division(id);
        let units = self.prior_units(id, organization_id, previous.as_ref())?;
        let division = Division::new(id, name, Some(organization_id), units);
        self.store.put_division(division.clone());

        let mut instructions = Vec::new();

        if let Some(previous_owner) = previous.as_ref().and_then(|division| division.organization_id)
            && previous_owner != organization_id
            && let Some(mut previous_organization) = self.store.organization(previous_owner)
            && previous_organization.remove_division(id).is_some()
        {
            info!(
                division_id = %id,
                from_organization_id = %previous_owner,
                to_organization_id = %organization_id,
                "division moved to another organization"
            );

            instructions.extend(self.replace_if_real(&previous_organization));
            self.commit_organization(previous_organization, &[]);
        }

        let mut organization = match self.store.organization(organization_id) {
            Some(organization) => organization,
            None => {
                info!(
                    organization_id = %organization_id,
                    division_id = %id,
                    "organization not seen yet, creating a stub"
                );
                Organization::new(organization_id, STUB_ORGANIZATION_NAME)
            }
        };
        organization.upsert_division(&division);

        debug!(
            organization_id = %organization_id,
            division_id = %id,
            units = division.units.len(),
            "upserted division"
        );

        instructions.push(WriteInstruction::replace(organization.clone()));
        self.commit_organization(organization, &[id]);

        Ok(instructions)
    }

    /// Returns the units a division carries before an upsert replaces it.
    ///
    /// A real organization's embedded copy wins over the flat entry, which wins over the copy
    /// quarantined in the division's placeholder organization.
    fn prior_units(
        &self,
        id: EntityId,
        organization_id: EntityId,
        previous: Option<&Division>,
    ) -> DocSinkResult<Vec<Unit>> {
        let mut owners = vec![organization_id];
        if let Some(previous_owner) = previous.and_then(|division| division.organization_id)
            && previous_owner != organization_id
        {
            owners.push(previous_owner);
        }

        for owner in owners {
            if let Some(organization) = self.store.organization(owner)
                && let Some(embedded) = organization.division(id)
            {
                return Ok(embedded.units.clone());
            }
        }

        if let Some(previous) = previous {
            return Ok(previous.units.clone());
        }

        let placeholder_id = self.placeholders.placeholder_for(id)?;
        let units = self
            .store
            .organization(placeholder_id)
            .and_then(|placeholder| {
                placeholder
                    .division(id)
                    .map(|embedded| embedded.units.clone())
            })
            .unwrap_or_default();

        Ok(units)
    }

    /// Adds unit `id` to division `division_id` in the organization that owns the division.
    ///
    /// Units of a division whose organization is unknown are quarantined in a placeholder
    /// organization and produce no write.
    pub(super) fn upsert_unit(
        &self,
        id: EntityId,
        name: &str,
        division_id: EntityId,
    ) -> DocSinkResult<Vec<WriteInstruction>> {
        let division = match self.store.division(division_id) {
            Some(division) => division,
            None => self.quarantine_division(division_id)?,
        };

        let owner_id = match division.organization_id {
            Some(owner_id) => owner_id,
            None => match self.find_real_owner(division_id) {
                Some(owner) => {
                    // The division is embedded in a real organization, adopt it as the owner.
                    self.store.put_division(Division {
                        organization_id: Some(owner.id),
                        ..division.clone()
                    });
                    owner.id
                }
                None => self.placeholders.placeholder_for(division_id)?,
            },
        };

        let mut organization = match self.store.organization(owner_id) {
            Some(organization) => organization,
            None if self.placeholders.is_placeholder(owner_id) => {
                self.placeholders.placeholder_organization(division_id)?
            }
            None => Organization::new(owner_id, STUB_ORGANIZATION_NAME),
        };

        if !organization.contains_division(division_id) {
            organization.upsert_division(&division);
        }
        if let Some(embedded) = organization.division_mut(division_id) {
            embedded.upsert_unit(Unit::new(id, name));
        }

        debug!(
            organization_id = %owner_id,
            division_id = %division_id,
            unit_id = %id,
            "upserted unit"
        );

        let instruction = self.replace_if_real(&organization);
        self.commit_organization(organization, &[division_id]);

        Ok(instruction.into_iter().collect())
    }

    /// Creates the flat entry of an unseen division and embeds it in its placeholder organization.
    fn quarantine_division(&self, division_id: EntityId) -> DocSinkResult<Division> {
        let placeholder_id = self.placeholders.placeholder_for(division_id)?;
        let division = self.placeholders.placeholder_division(division_id);
        self.store.put_division(division.clone());

        let mut placeholder = match self.store.organization(placeholder_id) {
            Some(placeholder) => placeholder,
            None => {
                info!(
                    placeholder_id = %placeholder_id,
                    division_id = %division_id,
                    "division not seen yet, creating a placeholder organization"
                );
                self.placeholders.placeholder_organization(division_id)?
            }
        };

        if !placeholder.contains_division(division_id) {
            placeholder.upsert_division(&division);
        }
        self.commit_organization(placeholder, &[division_id]);

        // The placeholder may already hold units for this division.
        Ok(self.store.division(division_id).unwrap_or(division))
    }
}
