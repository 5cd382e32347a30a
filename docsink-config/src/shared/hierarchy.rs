use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Settings of the hierarchical reconciliation engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HierarchyConfig {
    /// First organization id of the placeholder range.
    ///
    /// Ids below this value belong to organizations observed on the source, ids at or above it
    /// are synthesized as `placeholder_id_threshold + division_id` for divisions whose
    /// organization has not been seen yet. Source ids must never reach this range.
    #[serde(default = "default_placeholder_id_threshold")]
    pub placeholder_id_threshold: i64,
    /// Mapping of source tables and foreign key columns onto hierarchy levels.
    #[serde(default)]
    pub tables: TableMappingConfig,
}

impl HierarchyConfig {
    /// Default first id of the placeholder range.
    pub const DEFAULT_PLACEHOLDER_ID_THRESHOLD: i64 = 1_000_000;

    /// Validates the hierarchy settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.placeholder_id_threshold <= 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "hierarchy.placeholder_id_threshold".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        self.tables.validate()
    }
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            placeholder_id_threshold: default_placeholder_id_threshold(),
            tables: TableMappingConfig::default(),
        }
    }
}

fn default_placeholder_id_threshold() -> i64 {
    HierarchyConfig::DEFAULT_PLACEHOLDER_ID_THRESHOLD
}

/// Names of the source tables and foreign key columns for each hierarchy level.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct TableMappingConfig {
    /// Table holding top-level organizations.
    pub organization_table: String,
    /// Table holding divisions.
    pub division_table: String,
    /// Table holding units.
    pub unit_table: String,
    /// Column of the division table referencing its organization.
    pub organization_id_column: String,
    /// Column of the unit table referencing its division.
    pub division_id_column: String,
}

impl TableMappingConfig {
    /// Validates that every name is set and that the three tables are distinct.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("hierarchy.tables.organization_table", &self.organization_table),
            ("hierarchy.tables.division_table", &self.division_table),
            ("hierarchy.tables.unit_table", &self.unit_table),
            ("hierarchy.tables.organization_id_column", &self.organization_id_column),
            ("hierarchy.tables.division_id_column", &self.division_id_column),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidFieldValue {
                    field: field.to_string(),
                    constraint: "must not be empty".to_string(),
                });
            }
        }

        if self.organization_table == self.division_table
            || self.organization_table == self.unit_table
        {
            return Err(ValidationError::DuplicateTableName(
                self.organization_table.clone(),
            ));
        }
        if self.division_table == self.unit_table {
            return Err(ValidationError::DuplicateTableName(self.division_table.clone()));
        }

        Ok(())
    }
}

impl Default for TableMappingConfig {
    fn default() -> Self {
        Self {
            organization_table: "organization".to_string(),
            division_table: "division".to_string(),
            unit_table: "unit".to_string(),
            organization_id_column: "organization_id".to_string(),
            division_id_column: "division_id".to_string(),
        }
    }
}
