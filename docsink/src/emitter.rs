//! Ordering of the writes produced by a single change.

use crate::types::WriteInstruction;

/// Writes produced by one change: the reconciliation result followed by the cleanup deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmittedChanges {
    primary: Vec<WriteInstruction>,
    cleanup: Vec<WriteInstruction>,
}

impl EmittedChanges {
    pub fn new(primary: Vec<WriteInstruction>, cleanup: Vec<WriteInstruction>) -> Self {
        Self { primary, cleanup }
    }

    pub fn primary(&self) -> &[WriteInstruction] {
        &self.primary
    }

    pub fn cleanup(&self) -> &[WriteInstruction] {
        &self.cleanup
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.cleanup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.cleanup.is_empty()
    }

    /// Returns the instructions in the order they must be written.
    pub fn into_instructions(self) -> Vec<WriteInstruction> {
        let mut instructions = self.primary;
        instructions.extend(self.cleanup);

        instructions
    }
}

impl IntoIterator for EmittedChanges {
    type Item = WriteInstruction;
    type IntoIter = std::vec::IntoIter<WriteInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_instructions().into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityId, Organization};

    #[test]
    fn primary_writes_come_before_cleanup() {
        let emitted = EmittedChanges::new(
            vec![WriteInstruction::replace(Organization::new(EntityId(9), "Org"))],
            vec![WriteInstruction::delete(EntityId(1_000_005))],
        );

        let targets: Vec<EntityId> = emitted
            .into_iter()
            .map(|instruction| instruction.target_id())
            .collect();

        assert_eq!(targets, vec![EntityId(9), EntityId(1_000_005)]);
    }
}
