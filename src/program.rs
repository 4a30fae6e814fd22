//! The learner's program: an ordered list of placed blocks
//!
//! Insertion order is execution order. While a run is in flight the program
//! is frozen and edits are silently ignored.

use crate::catalog::{BlockAction, BlockDef};

/// Stable identifier of a placed block (never renumbered on removal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u32);

/// A block placed in the program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInstance {
    pub id: InstanceId,
    pub def: &'static BlockDef,
}

impl BlockInstance {
    #[inline]
    pub fn action(&self) -> BlockAction {
        self.def.action
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    blocks: Vec<BlockInstance>,
    next_id: u32,
    frozen: bool,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_id: 1,
            frozen: false,
        }
    }

    /// Append a block; `None` when frozen
    pub fn append(&mut self, def: &'static BlockDef) -> Option<InstanceId> {
        if self.frozen {
            log::debug!("Ignoring append of {} while running", def.id);
            return None;
        }
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.blocks.push(BlockInstance { id, def });
        Some(id)
    }

    /// Remove the block at `index`; `None` when frozen or out of range
    pub fn remove_at(&mut self, index: usize) -> Option<BlockInstance> {
        if self.frozen || index >= self.blocks.len() {
            return None;
        }
        Some(self.blocks.remove(index))
    }

    /// Drop every block (ignored while frozen)
    pub fn clear(&mut self) {
        if !self.frozen {
            self.blocks.clear();
        }
    }

    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BlockInstance> {
        self.blocks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockInstance> {
        self.blocks.iter()
    }

    /// Snapshot of the actions in execution order
    pub fn actions(&self) -> Vec<BlockAction> {
        self.blocks.iter().map(BlockInstance::action).collect()
    }

    /// Whether any block performs `action` (continuous-mode configuration)
    pub fn contains(&self, action: BlockAction) -> bool {
        self.blocks.iter().any(|b| b.action() == action)
    }

    /// Number of blocks performing `action`
    pub fn count(&self, action: BlockAction) -> usize {
        self.blocks.iter().filter(|b| b.action() == action).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::lookup;

    fn block(id: &str) -> &'static BlockDef {
        lookup(id).unwrap()
    }

    #[test]
    fn test_append_preserves_order() {
        let mut p = Program::new();
        p.append(block("b1"));
        p.append(block("b4"));
        p.append(block("b1"));
        assert_eq!(
            p.actions(),
            vec![BlockAction::MoveRight, BlockAction::MoveDown, BlockAction::MoveRight]
        );
    }

    #[test]
    fn test_remove_keeps_ids() {
        let mut p = Program::new();
        let a = p.append(block("b1")).unwrap();
        let b = p.append(block("b2")).unwrap();
        let c = p.append(block("b3")).unwrap();

        let removed = p.remove_at(1).unwrap();
        assert_eq!(removed.id, b);
        assert_eq!(p.get(0).unwrap().id, a);
        assert_eq!(p.get(1).unwrap().id, c);

        // New ids never reuse a removed one
        let d = p.append(block("b4")).unwrap();
        assert!(d > c);
        assert!(p.remove_at(9).is_none());
    }

    #[test]
    fn test_frozen_ignores_edits() {
        let mut p = Program::new();
        p.append(block("b1"));
        p.set_frozen(true);
        assert!(p.append(block("b2")).is_none());
        assert!(p.remove_at(0).is_none());
        p.clear();
        assert_eq!(p.len(), 1);

        p.set_frozen(false);
        assert!(p.append(block("b2")).is_some());
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_presence_queries() {
        let mut p = Program::new();
        p.append(block("v3"));
        p.append(block("v3"));
        p.append(block("v2"));
        assert!(p.contains(BlockAction::IncScore));
        assert!(!p.contains(BlockAction::GoRight));
        assert_eq!(p.count(BlockAction::GoLeft), 2);
    }
}
