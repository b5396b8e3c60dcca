//! StatusEffectInstance - Per-owner stack tracking

use super::StatusEffectDef;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An active status on one combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEffectInstance {
    pub def: Arc<StatusEffectDef>,
    /// Always > 0 while the instance exists
    pub stacks: i32,
}

impl StatusEffectInstance {
    pub fn id(&self) -> &str {
        &self.def.id
    }
}

/// Stack change produced by a status map mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackChange {
    pub old: i32,
    pub new: i32,
}

impl StackChange {
    /// The status did not exist before this change
    pub fn created(&self) -> bool {
        self.old == 0 && self.new > 0
    }

    /// The status no longer exists after this change
    pub fn removed(&self) -> bool {
        self.old > 0 && self.new == 0
    }
}

/// Status id → instance mapping, kept in application order
///
/// Keys are unique and no entry ever holds zero or negative stacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusMap {
    entries: Vec<StatusEffectInstance>,
}

impl StatusMap {
    pub fn new() -> Self {
        StatusMap { entries: Vec::new() }
    }

    pub fn get(&self, id: &str) -> Option<&StatusEffectInstance> {
        self.entries.iter().find(|e| e.def.id == id)
    }

    /// Stack count for a status, 0 when absent
    pub fn stacks(&self, id: &str) -> i32 {
        self.get(id).map(|e| e.stacks).unwrap_or(0)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Add stacks, creating the instance if needed
    pub fn add(&mut self, def: &Arc<StatusEffectDef>, stacks: i32) -> StackChange {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.def.id == def.id) {
            let old = entry.stacks;
            entry.stacks = def.clamp_stacks(old.saturating_add(stacks));
            let new = entry.stacks;
            if new <= 0 {
                self.entries.retain(|e| e.def.id != def.id);
                return StackChange { old, new: 0 };
            }
            return StackChange { old, new };
        }

        let new = def.clamp_stacks(stacks);
        if new > 0 {
            self.entries.push(StatusEffectInstance {
                def: Arc::clone(def),
                stacks: new,
            });
        }
        StackChange { old: 0, new: new.max(0) }
    }

    /// Remove up to `stacks` stacks, dropping the instance at zero
    pub fn reduce(&mut self, id: &str, stacks: i32) -> Option<StackChange> {
        let pos = self.entries.iter().position(|e| e.def.id == id)?;
        let old = self.entries[pos].stacks;
        let new = old.saturating_sub(stacks.max(0)).max(0);
        if new == 0 {
            self.entries.remove(pos);
        } else {
            self.entries[pos].stacks = new;
        }
        Some(StackChange { old, new })
    }

    pub fn remove(&mut self, id: &str) -> Option<StatusEffectInstance> {
        let pos = self.entries.iter().position(|e| e.def.id == id)?;
        Some(self.entries.remove(pos))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop everything that does not survive combat end
    pub fn retain_permanent(&mut self) {
        self.entries.retain(|e| e.def.permanent);
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffectInstance> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy of the current entries, for hook dispatch while mutating
    pub fn snapshot(&self) -> Vec<StatusEffectInstance> {
        self.entries.clone()
    }
}
