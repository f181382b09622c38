//! Day/slot grid and the per-class slot rules.

use std::collections::HashMap;

use types::{ClassSlotRule, Instance, LabWindow, Slot};

use crate::error::ConfigError;

/// Lookup table of class slot rules, keyed by class name.
#[derive(Clone, Debug)]
pub struct Topology {
    rules: HashMap<String, ClassSlotRule>,
}

fn rule(name: &str, lab_priority: [LabWindow; 3], lecture: [u8; 4]) -> ClassSlotRule {
    ClassSlotRule {
        class_name: name.to_string(),
        lab_priority: lab_priority.to_vec(),
        lecture_slots: lecture.iter().map(|&s| Slot(s)).collect(),
    }
}

impl Topology {
    pub fn new(rules: impl IntoIterator<Item = ClassSlotRule>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|r| (r.class_name.clone(), r))
                .collect(),
        }
    }

    /// Department table: preferred lab window first, lectures kept clear of it.
    pub fn standard() -> Self {
        use LabWindow::{Afternoon as Aft, Midday as Mid, Morning as Mor};
        Self::new([
            rule("SE-A", [Mor, Mid, Aft], [3, 4, 5, 6]),
            rule("SE-B", [Mid, Mor, Aft], [1, 2, 5, 6]),
            rule("SE-C", [Aft, Mid, Mor], [1, 2, 3, 4]),
            rule("TE-A", [Mor, Mid, Aft], [3, 4, 5, 6]),
            rule("TE-B", [Aft, Mid, Mor], [1, 2, 3, 4]),
            rule("BE-A", [Mor, Mid, Aft], [3, 4, 5, 6]),
            rule("BE-B", [Aft, Mid, Mor], [1, 2, 3, 4]),
        ])
    }

    /// Snapshot-supplied rules, or the standard table when the snapshot carries none.
    pub fn for_instance(inst: &Instance) -> Self {
        if inst.slot_rules.is_empty() {
            Self::standard()
        } else {
            Self::new(inst.slot_rules.iter().cloned())
        }
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.rules.contains_key(class_name)
    }

    fn rule(&self, class_name: &str) -> Result<&ClassSlotRule, ConfigError> {
        self.rules
            .get(class_name)
            .ok_or_else(|| ConfigError::NoSlotRule(class_name.to_string()))
    }

    pub fn lab_windows(&self, class_name: &str) -> Result<&[LabWindow], ConfigError> {
        Ok(&self.rule(class_name)?.lab_priority)
    }

    /// The class's primary lab window.
    pub fn preferred_lab_window(&self, class_name: &str) -> Result<Option<LabWindow>, ConfigError> {
        Ok(self.lab_windows(class_name)?.first().copied())
    }

    pub fn lecture_slots(&self, class_name: &str) -> Result<&[Slot], ConfigError> {
        Ok(&self.rule(class_name)?.lecture_slots)
    }

    pub fn window_for_slot(slot: Slot) -> Option<LabWindow> {
        LabWindow::containing(slot)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::standard()
    }
}
