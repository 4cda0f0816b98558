//! Cross-selection aggregation of format properties
//!
//! When the UI layer selects many elements it builds an aggregation for the
//! formats' type and feeds it every selected format; the aggregation keeps a
//! weak membership set and per-field summaries (sets of observed values,
//! min/max, boolean tri-states) that drive the format-editing dialogs.
//!
//! Summaries are never decremented in place. Removing a member and calling
//! `format_changed` rebuilds every summary from the surviving membership,
//! because a removed member's contribution to a set or tri-state cannot be
//! subtracted reliably.

use crate::format::SharedFormat;
use std::any::Any;
use std::rc::{Rc, Weak};

/// Common contract of every aggregation
pub trait Aggregation: Any {
    /// Type name of the formats this aggregation accepts
    fn type_name(&self) -> &'static str;

    /// Fold one format in. Returns false when the format's dynamic type
    /// does not match; returns `include_existing` when the format is
    /// already a member and `include_existing` is false; otherwise records
    /// membership and folds the value into every summary.
    fn add_format(&mut self, format: &SharedFormat, include_existing: bool) -> bool;

    /// Drop a member. Summaries stay stale until `format_changed`.
    fn remove_format(&mut self, format: &SharedFormat);

    /// Recompute every summary from the surviving membership
    fn format_changed(&mut self);

    /// Reset membership and every summary to the initial state
    fn clear(&mut self);

    /// Live members (dead weak references excluded)
    fn member_count(&self) -> usize;

    fn as_any(&self) -> &dyn Any;
}

// =============================================================================
// Boolean tri-state
// =============================================================================

/// Aggregate of boolean observations across a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    /// Nothing observed yet
    #[default]
    Invalid,
    /// Every observation was true
    AllTrue,
    /// Every observation was false
    AllFalse,
    /// Both values observed; absorbing
    Both,
}

impl TriState {
    pub fn observe(&mut self, value: bool) {
        *self = match (*self, value) {
            (TriState::Invalid, true) => TriState::AllTrue,
            (TriState::Invalid, false) => TriState::AllFalse,
            (TriState::AllTrue, true) => TriState::AllTrue,
            (TriState::AllFalse, false) => TriState::AllFalse,
            _ => TriState::Both,
        };
    }
}

// =============================================================================
// Observed float values
// =============================================================================

/// De-duplicated set of observed float values, insertion-ordered.
///
/// Floats lack a total order, so a sorted set type does not apply; the
/// observed values are few (one per distinct selection value).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatSet {
    values: Vec<f64>,
}

impl FloatSet {
    pub fn insert(&mut self, value: f64) {
        if !self.values.iter().any(|v| *v == value) {
            self.values.push(value);
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

// =============================================================================
// Membership
// =============================================================================

/// Weak, pointer-deduplicated membership set of contributing formats
#[derive(Default)]
pub struct Membership {
    members: Vec<Weak<std::cell::RefCell<Box<dyn crate::format::Format>>>>,
}

impl Membership {
    pub fn contains(&self, format: &SharedFormat) -> bool {
        self.members
            .iter()
            .any(|weak| weak.as_ptr() == Rc::as_ptr(format))
    }

    /// Record a member; false when already present
    pub fn insert(&mut self, format: &SharedFormat) -> bool {
        if self.contains(format) {
            return false;
        }
        self.members.push(Rc::downgrade(format));
        true
    }

    pub fn remove(&mut self, format: &SharedFormat) {
        self.members
            .retain(|weak| weak.as_ptr() != Rc::as_ptr(format));
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Upgrade the surviving members, pruning dead references
    pub fn live(&mut self) -> Vec<SharedFormat> {
        let live: Vec<SharedFormat> =
            self.members.iter().filter_map(|weak| weak.upgrade()).collect();
        self.members = live.iter().map(Rc::downgrade).collect();
        live
    }

    pub fn len(&self) -> usize {
        self.members
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
