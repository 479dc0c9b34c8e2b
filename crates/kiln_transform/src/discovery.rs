//! Slot discovery over a [`TypeSchema`], memoized per transform type.
//!
//! Properties are scanned in declaration order, and each property's setters
//! in order. A setter matches a slot kind when the setter itself carries the
//! marker or, failing that, when the same-named field does. The first match
//! per kind wins. This precedence feeds cache-key stability and must not
//! change.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::registration::Transform;
use crate::schema::{PropertySchema, Setter, SetterFn, SlotKind, TypeSchema};

/// A discovered slot: the property it belongs to and the setter to call.
pub struct InjectableSlot<T> {
    /// Slot kind.
    pub kind: SlotKind,
    /// Name of the property whose setter fills the slot.
    pub property: &'static str,
    /// The setter.
    pub setter: SetterFn<T>,
}

impl<T> Clone for InjectableSlot<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for InjectableSlot<T> {}

impl<T> std::fmt::Debug for InjectableSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectableSlot")
            .field("kind", &self.kind)
            .field("property", &self.property)
            .finish()
    }
}

/// At most one slot of each kind found on a transform type.
pub struct DiscoveredSlots<T> {
    /// Slot receiving the primary input, if any.
    pub primary_input: Option<InjectableSlot<T>>,
    /// Slot receiving the workspace directory, if any.
    pub workspace: Option<InjectableSlot<T>>,
}

impl<T> std::fmt::Debug for DiscoveredSlots<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveredSlots")
            .field("primary_input", &self.primary_input)
            .field("workspace", &self.workspace)
            .finish()
    }
}

impl<T> DiscoveredSlots<T> {
    /// Scans `schema` for every recognized slot kind.
    pub fn discover(schema: &TypeSchema<T>) -> Self {
        Self {
            primary_input: find_slot(schema, SlotKind::PrimaryInput),
            workspace: find_slot(schema, SlotKind::Workspace),
        }
    }

    /// Returns the slot of the given kind.
    pub fn get(&self, kind: SlotKind) -> Option<&InjectableSlot<T>> {
        match kind {
            SlotKind::PrimaryInput => self.primary_input.as_ref(),
            SlotKind::Workspace => self.workspace.as_ref(),
        }
    }

    /// Returns `true` if no slot was found.
    pub fn is_empty(&self) -> bool {
        self.primary_input.is_none() && self.workspace.is_none()
    }
}

fn find_slot<T>(schema: &TypeSchema<T>, kind: SlotKind) -> Option<InjectableSlot<T>> {
    for property in &schema.properties {
        for setter in &property.setters {
            if has_marker(property, setter, kind) {
                return Some(InjectableSlot {
                    kind,
                    property: property.name,
                    setter: setter.apply,
                });
            }
        }
    }
    None
}

/// Setter marker first; the field is only consulted when the setter lacks it.
fn has_marker<T>(property: &PropertySchema<T>, setter: &Setter<T>, kind: SlotKind) -> bool {
    if setter.markers.contains(&kind) {
        return true;
    }
    property
        .field_markers
        .as_ref()
        .is_some_and(|markers| markers.contains(&kind))
}

type SlotCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static SLOT_CACHE: OnceLock<SlotCache> = OnceLock::new();

/// Returns the discovered slots of `T`, computing them on first use.
///
/// Concurrent first calls may each run discovery; the first result stored
/// wins and every caller gets that same `Arc`.
pub fn slots_for<T: Transform>() -> Arc<DiscoveredSlots<T>> {
    let cache = SLOT_CACHE.get_or_init(SlotCache::default);
    let type_id = TypeId::of::<T>();

    let cached = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .cloned();
    if let Some(slots) = cached.and_then(|entry| entry.downcast::<DiscoveredSlots<T>>().ok()) {
        return slots;
    }

    let schema = T::schema();
    let discovered = Arc::new(DiscoveredSlots::discover(&schema));
    tracing::debug!(
        transform = schema.short_name(),
        primary_input = discovered.primary_input.map(|s| s.property),
        workspace = discovered.workspace.map(|s| s.property),
        "discovered transform slots"
    );

    let stored = cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(type_id)
        .or_insert_with(|| discovered.clone() as Arc<dyn Any + Send + Sync>)
        .clone();
    stored.downcast::<DiscoveredSlots<T>>().unwrap_or(discovered)
}
