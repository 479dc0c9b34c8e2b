//! Static descriptions of transform types.
//!
//! There is no runtime reflection to find injectable properties, so each
//! transform type lists its settable properties explicitly. A property has
//! zero or more setters and may have a same-named backing field; either the
//! setter or the field can carry a [`SlotKind`] marker.

use std::path::PathBuf;

use crate::error::BoxError;

/// A kind of configurable point filled by injection at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Receives the primary input file of the transform.
    PrimaryInput,
    /// Receives the directory the transform writes its outputs to.
    Workspace,
}

/// Setter function used to inject a path into an instance.
pub type SetterFn<T> = fn(&mut T, PathBuf) -> Result<(), BoxError>;

/// A setter of a property, with the slot markers placed on the setter itself.
pub struct Setter<T> {
    pub(crate) markers: Vec<SlotKind>,
    pub(crate) apply: SetterFn<T>,
}

impl<T> Setter<T> {
    /// Creates an unmarked setter.
    pub fn new(apply: SetterFn<T>) -> Self {
        Self {
            markers: Vec::new(),
            apply,
        }
    }

    /// Adds a slot marker to this setter.
    pub fn marked(mut self, kind: SlotKind) -> Self {
        self.markers.push(kind);
        self
    }
}

/// One settable property of a transform type.
pub struct PropertySchema<T> {
    pub(crate) name: &'static str,
    pub(crate) setters: Vec<Setter<T>>,
    /// Markers on the same-named field; `None` when no such field exists.
    pub(crate) field_markers: Option<Vec<SlotKind>>,
}

impl<T> PropertySchema<T> {
    /// Creates a property with no setters and no backing field.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            setters: Vec::new(),
            field_markers: None,
        }
    }

    /// Adds a setter.
    pub fn setter(mut self, setter: Setter<T>) -> Self {
        self.setters.push(setter);
        self
    }

    /// Declares a same-named backing field carrying `markers`.
    pub fn field(mut self, markers: &[SlotKind]) -> Self {
        self.field_markers = Some(markers.to_vec());
        self
    }

    /// Returns the property name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The settable properties of a transform type, in declaration order.
pub struct TypeSchema<T> {
    pub(crate) type_name: &'static str,
    pub(crate) properties: Vec<PropertySchema<T>>,
}

impl<T> TypeSchema<T> {
    /// Creates an empty schema named after `T`.
    pub fn new() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            properties: Vec::new(),
        }
    }

    /// Appends a property.
    pub fn property(mut self, property: PropertySchema<T>) -> Self {
        self.properties.push(property);
        self
    }

    /// Returns the fully qualified type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.type_name.split('<').next().unwrap_or(self.type_name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Returns property names in declaration order.
    pub fn property_names(&self) -> Vec<&'static str> {
        self.properties.iter().map(|p| p.name).collect()
    }
}

impl<T> Default for TypeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}
