use crate::common::Value;
use crate::errors::{ErrorKind, PatchError, PatchResult};
use std::fmt::{Debug, Formatter};
use std::ops::{BitOr, BitOrAssign};

/// Classification flags of an attribute.
///
/// An attribute carrying any flag is never persisted by a partial update:
///
/// - `CLASS_LEVEL` - belongs to the record shape rather than an instance
/// - `DERIVED` - computed from other attributes
/// - `TRANSIENT` - explicitly marked non-persistent
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AttributeFlags(u8);

impl AttributeFlags {
    pub const NONE: AttributeFlags = AttributeFlags(0);
    pub const CLASS_LEVEL: AttributeFlags = AttributeFlags(1);
    pub const DERIVED: AttributeFlags = AttributeFlags(1 << 1);
    pub const TRANSIENT: AttributeFlags = AttributeFlags(1 << 2);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: AttributeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: AttributeFlags) -> AttributeFlags {
        AttributeFlags(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for AttributeFlags {
    type Output = AttributeFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign for AttributeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl Debug for AttributeFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::new();
        if self.contains(AttributeFlags::CLASS_LEVEL) {
            names.push("CLASS_LEVEL");
        }
        if self.contains(AttributeFlags::DERIVED) {
            names.push("DERIVED");
        }
        if self.contains(AttributeFlags::TRANSIENT) {
            names.push("TRANSIENT");
        }
        if names.is_empty() {
            write!(f, "AttributeFlags(NONE)")
        } else {
            write!(f, "AttributeFlags({})", names.join(" | "))
        }
    }
}

/// Reads the current value of one attribute from a record.
pub type Accessor<T> = fn(&T) -> PatchResult<Value>;

/// Describes one attribute of a record shape.
pub struct AttributeDescriptor<T> {
    name: String,
    flags: AttributeFlags,
    accessor: Accessor<T>,
}

impl<T> AttributeDescriptor<T> {
    pub fn new(name: &str, flags: AttributeFlags, accessor: Accessor<T>) -> Self {
        AttributeDescriptor {
            name: name.to_string(),
            flags,
            accessor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> AttributeFlags {
        self.flags
    }

    /// Returns `true` if the attribute carries none of the classification flags.
    pub fn is_persistable(&self) -> bool {
        self.flags.is_empty()
    }

    /// Reads the attribute's current value from `record`.
    pub fn read(&self, record: &T) -> PatchResult<Value> {
        (self.accessor)(record)
    }
}

impl<T> Clone for AttributeDescriptor<T> {
    fn clone(&self) -> Self {
        AttributeDescriptor {
            name: self.name.clone(),
            flags: self.flags,
            accessor: self.accessor,
        }
    }
}

impl<T> Debug for AttributeDescriptor<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .finish()
    }
}

/// The attribute descriptor table of a record shape.
///
/// # Purpose
/// Replaces runtime introspection: a table lists every attribute of a shape in
/// declaration order, with its flags and an accessor. The partial update
/// builder walks it to produce an update payload.
///
/// # Characteristics
/// - Immutable once built
/// - Attribute names are unique within a table
/// - `Sync`, so one table can be shared by every thread through a `&'static`
///
/// # Usage
/// Derived types get their table from `#[derive(Patchable)]`. Shapes that are
/// only known at registration time build one by hand:
/// ```rust
/// use patchdoc::common::Value;
/// use patchdoc::update::{AttributeTable, AttributeFlags};
///
/// struct Point { x: i32, y: i32, label: Option<String> }
///
/// let table = AttributeTable::<Point>::builder("Point")
///     .attribute("x", |p| Ok(Value::from(p.x)))
///     .attribute("y", |p| Ok(Value::from(p.y)))
///     .attribute_with_flags("label", AttributeFlags::TRANSIENT, |p| Ok(Value::from(p.label.clone())))
///     .build()
///     .unwrap();
///
/// assert_eq!(table.len(), 3);
/// ```
pub struct AttributeTable<T> {
    shape: String,
    descriptors: Vec<AttributeDescriptor<T>>,
}

impl<T> AttributeTable<T> {
    /// Starts a table for the record shape named `shape`.
    pub fn builder(shape: &str) -> AttributeTableBuilder<T> {
        AttributeTableBuilder::new(shape)
    }

    /// Creates a table from descriptors whose names are already known to be
    /// unique. Used by `#[derive(Patchable)]`, which checks names at compile time.
    #[doc(hidden)]
    pub fn from_validated(shape: &str, descriptors: Vec<AttributeDescriptor<T>>) -> Self {
        AttributeTable {
            shape: shape.to_string(),
            descriptors,
        }
    }

    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn descriptors(&self) -> &[AttributeDescriptor<T>] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDescriptor<T>> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Iterates the descriptors in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, AttributeDescriptor<T>> {
        self.descriptors.iter()
    }
}

impl<T> Debug for AttributeTable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeTable")
            .field("shape", &self.shape)
            .field("descriptors", &self.descriptors)
            .finish()
    }
}

/// Builder for [AttributeTable].
///
/// The first invalid attribute is remembered and reported by [build](Self::build);
/// later calls are still accepted so registration code can chain freely.
pub struct AttributeTableBuilder<T> {
    shape: String,
    descriptors: Vec<AttributeDescriptor<T>>,
    error: Option<PatchError>,
}

impl<T> AttributeTableBuilder<T> {
    fn new(shape: &str) -> Self {
        AttributeTableBuilder {
            shape: shape.to_string(),
            descriptors: Vec::new(),
            error: None,
        }
    }

    /// Adds a persistable attribute.
    pub fn attribute(self, name: &str, accessor: Accessor<T>) -> Self {
        self.attribute_with_flags(name, AttributeFlags::NONE, accessor)
    }

    pub fn attribute_with_flags(
        mut self,
        name: &str,
        flags: AttributeFlags,
        accessor: Accessor<T>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }

        if name.is_empty() {
            log::error!("Empty attribute name in shape {}", self.shape);
            self.error = Some(PatchError::new(
                &format!("Attribute name cannot be empty in shape '{}'", self.shape),
                ErrorKind::InvalidFieldName,
            ));
            return self;
        }

        if self.descriptors.iter().any(|d| d.name == name) {
            log::error!("Duplicate attribute {} in shape {}", name, self.shape);
            self.error = Some(PatchError::new(
                &format!("Duplicate attribute '{}' in shape '{}'", name, self.shape),
                ErrorKind::InvalidFieldName,
            ));
            return self;
        }

        self.descriptors
            .push(AttributeDescriptor::new(name, flags, accessor));
        self
    }

    pub fn transient(self, name: &str, accessor: Accessor<T>) -> Self {
        self.attribute_with_flags(name, AttributeFlags::TRANSIENT, accessor)
    }

    pub fn derived(self, name: &str, accessor: Accessor<T>) -> Self {
        self.attribute_with_flags(name, AttributeFlags::DERIVED, accessor)
    }

    pub fn class_level(self, name: &str, accessor: Accessor<T>) -> Self {
        self.attribute_with_flags(name, AttributeFlags::CLASS_LEVEL, accessor)
    }

    pub fn build(self) -> PatchResult<AttributeTable<T>> {
        match self.error {
            Some(err) => Err(err),
            None => {
                log::trace!(
                    "Built attribute table for {} with {} attributes",
                    self.shape,
                    self.descriptors.len()
                );
                Ok(AttributeTable {
                    shape: self.shape,
                    descriptors: self.descriptors,
                })
            }
        }
    }
}

/// A record shape with a compile-time attribute descriptor table.
///
/// Implemented by `#[derive(Patchable)]`; the table is built on first use and
/// shared for the life of the process.
pub trait Patchable: Sized + 'static {
    fn attribute_table() -> &'static AttributeTable<Self>;
}
