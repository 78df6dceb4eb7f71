//! Configuration for vertex array state.
//!
//! [`AttributeAliasing`] decides which generic slot each fixed attribute
//! and texture coordinate unit is aliased onto; [`VertexStateConfig`]
//! bundles it with the per-process settings used when states are created.

use crate::types::FixedAttribute;

/// First slot used for texture coordinates by the default aliasing.
pub const DEFAULT_TEX_COORD_BASE_SLOT: u32 = 8;

/// Default number of texture coordinate units.
pub const DEFAULT_TEX_COORD_UNITS: u32 = 8;

/// Default number of generic vertex attribute slots.
pub const DEFAULT_VERTEX_ATTRIB_COUNT: u32 = 16;

/// Highest number of attribute slots a state will track.
pub const MAX_VERTEX_ATTRIB_SLOTS: u32 = 256;

/// Default number of concurrently supported contexts.
pub const DEFAULT_MAX_CONTEXTS: usize = 32;

/// Slot assignment for fixed attributes and texture coordinates.
///
/// The defaults follow the conventional aliasing table: vertex 0,
/// normal 2, color 3, secondary color 4, fog coordinate 5 and texture
/// units starting at slot 8.
///
/// # Example
///
/// ```ignore
/// let aliasing = AttributeAliasing::new()
///     .with_slot(FixedAttribute::Color, 6)
///     .with_tex_coord_units(4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeAliasing {
    /// Slot per fixed attribute, indexed by [`FixedAttribute::index`].
    fixed: [u32; 5],
    /// Slot per texture coordinate unit.
    tex_coords: Vec<u32>,
    /// Number of generic attribute slots to prepare.
    vertex_attrib_count: u32,
}

impl AttributeAliasing {
    /// Create the default aliasing.
    pub fn new() -> Self {
        Self {
            fixed: [0, 2, 3, 4, 5],
            tex_coords: (0..DEFAULT_TEX_COORD_UNITS)
                .map(|unit| DEFAULT_TEX_COORD_BASE_SLOT + unit)
                .collect(),
            vertex_attrib_count: DEFAULT_VERTEX_ATTRIB_COUNT,
        }
    }

    /// Alias `attribute` onto `slot`.
    pub fn with_slot(mut self, attribute: FixedAttribute, slot: u32) -> Self {
        self.set_slot(attribute, slot);
        self
    }

    /// Alias `attribute` onto `slot` in place.
    pub fn set_slot(&mut self, attribute: FixedAttribute, slot: u32) {
        self.fixed[attribute.index()] = slot;
    }

    /// Use `units` texture coordinate units at consecutive slots from
    /// [`DEFAULT_TEX_COORD_BASE_SLOT`].
    pub fn with_tex_coord_units(mut self, units: u32) -> Self {
        self.tex_coords = (0..units)
            .map(|unit| DEFAULT_TEX_COORD_BASE_SLOT + unit)
            .collect();
        self
    }

    /// Alias texture coordinate `unit` onto `slot`, adding units as needed.
    pub fn with_tex_coord_slot(mut self, unit: u32, slot: u32) -> Self {
        let unit = unit as usize;
        while self.tex_coords.len() <= unit {
            let next = DEFAULT_TEX_COORD_BASE_SLOT + self.tex_coords.len() as u32;
            self.tex_coords.push(next);
        }
        self.tex_coords[unit] = slot;
        self
    }

    /// Set the number of generic attribute slots to prepare.
    pub fn with_vertex_attrib_count(mut self, count: u32) -> Self {
        self.vertex_attrib_count = count;
        self
    }

    /// Slot `attribute` is aliased onto.
    pub fn slot(&self, attribute: FixedAttribute) -> u32 {
        self.fixed[attribute.index()]
    }

    /// Slot texture coordinate `unit` is aliased onto.
    pub fn tex_coord_slot(&self, unit: u32) -> Option<u32> {
        self.tex_coords.get(unit as usize).copied()
    }

    /// Number of texture coordinate units.
    pub fn tex_coord_units(&self) -> u32 {
        self.tex_coords.len() as u32
    }

    /// Number of generic attribute slots to prepare.
    pub fn vertex_attrib_count(&self) -> u32 {
        self.vertex_attrib_count
    }
}

impl Default for AttributeAliasing {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings used when creating per-context vertex array states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexStateConfig {
    /// Number of contexts a [`VertexArrayStateList`](crate::VertexArrayStateList) can hold.
    pub max_contexts: usize,
    /// Whether new states try to create a vertex array object.
    pub use_vertex_array_objects: bool,
    /// Slot aliasing applied to new states.
    pub aliasing: AttributeAliasing,
}

impl VertexStateConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self {
            max_contexts: DEFAULT_MAX_CONTEXTS,
            use_vertex_array_objects: true,
            aliasing: AttributeAliasing::new(),
        }
    }

    /// Set the number of supported contexts.
    pub fn with_max_contexts(mut self, max_contexts: usize) -> Self {
        self.max_contexts = max_contexts;
        self
    }

    /// Set whether vertex array objects are used.
    pub fn with_vertex_array_objects(mut self, enabled: bool) -> Self {
        self.use_vertex_array_objects = enabled;
        self
    }

    /// Set the slot aliasing.
    pub fn with_aliasing(mut self, aliasing: AttributeAliasing) -> Self {
        self.aliasing = aliasing;
        self
    }
}

impl Default for VertexStateConfig {
    fn default() -> Self {
        Self::new()
    }
}
