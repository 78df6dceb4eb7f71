//! Per-context single-element upload tables.
//!
//! Attributes bound per primitive or per vertex are not pointed at arrays;
//! their values are uploaded one element at a time. [`AttributeDispatchers`]
//! holds the tables that pick the right upload for each attribute and
//! [`DispatchPass`] replays the selected uploads for every element index.

use crate::config::{AttributeAliasing, MAX_VERTEX_ATTRIB_SLOTS};
use crate::device::GraphicsDevice;
use crate::source::ArraySource;
use crate::types::{ArrayType, FixedAttribute};

use super::attribute::{AttributeDispatch, AttributeFunction};
use super::table::AttributeDispatchTable;

/// Element types accepted by each fixed attribute's table.
fn fixed_array_types(attribute: FixedAttribute) -> &'static [ArrayType] {
    match attribute {
        FixedAttribute::Vertex => &[
            ArrayType::Vec2,
            ArrayType::Vec3,
            ArrayType::Vec4,
            ArrayType::Vec2d,
            ArrayType::Vec3d,
            ArrayType::Vec4d,
        ],
        FixedAttribute::Normal => &[ArrayType::Vec3, ArrayType::Vec3d],
        FixedAttribute::Color => &[
            ArrayType::Vec3,
            ArrayType::Vec4,
            ArrayType::Vec3d,
            ArrayType::Vec4d,
            ArrayType::Vec4ub,
        ],
        FixedAttribute::SecondaryColor => &[ArrayType::Vec3, ArrayType::Vec3d],
        FixedAttribute::FogCoord => &[ArrayType::Float, ArrayType::Double],
    }
}

/// Element types accepted by generic attribute tables.
const VERTEX_ATTRIB_ARRAY_TYPES: &[ArrayType] = &[
    ArrayType::Float,
    ArrayType::Vec2,
    ArrayType::Vec3,
    ArrayType::Vec4,
    ArrayType::Double,
    ArrayType::Vec2d,
    ArrayType::Vec3d,
    ArrayType::Vec4d,
    ArrayType::Vec4ub,
];

/// Upload tables for every attribute of one context.
///
/// Fixed attributes upload through their named entry points unless
/// aliasing is enabled, in which case they upload to the generic slot
/// they are aliased onto. Generic slot tables are created on first use.
#[derive(Debug, Clone)]
pub struct AttributeDispatchers {
    fixed: [AttributeDispatchTable; 5],
    vertex_attrib: Vec<AttributeDispatchTable>,
    aliased: bool,
}

impl AttributeDispatchers {
    /// Create tables targeting the fixed-function entry points.
    pub fn new() -> Self {
        let mut dispatchers = Self {
            fixed: Default::default(),
            vertex_attrib: Vec::new(),
            aliased: false,
        };
        for attribute in FixedAttribute::ALL {
            dispatchers.register_fixed(attribute);
        }
        dispatchers
    }

    /// Create tables that upload fixed attributes to their aliased slots.
    pub fn with_aliasing(aliasing: &AttributeAliasing) -> Self {
        let mut dispatchers = Self::new();
        dispatchers.set_aliasing(Some(aliasing));
        dispatchers
    }

    /// Retarget the fixed attribute tables.
    ///
    /// `Some` uploads each fixed attribute to its aliased generic slot,
    /// `None` restores the fixed-function entry points.
    pub fn set_aliasing(&mut self, aliasing: Option<&AttributeAliasing>) {
        self.aliased = aliasing.is_some();
        for attribute in FixedAttribute::ALL {
            match aliasing {
                Some(aliasing) => {
                    let slot = aliasing.slot(attribute);
                    let table = &mut self.fixed[attribute.index()];
                    for &array_type in fixed_array_types(attribute) {
                        let function = AttributeFunction::for_array_type(array_type);
                        table.target_assign(slot, array_type, function, array_type.data_size() as usize);
                    }
                }
                None => self.register_fixed(attribute),
            }
        }
        log::debug!(
            "AttributeDispatchers: fixed attributes {}",
            if self.aliased { "aliased onto generic slots" } else { "use fixed entry points" }
        );
    }

    /// Whether fixed attributes upload to generic slots.
    pub fn is_aliased(&self) -> bool {
        self.aliased
    }

    fn register_fixed(&mut self, attribute: FixedAttribute) {
        let table = &mut self.fixed[attribute.index()];
        for &array_type in fixed_array_types(attribute) {
            let function = AttributeFunction::for_array_type(array_type);
            table.assign(array_type, attribute, function, array_type.data_size() as usize);
        }
    }

    fn vertex_attrib_table(&mut self, unit: u32) -> &mut AttributeDispatchTable {
        let index = unit as usize;
        while self.vertex_attrib.len() <= index {
            let slot = self.vertex_attrib.len() as u32;
            let mut table = AttributeDispatchTable::new();
            for &array_type in VERTEX_ATTRIB_ARRAY_TYPES {
                let function = AttributeFunction::for_array_type(array_type);
                table.target_assign(slot, array_type, function, array_type.data_size() as usize);
            }
            self.vertex_attrib.push(table);
        }
        &mut self.vertex_attrib[index]
    }

    /// Upload for a fixed attribute's array, if its type is supported.
    pub fn fixed_dispatcher<'a>(
        &self,
        attribute: FixedAttribute,
        array: &'a dyn ArraySource,
    ) -> Option<AttributeDispatch<'a>> {
        self.fixed[attribute.index()].dispatcher(array)
    }

    /// Upload for a normal array.
    pub fn normal_dispatcher<'a>(&self, array: &'a dyn ArraySource) -> Option<AttributeDispatch<'a>> {
        self.fixed_dispatcher(FixedAttribute::Normal, array)
    }

    /// Upload for a color array.
    pub fn color_dispatcher<'a>(&self, array: &'a dyn ArraySource) -> Option<AttributeDispatch<'a>> {
        self.fixed_dispatcher(FixedAttribute::Color, array)
    }

    /// Upload for a secondary color array.
    pub fn secondary_color_dispatcher<'a>(
        &self,
        array: &'a dyn ArraySource,
    ) -> Option<AttributeDispatch<'a>> {
        self.fixed_dispatcher(FixedAttribute::SecondaryColor, array)
    }

    /// Upload for a fog coordinate array.
    pub fn fog_coord_dispatcher<'a>(&self, array: &'a dyn ArraySource) -> Option<AttributeDispatch<'a>> {
        self.fixed_dispatcher(FixedAttribute::FogCoord, array)
    }

    /// Upload for generic attribute `unit`, creating its table if needed.
    ///
    /// Units at or beyond [`MAX_VERTEX_ATTRIB_SLOTS`] have no upload.
    pub fn vertex_attrib_dispatcher<'a>(
        &mut self,
        unit: u32,
        array: &'a dyn ArraySource,
    ) -> Option<AttributeDispatch<'a>> {
        if unit >= MAX_VERTEX_ATTRIB_SLOTS {
            log::warn!(
                "AttributeDispatchers: vertex attribute {} beyond limit {}",
                unit,
                MAX_VERTEX_ATTRIB_SLOTS
            );
            return None;
        }
        self.vertex_attrib_table(unit).dispatcher(array)
    }
}

impl Default for AttributeDispatchers {
    fn default() -> Self {
        Self::new()
    }
}

/// Uploads selected for one primitive set, replayed per element index.
#[derive(Debug, Default)]
pub struct DispatchPass<'a> {
    active: Vec<AttributeDispatch<'a>>,
}

impl<'a> DispatchPass<'a> {
    /// Create an empty pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `dispatch` to the pass. `None` is ignored.
    pub fn activate(&mut self, dispatch: Option<AttributeDispatch<'a>>) {
        if let Some(dispatch) = dispatch {
            self.active.push(dispatch);
        }
    }

    /// Upload element `index` of every active dispatch.
    ///
    /// Returns how many uploads were issued.
    pub fn dispatch(&self, device: &mut dyn GraphicsDevice, index: usize) -> usize {
        let mut issued = 0;
        for dispatch in &self.active {
            if dispatch.call(device, index) {
                issued += 1;
            }
        }
        issued
    }

    /// Number of active dispatches.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether nothing is active.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drop every active dispatch.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
