// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Primitive values marshalled across the native boundary.

use std::collections::BTreeMap;

use crate::ident::NativeRef;

/// Scalar or small aggregate value carried in a [`StateRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Integer value (enumerations, counts).
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// 2D point in document coordinates.
    Point {
        /// Horizontal coordinate.
        x: f64,
        /// Vertical coordinate.
        y: f64,
    },
    /// Axis-aligned rectangle in document coordinates.
    Rect {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
    },
    /// Color components (RGBA or the host's native model).
    Color([f32; 4]),
    /// Text value.
    Text(String),
}

/// Which cached view of an object a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Section {
    /// Path style (fill, stroke, clipping flags).
    Style,
    /// Position of the object's center.
    Position,
    /// Bounding box excluding stroke.
    Bounds,
    /// Adapter-defined section.
    Custom(&'static str),
}

/// Ordered field name to value map for one [`Section`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateRecord {
    fields: BTreeMap<String, Value>,
}

impl StateRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Returns the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets `name` to `value`, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the record holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Payload of one native commit call.
///
/// All commitables dirtied under the same commit key stage their sections
/// into one batch; the batch is then pushed with a single
/// [`crate::NativeHost::commit_state`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitBatch {
    /// Object receiving the state.
    pub target: NativeRef,
    /// Staged sections.
    pub sections: BTreeMap<Section, StateRecord>,
}

impl CommitBatch {
    /// Creates an empty batch addressed to `target`.
    pub fn new(target: NativeRef) -> Self {
        Self {
            target,
            sections: BTreeMap::new(),
        }
    }

    /// Stages `record` for `section`, replacing any previously staged record.
    pub fn stage(&mut self, section: Section, record: StateRecord) {
        self.sections.insert(section, record);
    }

    /// Returns the staged record for `section`.
    pub fn section(&self, section: Section) -> Option<&StateRecord> {
        self.sections.get(&section)
    }
}
