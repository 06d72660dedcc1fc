// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Type tags reported by the host and the closed set of wrapper kinds.
//!
//! The host identifies an object's class with a numeric art type (mirrored
//! from the host SDK header) plus, for text frames, a text sub-type.
//! [`ItemKind::from_tag`] is the type-to-constructor table: every tag the
//! bridge can wrap maps to exactly one kind, and everything else (including
//! tags introduced by host versions newer than this crate) is rejected with
//! [`BridgeError::UnrecognizedType`] instead of producing a half-typed wrapper.

use crate::error::BridgeError;

/// Raw art type values from the host SDK.
pub mod art_type {
    /// Matches any type in queries; never reported for an object.
    pub const ANY: i16 = -1;
    /// Objects not supported by the plugin interface (graphs, ...).
    pub const UNKNOWN: i16 = 0;
    /// Group container.
    pub const GROUP: i16 = 1;
    /// Bezier path.
    pub const PATH: i16 = 2;
    /// Compound path.
    pub const COMPOUND_PATH: i16 = 3;
    /// Pre-text-engine text; placeholder only.
    pub const TEXT: i16 = 4;
    /// Pre-text-engine text on path; placeholder only.
    pub const TEXT_PATH: i16 = 5;
    /// Pre-text-engine text run; placeholder only.
    pub const TEXT_RUN: i16 = 6;
    /// Placed (linked) file.
    pub const PLACED: i16 = 7;
    /// Obsolete query-only type.
    pub const MYSTERY_PATH: i16 = 8;
    /// Raster image.
    pub const RASTER: i16 = 9;
    /// Plugin group.
    pub const PLUGIN: i16 = 10;
    /// Gradient mesh.
    pub const MESH: i16 = 11;
    /// Text frame; see [`super::text_type`].
    pub const TEXT_FRAME: i16 = 12;
    /// Symbol instance.
    pub const SYMBOL: i16 = 13;
    /// Foreign "black box" object.
    pub const FOREIGN: i16 = 14;
    /// Text read from a legacy file.
    pub const LEGACY_TEXT: i16 = 15;
    /// Layer group (bridge-defined).
    pub const LAYER: i16 = 100;
    /// Live trace object (bridge-defined).
    pub const TRACING: i16 = 101;
}

/// Raw text frame sub-type values from the host SDK.
pub mod text_type {
    /// Point text.
    pub const POINT: i16 = 0;
    /// Area (in-path) text.
    pub const AREA: i16 = 1;
    /// Text on a path.
    pub const PATH: i16 = 2;
}

/// Type tag as reported by the host for one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    /// One of the [`art_type`] values.
    pub art_type: i16,
    /// One of the [`text_type`] values; ignored unless `art_type` is a text frame.
    pub text_type: i16,
}

impl TypeTag {
    /// Tag for a non-text object.
    #[must_use]
    pub const fn art(art_type: i16) -> Self {
        Self {
            art_type,
            text_type: 0,
        }
    }

    /// Tag for a text frame of the given sub-type.
    #[must_use]
    pub const fn text(text_type: i16) -> Self {
        Self {
            art_type: art_type::TEXT_FRAME,
            text_type,
        }
    }
}

/// Text frame flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Text anchored at a point.
    Point,
    /// Text flowing inside an area.
    Area,
    /// Text running along a path.
    OnPath,
}

/// Concrete wrapper kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Group container.
    Group,
    /// Bezier path.
    Path,
    /// Compound path.
    CompoundPath,
    /// Placed file.
    Placed,
    /// Raster image.
    Raster,
    /// Text frame.
    TextFrame(TextKind),
    /// Symbol instance.
    Symbol,
    /// Layer.
    Layer,
    /// Live trace object.
    Tracing,
}

impl ItemKind {
    /// Dispatches a host type tag to a wrapper kind.
    pub fn from_tag(tag: TypeTag) -> Result<Self, BridgeError> {
        let kind = match tag.art_type {
            art_type::GROUP => Self::Group,
            art_type::PATH => Self::Path,
            art_type::COMPOUND_PATH => Self::CompoundPath,
            art_type::PLACED => Self::Placed,
            art_type::RASTER => Self::Raster,
            art_type::SYMBOL => Self::Symbol,
            art_type::LAYER => Self::Layer,
            art_type::TRACING => Self::Tracing,
            art_type::TEXT_FRAME => match tag.text_type {
                text_type::POINT => Self::TextFrame(TextKind::Point),
                text_type::AREA => Self::TextFrame(TextKind::Area),
                text_type::PATH => Self::TextFrame(TextKind::OnPath),
                _ => return Err(unrecognized(tag)),
            },
            _ => return Err(unrecognized(tag)),
        };
        Ok(kind)
    }

    /// Returns the host tag used to create an object of this kind.
    #[must_use]
    pub const fn tag(self) -> TypeTag {
        match self {
            Self::Group => TypeTag::art(art_type::GROUP),
            Self::Path => TypeTag::art(art_type::PATH),
            Self::CompoundPath => TypeTag::art(art_type::COMPOUND_PATH),
            Self::Placed => TypeTag::art(art_type::PLACED),
            Self::Raster => TypeTag::art(art_type::RASTER),
            Self::Symbol => TypeTag::art(art_type::SYMBOL),
            Self::Layer => TypeTag::art(art_type::LAYER),
            Self::Tracing => TypeTag::art(art_type::TRACING),
            Self::TextFrame(TextKind::Point) => TypeTag::text(text_type::POINT),
            Self::TextFrame(TextKind::Area) => TypeTag::text(text_type::AREA),
            Self::TextFrame(TextKind::OnPath) => TypeTag::text(text_type::PATH),
        }
    }
}

fn unrecognized(tag: TypeTag) -> BridgeError {
    BridgeError::UnrecognizedType {
        art_type: tag.art_type,
        text_type: tag.text_type,
    }
}
