// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! GPU register-field enumerations and decode helpers
//!
//! Pipeline state arrives as raw 32-bit data words on register-mapped
//! methods. This module gives every multi-value field an explicit Rust
//! enum with a `from_raw` decoder, plus the small bit-extraction and
//! channel-expansion helpers the rest of the GPU shares.
//!
//! Most selector values are the familiar GL token numbers (comparison
//! functions 0x200-0x207, logic ops 0x1500-0x150F, blend factors and
//! equations), because the guest driver programs the chip with them
//! directly. Unknown raw values decode to the same fallback the hardware
//! exhibits: comparisons fall back to ALWAYS, stencil ops to KEEP, logic
//! ops to COPY, and so on.

/// Extract `width` bits starting at bit `lo`
#[inline(always)]
pub fn bits(value: u32, lo: u32, width: u32) -> u32 {
    (value >> lo) & ((1u32 << width) - 1)
}

/// Expand a 4-bit channel value to 8 bits (0xF -> 0xFF)
#[inline(always)]
pub fn pal4bit(value: u32) -> u32 {
    let v = value & 0x0F;
    (v << 4) | v
}

/// Expand a 5-bit channel value to 8 bits (0x1F -> 0xFF)
#[inline(always)]
pub fn pal5bit(value: u32) -> u32 {
    let v = value & 0x1F;
    (v << 3) | (v >> 2)
}

/// Expand a 6-bit channel value to 8 bits (0x3F -> 0xFF)
#[inline(always)]
pub fn pal6bit(value: u32) -> u32 {
    let v = value & 0x3F;
    (v << 2) | (v >> 4)
}

/// Comparison function shared by the alpha, stencil and depth tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonOp {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    #[default]
    Always,
}

impl ComparisonOp {
    /// Decode the GL comparison token; unknown values compare ALWAYS
    pub fn from_raw(value: u32) -> Self {
        match value {
            0x0200 => Self::Never,
            0x0201 => Self::Less,
            0x0202 => Self::Equal,
            0x0203 => Self::LessEqual,
            0x0204 => Self::Greater,
            0x0205 => Self::NotEqual,
            0x0206 => Self::GreaterEqual,
            0x0207 => Self::Always,
            _ => Self::Always,
        }
    }

    /// Apply the comparison as `incoming OP stored`
    #[inline(always)]
    pub fn passes(self, incoming: u32, stored: u32) -> bool {
        match self {
            Self::Never => false,
            Self::Less => incoming < stored,
            Self::Equal => incoming == stored,
            Self::LessEqual => incoming <= stored,
            Self::Greater => incoming > stored,
            Self::NotEqual => incoming != stored,
            Self::GreaterEqual => incoming >= stored,
            Self::Always => true,
        }
    }
}

/// Stencil update operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StencilOp {
    Zero,
    Invert,
    #[default]
    Keep,
    Replace,
    Incr,
    Decr,
    IncrWrap,
    DecrWrap,
}

impl StencilOp {
    /// Decode the GL stencil-op token; unknown values KEEP
    pub fn from_raw(value: u32) -> Self {
        match value {
            0x0000 => Self::Zero,
            0x150A => Self::Invert,
            0x1E00 => Self::Keep,
            0x1E01 => Self::Replace,
            0x1E02 => Self::Incr,
            0x1E03 => Self::Decr,
            0x8507 => Self::IncrWrap,
            0x8508 => Self::DecrWrap,
            _ => Self::Keep,
        }
    }

    /// Produce the updated stencil value for a stored value and reference
    #[inline(always)]
    pub fn apply(self, stored: u32, reference: u32) -> u32 {
        match self {
            Self::Zero => 0,
            Self::Invert => stored ^ 255,
            Self::Keep => stored,
            Self::Replace => reference,
            Self::Incr => {
                if stored < 255 {
                    stored + 1
                } else {
                    stored
                }
            }
            Self::Decr => {
                if stored > 0 {
                    stored - 1
                } else {
                    stored
                }
            }
            Self::IncrWrap => {
                if stored < 255 {
                    stored + 1
                } else {
                    0
                }
            }
            Self::DecrWrap => {
                if stored > 0 {
                    stored - 1
                } else {
                    255
                }
            }
        }
    }
}

/// Blend scale factor for source or destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    DstColor,
    OneMinusDstColor,
    SrcAlphaSaturate,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
}

impl BlendFactor {
    /// Decode the GL blend-factor token
    ///
    /// Returns `None` for unknown values; the caller substitutes the
    /// hardware fallback (ONE for the source slot, ZERO for destination).
    pub fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            0x0000 => Self::Zero,
            0x0001 => Self::One,
            0x0300 => Self::SrcColor,
            0x0301 => Self::OneMinusSrcColor,
            0x0302 => Self::SrcAlpha,
            0x0303 => Self::OneMinusSrcAlpha,
            0x0304 => Self::DstAlpha,
            0x0305 => Self::OneMinusDstAlpha,
            0x0306 => Self::DstColor,
            0x0307 => Self::OneMinusDstColor,
            0x0308 => Self::SrcAlphaSaturate,
            0x8001 => Self::ConstantColor,
            0x8002 => Self::OneMinusConstantColor,
            0x8003 => Self::ConstantAlpha,
            0x8004 => Self::OneMinusConstantAlpha,
            _ => return None,
        })
    }
}

/// Blend combine equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendEquation {
    #[default]
    FuncAdd,
    Min,
    Max,
    FuncSubtract,
    FuncReverseSubtract,
}

impl BlendEquation {
    /// Decode the GL blend-equation token; unknown values ADD
    pub fn from_raw(value: u32) -> Self {
        match value {
            0x8006 => Self::FuncAdd,
            0x8007 => Self::Min,
            0x8008 => Self::Max,
            0x800A => Self::FuncSubtract,
            0x800B => Self::FuncReverseSubtract,
            _ => Self::FuncAdd,
        }
    }
}

/// Framebuffer logical operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicOp {
    Clear,
    And,
    AndReverse,
    #[default]
    Copy,
    AndInverted,
    Noop,
    Xor,
    Or,
    Nor,
    Equiv,
    Invert,
    OrReverse,
    CopyInverted,
    OrInverted,
    Nand,
    Set,
}

impl LogicOp {
    /// Decode the GL logic-op token; unknown values COPY
    pub fn from_raw(value: u32) -> Self {
        match value {
            0x1500 => Self::Clear,
            0x1501 => Self::And,
            0x1502 => Self::AndReverse,
            0x1503 => Self::Copy,
            0x1504 => Self::AndInverted,
            0x1505 => Self::Noop,
            0x1506 => Self::Xor,
            0x1507 => Self::Or,
            0x1508 => Self::Nor,
            0x1509 => Self::Equiv,
            0x150A => Self::Invert,
            0x150B => Self::OrReverse,
            0x150C => Self::CopyInverted,
            0x150D => Self::OrInverted,
            0x150E => Self::Nand,
            0x150F => Self::Set,
            _ => Self::Copy,
        }
    }

    /// Combine a source channel with the stored framebuffer channel
    #[inline(always)]
    pub fn apply(self, src: i32, dst: i32) -> i32 {
        match self {
            Self::Clear => 0,
            Self::And => src & dst,
            Self::AndReverse => src & (dst ^ 255),
            Self::Copy => src,
            Self::AndInverted => (src ^ 255) & dst,
            Self::Noop => dst,
            Self::Xor => src ^ dst,
            Self::Or => src | dst,
            Self::Nor => (src | dst) ^ 255,
            Self::Equiv => (src ^ dst) ^ 255,
            Self::Invert => dst ^ 255,
            Self::OrReverse => src | (dst ^ 255),
            Self::CopyInverted => src ^ 255,
            Self::OrInverted => (src ^ 255) | dst,
            Self::Nand => (src & dst) ^ 255,
            Self::Set => 255,
        }
    }
}

/// Render-target color format (low nibble of the surface-format method)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFormat {
    R5G6B5,
    X8R8G8B8Z8R8G8B8,
    X8R8G8B8X8R8G8B8,
    #[default]
    A8R8G8B8,
    B8,
    /// Anything this renderer does not model; reads/writes are skipped
    Invalid,
}

impl ColorFormat {
    pub fn from_raw(value: u32) -> Self {
        match value {
            3 => Self::R5G6B5,
            4 => Self::X8R8G8B8Z8R8G8B8,
            5 => Self::X8R8G8B8X8R8G8B8,
            8 => Self::A8R8G8B8,
            9 => Self::B8,
            _ => Self::Invalid,
        }
    }

    /// Bytes per pixel in this format (unknown formats report 4)
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::R5G6B5 => 2,
            Self::B8 => 1,
            _ => 4,
        }
    }
}

/// Render-target depth/stencil format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthFormat {
    Z16,
    #[default]
    Z24S8,
    Invalid,
}

impl DepthFormat {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0x1 => Self::Z16,
            0x2 => Self::Z24S8,
            _ => Self::Invalid,
        }
    }
}

/// Surface memory layout
///
/// A linear surface is plain row-major with a byte pitch; a swizzled
/// surface interleaves x/y address bits (Morton order) for locality.
/// Every surface access resolves through exactly one of the two; mixing
/// them on one surface is a correctness bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceLayout {
    #[default]
    Linear,
    Swizzled,
}

impl SurfaceLayout {
    pub fn from_raw(value: u32) -> Self {
        match value {
            2 => Self::Swizzled,
            _ => Self::Linear,
        }
    }
}

/// Texture pixel format (texture-control method, bits 8-15)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    L8,
    I8,
    A1R5G5B5,
    A4R4G4B4,
    R5G6B5,
    A8R8G8B8,
    X8R8G8B8,
    Index8,
    Dxt1,
    Dxt3,
    Dxt5,
    A1R5G5B5Rect,
    R5G6B5Rect,
    A8R8G8B8Rect,
    L8Rect,
    Dsdt8Rect,
    A8,
    A8L8,
    I8Rect,
    A4R4G4B4Rect,
    R8G8B8Rect,
    A8L8Rect,
    Z24,
    Z24Rect,
    Z16,
    Z16Rect,
    Dsdt8,
    Hilo16,
    Hilo16Rect,
    Hilo8,
    SignedHilo8,
    Hilo8Rect,
    SignedHilo8Rect,
    /// Unrecognized format code; samples decode to a diagnostic color
    Invalid,
}

impl TextureFormat {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0x00 => Self::L8,
            0x01 => Self::I8,
            0x02 => Self::A1R5G5B5,
            0x04 => Self::A4R4G4B4,
            0x05 => Self::R5G6B5,
            0x06 => Self::A8R8G8B8,
            0x07 => Self::X8R8G8B8,
            0x0B => Self::Index8,
            0x0C => Self::Dxt1,
            0x0E => Self::Dxt3,
            0x0F => Self::Dxt5,
            0x10 => Self::A1R5G5B5Rect,
            0x11 => Self::R5G6B5Rect,
            0x12 => Self::A8R8G8B8Rect,
            0x13 => Self::L8Rect,
            0x17 => Self::Dsdt8Rect,
            0x19 => Self::A8,
            0x1A => Self::A8L8,
            0x1B => Self::I8Rect,
            0x1D => Self::A4R4G4B4Rect,
            0x1E => Self::R8G8B8Rect,
            0x20 => Self::A8L8Rect,
            0x28 => Self::Dsdt8,
            0x2A => Self::Z24,
            0x2B => Self::Z24Rect,
            0x2C => Self::Z16,
            0x2D => Self::Z16Rect,
            0x33 => Self::Hilo16,
            0x36 => Self::Hilo16Rect,
            0x44 => Self::Hilo8,
            0x45 => Self::SignedHilo8,
            0x46 => Self::Hilo8Rect,
            0x47 => Self::SignedHilo8Rect,
            _ => Self::Invalid,
        }
    }

    /// True for formats addressed by pitch instead of swizzle
    pub fn is_rectangle(self) -> bool {
        matches!(
            self,
            Self::A1R5G5B5Rect
                | Self::R5G6B5Rect
                | Self::A8R8G8B8Rect
                | Self::L8Rect
                | Self::Dsdt8Rect
                | Self::I8Rect
                | Self::A4R4G4B4Rect
                | Self::R8G8B8Rect
                | Self::A8L8Rect
                | Self::Z24Rect
                | Self::Z16Rect
                | Self::Hilo16Rect
                | Self::Hilo8Rect
                | Self::SignedHilo8Rect
        )
    }
}

/// Vertex attribute component storage type (vertex-format method, low nibble)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexAttrKind {
    /// Packed bytes in Direct3D order (D3DCOLOR)
    UByteD3d,
    /// 32-bit IEEE floats
    #[default]
    Float,
    /// Packed bytes in OpenGL order
    UByteOgl,
    /// Signed 16-bit shorts
    UShort,
    /// Three floats packed into one 32-bit word (r11g11b10f)
    FloatPacked,
    Invalid,
}

impl VertexAttrKind {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => Self::UByteD3d,
            2 => Self::Float,
            4 => Self::UByteOgl,
            5 => Self::UShort,
            6 => Self::FloatPacked,
            _ => Self::Invalid,
        }
    }

    /// 32-bit words one component-count of this kind occupies in a packed
    /// inline vertex stream
    pub fn stream_words(self, size: u32) -> u32 {
        match self {
            Self::UByteD3d | Self::UByteOgl => size / 4,
            Self::UShort => (size * 2) / 4,
            Self::Float | Self::FloatPacked => size,
            Self::Invalid => 0,
        }
    }
}

/// Primitive topology selected by the begin/end method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveType {
    #[default]
    Stop,
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
    QuadStrip,
    Polygon,
    Invalid,
}

impl PrimitiveType {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => Self::Stop,
            1 => Self::Points,
            2 => Self::Lines,
            3 => Self::LineLoop,
            4 => Self::LineStrip,
            5 => Self::Triangles,
            6 => Self::TriangleStrip,
            7 => Self::TriangleFan,
            8 => Self::Quads,
            9 => Self::QuadStrip,
            10 => Self::Polygon,
            _ => Self::Invalid,
        }
    }
}

/// Which faces backface culling removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullFace {
    Front,
    #[default]
    Back,
    FrontAndBack,
}

impl CullFace {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0x0404 => Self::Front,
            0x0405 => Self::Back,
            0x0408 => Self::FrontAndBack,
            _ => Self::Back,
        }
    }
}

/// Winding order considered front facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontFace {
    Cw,
    #[default]
    Ccw,
}

impl FrontFace {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0x0900 => Self::Cw,
            _ => Self::Ccw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_helper() {
        assert_eq!(bits(0xDEADBEEF, 0, 4), 0xF);
        assert_eq!(bits(0xDEADBEEF, 16, 8), 0xAD);
        assert_eq!(bits(0xDEADBEEF, 28, 4), 0xD);
    }

    #[test]
    fn test_channel_expansion() {
        assert_eq!(pal4bit(0xF), 0xFF);
        assert_eq!(pal4bit(0x0), 0x00);
        assert_eq!(pal5bit(0x1F), 0xFF);
        assert_eq!(pal5bit(0x10), 0x84);
        assert_eq!(pal6bit(0x3F), 0xFF);
        assert_eq!(pal6bit(0x20), 0x82);
    }

    #[test]
    fn test_comparison_decode_and_apply() {
        assert_eq!(ComparisonOp::from_raw(0x0200), ComparisonOp::Never);
        assert_eq!(ComparisonOp::from_raw(0x0207), ComparisonOp::Always);
        // unknown compares ALWAYS
        assert_eq!(ComparisonOp::from_raw(0x1234), ComparisonOp::Always);

        assert!(ComparisonOp::Less.passes(1, 2));
        assert!(!ComparisonOp::Less.passes(2, 2));
        assert!(ComparisonOp::GreaterEqual.passes(2, 2));
        assert!(!ComparisonOp::Never.passes(0, 0));
    }

    #[test]
    fn test_stencil_op_table() {
        assert_eq!(StencilOp::Zero.apply(77, 3), 0);
        assert_eq!(StencilOp::Invert.apply(0xF0, 3), 0x0F);
        assert_eq!(StencilOp::Keep.apply(77, 3), 77);
        assert_eq!(StencilOp::Replace.apply(77, 3), 3);
        assert_eq!(StencilOp::Incr.apply(255, 3), 255);
        assert_eq!(StencilOp::IncrWrap.apply(255, 3), 0);
        assert_eq!(StencilOp::Decr.apply(0, 3), 0);
        assert_eq!(StencilOp::DecrWrap.apply(0, 3), 255);
    }

    #[test]
    fn test_logic_op_table() {
        assert_eq!(LogicOp::Clear.apply(0xAA, 0x55), 0);
        assert_eq!(LogicOp::Set.apply(0xAA, 0x55), 255);
        assert_eq!(LogicOp::Xor.apply(0xAA, 0x55), 0xFF);
        assert_eq!(LogicOp::Equiv.apply(0xAA, 0xAA), 0xFF);
        assert_eq!(LogicOp::Noop.apply(0xAA, 0x55), 0x55);
        assert_eq!(LogicOp::CopyInverted.apply(0xAA, 0x55), 0x55);
        assert_eq!(LogicOp::Nand.apply(0xFF, 0xFF), 0x00);
    }

    #[test]
    fn test_blend_factor_fallback() {
        assert_eq!(BlendFactor::from_raw(0x0301), Some(BlendFactor::OneMinusSrcColor));
        assert_eq!(BlendFactor::from_raw(0xBEEF), None);
    }

    #[test]
    fn test_texture_format_rectangle_classes() {
        assert!(TextureFormat::from_raw(0x12).is_rectangle());
        assert!(TextureFormat::from_raw(0x1E).is_rectangle());
        assert!(!TextureFormat::from_raw(0x06).is_rectangle());
        assert!(!TextureFormat::from_raw(0x0C).is_rectangle());
        assert_eq!(TextureFormat::from_raw(0xEE), TextureFormat::Invalid);
    }

    #[test]
    fn test_vertex_attr_stream_words() {
        assert_eq!(VertexAttrKind::Float.stream_words(3), 3);
        assert_eq!(VertexAttrKind::UByteD3d.stream_words(4), 1);
        assert_eq!(VertexAttrKind::UShort.stream_words(2), 1);
        assert_eq!(VertexAttrKind::FloatPacked.stream_words(1), 1);
    }
}
