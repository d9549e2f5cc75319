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

//! Vertex stream methods
//!
//! Four ways vertices reach the assembler, all funneled through the same
//! persistent attribute state:
//!
//! - **Indexed draws** (0x1800/0x1808): the data words carry 16- or
//!   32-bit indices into the configured vertex arrays.
//! - **Sequential draws** (0x1810): the data word packs a start offset
//!   and count into the arrays.
//! - **Inline arrays** (0x1818): raw packed vertices follow in the
//!   command stream itself, laid out per the array format methods.
//! - **Immediate attributes** (0x1518, 0x1880-0x1AFC): individual
//!   attribute writes in several packings; completing attribute 0 pushes
//!   the accumulated vertex into the assembler.
//!
//! Unwritten attributes keep their previous immediate values, which is
//! what makes the persistent-vertex trick work: software sets a constant
//! color once and then streams bare positions.

use super::{MethodCall, MethodStatus};
use crate::core::gpu::primitives::{attr, Vertex};
use crate::core::gpu::registers::{PrimitiveType, VertexAttrKind};
use crate::core::gpu::render::rasterizer::SpanShader;
use crate::core::gpu::{GpuContext, VertexAttrLayout};
use crate::core::memory::SystemMemory;

/// Decode an r11g11b10 packed-float word into three floats
///
/// The 11-bit fields carry 6 bits of mantissa and 5 of exponent, the
/// 10-bit field 5 and 5. Zero exponents denormalize, exponent 31 maps
/// onto the IEEE infinity/NaN patterns.
pub(crate) fn extract_packed_float(data: u32) -> (f32, f32, f32) {
    fn unpack(field: u32, mantissa_bits: u32) -> f32 {
        let m = field & ((1 << mantissa_bits) - 1);
        let e = (field >> mantissa_bits) & 0x1F;
        if e == 0 {
            if m != 0 {
                m as f32 / (1u32 << 20) as f32
            } else {
                0.0
            }
        } else if e == 31 {
            f32::from_bits(0x7F80_0000 | m)
        } else {
            let scale = if e < 15 {
                1.0 / (1u64 << (15 - e)) as f32
            } else {
                (1u64 << (e - 15)) as f32
            };
            scale * (1.0 + m as f32 / (1u32 << mantissa_bits) as f32)
        }
    }
    (
        unpack(data & 0x7FF, 6),
        unpack((data >> 11) & 0x7FF, 6),
        unpack((data >> 22) & 0x3FF, 5),
    )
}

/// Fetch one typed attribute from system memory into `vertex`
pub(crate) fn read_vertex(
    layout: &VertexAttrLayout,
    mem: &SystemMemory,
    address: u32,
    vertex: &mut Vertex,
    attrib: usize,
) {
    let l = layout.size as usize;
    match layout.kind {
        VertexAttrKind::Float => {
            vertex.attribute[attrib].fv = [0.0, 0.0, 0.0, 1.0];
            for c in 0..l {
                vertex.attribute[attrib].set_raw(c, mem.read_u32(address + 4 * c as u32));
            }
        }
        VertexAttrKind::UByteOgl => {
            let mut u = mem.read_u32(address);
            for c in (0..l).rev() {
                vertex.attribute[attrib].fv[c] = (u & 0xFF) as f32 / 255.0;
                u >>= 8;
            }
        }
        VertexAttrKind::UByteD3d => {
            let mut u = mem.read_u32(address);
            for c in 0..l {
                vertex.attribute[attrib].fv[c] = (u & 0xFF) as f32 / 255.0;
                u >>= 8;
            }
        }
        VertexAttrKind::FloatPacked => {
            let (x, y, z) = extract_packed_float(mem.read_u32(address));
            vertex.attribute[attrib].fv = [x, y, z, 1.0];
        }
        VertexAttrKind::UShort | VertexAttrKind::Invalid => {
            vertex.attribute[attrib].fv = [0.0, 0.0, 0.0, 1.0];
            log::warn!("unsupported vertex component type {:?}", layout.kind);
        }
    }
}

impl GpuContext {
    /// Build one vertex from the configured arrays at `index`
    fn fetch_array_vertex(&mut self, mem: &SystemMemory, index: u32) -> Vertex {
        let mut v = self.persist_vertex;
        let mut enabled = self.enabled_vertex_attributes;
        for a in 0..16 {
            if enabled & 1 != 0 {
                let layout = self.vertex_attrs[a];
                read_vertex(
                    &layout,
                    mem,
                    layout.address + index * layout.stride,
                    &mut v,
                    a,
                );
            }
            enabled >>= 1;
        }
        v
    }

    /// Build one vertex from a packed inline stream at `address`
    ///
    /// Returns the vertex and the number of words one vertex occupies.
    fn fetch_inline_vertex(&mut self, mem: &SystemMemory, address: u32) -> (Vertex, u32) {
        let vwords = self.vertex_attrs[15].words + self.vertex_attrs[15].offset;
        let mut v = self.persist_vertex;
        let mut enabled = self.enabled_vertex_attributes;
        for a in 0..16 {
            if enabled & 1 != 0 {
                let layout = self.vertex_attrs[a];
                read_vertex(&layout, mem, address + layout.offset * 4, &mut v, a);
            }
            enabled >>= 1;
        }
        (v, vwords)
    }
}

/// 0x17FC: begin/end a primitive batch
///
/// A nonzero topology resets the assembly counters and locks in the span
/// shader for the whole batch: combiners if any stage is active and the
/// combiner path is allowed, else single-texture if unit 0 is enabled,
/// else flat color.
pub(crate) fn m_begin_end(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.vertex_count = 0;
    gpu.vertex_first = 0;
    gpu.vertex_accumulated = 0;
    gpu.indexes_first = 0;
    gpu.indexes_count = 0;
    gpu.primitives_count = 0;
    gpu.primitive_type = PrimitiveType::from_raw(call.data);
    if call.data != 0 {
        let combiner_stages = gpu.method_reg(call.channel, call.subchannel, 0x1E60) & 7;
        gpu.shader = if combiner_stages > 0 && gpu.combiner.used {
            SpanShader::RegisterCombiners
        } else if gpu.textures[0].enabled != 0 {
            SpanShader::TextureSimple
        } else {
            SpanShader::Color
        };
    }
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1720-0x175C: vertex array base address
///
/// Bit 31 selects which DMA object the offset is relative to.
pub(crate) fn m_vertex_array_offset(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let slot = ((call.maddress - 0x1720) / 4) as usize;
    let dma = (call.data >> 31) as usize;
    gpu.vertex_attrs[slot].address = (call.data & 0x0FFF_FFFF) + gpu.dma_offset[dma];
    MethodStatus::Completed
}

/// 0x1760-0x179C: vertex array component format
///
/// Also rebuilds the packed-stream word counts and cumulative offsets
/// the inline-array mode depends on.
pub(crate) fn m_vertex_array_format(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let slot = ((call.maddress - 0x1760) / 4) as usize;
    let layout = &mut gpu.vertex_attrs[slot];
    layout.stride = (call.data >> 8) & 255;
    layout.kind = VertexAttrKind::from_raw(call.data & 15);
    layout.size = (call.data >> 4) & 15;
    layout.words = layout.kind.stream_words(layout.size);
    if layout.size > 0 {
        gpu.enabled_vertex_attributes |= 1 << slot;
    } else {
        gpu.enabled_vertex_attributes &= !(1 << slot);
    }
    for n in slot + 1..16 {
        let prev = if gpu.enabled_vertex_attributes & (1 << (n - 1)) != 0 {
            gpu.vertex_attrs[n - 1].offset + gpu.vertex_attrs[n - 1].words
        } else {
            gpu.vertex_attrs[n - 1].offset
        };
        gpu.vertex_attrs[n].offset = prev;
    }
    *countlen -= 1;
    MethodStatus::Completed
}

fn draw_indexed(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
    per_word: usize,
) -> MethodStatus {
    let mut address = call.address;
    while *countlen > 0 {
        let data = mem.read_u32(address);
        let n = gpu.indexes_first + gpu.indexes_count as usize;
        if per_word == 2 {
            gpu.vertex_indexes[n & 1023] = data & 0xFFFF;
            gpu.vertex_indexes[(n + 1) & 1023] = data >> 16;
            gpu.indexes_count += 2;
        } else {
            gpu.vertex_indexes[n & 1023] = data;
            gpu.indexes_count += 1;
        }
        address += 4;
        *countlen -= 1;
        for _ in 0..per_word {
            let index = gpu.vertex_indexes[gpu.indexes_first];
            let v = gpu.fetch_array_vertex(mem, index);
            let slot = gpu.vertex_first;
            gpu.vertex_staging[slot] = v;
            gpu.indexes_first = (gpu.indexes_first + 1) & 1023;
            gpu.indexes_count -= 1;
            gpu.assemble_primitive(mem, &v);
            gpu.vertex_first = (gpu.vertex_first + 1) & 1023;
        }
    }
    MethodStatus::Completed
}

/// 0x1800: draw with two 16-bit indices per data word
pub(crate) fn m_draw_index16(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    draw_indexed(gpu, mem, call, countlen, 2)
}

/// 0x1808: draw with one 32-bit index per data word
pub(crate) fn m_draw_index32(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    draw_indexed(gpu, mem, call, countlen, 1)
}

/// 0x1810: draw a sequential range from the vertex arrays
///
/// The word packs a 24-bit first-vertex offset and an 8-bit count (one
/// less than the number of vertices drawn).
pub(crate) fn m_draw_arrays(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let offset = call.data & 0xFFFFFF;
    let count = (call.data >> 24) & 0xFF;
    log::trace!("draw arrays offset {} count {}", offset, count + 1);
    for n in 0..=count {
        let v = gpu.fetch_array_vertex(mem, n + offset);
        let slot = gpu.vertex_first;
        gpu.vertex_staging[slot] = v;
        gpu.assemble_primitive(mem, &v);
        gpu.vertex_first = (gpu.vertex_first + 1) & 1023;
    }
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1818: draw packed vertices embedded in the command stream
pub(crate) fn m_inline_array(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let mut address = call.address;
    while *countlen > 0 {
        let (v, vwords) = gpu.fetch_inline_vertex(mem, address);
        if vwords == 0 {
            log::warn!("inline array with no enabled attributes");
            *countlen = 0;
            break;
        }
        *countlen -= vwords as i32;
        if *countlen < 0 {
            log::warn!("inline array short by {} words", -*countlen);
            *countlen = 0;
            break;
        }
        address += vwords * 4;
        let slot = gpu.vertex_first;
        gpu.vertex_staging[slot] = v;
        gpu.assemble_primitive(mem, &v);
        gpu.vertex_first = (gpu.vertex_first + 1) & 1023;
    }
    MethodStatus::Completed
}

/// 0x1518-0x1524: immediate position as four raw floats
pub(crate) fn m_vertex_pos4f(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let comp = ((call.maddress - 0x1518) >> 2) as usize;
    gpu.persist_vertex.attribute[attr::POS].set_raw(comp, call.data);
    if comp == 3 {
        let v = gpu.persist_vertex;
        gpu.assemble_primitive(mem, &v);
    }
    MethodStatus::Completed
}

/// 0x1880-0x18FC: immediate attribute as two raw floats
pub(crate) fn m_vertex_attr2f(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let v = call.maddress - 0x1880;
    let attrib = (v >> 3) as usize;
    let comp = ((v >> 2) & 1) as usize;
    gpu.persist_vertex.attribute[attrib].set_raw(comp, call.data);
    if comp == 1 {
        gpu.persist_vertex.attribute[attrib].fv[2] = 0.0;
        gpu.persist_vertex.attribute[attrib].fv[3] = 1.0;
        if attrib == 0 {
            let v = gpu.persist_vertex;
            gpu.assemble_primitive(mem, &v);
        }
    }
    MethodStatus::Completed
}

/// 0x1900-0x193C: immediate attribute as two signed shorts
pub(crate) fn m_vertex_attr2s(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let v = call.maddress - 0x1900;
    let attrib = (v >> 2) as usize;
    let d1 = (call.data & 0xFFFF) as u16 as i16;
    let d2 = (call.data >> 16) as u16 as i16;
    gpu.persist_vertex.attribute[attrib].fv = [d1 as f32, d2 as f32, 0.0, 1.0];
    if attrib == 0 {
        let v = gpu.persist_vertex;
        gpu.assemble_primitive(mem, &v);
    }
    MethodStatus::Completed
}

/// 0x1940-0x197C: immediate attribute as four unsigned bytes
pub(crate) fn m_vertex_attr4ub(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let v = call.maddress - 0x1940;
    let attrib = (v >> 2) as usize;
    gpu.persist_vertex.attribute[attrib].fv = [
        (call.data & 255) as f32,
        ((call.data >> 8) & 255) as f32,
        ((call.data >> 16) & 255) as f32,
        (call.data >> 24) as f32,
    ];
    if attrib == 0 {
        let v = gpu.persist_vertex;
        gpu.assemble_primitive(mem, &v);
    }
    MethodStatus::Completed
}

/// 0x1980-0x19FC: immediate attribute as four signed shorts (two words)
pub(crate) fn m_vertex_attr4s(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let v = call.maddress - 0x1980;
    let attrib = (v >> 3) as usize;
    let comp = ((v >> 1) & 2) as usize;
    let d1 = (call.data & 0xFFFF) as u16 as i16;
    let d2 = (call.data >> 16) as u16 as i16;
    gpu.persist_vertex.attribute[attrib].fv[comp] = d1 as f32;
    gpu.persist_vertex.attribute[attrib].fv[comp + 1] = d2 as f32;
    if comp == 2 && attrib == 0 {
        let v = gpu.persist_vertex;
        gpu.assemble_primitive(mem, &v);
    }
    MethodStatus::Completed
}

/// 0x1A00-0x1AFC: immediate attribute as four raw floats
pub(crate) fn m_vertex_attr4f(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let v = call.maddress - 0x1A00;
    let attrib = (v >> 4) as usize;
    let comp = ((v >> 2) & 3) as usize;
    gpu.persist_vertex.attribute[attrib].set_raw(comp, call.data);
    if comp == 3 && attrib == 0 {
        let v = gpu.persist_vertex;
        gpu.assemble_primitive(mem, &v);
    }
    MethodStatus::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gpu::primitives::Rect;
    use crate::core::gpu::registers::{ColorFormat, DepthFormat};

    fn exec(gpu: &mut GpuContext, mem: &mut SystemMemory, maddress: u32, data: u32) {
        mem.write_u32(0x80, data);
        let mut countlen = 1;
        gpu.exec_method(mem, 0, 0, maddress / 4, 0x80, &mut countlen);
    }

    fn drawable_gpu() -> GpuContext {
        let mut gpu = GpuContext::new();
        gpu.rt.limits = Rect::new(0, 0, 31, 31);
        gpu.rt.pitch_color = 128;
        gpu.rt.pitch_depth = 128;
        gpu.rt.color_format = ColorFormat::A8R8G8B8;
        gpu.rt.depth_format = DepthFormat::Z24S8;
        gpu.rt.size_color = 128 * 32;
        gpu.rt.size_depth = 128 * 32;
        gpu.rt.depth_offset = 0x4000;
        gpu.vertex_pipeline = 4;
        gpu.matrices.composite = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        gpu
    }

    #[test]
    fn test_packed_float_decode() {
        // 1.0 in the 11-bit format: e = 15, m = 0
        let one11 = 15 << 6;
        let one10 = 15 << 5;
        let word = one11 | (one11 << 11) | (one10 << 22);
        let (x, y, z) = extract_packed_float(word);
        assert_eq!(x, 1.0);
        assert_eq!(y, 1.0);
        assert_eq!(z, 1.0);

        // 1.5: mantissa high bit set
        let (x, _, _) = extract_packed_float((15 << 6) | 32);
        assert_eq!(x, 1.5);

        // zero
        let (x, y, z) = extract_packed_float(0);
        assert_eq!((x, y, z), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_read_vertex_float() {
        let mut mem = SystemMemory::new(0x100);
        mem.write_u32(0x10, 2.0f32.to_bits());
        mem.write_u32(0x14, 3.0f32.to_bits());
        mem.write_u32(0x18, 4.0f32.to_bits());
        let layout = VertexAttrLayout {
            kind: VertexAttrKind::Float,
            size: 3,
            ..VertexAttrLayout::default()
        };
        let mut v = Vertex::default();
        read_vertex(&layout, &mem, 0x10, &mut v, 0);
        assert_eq!(v.attribute[0].fv, [2.0, 3.0, 4.0, 1.0]);
    }

    #[test]
    fn test_read_vertex_ubyte_orders() {
        let mut mem = SystemMemory::new(0x100);
        mem.write_u32(0, 0xFF804020);
        let mut layout = VertexAttrLayout {
            kind: VertexAttrKind::UByteD3d,
            size: 4,
            ..VertexAttrLayout::default()
        };
        let mut v = Vertex::default();
        read_vertex(&layout, &mem, 0, &mut v, 0);
        // D3D order walks up from the low byte
        assert_eq!(v.attribute[0].fv[0], 0x20 as f32 / 255.0);
        assert_eq!(v.attribute[0].fv[3], 1.0);

        layout.kind = VertexAttrKind::UByteOgl;
        read_vertex(&layout, &mem, 0, &mut v, 0);
        // GL order walks down from the high component
        assert_eq!(v.attribute[0].fv[3], 0x20 as f32 / 255.0);
        assert_eq!(v.attribute[0].fv[0], 1.0);
    }

    #[test]
    fn test_vertex_format_offsets() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        // attribute 0: 3 floats; attribute 3: 4 bytes (D3DCOLOR)
        exec(&mut gpu, &mut mem, 0x1760, (3 << 4) | 2);
        exec(&mut gpu, &mut mem, 0x1760 + 3 * 4, (4 << 4) | 0);
        assert_eq!(gpu.enabled_vertex_attributes & 0b1001, 0b1001);
        assert_eq!(gpu.vertex_attrs[0].words, 3);
        assert_eq!(gpu.vertex_attrs[3].words, 1);
        // cumulative offsets: attr 1..3 start after attr 0's words
        assert_eq!(gpu.vertex_attrs[1].offset, 3);
        assert_eq!(gpu.vertex_attrs[3].offset, 3);
        assert_eq!(gpu.vertex_attrs[4].offset, 4);
        assert_eq!(gpu.vertex_attrs[15].offset, 4);

        // disabling an attribute rebuilds the offsets
        exec(&mut gpu, &mut mem, 0x1760, 2);
        assert_eq!(gpu.enabled_vertex_attributes & 1, 0);
        assert_eq!(gpu.vertex_attrs[3].offset, 0);
    }

    #[test]
    fn test_immediate_triangle_via_attr4f() {
        let mut gpu = drawable_gpu();
        let mut mem = SystemMemory::new(0x8000);
        exec(&mut gpu, &mut mem, 0x17FC, 5); // TRIANGLES
        assert_eq!(gpu.primitive_type, PrimitiveType::Triangles);
        assert_eq!(gpu.shader, SpanShader::Color);

        // constant white color, then three positions; each completed
        // position (component w) pushes a vertex
        for c in 0..4 {
            exec(
                &mut gpu,
                &mut mem,
                0x1A00 + (attr::COLOR0 as u32) * 16 + c * 4,
                1.0f32.to_bits(),
            );
        }
        let verts = [(4.0f32, 2.0f32), (28.0, 6.0), (10.0, 30.0)];
        for (x, y) in verts {
            exec(&mut gpu, &mut mem, 0x1A00, x.to_bits());
            exec(&mut gpu, &mut mem, 0x1A04, y.to_bits());
            exec(&mut gpu, &mut mem, 0x1A08, 0);
            exec(&mut gpu, &mut mem, 0x1A0C, 1.0f32.to_bits());
        }
        assert_eq!(gpu.primitives_count, 1);
        // spot check an interior pixel
        assert_eq!(mem.read_u32(128 * 10 + 12 * 4), 0xFFFFFFFF);
    }

    #[test]
    fn test_draw_arrays_fetches_from_memory() {
        let mut gpu = drawable_gpu();
        let mut mem = SystemMemory::new(0x10000);
        // vertex buffer: 3 positions of 4 floats at 0x1000
        let verts = [
            [4.0f32, 2.0, 0.0, 1.0],
            [28.0, 6.0, 0.0, 1.0],
            [10.0, 30.0, 0.0, 1.0],
        ];
        for (i, v) in verts.iter().enumerate() {
            for (c, f) in v.iter().enumerate() {
                mem.write_u32(0x1000 + (i * 16 + c * 4) as u32, f.to_bits());
            }
        }
        // attribute 0: 4 floats, stride 16, at 0x1000
        exec(&mut gpu, &mut mem, 0x1760, (16 << 8) | (4 << 4) | 2);
        exec(&mut gpu, &mut mem, 0x1720, 0x1000);
        // constant color through the persistent vertex
        gpu.persist_vertex.attribute[attr::COLOR0].fv = [1.0, 1.0, 1.0, 1.0];

        exec(&mut gpu, &mut mem, 0x17FC, 5);
        gpu.persist_vertex.attribute[attr::COLOR0].fv = [1.0, 1.0, 1.0, 1.0];
        // offset 0, count 2 -> three vertices
        exec(&mut gpu, &mut mem, 0x1810, 2 << 24);
        assert_eq!(gpu.primitives_count, 1);
        assert_eq!(mem.read_u32(128 * 10 + 12 * 4), 0xFFFFFFFF);
    }

    #[test]
    fn test_attr2s_packs_signed_shorts() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x200);
        // attribute 9 (texture 0), not position: no primitive push
        exec(&mut gpu, &mut mem, 0x1900 + 9 * 4, 0xFFFF_0005);
        assert_eq!(gpu.persist_vertex.attribute[9].fv[0], 5.0);
        assert_eq!(gpu.persist_vertex.attribute[9].fv[1], -1.0);
        assert_eq!(gpu.persist_vertex.attribute[9].fv[3], 1.0);
    }

    #[test]
    fn test_begin_end_shader_selection() {
        let mut gpu = drawable_gpu();
        let mut mem = SystemMemory::new(0x1000);
        exec(&mut gpu, &mut mem, 0x17FC, 5);
        assert_eq!(gpu.shader, SpanShader::Color);

        gpu.textures[0].enabled = 3;
        exec(&mut gpu, &mut mem, 0x17FC, 5);
        assert_eq!(gpu.shader, SpanShader::TextureSimple);

        exec(&mut gpu, &mut mem, 0x1E60, 1);
        exec(&mut gpu, &mut mem, 0x17FC, 5);
        assert_eq!(gpu.shader, SpanShader::RegisterCombiners);

        // the debug toggle forces the combiner path off
        gpu.toggle_register_combiners_usage();
        exec(&mut gpu, &mut mem, 0x17FC, 5);
        assert_eq!(gpu.shader, SpanShader::TextureSimple);
    }
}
