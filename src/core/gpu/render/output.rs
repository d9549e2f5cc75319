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

//! Per-pixel output stage
//!
//! The final gauntlet every shaded pixel runs before reaching memory, in
//! hardware order: alpha test, stencil test, depth test, blending or
//! logical operation (mutually exclusive), color-mask merge, and the
//! packed write-back of color and depth+stencil in the render target's
//! native formats.
//!
//! A failed alpha test discards with no side effects; failed stencil and
//! depth tests still run their configured stencil update and write the
//! depth/stencil word back before discarding. Every address resolves
//! through the active surface layout, linear pitch or dilated swizzle,
//! exactly once per pixel.

use bitflags::bitflags;

use crate::core::gpu::dilate::DilateTables;
use crate::core::gpu::primitives::Rect;
use crate::core::gpu::registers::{
    pal5bit, pal6bit, BlendEquation, BlendFactor, ColorFormat, ComparisonOp, DepthFormat,
    LogicOp, StencilOp, SurfaceLayout,
};
use crate::core::memory::SystemMemory;

bitflags! {
    /// Channel-select bits of the clear-surface method
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearMask: u32 {
        const BLUE = 1 << 0;
        const GREEN = 1 << 1;
        const RED = 1 << 2;
        const ALPHA = 1 << 3;
    }
}

bitflags! {
    /// Depth/stencil-select bits of the clear-surface method
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearDepthMask: u32 {
        const DEPTH = 1 << 0;
        const STENCIL = 1 << 1;
    }
}

/// Render target and depth buffer configuration
///
/// `size_color`/`size_depth` are derived from pitch and the vertical
/// limits and must be recomputed whenever pitch, height or antialiasing
/// change; the method layer owns that invariant.
#[derive(Debug, Clone, Copy)]
pub struct RenderTargetState {
    /// Drawable area in supersampled pixel coordinates
    pub limits: Rect,
    /// Clear rectangle in unscaled pixel coordinates
    pub clear_rect: Rect,
    pub pitch_color: u32,
    pub pitch_depth: u32,
    pub color_format: ColorFormat,
    pub depth_format: DepthFormat,
    pub layout: SurfaceLayout,
    pub log2_width: u32,
    pub log2_height: u32,
    /// Raw antialias field of the surface-format method
    pub antialiasing: u32,
    /// Raw antialias-control method value
    pub antialias_control: u32,
    pub supersample_x: f32,
    pub supersample_y: f32,
    pub bytes_per_pixel: u32,
    /// Interleave width for swizzled color addressing
    pub dilate: u32,
    /// Byte offset of the color buffer in system memory
    pub color_offset: u32,
    /// Byte offset of the depth buffer in system memory
    pub depth_offset: u32,
    /// Derived byte size of the color buffer
    pub size_color: u32,
    /// Derived byte size of the depth buffer
    pub size_depth: u32,
}

impl Default for RenderTargetState {
    fn default() -> Self {
        Self {
            limits: Rect::new(0, 0, 639, 479),
            clear_rect: Rect::new(0, 0, 639, 479),
            pitch_color: 0,
            pitch_depth: 0,
            color_format: ColorFormat::A8R8G8B8,
            depth_format: DepthFormat::Z24S8,
            layout: SurfaceLayout::Linear,
            log2_width: 0,
            log2_height: 0,
            antialiasing: 0,
            antialias_control: 0,
            supersample_x: 1.0,
            supersample_y: 1.0,
            bytes_per_pixel: 4,
            dilate: 0,
            color_offset: 0,
            depth_offset: 0,
            size_color: 0,
            size_depth: 0,
        }
    }
}

impl RenderTargetState {
    /// Byte offset of pixel (x, y) within the color buffer
    #[inline(always)]
    pub fn color_pixel_offset(&self, dilate: &DilateTables, x: i32, y: i32) -> u32 {
        match self.layout {
            SurfaceLayout::Swizzled => {
                (dilate.d0(self.dilate, x) + dilate.d1(self.dilate, y)) * self.bytes_per_pixel
            }
            SurfaceLayout::Linear => self.pitch_color * y as u32 + x as u32 * self.bytes_per_pixel,
        }
    }
}

/// Alpha/stencil/depth/blend/logic-op pipeline state
#[derive(Debug, Clone, Copy)]
pub struct PixelOpState {
    pub alpha_test_enabled: bool,
    pub alpha_func: ComparisonOp,
    pub alpha_reference: i32,
    pub stencil_test_enabled: bool,
    pub stencil_func: ComparisonOp,
    pub stencil_ref: u32,
    pub stencil_mask: u32,
    pub stencil_op_fail: StencilOp,
    pub stencil_op_zfail: StencilOp,
    pub stencil_op_zpass: StencilOp,
    pub depth_test_enabled: bool,
    pub depth_function: ComparisonOp,
    pub depth_write_enabled: bool,
    pub blending_enabled: bool,
    pub blend_function_source: BlendFactor,
    pub blend_function_destination: BlendFactor,
    pub blend_equation: BlendEquation,
    pub blend_color: u32,
    pub logical_operation_enabled: bool,
    pub logical_operation: LogicOp,
    /// Per-channel color write mask, already byte-expanded (0 or 0xFF per
    /// channel); zero suppresses the color write entirely
    pub color_mask: u32,
}

impl Default for PixelOpState {
    fn default() -> Self {
        Self {
            alpha_test_enabled: false,
            alpha_func: ComparisonOp::Always,
            alpha_reference: 0,
            stencil_test_enabled: false,
            stencil_func: ComparisonOp::Always,
            stencil_ref: 0,
            stencil_mask: 0xFF,
            stencil_op_fail: StencilOp::Keep,
            stencil_op_zfail: StencilOp::Keep,
            stencil_op_zpass: StencilOp::Keep,
            depth_test_enabled: false,
            depth_function: ComparisonOp::Always,
            depth_write_enabled: false,
            blending_enabled: false,
            blend_function_source: BlendFactor::One,
            blend_function_destination: BlendFactor::Zero,
            blend_equation: BlendEquation::FuncAdd,
            blend_color: 0,
            logical_operation_enabled: false,
            logical_operation: LogicOp::Copy,
            color_mask: 0xFFFF_FFFF,
        }
    }
}

/// Read the framebuffer pixel at (x, y) as per-channel values
///
/// Returns the absolute byte address of the pixel and its channels in
/// (b, g, r, a) order expanded to 8 bits. `None` when the color format is
/// unknown or the computed offset leaves the configured surface.
pub fn read_pixel(
    rt: &RenderTargetState,
    dilate: &DilateTables,
    mem: &SystemMemory,
    x: i32,
    y: i32,
) -> Option<(u32, [i32; 4])> {
    let offset = rt.color_pixel_offset(dilate, x, y);
    if offset >= rt.size_color {
        log::warn!(
            "render target offset 0x{:08X} outside surface (size 0x{:08X})",
            offset,
            rt.size_color
        );
        debug_assert!(offset < rt.size_color, "bad render target offset");
        return None;
    }
    let addr = rt.color_offset + offset;
    let c = match rt.color_format {
        ColorFormat::R5G6B5 => {
            let color = mem.read_u16(addr) as u32;
            [
                pal5bit(color & 0x1F) as i32,
                pal6bit((color & 0x07E0) >> 5) as i32,
                pal5bit((color & 0xF800) >> 11) as i32,
                0xFF,
            ]
        }
        ColorFormat::X8R8G8B8Z8R8G8B8 | ColorFormat::X8R8G8B8X8R8G8B8 => {
            let color = mem.read_u32(addr);
            [
                (color & 255) as i32,
                ((color >> 8) & 255) as i32,
                ((color >> 16) & 255) as i32,
                0xFF,
            ]
        }
        ColorFormat::A8R8G8B8 => {
            let color = mem.read_u32(addr);
            [
                (color & 255) as i32,
                ((color >> 8) & 255) as i32,
                ((color >> 16) & 255) as i32,
                (color >> 24) as i32,
            ]
        }
        ColorFormat::B8 => [mem.read_u8(addr) as i32, 0, 0, 0xFF],
        ColorFormat::Invalid => return None,
    };
    Some((addr, c))
}

/// Depth/stencil storage for one pixel
struct DepthSlot {
    addr: Option<u32>,
    depth: u32,
    stencil: u32,
}

fn read_depth(
    rt: &RenderTargetState,
    mem: &SystemMemory,
    x: i32,
    y: i32,
) -> DepthSlot {
    match rt.depth_format {
        DepthFormat::Z24S8 => {
            let offset = rt.pitch_depth * y as u32 + 4 * x as u32;
            if offset + 4 > rt.size_depth {
                log::warn!(
                    "depth buffer offset 0x{:08X} outside surface (size 0x{:08X})",
                    offset,
                    rt.size_depth
                );
                return DepthSlot {
                    addr: None,
                    depth: 0xFFFFFF,
                    stencil: 0,
                };
            }
            let word = mem.read_u32(rt.depth_offset + offset);
            DepthSlot {
                addr: Some(rt.depth_offset + offset),
                depth: word >> 8,
                stencil: word & 255,
            }
        }
        DepthFormat::Z16 => {
            let offset = rt.pitch_depth * y as u32 + 2 * x as u32;
            if offset + 2 > rt.size_depth {
                log::warn!(
                    "depth buffer offset 0x{:08X} outside surface (size 0x{:08X})",
                    offset,
                    rt.size_depth
                );
                return DepthSlot {
                    addr: None,
                    depth: 0xFFFFFF,
                    stencil: 0,
                };
            }
            let word = mem.read_u16(rt.depth_offset + offset) as u32;
            DepthSlot {
                addr: Some(rt.depth_offset + offset),
                depth: (word << 8) | 0xFF,
                stencil: 0,
            }
        }
        DepthFormat::Invalid => DepthSlot {
            addr: None,
            depth: 0xFFFFFF,
            stencil: 0,
        },
    }
}

fn write_depth(rt: &RenderTargetState, mem: &mut SystemMemory, slot: &DepthSlot) {
    if let Some(addr) = slot.addr {
        match rt.depth_format {
            DepthFormat::Z24S8 => mem.write_u32(addr, (slot.depth << 8) | slot.stencil),
            DepthFormat::Z16 => mem.write_u16(addr, (slot.depth >> 8) as u16),
            DepthFormat::Invalid => {}
        }
    }
}

/// Run the complete per-pixel output pipeline for one shaded pixel
///
/// `color` is the shaded A8R8G8B8 value, `depth` the interpolated 24-bit
/// depth. Out-of-range depth or negative x discards the pixel outright.
#[allow(clippy::too_many_arguments)]
pub fn write_pixel(
    rt: &RenderTargetState,
    ps: &PixelOpState,
    dilate: &DilateTables,
    mem: &mut SystemMemory,
    x: i32,
    y: i32,
    color: u32,
    depth: i32,
) {
    if !(0..=0xFFFFFF).contains(&depth) || x < 0 {
        return;
    }
    let depth = depth as u32;

    let mut fb = [0i32; 4];
    let mut color_addr = None;
    if ps.color_mask != 0 {
        if let Some((addr, c)) = read_pixel(rt, dilate, mem, x, y) {
            color_addr = Some(addr);
            fb = c;
        }
    }
    let mut ds = read_depth(rt, mem, x, y);

    let mut c = [
        (color & 255) as i32,
        ((color >> 8) & 255) as i32,
        ((color >> 16) & 255) as i32,
        (color >> 24) as i32,
    ];
    let cc = [
        (ps.blend_color & 255) as i32,
        ((ps.blend_color >> 8) & 255) as i32,
        ((ps.blend_color >> 16) & 255) as i32,
        (ps.blend_color >> 24) as i32,
    ];

    // ownership and scissor tests are not modeled
    // alpha test: fail discards with no stencil side effect
    if ps.alpha_test_enabled && !ps.alpha_func.passes(c[3] as u32, ps.alpha_reference as u32) {
        return;
    }

    // stencil test: fail applies the fail op and writes back
    if ps.stencil_test_enabled {
        let stenc = ps.stencil_mask & ps.stencil_ref;
        let stenv = ps.stencil_mask & ds.stencil;
        if !ps.stencil_func.passes(stenc, stenv) {
            ds.stencil = ps.stencil_op_fail.apply(ds.stencil, ps.stencil_ref);
            write_depth(rt, mem, &ds);
            return;
        }
    }

    // depth test: fail applies the zfail op and writes back; pass applies
    // the zpass op with the write deferred to the final write-back
    if ps.depth_test_enabled {
        if !ps.depth_function.passes(depth, ds.depth) {
            ds.stencil = ps.stencil_op_zfail.apply(ds.stencil, ps.stencil_ref);
            write_depth(rt, mem, &ds);
            return;
        }
        ds.stencil = ps.stencil_op_zpass.apply(ds.stencil, ps.stencil_ref);
    }

    if ps.blending_enabled {
        blend(ps, &mut c, fb, cc);
    }

    // dithering is not modeled
    if ps.logical_operation_enabled {
        for i in 0..4 {
            c[i] = ps.logical_operation.apply(c[i], fb[i]);
        }
    }

    if ps.color_mask != 0 {
        if let Some(addr) = color_addr {
            let ct = ((c[3] as u32) << 24) | ((c[2] as u32) << 16) | ((c[1] as u32) << 8) | c[0] as u32;
            let ft = ((fb[3] as u32) << 24)
                | ((fb[2] as u32) << 16)
                | ((fb[1] as u32) << 8)
                | fb[0] as u32;
            let w = (ft & !ps.color_mask) | (ct & ps.color_mask);
            match rt.color_format {
                ColorFormat::R5G6B5 => {
                    let packed = ((w >> 8) & 0xF800) + ((w >> 5) & 0x07E0) + ((w >> 3) & 0x001F);
                    mem.write_u16(addr, packed as u16);
                }
                ColorFormat::X8R8G8B8Z8R8G8B8
                | ColorFormat::X8R8G8B8X8R8G8B8
                | ColorFormat::A8R8G8B8 => mem.write_u32(addr, w),
                ColorFormat::B8 => mem.write_u8(addr, w as u8),
                ColorFormat::Invalid => {}
            }
        }
    }

    if ps.depth_write_enabled {
        ds.depth = depth;
    }
    write_depth(rt, mem, &ds);
}

/// Compute a blend factor vector for the source or destination slot
fn factor(
    which: BlendFactor,
    c: &[i32; 4],
    fb: &[i32; 4],
    cc: &[i32; 4],
    is_source: bool,
) -> [i32; 4] {
    match which {
        BlendFactor::Zero => [0; 4],
        BlendFactor::One => [255; 4],
        BlendFactor::SrcColor => *c,
        BlendFactor::OneMinusSrcColor => [c[0] ^ 255, c[1] ^ 255, c[2] ^ 255, c[3] ^ 255],
        BlendFactor::SrcAlpha => [c[3]; 4],
        BlendFactor::OneMinusSrcAlpha => [c[3] ^ 255; 4],
        BlendFactor::DstColor => *fb,
        BlendFactor::OneMinusDstColor => [fb[0] ^ 255, fb[1] ^ 255, fb[2] ^ 255, fb[3] ^ 255],
        BlendFactor::DstAlpha => [fb[3]; 4],
        BlendFactor::OneMinusDstAlpha => [fb[3] ^ 255; 4],
        BlendFactor::ConstantColor => *cc,
        BlendFactor::OneMinusConstantColor => {
            [cc[0] ^ 255, cc[1] ^ 255, cc[2] ^ 255, cc[3] ^ 255]
        }
        BlendFactor::ConstantAlpha => [cc[3]; 4],
        BlendFactor::OneMinusConstantAlpha => [cc[3] ^ 255; 4],
        BlendFactor::SrcAlphaSaturate => {
            if !is_source {
                // saturate is only defined for the source factor
                return [0; 4];
            }
            let f = if c[3] < (fb[3] ^ 255) { c[3] } else { fb[3] };
            [f, f, f, 255]
        }
    }
}

fn blend(ps: &PixelOpState, c: &mut [i32; 4], fb: [i32; 4], cc: [i32; 4]) {
    let s = factor(ps.blend_function_source, c, &fb, &cc, true);
    let d = factor(ps.blend_function_destination, c, &fb, &cc, false);
    match ps.blend_equation {
        BlendEquation::FuncAdd => {
            for i in 0..4 {
                c[i] = ((c[i] * s[i] + fb[i] * d[i]) / 255).min(255);
            }
        }
        BlendEquation::FuncSubtract => {
            for i in 0..4 {
                c[i] = (c[i] * s[i] - fb[i] * d[i]) / 255;
                if c[i] < 0 {
                    c[i] = 255;
                }
            }
        }
        BlendEquation::FuncReverseSubtract => {
            for i in 0..4 {
                c[i] = (fb[i] * d[i] - c[i] * s[i]) / 255;
                if c[i] < 0 {
                    c[i] = 255;
                }
            }
        }
        BlendEquation::Min => {
            for i in 0..4 {
                c[i] = s[i].min(d[i]);
            }
        }
        BlendEquation::Max => {
            for i in 0..4 {
                c[i] = s[i].max(d[i]);
            }
        }
    }
}

/// Clear the selected channels of the render target inside the clear
/// rectangle, respecting layout, format and the drawable limits
pub fn clear_render_target(
    rt: &RenderTargetState,
    dilate: &DilateTables,
    mem: &mut SystemMemory,
    what: ClearMask,
    value: u32,
) {
    if what.is_empty() {
        return;
    }
    let mask = match rt.color_format {
        ColorFormat::R5G6B5 => {
            let mut m = 0;
            if what.contains(ClearMask::BLUE) {
                m |= 0x001F;
            }
            if what.contains(ClearMask::GREEN) {
                m |= 0x07E0;
            }
            if what.contains(ClearMask::RED) {
                m |= 0xF800;
            }
            m
        }
        ColorFormat::X8R8G8B8Z8R8G8B8
        | ColorFormat::X8R8G8B8X8R8G8B8
        | ColorFormat::A8R8G8B8 => {
            let mut m = 0u32;
            for (flag, shift) in [
                (ClearMask::BLUE, 0),
                (ClearMask::GREEN, 8),
                (ClearMask::RED, 16),
                (ClearMask::ALPHA, 24),
            ] {
                if what.contains(flag) {
                    m |= 0xFF << shift;
                }
            }
            m
        }
        ColorFormat::B8 => {
            if what.contains(ClearMask::BLUE) {
                0xFF
            } else {
                0
            }
        }
        ColorFormat::Invalid => return,
    };

    let Some((xi, yi, xf, yf)) = clamped_clear_window(rt) else {
        return;
    };
    for y in yi..=yf {
        for x in xi..=xf {
            let offset = rt.color_pixel_offset(dilate, x, y);
            let addr = rt.color_offset + offset;
            match rt.color_format {
                ColorFormat::R5G6B5 => {
                    let old = mem.read_u16(addr) as u32;
                    mem.write_u16(addr, ((old & !mask) | (value & mask)) as u16);
                }
                ColorFormat::X8R8G8B8Z8R8G8B8
                | ColorFormat::X8R8G8B8X8R8G8B8
                | ColorFormat::A8R8G8B8 => {
                    let old = mem.read_u32(addr);
                    mem.write_u32(addr, (old & !mask) | (value & mask));
                }
                ColorFormat::B8 => {
                    let old = mem.read_u8(addr) as u32;
                    mem.write_u8(addr, ((old & !mask) | (value & mask)) as u8);
                }
                ColorFormat::Invalid => return,
            }
        }
    }
    log::debug!("cleared render target with 0x{:08X}", value);
}

/// Clear the depth and/or stencil planes inside the clear rectangle
pub fn clear_depth_buffer(
    rt: &RenderTargetState,
    mem: &mut SystemMemory,
    what: ClearDepthMask,
    value: u32,
) {
    if what.is_empty() {
        return;
    }
    let (mask, bpp) = match rt.depth_format {
        DepthFormat::Z24S8 => {
            let mut m = 0u32;
            if what.contains(ClearDepthMask::DEPTH) {
                m |= 0xFFFF_FF00;
            }
            if what.contains(ClearDepthMask::STENCIL) {
                m |= 0xFF;
            }
            (m, 4)
        }
        DepthFormat::Z16 => {
            let m = if what.contains(ClearDepthMask::DEPTH) {
                0xFFFF
            } else {
                0
            };
            (m, 2)
        }
        DepthFormat::Invalid => return,
    };

    let Some((xi, yi, xf, yf)) = clamped_clear_window(rt) else {
        return;
    };
    for y in yi..=yf {
        for x in xi..=xf {
            let offset = rt.pitch_depth * y as u32 + x as u32 * bpp;
            let addr = rt.depth_offset + offset;
            match rt.depth_format {
                DepthFormat::Z16 => {
                    let old = mem.read_u16(addr) as u32;
                    mem.write_u16(addr, ((old & !mask) | (value & mask)) as u16);
                }
                DepthFormat::Z24S8 => {
                    let old = mem.read_u32(addr);
                    mem.write_u32(addr, (old & !mask) | (value & mask));
                }
                DepthFormat::Invalid => return,
            }
        }
    }
}

/// Supersample-scale the clear rectangle and clamp it to the drawable
/// limits; `None` when the two do not intersect
fn clamped_clear_window(rt: &RenderTargetState) -> Option<(i32, i32, i32, i32)> {
    let xi = (rt.clear_rect.left() as f32 * rt.supersample_x) as i32;
    let yi = (rt.clear_rect.top() as f32 * rt.supersample_y) as i32;
    let xf = (rt.clear_rect.right() as f32 * rt.supersample_x) as i32;
    let yf = (rt.clear_rect.bottom() as f32 * rt.supersample_y) as i32;
    let l = &rt.limits;
    if (xi < l.left() && xf < l.left()) || (xi > l.right() && xf > l.right()) {
        return None;
    }
    if (yi < l.top() && yf < l.top()) || (yi > l.bottom() && yf > l.bottom()) {
        return None;
    }
    Some((
        xi.max(l.left()),
        yi.max(l.top()),
        xf.min(l.right()),
        yf.min(l.bottom()),
    ))
}
