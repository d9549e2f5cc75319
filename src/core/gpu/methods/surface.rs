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

//! Render-target configuration and clear methods
//!
//! The derived invariant maintained here: `size_color`/`size_depth` are
//! always `pitch * (bottom + 1)` for the current limits, recomputed after
//! every write that can change pitch, height or antialiasing.

use super::{MethodCall, MethodStatus};
use crate::core::gpu::registers::{bits, ColorFormat, DepthFormat, SurfaceLayout};
use crate::core::gpu::render::output::{
    clear_depth_buffer, clear_render_target, ClearDepthMask, ClearMask,
};
use crate::core::gpu::GpuContext;
use crate::core::memory::SystemMemory;

impl GpuContext {
    /// Derive the supersampling factors from the antialias state
    pub(crate) fn compute_supersample_factors(&mut self) {
        let key = ((self.rt.antialias_control & 1) << 2) | self.rt.antialiasing;
        let (mx, my) = match key {
            1 | 5 => (2.0, 1.0),
            2 | 6 => (2.0, 2.0),
            _ => (1.0, 1.0),
        };
        self.rt.supersample_x = mx;
        self.rt.supersample_y = my;
    }

    /// Rebuild the drawable limits from the surface-clip registers
    pub(crate) fn compute_limits_rendertarget(&mut self, channel: usize, subchannel: usize) {
        let data = self.method_reg(channel, subchannel, 0x0200);
        let x = (data & 0xFFFF) as i32 * self.rt.supersample_x as i32;
        let w = ((data >> 16) & 0xFFFF) as i32 * self.rt.supersample_x as i32;
        self.rt.limits.set_x(x, x + w - 1);
        let data = self.method_reg(channel, subchannel, 0x0204);
        let y = (data & 0xFFFF) as i32 * self.rt.supersample_y as i32;
        let h = ((data >> 16) & 0xFFFF) as i32 * self.rt.supersample_y as i32;
        self.rt.limits.set_y(y, y + h - 1);
    }

    /// Rebuild the derived surface byte sizes
    pub(crate) fn compute_size_rendertarget(&mut self) {
        let height = (self.rt.limits.bottom() + 1).max(0) as u32;
        self.rt.size_color = self.rt.pitch_color * height;
        self.rt.size_depth = self.rt.pitch_depth * height;
    }
}

/// 0x0200/0x0204: drawable x/y extents
pub(crate) fn m_surface_clip(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.compute_limits_rendertarget(call.channel, call.subchannel);
    gpu.compute_size_rendertarget();
    MethodStatus::Completed
}

/// 0x0208: surface format
///
/// Packs color format, depth format, layout, antialias mode and the
/// power-of-two dimensions used for swizzled addressing.
pub(crate) fn m_surface_format(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let data = call.data;
    gpu.rt.log2_height = bits(data, 24, 8);
    gpu.rt.log2_width = bits(data, 16, 8);
    gpu.rt.antialiasing = bits(data, 12, 4);
    gpu.rt.layout = SurfaceLayout::from_raw(bits(data, 8, 4));
    gpu.rt.depth_format = DepthFormat::from_raw(bits(data, 4, 4));
    gpu.rt.color_format = ColorFormat::from_raw(bits(data, 0, 4));
    gpu.compute_supersample_factors();
    gpu.compute_limits_rendertarget(call.channel, call.subchannel);
    gpu.compute_size_rendertarget();
    if gpu.rt.color_format == ColorFormat::Invalid {
        log::warn!("unknown render target color format {}", bits(data, 0, 4));
    }
    gpu.rt.bytes_per_pixel = gpu.rt.color_format.bytes_per_pixel();
    gpu.rt.dilate = gpu.dilate.choose(gpu.rt.log2_width, gpu.rt.log2_height);
    MethodStatus::Completed
}

/// 0x020C: color and depth pitch
pub(crate) fn m_surface_pitch(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.rt.pitch_color = call.data & 0xFFFF;
    gpu.rt.pitch_depth = (call.data >> 16) & 0xFFFF;
    gpu.compute_size_rendertarget();
    log::debug!(
        "surface pitch color 0x{:04X} depth 0x{:04X}",
        gpu.rt.pitch_color,
        gpu.rt.pitch_depth
    );
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0210: color buffer byte offset
pub(crate) fn m_surface_color_offset(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.rt.color_offset = call.data;
    log::debug!("render target at 0x{:08X}", call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0214: depth buffer byte offset
///
/// A null or implausible offset forces depth writes off regardless of the
/// depth-write-enable method.
pub(crate) fn m_surface_zeta_offset(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.rt.depth_offset = call.data;
    log::debug!("depth buffer at 0x{:08X}", call.data);
    if call.data == 0 || call.data > 0x7FFF_FFFC {
        gpu.pixel_ops.depth_write_enabled = false;
    } else {
        gpu.pixel_ops.depth_write_enabled =
            gpu.method_reg(call.channel, call.subchannel, 0x035C) != 0;
    }
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x02C0-0x02DC: clip window horizontal extents (state only)
pub(crate) fn m_clip_window_x(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let i = ((call.maddress - 0x02C0) / 4) as usize;
    let x = (call.data & 0xFFFF) as i32;
    let w = ((call.data >> 16) & 0xFFFF) as i32;
    gpu.clipping_windows[i].set_x(x, x + w - 1);
    MethodStatus::Completed
}

/// 0x02E0-0x02FC: clip window vertical extents (state only)
pub(crate) fn m_clip_window_y(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let i = ((call.maddress - 0x02E0) / 4) as usize;
    let y = (call.data & 0xFFFF) as i32;
    let h = ((call.data >> 16) & 0xFFFF) as i32;
    gpu.clipping_windows[i].set_y(y, y + h - 1);
    MethodStatus::Completed
}

/// 0x1D7C: antialias control
pub(crate) fn m_antialias_control(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.rt.antialias_control = call.data;
    gpu.compute_supersample_factors();
    gpu.compute_limits_rendertarget(call.channel, call.subchannel);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1D8C: depth/stencil clear value (also a notify parameter)
pub(crate) fn m_clear_value_zeta(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.pgraph[0x1A88 / 4] = call.data;
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1D90: color clear value (also a notify parameter)
pub(crate) fn m_clear_value_color(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.pgraph[0x186C / 4] = call.data;
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1D94: clear the selected surfaces now
pub(crate) fn m_clear_surface(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let color_value = gpu.method_reg(call.channel, call.subchannel, 0x1D90);
    let zeta_value = gpu.method_reg(call.channel, call.subchannel, 0x1D8C);
    clear_render_target(
        &gpu.rt,
        &gpu.dilate,
        mem,
        ClearMask::from_bits_truncate((call.data >> 4) & 15),
        color_value,
    );
    clear_depth_buffer(
        &gpu.rt,
        mem,
        ClearDepthMask::from_bits_truncate(call.data & 3),
        zeta_value,
    );
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1D98: clear rectangle horizontal extents
pub(crate) fn m_clear_rect_x(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let x = (call.data & 0xFFFF) as i32;
    let r = ((call.data >> 16) & 0xFFFF) as i32;
    gpu.rt.clear_rect.set_x(x, r);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1D9C: clear rectangle vertical extents
pub(crate) fn m_clear_rect_y(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let y = (call.data & 0xFFFF) as i32;
    let b = ((call.data >> 16) & 0xFFFF) as i32;
    gpu.rt.clear_rect.set_y(y, b);
    *countlen -= 1;
    MethodStatus::Completed
}
