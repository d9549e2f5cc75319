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

//! Texture unit configuration methods
//!
//! The 0x1B00 block repeats every 0x40 bytes for the four units; the
//! register offset within the block selects the field group.

use super::{MethodCall, MethodStatus};
use crate::core::gpu::registers::{bits, TextureFormat};
use crate::core::gpu::GpuContext;
use crate::core::memory::SystemMemory;

/// 0x1B00-0x1BFC: one register of one texture unit
pub(crate) fn m_texture_unit(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let unit = ((call.maddress >> 6) & 3) as usize;
    let reg = call.maddress & !0xC0;
    let data = call.data;
    match reg {
        0x1B00 => {
            // texel data offset in system memory
            gpu.textures[unit].offset = data;
        }
        0x1B04 => {
            let t = &mut gpu.textures[unit];
            t.dma0 = bits(data, 0, 1);
            t.dma1 = bits(data, 1, 1);
            t.cubic = bits(data, 2, 1);
            t.noborder = bits(data, 3, 1);
            t.dims = bits(data, 4, 4);
            t.mipmap = bits(data, 19, 1);
            let format = bits(data, 8, 8);
            let base_size_u = bits(data, 20, 4);
            let base_size_v = bits(data, 24, 4);
            let base_size_w = bits(data, 28, 4);
            t.size_u = 1 << base_size_u;
            t.size_v = 1 << base_size_v;
            t.size_w = 1 << base_size_w;
            t.format = TextureFormat::from_raw(format);
            t.rectangle = t.format.is_rectangle();
            gpu.textures[unit].dilate = gpu.dilate.choose(base_size_u, base_size_v);
        }
        0x1B0C => {
            let t = &mut gpu.textures[unit];
            t.color_key = bits(data, 0, 2);
            t.image_field = bits(data, 3, 1);
            t.aniso = bits(data, 4, 2);
            t.mipmap_max_lod = bits(data, 6, 12);
            t.mipmap_min_lod = bits(data, 18, 12);
            t.enabled = bits(data, 30, 2);
        }
        0x1B10 => {
            gpu.textures[unit].rect_pitch = data >> 16;
        }
        0x1B1C => {
            gpu.textures[unit].rect_height = (data & 0xFFFF) as i32;
            gpu.textures[unit].rect_width = (data >> 16) as i32;
        }
        _ => {}
    }
    *countlen -= 1;
    MethodStatus::Completed
}
