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

//! Register-combiner configuration methods
//!
//! Input-mapping words pack four descriptors, one per byte: D in the low
//! byte up to A in the high byte, each as {input register 0-3 bits,
//! component bit 4, mapping function bits 5-7}. Output-mapping words pack
//! the three destination selectors plus the dot/mux/bias/scale controls.

use super::{MethodCall, MethodStatus};
use crate::core::gpu::render::combiner::{argb8_float, MapIn};
use crate::core::gpu::GpuContext;
use crate::core::memory::SystemMemory;

/// Unpack the four A-D input descriptors of one mapping word
fn unpack_inputs(data: u32) -> [MapIn; 4] {
    let field = |shift: u32| MapIn {
        input: (data >> shift) & 15,
        component: (data >> (shift + 4)) & 1,
        mapping: (data >> (shift + 5)) & 7,
    };
    // A sits in the top byte, D in the bottom
    [field(24), field(16), field(8), field(0)]
}

/// 0x1E60: number of active general stages
pub(crate) fn m_combiner_stages(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.combiner.stages = (call.data & 15) as usize;
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0260-0x027C: per-stage alpha-half input mapping
pub(crate) fn m_stage_alpha_inputs(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let n = ((call.maddress - 0x0260) >> 2) as usize;
    gpu.combiner.stage[n].alpha_in = unpack_inputs(call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0AC0-0x0ADC: per-stage RGB-half input mapping
pub(crate) fn m_stage_rgb_inputs(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let n = ((call.maddress - 0x0AC0) >> 2) as usize;
    gpu.combiner.stage[n].rgb_in = unpack_inputs(call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0A60-0x0A7C: per-stage constant color 0
pub(crate) fn m_stage_constant_color0(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let n = ((call.maddress - 0x0A60) >> 2) as usize;
    gpu.combiner.stage[n].constant_color0 = argb8_float(call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0A80-0x0A9C: per-stage constant color 1
pub(crate) fn m_stage_constant_color1(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let n = ((call.maddress - 0x0A80) >> 2) as usize;
    gpu.combiner.stage[n].constant_color1 = argb8_float(call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

fn unpack_outputs(data: u32) -> crate::core::gpu::render::combiner::MapOut {
    crate::core::gpu::render::combiner::MapOut {
        cd_output: data & 15,
        ab_output: (data >> 4) & 15,
        sum_output: (data >> 8) & 15,
        cd_dot: (data >> 12) & 1 != 0,
        ab_dot: (data >> 13) & 1 != 0,
        muxsum: (data >> 14) & 1 != 0,
        bias: (data >> 15) & 1 != 0,
        scale: (data >> 16) & 3,
    }
}

/// 0x0AA0-0x0ABC: per-stage alpha-half output routing
pub(crate) fn m_stage_alpha_outputs(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let n = ((call.maddress - 0x0AA0) >> 2) as usize;
    gpu.combiner.stage[n].alpha_out = unpack_outputs(call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1E40-0x1E5C: per-stage RGB-half output routing
pub(crate) fn m_stage_rgb_outputs(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let n = ((call.maddress - 0x1E40) >> 2) as usize;
    gpu.combiner.stage[n].rgb_out = unpack_outputs(call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0288: final combiner A-D RGB inputs
pub(crate) fn m_final_rgb_inputs(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.combiner.final_stage.rgb_in = unpack_inputs(call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x028C: final combiner E/F/G inputs and the sum clamp control
pub(crate) fn m_final_extra_inputs(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let data = call.data;
    gpu.combiner.final_stage.color_sum_clamp = (data >> 7) & 1 != 0;
    gpu.combiner.final_stage.g_in = MapIn {
        input: (data >> 8) & 15,
        component: (data >> 12) & 1,
        mapping: (data >> 13) & 7,
    };
    gpu.combiner.final_stage.f_in = MapIn {
        input: (data >> 16) & 15,
        component: (data >> 20) & 1,
        mapping: (data >> 21) & 7,
    };
    gpu.combiner.final_stage.e_in = MapIn {
        input: (data >> 24) & 15,
        component: (data >> 28) & 1,
        mapping: (data >> 29) & 7,
    };
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1E20: final combiner constant color 0
pub(crate) fn m_final_constant_color0(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.combiner.final_stage.constant_color0 = argb8_float(call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1E24: final combiner constant color 1
pub(crate) fn m_final_constant_color1(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.combiner.final_stage.constant_color1 = argb8_float(call.data);
    *countlen -= 1;
    MethodStatus::Completed
}
