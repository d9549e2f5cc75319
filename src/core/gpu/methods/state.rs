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

//! Pixel-test, blend, logic-op and culling state methods
//!
//! One method per GL-style pipeline state. Blending and logical
//! operations are mutually exclusive: enabling the logic op forces
//! blending off, and the blend enable is re-latched from its method
//! register when the logic op goes away.

use super::{MethodCall, MethodStatus};
use crate::core::gpu::registers::{
    BlendEquation, BlendFactor, ComparisonOp, CullFace, FrontFace, LogicOp, StencilOp,
};
use crate::core::gpu::GpuContext;
use crate::core::memory::SystemMemory;

pub(crate) fn m_alpha_test_enable(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.alpha_test_enabled = call.data != 0;
    MethodStatus::Completed
}

pub(crate) fn m_alpha_func(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.alpha_func = ComparisonOp::from_raw(call.data);
    MethodStatus::Completed
}

pub(crate) fn m_alpha_ref(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.alpha_reference = call.data as i32;
    MethodStatus::Completed
}

/// Blend enable defers to the logic op when that is active
pub(crate) fn m_blend_enable(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    if gpu.pixel_ops.logical_operation_enabled {
        gpu.pixel_ops.blending_enabled = false;
    } else {
        gpu.pixel_ops.blending_enabled = call.data != 0;
    }
    MethodStatus::Completed
}

pub(crate) fn m_blend_factor_source(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.blend_function_source =
        BlendFactor::from_raw(call.data).unwrap_or(BlendFactor::One);
    MethodStatus::Completed
}

pub(crate) fn m_blend_factor_destination(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.blend_function_destination =
        BlendFactor::from_raw(call.data).unwrap_or(BlendFactor::Zero);
    MethodStatus::Completed
}

pub(crate) fn m_blend_color(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.blend_color = call.data;
    MethodStatus::Completed
}

pub(crate) fn m_blend_equation(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.blend_equation = BlendEquation::from_raw(call.data);
    MethodStatus::Completed
}

pub(crate) fn m_depth_test_enable(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.depth_test_enabled = call.data != 0;
    MethodStatus::Completed
}

pub(crate) fn m_depth_func(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.depth_function = ComparisonOp::from_raw(call.data);
    MethodStatus::Completed
}

/// Depth write enable, gated by the plausibility of the bound depth buffer
pub(crate) fn m_depth_write_enable(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let zeta = gpu.method_reg(call.channel, call.subchannel, 0x0214);
    gpu.pixel_ops.depth_write_enabled = call.data != 0;
    if zeta == 0 || zeta > 0x7FFF_FFFC {
        gpu.pixel_ops.depth_write_enabled = false;
    }
    MethodStatus::Completed
}

/// Color mask arrives per channel; any nonzero byte enables the whole
/// channel, so the stored mask is byte-expanded
pub(crate) fn m_color_mask(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let mut mask = call.data;
    for shift in [0, 8, 16, 24] {
        if mask & (0xFF << shift) != 0 {
            mask |= 0xFF << shift;
        }
    }
    gpu.pixel_ops.color_mask = mask;
    MethodStatus::Completed
}

pub(crate) fn m_stencil_test_enable(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.stencil_test_enabled = call.data != 0;
    MethodStatus::Completed
}

pub(crate) fn m_stencil_func(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.stencil_func = ComparisonOp::from_raw(call.data);
    MethodStatus::Completed
}

pub(crate) fn m_stencil_ref(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.stencil_ref = call.data.min(255);
    MethodStatus::Completed
}

pub(crate) fn m_stencil_mask(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.stencil_mask = call.data;
    MethodStatus::Completed
}

pub(crate) fn m_stencil_op_fail(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.stencil_op_fail = StencilOp::from_raw(call.data);
    MethodStatus::Completed
}

pub(crate) fn m_stencil_op_zfail(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.stencil_op_zfail = StencilOp::from_raw(call.data);
    MethodStatus::Completed
}

pub(crate) fn m_stencil_op_zpass(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.stencil_op_zpass = StencilOp::from_raw(call.data);
    MethodStatus::Completed
}

/// Logic-op enable forces blending off while active
pub(crate) fn m_logic_op_enable(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    if call.data != 0 {
        gpu.pixel_ops.blending_enabled = false;
    } else {
        gpu.pixel_ops.blending_enabled =
            gpu.method_reg(call.channel, call.subchannel, 0x0304) != 0;
    }
    gpu.pixel_ops.logical_operation_enabled = call.data != 0;
    MethodStatus::Completed
}

pub(crate) fn m_logic_op(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.pixel_ops.logical_operation = LogicOp::from_raw(call.data);
    MethodStatus::Completed
}

pub(crate) fn m_cull_enable(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.culling.enabled = call.data != 0;
    MethodStatus::Completed
}

pub(crate) fn m_cull_face(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.culling.cull = CullFace::from_raw(call.data);
    MethodStatus::Completed
}

pub(crate) fn m_front_face(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    gpu.culling.winding = FrontFace::from_raw(call.data);
    MethodStatus::Completed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(gpu: &mut GpuContext, mem: &mut SystemMemory, maddress: u32, data: u32) {
        mem.write_u32(0, data);
        let mut countlen = 1;
        gpu.exec_method(mem, 0, 0, maddress / 4, 0, &mut countlen);
    }

    #[test]
    fn test_alpha_state() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        exec(&mut gpu, &mut mem, 0x0300, 1);
        exec(&mut gpu, &mut mem, 0x033C, 0x0204); // GREATER
        exec(&mut gpu, &mut mem, 0x0340, 0x80);
        assert!(gpu.pixel_ops.alpha_test_enabled);
        assert_eq!(gpu.pixel_ops.alpha_func, ComparisonOp::Greater);
        assert_eq!(gpu.pixel_ops.alpha_reference, 0x80);
    }

    #[test]
    fn test_blend_and_logic_op_are_exclusive() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        exec(&mut gpu, &mut mem, 0x0304, 1);
        assert!(gpu.pixel_ops.blending_enabled);

        // enabling the logic op forces blending off
        exec(&mut gpu, &mut mem, 0x0D40, 1);
        assert!(!gpu.pixel_ops.blending_enabled);
        assert!(gpu.pixel_ops.logical_operation_enabled);

        // a blend enable while the logic op is active stays off
        exec(&mut gpu, &mut mem, 0x0304, 1);
        assert!(!gpu.pixel_ops.blending_enabled);

        // dropping the logic op re-latches the blend enable
        exec(&mut gpu, &mut mem, 0x0D40, 0);
        assert!(gpu.pixel_ops.blending_enabled);
        assert!(!gpu.pixel_ops.logical_operation_enabled);
    }

    #[test]
    fn test_color_mask_byte_expansion() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        exec(&mut gpu, &mut mem, 0x0358, 0x0100_0001);
        assert_eq!(gpu.pixel_ops.color_mask, 0xFF00_00FF);
        exec(&mut gpu, &mut mem, 0x0358, 0);
        assert_eq!(gpu.pixel_ops.color_mask, 0);
    }

    #[test]
    fn test_stencil_ref_clamps() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        exec(&mut gpu, &mut mem, 0x0368, 0x1234);
        assert_eq!(gpu.pixel_ops.stencil_ref, 255);
        exec(&mut gpu, &mut mem, 0x0368, 7);
        assert_eq!(gpu.pixel_ops.stencil_ref, 7);
    }

    #[test]
    fn test_stencil_op_decode() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        exec(&mut gpu, &mut mem, 0x0370, 0x1E01); // REPLACE
        exec(&mut gpu, &mut mem, 0x0374, 0x8507); // INCR_WRAP
        exec(&mut gpu, &mut mem, 0x0378, 0x150A); // INVERT
        assert_eq!(gpu.pixel_ops.stencil_op_fail, StencilOp::Replace);
        assert_eq!(gpu.pixel_ops.stencil_op_zfail, StencilOp::IncrWrap);
        assert_eq!(gpu.pixel_ops.stencil_op_zpass, StencilOp::Invert);
    }

    #[test]
    fn test_culling_state_decode() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        exec(&mut gpu, &mut mem, 0x0308, 1);
        exec(&mut gpu, &mut mem, 0x039C, 0x0404); // FRONT
        exec(&mut gpu, &mut mem, 0x03A0, 0x0900); // CW
        assert!(gpu.culling.enabled);
        assert_eq!(gpu.culling.cull, CullFace::Front);
        assert_eq!(gpu.culling.winding, FrontFace::Cw);
    }
}
