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

//! Vertex program upload, transformation matrix upload and the engine
//! mode select
//!
//! Matrices arrive transposed as 16 consecutive raw float words. The
//! viewport scale and translate additionally mirror into vertex-program
//! constants 58 and 59 so the programmable and fixed-function paths see
//! consistent viewport parameters.

use super::{MethodCall, MethodStatus};
use crate::core::gpu::GpuContext;
use crate::core::memory::SystemMemory;

fn store_matrix(m: &mut [[f32; 4]; 4], base: u32, call: &MethodCall) {
    let idx = ((call.maddress - base) / 4) as usize;
    m[idx >> 2][idx & 3] = f32::from_bits(call.data);
}

/// 0x0440-0x047C: projection matrix
pub(crate) fn m_matrix_projection(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    store_matrix(&mut gpu.matrices.projection, 0x0440, &call);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0480-0x04BC: modelview matrix (world * view, sent transposed)
pub(crate) fn m_matrix_modelview(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    store_matrix(&mut gpu.matrices.modelview, 0x0480, &call);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0580-0x05BC: inverse modelview matrix
pub(crate) fn m_matrix_modelview_inverse(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    store_matrix(&mut gpu.matrices.modelview_inverse, 0x0580, &call);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0680-0x06BC: composite matrix (world * view * projection * viewport)
pub(crate) fn m_matrix_composite(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    store_matrix(&mut gpu.matrices.composite, 0x0680, &call);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0A20-0x0A2C: viewport translate, mirrored into constant 59
pub(crate) fn m_viewport_translate(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let idx = ((call.maddress - 0x0A20) / 4) as usize;
    gpu.matrices.translate[idx] = f32::from_bits(call.data);
    gpu.vp.exec.set_constant_word(59, idx, call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0AF0-0x0AFC: viewport scale, mirrored into constant 58
pub(crate) fn m_viewport_scale(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let idx = ((call.maddress - 0x0AF0) / 4) as usize;
    gpu.matrices.scale[idx] = f32::from_bits(call.data);
    gpu.vp.exec.set_constant_word(58, idx, call.data);
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1E94: engine mode (2 = vertex program, 4 = fixed function)
pub(crate) fn m_engine_mode(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.vertex_pipeline = call.data & 6;
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1E9C: set the instruction upload cursor
pub(crate) fn m_program_upload_from(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.vp.upload_instruction_index = call.data as usize;
    gpu.vp.upload_instruction_component = 0;
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1EA0: latch the program length and set the start instruction
pub(crate) fn m_program_start_from(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.vp.instructions = gpu.vp.upload_instruction_index as u32;
    gpu.vp.start_instruction = call.data as usize;
    log::debug!(
        "vertex program start {} ({} instructions uploaded)",
        gpu.vp.start_instruction,
        gpu.vp.instructions
    );
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1EA4: set the constant upload cursor
pub(crate) fn m_constant_upload_from(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    gpu.vp.upload_parameter_index = call.data as usize;
    gpu.vp.upload_parameter_component = 0;
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x0B00-0x0B7C: stream one instruction word into the microcode store
///
/// Instructions are 4 words; the decode happens inside the VM once the
/// fourth constituent word lands.
pub(crate) fn m_program_upload(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let slot = gpu.vp.upload_instruction_index;
    let component = gpu.vp.upload_instruction_component;
    gpu.vp.exec.upload_word(slot, component, call.data);
    gpu.vp.upload_instruction_component += 1;
    if gpu.vp.upload_instruction_component >= 4 {
        gpu.vp.upload_instruction_component = 0;
        gpu.vp.upload_instruction_index += 1;
    }
    MethodStatus::Completed
}

/// 0x0B80-0x0BFC: stream one constant word into the constant bank
pub(crate) fn m_constant_upload(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let index = gpu.vp.upload_parameter_index;
    let component = gpu.vp.upload_parameter_component;
    gpu.vp.exec.set_constant_word(index, component, call.data);
    gpu.vp.upload_parameter_component += 1;
    if gpu.vp.upload_parameter_component >= 4 {
        gpu.vp.upload_parameter_component = 0;
        gpu.vp.upload_parameter_index += 1;
    }
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
    fn test_composite_matrix_upload_is_transposed_layout() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        // word k lands at [k >> 2][k & 3]
        exec(&mut gpu, &mut mem, 0x0680, 1.0f32.to_bits());
        exec(&mut gpu, &mut mem, 0x0680 + 4 * 5, 2.5f32.to_bits());
        exec(&mut gpu, &mut mem, 0x0680 + 4 * 15, (-1.0f32).to_bits());
        assert_eq!(gpu.matrices.composite[0][0], 1.0);
        assert_eq!(gpu.matrices.composite[1][1], 2.5);
        assert_eq!(gpu.matrices.composite[3][3], -1.0);
    }

    #[test]
    fn test_viewport_mirrors_into_constants() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        exec(&mut gpu, &mut mem, 0x0A20, 320.0f32.to_bits());
        exec(&mut gpu, &mut mem, 0x0A24, 240.0f32.to_bits());
        exec(&mut gpu, &mut mem, 0x0AF0, 320.0f32.to_bits());
        assert_eq!(gpu.matrices.translate[0], 320.0);
        assert_eq!(gpu.matrices.translate[1], 240.0);
        assert_eq!(gpu.matrices.scale[0], 320.0);
        assert_eq!(gpu.vp.exec.constant(59)[0], 320.0);
        assert_eq!(gpu.vp.exec.constant(59)[1], 240.0);
        assert_eq!(gpu.vp.exec.constant(58)[0], 320.0);
    }

    #[test]
    fn test_program_upload_cursor_walk() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        exec(&mut gpu, &mut mem, 0x1E9C, 3); // upload from slot 3
        for w in [0x11u32, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88] {
            exec(&mut gpu, &mut mem, 0x0B00, w);
        }
        assert_eq!(gpu.vp.exec.slot_words(3), [0x11, 0x22, 0x33, 0x44]);
        assert_eq!(gpu.vp.exec.slot_words(4), [0x55, 0x66, 0x77, 0x88]);

        exec(&mut gpu, &mut mem, 0x1EA0, 3); // start from 3
        assert_eq!(gpu.vp.start_instruction, 3);
        assert_eq!(gpu.vp.instructions, 5);
    }

    #[test]
    fn test_constant_upload_cursor_walk() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        exec(&mut gpu, &mut mem, 0x1EA4, 10);
        for v in [1.0f32, 2.0, 3.0, 4.0, 5.0] {
            exec(&mut gpu, &mut mem, 0x0B80, v.to_bits());
        }
        assert_eq!(gpu.vp.exec.constant(10), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(gpu.vp.exec.constant(11)[0], 5.0);
    }

    #[test]
    fn test_engine_mode_masks_to_pipeline_bits() {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x100);
        exec(&mut gpu, &mut mem, 0x1E94, 2);
        assert_eq!(gpu.vertex_pipeline, 2);
        exec(&mut gpu, &mut mem, 0x1E94, 7);
        assert_eq!(gpu.vertex_pipeline, 6);
    }
}
