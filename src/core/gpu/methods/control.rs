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

//! Control methods: interrupts, synchronization, DMA object binding and
//! the report write-back

use super::{MethodCall, MethodStatus};
use crate::core::gpu::GpuContext;
use crate::core::memory::SystemMemory;

/// 0x0100: raise the PGRAPH notify interrupt and stall for the host
///
/// Software writes a nonzero notify parameter here to ask for an
/// interrupt. The handler latches the parameter into the PGRAPH notify
/// registers, raises the interrupt, and parks the puller until the host
/// acknowledges by writing the PGRAPH idle register.
pub(crate) fn m_interrupt_notify(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    *countlen -= 1;
    if call.data == 0 {
        return MethodStatus::Completed;
    }
    gpu.pgraph[0x704 / 4] = 0x100;
    gpu.pgraph[0x708 / 4] = call.data;
    gpu.pgraph[0x100 / 4] |= 1;
    gpu.pgraph[0x108 / 4] |= 1;
    gpu.update_interrupts();
    MethodStatus::WaitPgraphIdle
}

/// 0x0130: block until the next vblank edge
pub(crate) fn m_wait_for_vblank(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    _call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    *countlen -= 1;
    if gpu.enable_waitvblank {
        MethodStatus::WaitVblank
    } else {
        MethodStatus::Completed
    }
}

/// 0x019C: resolve the first vertex-buffer DMA object
pub(crate) fn m_dma_vertex_a(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let (offset, size) = gpu.read_dma_object(call.data);
    gpu.dma_offset[0] = offset;
    gpu.dma_size[0] = size;
    log::debug!(
        "vertex dma object A at 0x{:08X} size 0x{:X}",
        gpu.dma_offset[0],
        gpu.dma_size[0]
    );
    MethodStatus::Completed
}

/// 0x01A0: resolve the second vertex-buffer DMA object
pub(crate) fn m_dma_vertex_b(
    gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    call: MethodCall,
    _countlen: &mut i32,
) -> MethodStatus {
    let (offset, size) = gpu.read_dma_object(call.data);
    gpu.dma_offset[1] = offset;
    gpu.dma_size[1] = size;
    log::debug!(
        "vertex dma object B at 0x{:08X} size 0x{:X}",
        gpu.dma_offset[1],
        gpu.dma_size[1]
    );
    MethodStatus::Completed
}

/// Parameter-only methods: the raw write suffices, consume the word
pub(crate) fn m_consume_word(
    _gpu: &mut GpuContext,
    _mem: &mut SystemMemory,
    _call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    *countlen -= 1;
    MethodStatus::Completed
}

/// 0x1D70: write the data word through the bound report DMA object
///
/// The destination offset comes from the preceding 0x1D6C write and the
/// DMA object handle from 0x01A4. Software also expects the parameter
/// mirrored (shifted) into PGRAPH 0xB10.
pub(crate) fn m_report_write(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    call: MethodCall,
    countlen: &mut i32,
) -> MethodStatus {
    let offset = gpu.method_reg(call.channel, call.subchannel, 0x1D6C);
    let dmahand = gpu.method_reg(call.channel, call.subchannel, 0x01A4);
    let (base, _size) = gpu.read_dma_object(dmahand);
    mem.write_u32(base + offset, call.data);
    gpu.pgraph[0xB10 / 4] = call.data << 2;
    *countlen -= 1;
    MethodStatus::Completed
}
