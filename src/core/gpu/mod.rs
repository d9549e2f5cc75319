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

//! GPU core
//!
//! This module implements an NV2A-class 3D accelerator: the command
//! puller that drains per-channel DMA rings from system memory, the
//! register-mapped method engine configuring the pipeline, a vertex
//! program virtual machine, primitive assembly with w-plane clipping, and
//! a software span renderer with texture sampling, register combiners and
//! the full depth/stencil/blend output stage.
//!
//! # Register Window
//!
//! The host reaches the GPU through one memory-mapped window divided into
//! fixed blocks:
//!
//! | Offset range           | Block   | Contents                          |
//! |------------------------|---------|-----------------------------------|
//! | 0x00000000-0x00000FFF  | PMC     | Master control and interrupts     |
//! | 0x00002000-0x00003FFF  | PFIFO   | Puller control registers          |
//! | 0x00100000-0x00101FFF  | PBUS    | Bus config (stub reads)           |
//! | 0x00101000-0x00101FFF  | STRAPS  | Straps (ignored)                  |
//! | 0x00400000-0x00401FFF  | PGRAPH  | Graphics engine status/interrupts |
//! | 0x00600000-0x00600FFF  | PCRTC   | Display controller                |
//! | 0x00700000-0x007FFFFF  | PRAMIN  | Instance memory (object table)    |
//! | 0x00800000-0x008FFFFF  | USER    | 32 channels x 8 subchannels       |
//!
//! # Concurrency model
//!
//! One logical thread per GPU instance. The puller runs synchronously
//! inside register writes that kick it and suspends itself on the wait
//! methods; [`GpuContext::vblank`] and the PGRAPH idle register resume
//! it. There is no preemption and no parallel pixel work.

pub mod dilate;
pub mod methods;
pub mod primitives;
pub mod puller;
pub mod registers;
pub mod render;
pub mod vp;

#[cfg(test)]
mod tests;

use crate::core::interrupt::{fold_engine, pmc, pmc_pending, IrqLine};
use crate::core::memory::SystemMemory;

use dilate::DilateTables;
use primitives::{Rect, TransformedVertex, Vertex, FAN_ANCHOR_SLOT, VERTEX_RING};
use puller::PullerState;
use registers::{CullFace, FrontFace, PrimitiveType};
use render::combiner::Combiner;
use render::output::{PixelOpState, RenderTargetState};
use render::rasterizer::{RenderStats, SpanShader};
use render::texture::TextureUnit;
use vp::VertexProgram;

// Register block sizes in 32-bit words
const PMC_WORDS: usize = 0x1000 / 4;
const PFIFO_WORDS: usize = 0x2000 / 4;
const PGRAPH_WORDS: usize = 0x2000 / 4;
const PCRTC_WORDS: usize = 0x1000 / 4;
const PRAMIN_WORDS: usize = 0x100000 / 4;

/// Channels and subchannels of the USER block
pub const CHANNEL_COUNT: usize = 32;
pub const SUBCHANNEL_COUNT: usize = 8;

/// Per-subchannel register window size in words
const SUBCHANNEL_REG_WORDS: usize = 0x800;

/// Per-object method register file size in words
const OBJECT_METHOD_WORDS: usize = 0x2000 / 4;

/// Object bound to a subchannel by the command stream
pub(crate) struct BoundObject {
    pub objhandle: u32,
    pub objclass: u32,
    /// Raw data of every method ever written to this object; handlers
    /// read configuration back from here
    pub method: Vec<u32>,
}

impl Default for BoundObject {
    fn default() -> Self {
        Self {
            objhandle: 0,
            objclass: 0,
            method: vec![0; OBJECT_METHOD_WORDS],
        }
    }
}

/// One subchannel: its register window plus the bound object
pub(crate) struct Subchannel {
    pub regs: Vec<u32>,
    pub object: BoundObject,
}

impl Default for Subchannel {
    fn default() -> Self {
        Self {
            regs: vec![0; SUBCHANNEL_REG_WORDS],
            object: BoundObject::default(),
        }
    }
}

/// Transformation matrices of the fixed-function path
///
/// Only the composite matrix and the viewport vectors feed rendering
/// directly; the component matrices are latched for completeness since
/// drivers upload them unconditionally.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MatrixState {
    #[allow(dead_code)]
    pub projection: [[f32; 4]; 4],
    #[allow(dead_code)]
    pub modelview: [[f32; 4]; 4],
    #[allow(dead_code)]
    pub modelview_inverse: [[f32; 4]; 4],
    pub composite: [[f32; 4]; 4],
    /// Viewport translate, mirrored into vertex-program constant 59
    pub translate: [f32; 4],
    /// Viewport scale, mirrored into vertex-program constant 58
    #[allow(dead_code)]
    pub scale: [f32; 4],
}

/// Layout of one vertex attribute in the vertex buffer
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct VertexAttrLayout {
    pub address: u32,
    pub stride: u32,
    pub kind: registers::VertexAttrKind,
    pub size: u32,
    /// Words this attribute occupies in a packed inline stream
    pub words: u32,
    /// Cumulative word offset in a packed inline stream
    pub offset: u32,
}

/// Vertex program upload cursors and execution window
pub(crate) struct VertexProgramState {
    pub exec: VertexProgram,
    pub instructions: u32,
    pub start_instruction: usize,
    pub upload_instruction_index: usize,
    pub upload_instruction_component: usize,
    pub upload_parameter_index: usize,
    pub upload_parameter_component: usize,
}

impl Default for VertexProgramState {
    fn default() -> Self {
        Self {
            exec: VertexProgram::new(),
            instructions: 0,
            start_instruction: 0,
            upload_instruction_index: 0,
            upload_instruction_component: 0,
            upload_parameter_index: 0,
            upload_parameter_component: 0,
        }
    }
}

/// Backface culling configuration
#[derive(Debug, Clone, Copy)]
pub(crate) struct CullingState {
    pub enabled: bool,
    pub winding: FrontFace,
    pub cull: CullFace,
}

impl Default for CullingState {
    fn default() -> Self {
        Self {
            enabled: false,
            winding: FrontFace::Ccw,
            cull: CullFace::Back,
        }
    }
}

/// The GPU instance: every register block and derived pipeline state
///
/// All state lives here explicitly; the context is owned by the emulated
/// machine and passed by reference, never global.
pub struct GpuContext {
    // MMIO register blocks
    pub(crate) pmc: Vec<u32>,
    pub(crate) pfifo: Vec<u32>,
    pub(crate) pgraph: Vec<u32>,
    pub(crate) pcrtc: Vec<u32>,
    pub(crate) ramin: Vec<u32>,
    pub(crate) channels: Vec<Subchannel>,

    // command puller
    pub(crate) puller: PullerState,

    // render target and pixel pipeline
    pub(crate) rt: RenderTargetState,
    pub(crate) pixel_ops: PixelOpState,
    pub(crate) textures: [TextureUnit; 4],
    pub(crate) combiner: Combiner,
    pub(crate) dilate: DilateTables,
    pub(crate) culling: CullingState,
    pub(crate) clipping_windows: [Rect; 8],

    // vertex transformation
    pub(crate) vp: VertexProgramState,
    /// Pipeline select from the engine-mode method: 2 = vertex program,
    /// 4 = fixed function
    pub(crate) vertex_pipeline: u32,
    pub(crate) matrices: MatrixState,

    // vertex streams and primitive assembly
    pub(crate) vertex_attrs: [VertexAttrLayout; 16],
    pub(crate) enabled_vertex_attributes: u32,
    pub(crate) persist_vertex: Vertex,
    pub(crate) vertex_staging: Vec<Vertex>,
    pub(crate) vertex_ring: Vec<TransformedVertex>,
    pub(crate) vertex_indexes: Vec<u32>,
    pub(crate) indexes_first: usize,
    pub(crate) indexes_count: i32,
    pub(crate) vertex_first: usize,
    pub(crate) vertex_count: usize,
    pub(crate) vertex_accumulated: usize,
    pub(crate) primitive_type: PrimitiveType,
    pub(crate) primitives_count: u32,
    pub(crate) primitives_total: u64,
    pub(crate) shader: SpanShader,
    pub(crate) stats: RenderStats,

    // DMA objects resolved from the instance memory
    pub(crate) dma_offset: [u32; 2],
    pub(crate) dma_size: [u32; 2],

    // host-facing plumbing
    pub(crate) irq: IrqLine,
    /// Byte offset of the scanout buffer latched by PCRTC
    pub(crate) displayed_target: u32,
    /// Toggling diagnostic register some drivers poll at boot
    pub(crate) toggle: u32,

    // runtime feature switches
    pub(crate) enable_waitvblank: bool,
    pub(crate) enable_clipping_w: bool,
}

impl GpuContext {
    pub fn new() -> Self {
        let mut channels = Vec::with_capacity(CHANNEL_COUNT * SUBCHANNEL_COUNT);
        channels.resize_with(CHANNEL_COUNT * SUBCHANNEL_COUNT, Subchannel::default);
        Self {
            pmc: vec![0; PMC_WORDS],
            pfifo: vec![0; PFIFO_WORDS],
            pgraph: vec![0; PGRAPH_WORDS],
            pcrtc: vec![0; PCRTC_WORDS],
            ramin: vec![0; PRAMIN_WORDS],
            channels,
            puller: PullerState::default(),
            rt: RenderTargetState::default(),
            pixel_ops: PixelOpState::default(),
            textures: [TextureUnit::default(); 4],
            combiner: Combiner::new(),
            dilate: DilateTables::new(),
            culling: CullingState::default(),
            clipping_windows: [Rect::default(); 8],
            vp: VertexProgramState::default(),
            vertex_pipeline: 4,
            matrices: MatrixState::default(),
            vertex_attrs: [VertexAttrLayout::default(); 16],
            enabled_vertex_attributes: 0,
            persist_vertex: Vertex::default(),
            vertex_staging: vec![Vertex::default(); VERTEX_RING + 2],
            vertex_ring: vec![TransformedVertex::default(); FAN_ANCHOR_SLOT + 2],
            vertex_indexes: vec![0; VERTEX_RING],
            indexes_first: 0,
            indexes_count: 0,
            vertex_first: 0,
            vertex_count: 0,
            vertex_accumulated: 0,
            primitive_type: PrimitiveType::Stop,
            primitives_count: 0,
            primitives_total: 0,
            shader: SpanShader::Color,
            stats: RenderStats::default(),
            dma_offset: [0; 2],
            dma_size: [0; 2],
            irq: IrqLine::new(),
            displayed_target: 0,
            toggle: 0,
            enable_waitvblank: true,
            enable_clipping_w: true,
        }
    }

    /// Connect the host interrupt callback
    pub fn connect_irq(&mut self, callback: Box<dyn FnMut(bool)>) {
        self.irq.connect(callback);
    }

    /// Index into `channels` for (channel, subchannel)
    #[inline(always)]
    pub(crate) fn subch(&self, channel: usize, subchannel: usize) -> &Subchannel {
        &self.channels[channel * SUBCHANNEL_COUNT + subchannel]
    }

    #[inline(always)]
    pub(crate) fn subch_mut(&mut self, channel: usize, subchannel: usize) -> &mut Subchannel {
        &mut self.channels[channel * SUBCHANNEL_COUNT + subchannel]
    }

    /// Raw value last written to a method of a bound object
    #[inline(always)]
    pub(crate) fn method_reg(&self, channel: usize, subchannel: usize, maddress: u32) -> u32 {
        self.subch(channel, subchannel).object.method[(maddress / 4) as usize]
    }

    /// MMIO read from the GPU register window
    pub fn mmio_r(&mut self, address: u32) -> u32 {
        let offset = (address / 4) as usize;
        // diagnostic toggle some drivers spin on during bring-up
        if offset == 0x1804F6 {
            self.toggle ^= 0x0808_0808;
            return self.toggle;
        }
        match address {
            0x0010_0000..=0x0010_0FFF => {
                // boot configuration block
                if address == 0x0010_0200 {
                    3
                } else {
                    0
                }
            }
            0x0010_1000..=0x0010_1FFF => 0, // straps
            0x0000_2000..=0x0000_3FFF => {
                // cache status and runout status always report ready
                if address == 0x0000_3214 || address == 0x0000_2400 {
                    return 0x10;
                }
                self.pfifo[offset - 0x2000 / 4]
            }
            0x0070_0000..=0x007F_FFFF => self.ramin[offset - 0x0070_0000 / 4],
            0x0040_0000..=0x0040_1FFF => self.pgraph[offset - 0x0040_0000 / 4],
            0x0060_0000..=0x0060_0FFF => self.pcrtc[offset - 0x0060_0000 / 4],
            0x0000_0000..=0x0000_0FFF => self.pmc[offset],
            0x0080_0000..=0x008F_FFFF => {
                let suboffset = offset - 0x0080_0000 / 4;
                let channel = (suboffset >> 14) & 31;
                let subchannel = (suboffset >> 11) & 7;
                let reg = suboffset & 0x7FF;
                if reg < 0x80 / 4 {
                    self.subch(channel, subchannel).regs[reg]
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    /// MMIO write to the GPU register window
    ///
    /// Needs the memory arena because writes to the channel DMA registers
    /// kick the command puller, and PGRAPH writes can resume it.
    pub fn mmio_w(&mut self, mem: &mut SystemMemory, address: u32, data: u32) {
        let offset = (address / 4) as usize;
        let mut update_int = false;
        match address {
            0x0010_1000..=0x0010_1FFF => {} // straps
            0x0000_2000..=0x0000_3FFF => {
                self.pfifo[offset - 0x2000 / 4] = data;
            }
            0x0070_0000..=0x007F_FFFF => {
                self.ramin[offset - 0x0070_0000 / 4] = data;
            }
            0x0040_0000..=0x0040_1FFF => {
                let e = offset - 0x0040_0000 / 4;
                let old = self.pgraph[e];
                self.pgraph[e] = data;
                if e == 0x100 / 4 {
                    // interrupt status is write-1-to-clear
                    self.pgraph[e] = old & !data;
                    if data & 1 != 0 {
                        self.pgraph[0x108 / 4] = 0;
                    }
                    update_int = true;
                }
                if e == 0x140 / 4 {
                    update_int = true;
                }
                if e == 0x720 / 4 && data & 1 != 0 {
                    self.puller_resume_pgraph_idle(mem);
                }
                if (0x900 / 4..0xA00 / 4).contains(&e) {
                    self.pgraph[e] = 0;
                }
            }
            0x0060_0000..=0x0060_0FFF => {
                let e = offset - 0x0060_0000 / 4;
                let old = self.pcrtc[e];
                self.pcrtc[e] = data;
                if e == 0x100 / 4 {
                    self.pcrtc[e] = old & !data;
                    update_int = true;
                }
                if e == 0x140 / 4 {
                    update_int = true;
                }
                if e == 0x800 / 4 {
                    self.displayed_target = data;
                    log::debug!("scanout buffer at 0x{:08X}", data);
                }
            }
            0x0000_0000..=0x0000_0FFF => {
                self.pmc[offset] = data;
            }
            0x0080_0000..=0x008F_FFFF => {
                let suboffset = offset - 0x0080_0000 / 4;
                let channel = (suboffset >> 14) & 31;
                let subchannel = (suboffset >> 11) & 7;
                let reg = suboffset & 0x7FF;
                self.subch_mut(channel, subchannel).regs[reg] = data;
                if reg >= 0x80 / 4 {
                    return;
                }
                if reg == puller::DMA_PUT_REG || reg == puller::DMA_GET_REG {
                    self.puller_kick(mem, channel);
                }
            }
            _ => {}
        }
        if update_int {
            self.update_interrupts();
        }
    }

    /// Recompute the PMC summary bits and drive the IRQ line
    pub(crate) fn update_interrupts(&mut self) {
        let mut status = self.pmc[0x100 / 4];
        status = fold_engine(
            status,
            pmc::INTR_PCRTC,
            self.pcrtc[0x100 / 4],
            self.pcrtc[0x140 / 4],
        );
        status = fold_engine(
            status,
            pmc::INTR_PGRAPH,
            self.pgraph[0x100 / 4],
            self.pgraph[0x140 / 4],
        );
        self.pmc[0x100 / 4] = status;
        let level = pmc_pending(status, self.pmc[0x140 / 4]);
        self.irq.set(level);
    }

    /// External vblank edge
    ///
    /// On the rising edge the display interrupt latches, and a puller
    /// suspended on the wait-for-vblank method resumes.
    pub fn vblank(&mut self, mem: &mut SystemMemory, state: bool) {
        if state {
            self.puller_resume_vblank(mem);
            self.pcrtc[0x100 / 4] |= 1;
            self.pcrtc[0x808 / 4] |= 0x10000;
        } else {
            self.pcrtc[0x100 / 4] &= !1;
            self.pcrtc[0x808 / 4] &= !0x10000;
        }
        self.update_interrupts();
    }

    /// Copy the scanout buffer (640x480 A8R8G8B8) into `frame`
    ///
    /// `frame` receives up to 640*480 pixels in row-major order; short
    /// destination slices truncate the copy.
    pub fn screen_update(&self, mem: &SystemMemory, frame: &mut [u32]) {
        let src = self.displayed_target;
        for (i, px) in frame.iter_mut().enumerate().take(640 * 480) {
            *px = mem.read_u32(src + (i as u32) * 4);
        }
    }

    /// Byte offset of the latched scanout buffer
    pub fn displayed_target(&self) -> u32 {
        self.displayed_target
    }

    /// Count of triangles removed by backface culling
    pub fn triangles_culled(&self) -> u64 {
        self.stats.triangles_culled
    }

    /// Total primitives assembled since power-on
    pub fn primitives_total(&self) -> u64 {
        self.primitives_total
    }

    /// Debug switch: toggle whether the combiner path is ever selected
    pub fn toggle_register_combiners_usage(&mut self) -> bool {
        self.combiner.used = !self.combiner.used;
        self.combiner.used
    }

    /// Debug switch: toggle honoring of the wait-for-vblank method
    pub fn toggle_wait_vblank_support(&mut self) -> bool {
        self.enable_waitvblank = !self.enable_waitvblank;
        self.enable_waitvblank
    }

    /// Debug switch: toggle w-plane clipping
    pub fn toggle_clipping_w_support(&mut self) -> bool {
        self.enable_clipping_w = !self.enable_clipping_w;
        self.enable_clipping_w
    }

    /// Raw words of a vertex-program microcode slot (diagnostics)
    pub fn vertex_program_slot(&self, slot: usize) -> [u32; 4] {
        self.vp.exec.slot_words(slot)
    }
}

impl Default for GpuContext {
    fn default() -> Self {
        Self::new()
    }
}
