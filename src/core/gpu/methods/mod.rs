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

//! Method dispatch
//!
//! A method is one register-address-indexed operation carried by a data
//! word in the command stream; the address ranges form the GPU's
//! instruction set. Dispatch goes through a table mapping aligned
//! address ranges to handler functions, built once as a sorted constant
//! and binary searched per call, so each range's behavior is testable in
//! isolation.
//!
//! Every write first lands in the bound object's method register file;
//! handlers read earlier configuration back from there. Addresses with no
//! handler are ignored silently: real software probes unknown methods to
//! detect features this chip revision does not have.
//!
//! Handlers never fail. Malformed streams degrade to logged no-ops
//! because one bad command must not halt the machine.

mod combiner;
mod control;
mod program;
mod state;
mod surface;
mod texture;
mod vertex;

use crate::core::gpu::GpuContext;
use crate::core::memory::SystemMemory;

/// Outcome of one method execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodStatus {
    /// Proceed with the next command word
    Completed,
    /// Park the puller until the next vblank edge
    WaitVblank,
    /// Park the puller until the PGRAPH idle register is written
    WaitPgraphIdle,
}

/// Arguments common to every method handler
#[derive(Debug, Clone, Copy)]
pub(crate) struct MethodCall {
    pub channel: usize,
    pub subchannel: usize,
    /// Byte address of the method (word index * 4)
    pub maddress: u32,
    /// The data word
    pub data: u32,
    /// System-memory address the data word was read from (burst methods
    /// consume further words from here)
    pub address: u32,
}

/// One method handler
pub(crate) type Handler =
    fn(&mut GpuContext, &mut SystemMemory, MethodCall, &mut i32) -> MethodStatus;

/// Half-open method address range with its handler
struct MethodRange {
    start: u32,
    end: u32,
    handler: Handler,
}

macro_rules! range {
    ($start:literal..$end:literal => $handler:path) => {
        MethodRange {
            start: $start,
            end: $end,
            handler: $handler,
        }
    };
}

/// The dispatch table, sorted by start address
///
/// Ranges must not overlap; `method_table_is_sorted` in the tests keeps
/// the invariant honest.
const METHOD_TABLE: &[MethodRange] = &[
    range!(0x0100..0x0104 => control::m_interrupt_notify),
    range!(0x0130..0x0134 => control::m_wait_for_vblank),
    range!(0x019C..0x01A0 => control::m_dma_vertex_a),
    range!(0x01A0..0x01A4 => control::m_dma_vertex_b),
    range!(0x01A4..0x01A8 => control::m_consume_word),
    range!(0x0200..0x0208 => surface::m_surface_clip),
    range!(0x0208..0x020C => surface::m_surface_format),
    range!(0x020C..0x0210 => surface::m_surface_pitch),
    range!(0x0210..0x0214 => surface::m_surface_color_offset),
    range!(0x0214..0x0218 => surface::m_surface_zeta_offset),
    range!(0x0260..0x0280 => combiner::m_stage_alpha_inputs),
    range!(0x0288..0x028C => combiner::m_final_rgb_inputs),
    range!(0x028C..0x0290 => combiner::m_final_extra_inputs),
    range!(0x02C0..0x02E0 => surface::m_clip_window_x),
    range!(0x02E0..0x0300 => surface::m_clip_window_y),
    range!(0x0300..0x0304 => state::m_alpha_test_enable),
    range!(0x0304..0x0308 => state::m_blend_enable),
    range!(0x0308..0x030C => state::m_cull_enable),
    range!(0x030C..0x0310 => state::m_depth_test_enable),
    range!(0x032C..0x0330 => state::m_stencil_test_enable),
    range!(0x033C..0x0340 => state::m_alpha_func),
    range!(0x0340..0x0344 => state::m_alpha_ref),
    range!(0x0344..0x0348 => state::m_blend_factor_source),
    range!(0x0348..0x034C => state::m_blend_factor_destination),
    range!(0x034C..0x0350 => state::m_blend_color),
    range!(0x0350..0x0354 => state::m_blend_equation),
    range!(0x0354..0x0358 => state::m_depth_func),
    range!(0x0358..0x035C => state::m_color_mask),
    range!(0x035C..0x0360 => state::m_depth_write_enable),
    range!(0x0364..0x0368 => state::m_stencil_func),
    range!(0x0368..0x036C => state::m_stencil_ref),
    range!(0x036C..0x0370 => state::m_stencil_mask),
    range!(0x0370..0x0374 => state::m_stencil_op_fail),
    range!(0x0374..0x0378 => state::m_stencil_op_zfail),
    range!(0x0378..0x037C => state::m_stencil_op_zpass),
    range!(0x039C..0x03A0 => state::m_cull_face),
    range!(0x03A0..0x03A4 => state::m_front_face),
    range!(0x0440..0x0480 => program::m_matrix_projection),
    range!(0x0480..0x04C0 => program::m_matrix_modelview),
    range!(0x0580..0x05C0 => program::m_matrix_modelview_inverse),
    range!(0x0680..0x06C0 => program::m_matrix_composite),
    range!(0x0A20..0x0A30 => program::m_viewport_translate),
    range!(0x0A60..0x0A80 => combiner::m_stage_constant_color0),
    range!(0x0A80..0x0AA0 => combiner::m_stage_constant_color1),
    range!(0x0AA0..0x0AC0 => combiner::m_stage_alpha_outputs),
    range!(0x0AC0..0x0AE0 => combiner::m_stage_rgb_inputs),
    range!(0x0AF0..0x0B00 => program::m_viewport_scale),
    range!(0x0B00..0x0B80 => program::m_program_upload),
    range!(0x0B80..0x0C00 => program::m_constant_upload),
    range!(0x0D40..0x0D44 => state::m_logic_op_enable),
    range!(0x0D44..0x0D48 => state::m_logic_op),
    range!(0x1518..0x1528 => vertex::m_vertex_pos4f),
    range!(0x1720..0x1760 => vertex::m_vertex_array_offset),
    range!(0x1760..0x17A0 => vertex::m_vertex_array_format),
    range!(0x17FC..0x1800 => vertex::m_begin_end),
    range!(0x1800..0x1804 => vertex::m_draw_index16),
    range!(0x1808..0x180C => vertex::m_draw_index32),
    range!(0x1810..0x1814 => vertex::m_draw_arrays),
    range!(0x1818..0x181C => vertex::m_inline_array),
    range!(0x1880..0x1900 => vertex::m_vertex_attr2f),
    range!(0x1900..0x1940 => vertex::m_vertex_attr2s),
    range!(0x1940..0x1980 => vertex::m_vertex_attr4ub),
    range!(0x1980..0x1A00 => vertex::m_vertex_attr4s),
    range!(0x1A00..0x1B00 => vertex::m_vertex_attr4f),
    range!(0x1B00..0x1C00 => texture::m_texture_unit),
    range!(0x1D6C..0x1D70 => control::m_consume_word),
    range!(0x1D70..0x1D74 => control::m_report_write),
    range!(0x1D7C..0x1D80 => surface::m_antialias_control),
    range!(0x1D8C..0x1D90 => surface::m_clear_value_zeta),
    range!(0x1D90..0x1D94 => surface::m_clear_value_color),
    range!(0x1D94..0x1D98 => surface::m_clear_surface),
    range!(0x1D98..0x1D9C => surface::m_clear_rect_x),
    range!(0x1D9C..0x1DA0 => surface::m_clear_rect_y),
    range!(0x1E20..0x1E24 => combiner::m_final_constant_color0),
    range!(0x1E24..0x1E28 => combiner::m_final_constant_color1),
    range!(0x1E40..0x1E60 => combiner::m_stage_rgb_outputs),
    range!(0x1E60..0x1E64 => combiner::m_combiner_stages),
    range!(0x1E94..0x1E98 => program::m_engine_mode),
    range!(0x1E9C..0x1EA0 => program::m_program_upload_from),
    range!(0x1EA0..0x1EA4 => program::m_program_start_from),
    range!(0x1EA4..0x1EA8 => program::m_constant_upload_from),
];

/// Find the handler for a method byte address
fn lookup(maddress: u32) -> Option<Handler> {
    let mut lo = 0usize;
    let mut hi = METHOD_TABLE.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        let r = &METHOD_TABLE[mid];
        if maddress < r.start {
            hi = mid;
        } else if maddress >= r.end {
            lo = mid + 1;
        } else {
            return Some(r.handler);
        }
    }
    None
}

impl GpuContext {
    /// Execute one method write against a (channel, subchannel)
    ///
    /// `countlen` holds the data words still available to this command;
    /// burst handlers decrement it as they consume. Returns the puller
    /// disposition.
    pub(crate) fn exec_method(
        &mut self,
        mem: &mut SystemMemory,
        channel: usize,
        subchannel: usize,
        method: u32,
        address: u32,
        countlen: &mut i32,
    ) -> MethodStatus {
        let maddress = method * 4;
        let data = mem.read_u32(address);
        self.subch_mut(channel, subchannel).object.method[(method & 0x7FF) as usize] = data;
        log::trace!(
            "method 0x{:04X} subch {} data 0x{:08X}",
            maddress,
            subchannel,
            data
        );
        match lookup(maddress) {
            Some(handler) => handler(
                self,
                mem,
                MethodCall {
                    channel,
                    subchannel,
                    maddress,
                    data,
                    address,
                },
                countlen,
            ),
            None => MethodStatus::Completed,
        }
    }
}
