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

//! End-to-end command-stream scenarios
//!
//! These tests drive the GPU exactly the way the host does: command words
//! deposited in the shared memory arena, the channel DMA registers poked
//! through the register window, pixels read back from the arena.

use proptest::prelude::*;

use crate::core::gpu::primitives::attr;
use crate::core::gpu::puller::SuspendReason;
use crate::core::gpu::registers::{BlendEquation, BlendFactor};
use crate::core::gpu::render::output::{write_pixel, PixelOpState};
use crate::core::gpu::GpuContext;
use crate::core::memory::SystemMemory;

/// Channel 0 DMA_PUT register in the MMIO window
const DMA_PUT: u32 = 0x0080_0040;

/// Builds a command ring in system memory starting at address 0
struct Stream {
    cursor: u32,
}

impl Stream {
    fn new() -> Self {
        Self { cursor: 0 }
    }

    /// Append an increasing-method command with its data words
    fn method(&mut self, mem: &mut SystemMemory, maddress: u32, data: &[u32]) {
        let cmd = ((data.len() as u32) << 18) | maddress;
        mem.write_u32(self.cursor, cmd);
        self.cursor += 4;
        for d in data {
            mem.write_u32(self.cursor, *d);
            self.cursor += 4;
        }
    }

    /// Kick the puller by advancing DMA_PUT to the end of the stream
    fn kick(&self, gpu: &mut GpuContext, mem: &mut SystemMemory) {
        gpu.mmio_w(mem, DMA_PUT, self.cursor);
    }
}

/// Configure a 32x32 linear A8R8G8B8 target with Z24S8 depth
///
/// Color at COLOR_BASE, depth at DEPTH_BASE, everything addressed inside
/// a small arena.
const COLOR_BASE: u32 = 0x10000;
const DEPTH_BASE: u32 = 0x18000;
const PITCH: u32 = 0x80;

fn configure_target(s: &mut Stream, mem: &mut SystemMemory) {
    s.method(mem, 0x0200, &[32 << 16]);
    s.method(mem, 0x0204, &[32 << 16]);
    s.method(mem, 0x0208, &[0x0128]); // A8R8G8B8, Z24S8, linear
    s.method(mem, 0x020C, &[(PITCH << 16) | PITCH]);
    s.method(mem, 0x0210, &[COLOR_BASE]);
    s.method(mem, 0x0214, &[DEPTH_BASE]);
    s.method(mem, 0x0354, &[0x0207]); // depth func ALWAYS
}

fn push_color(s: &mut Stream, mem: &mut SystemMemory, rgba: [f32; 4]) {
    s.method(
        mem,
        0x1A00 + (attr::COLOR0 as u32) * 16,
        &[
            rgba[0].to_bits(),
            rgba[1].to_bits(),
            rgba[2].to_bits(),
            rgba[3].to_bits(),
        ],
    );
}

fn push_position(s: &mut Stream, mem: &mut SystemMemory, x: f32, y: f32) {
    s.method(
        mem,
        0x1A00,
        &[x.to_bits(), y.to_bits(), 0, 1.0f32.to_bits()],
    );
}

fn identity_composite(s: &mut Stream, mem: &mut SystemMemory) {
    for i in 0..16u32 {
        let v = if i % 5 == 0 { 1.0f32 } else { 0.0 };
        s.method(mem, 0x0680 + i * 4, &[v.to_bits()]);
    }
    // fixed-function pipeline
    s.method(mem, 0x1E94, &[4]);
}

fn pixel(mem: &SystemMemory, x: u32, y: u32) -> u32 {
    mem.read_u32(COLOR_BASE + PITCH * y + x * 4)
}

/// Reference edge-function coverage test at pixel centers
fn reference_inside(px: u32, py: u32, v: &[(f64, f64); 3]) -> bool {
    let cx = px as f64 + 0.5;
    let cy = py as f64 + 0.5;
    let e = |a: (f64, f64), b: (f64, f64)| (b.0 - a.0) * (cy - a.1) - (b.1 - a.1) * (cx - a.0);
    let e0 = e(v[0], v[1]);
    let e1 = e(v[1], v[2]);
    let e2 = e(v[2], v[0]);
    (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0)
}

#[test]
fn test_end_to_end_white_triangle() {
    let mut gpu = GpuContext::new();
    let mut mem = SystemMemory::new(0x20000);
    let mut s = Stream::new();

    configure_target(&mut s, &mut mem);
    identity_composite(&mut s, &mut mem);
    s.method(&mut mem, 0x17FC, &[5]); // begin TRIANGLES
    push_color(&mut s, &mut mem, [1.0, 1.0, 1.0, 1.0]);
    let verts = [(5.0, 3.0), (27.0, 7.0), (9.0, 29.0)];
    for (x, y) in verts {
        push_position(&mut s, &mut mem, x as f32, y as f32);
    }
    s.method(&mut mem, 0x17FC, &[0]); // end
    s.kick(&mut gpu, &mut mem);

    assert_eq!(gpu.primitives_total(), 1);
    let mut interior = 0;
    for y in 0..32 {
        for x in 0..32 {
            let px = pixel(&mem, x, y);
            if reference_inside(x, y, &verts) {
                if px == 0xFFFFFFFF {
                    interior += 1;
                } else {
                    // only pixels whose center sits exactly on an edge may
                    // differ from the reference
                    assert_eq!(px, 0, "unexpected value at ({}, {})", x, y);
                }
            } else {
                assert_eq!(px, 0, "pixel ({}, {}) outside the triangle", x, y);
            }
        }
    }
    assert!(interior > 150, "only {} interior pixels rendered", interior);
}

#[test]
fn test_end_to_end_dxt1_textured_triangle() {
    let mut gpu = GpuContext::new();
    let mut mem = SystemMemory::new(0x20000);
    let mut s = Stream::new();

    // a solid DXT1 block: color0 == color1 == green, all codes zero
    const TEX_BASE: u32 = 0xC000;
    mem.write_u16(TEX_BASE, 0x07E0);
    mem.write_u16(TEX_BASE + 2, 0x07E0);
    mem.write_u32(TEX_BASE + 4, 0);

    configure_target(&mut s, &mut mem);
    identity_composite(&mut s, &mut mem);
    // texture unit 0: 4x4 DXT1, enabled
    s.method(&mut mem, 0x1B00, &[TEX_BASE]);
    s.method(&mut mem, 0x1B04, &[(2 << 20) | (2 << 24) | (0x0C << 8) | (2 << 4)]);
    s.method(&mut mem, 0x1B0C, &[3 << 30]);
    // constant texture coordinate across the whole triangle
    s.method(&mut mem, 0x1880 + (attr::TEX0 as u32) * 8, &[0, 0]);
    s.method(&mut mem, 0x17FC, &[5]);
    let verts = [(4.0f32, 4.0f32), (28.0, 4.0), (4.0, 28.0)];
    for (x, y) in verts {
        push_position(&mut s, &mut mem, x, y);
    }
    s.method(&mut mem, 0x17FC, &[0]);
    s.kick(&mut gpu, &mut mem);

    // interior equals the expanded color0 of the block
    assert_eq!(pixel(&mem, 8, 8), 0xFF00_FF00);
    assert_eq!(pixel(&mem, 12, 6), 0xFF00_FF00);
    // outside untouched
    assert_eq!(pixel(&mem, 30, 30), 0);
}

#[test]
fn test_end_to_end_clear() {
    let mut gpu = GpuContext::new();
    let mut mem = SystemMemory::new(0x20000);
    let mut s = Stream::new();

    configure_target(&mut s, &mut mem);
    s.method(&mut mem, 0x1D98, &[31 << 16]);
    s.method(&mut mem, 0x1D9C, &[31 << 16]);
    s.method(&mut mem, 0x1D90, &[0x0011_2233]);
    s.method(&mut mem, 0x1D94, &[0xF0]);
    s.kick(&mut gpu, &mut mem);
    assert_eq!(pixel(&mem, 0, 0), 0x0011_2233);
    assert_eq!(pixel(&mem, 17, 23), 0x0011_2233);
    assert_eq!(pixel(&mem, 31, 31), 0x0011_2233);

    // same clear against an R5G6B5 target stores the packed low word;
    // the follow-up stream continues where GET stopped
    s.method(&mut mem, 0x0208, &[0x0123]); // R5G6B5
    s.method(&mut mem, 0x1D94, &[0xF0]);
    s.kick(&mut gpu, &mut mem);
    assert_eq!(mem.read_u16(COLOR_BASE), 0x2233);
}

#[test]
fn test_end_to_end_wait_vblank_suspends_and_resumes() {
    let mut gpu = GpuContext::new();
    let mut mem = SystemMemory::new(0x20000);
    let mut s = Stream::new();

    configure_target(&mut s, &mut mem);
    s.method(&mut mem, 0x0130, &[0]); // wait for vblank
    s.method(&mut mem, 0x1D98, &[31 << 16]);
    s.method(&mut mem, 0x1D9C, &[31 << 16]);
    s.method(&mut mem, 0x1D90, &[0xDEAD_BEEF]);
    s.method(&mut mem, 0x1D94, &[0xF0]);
    s.kick(&mut gpu, &mut mem);

    // parked: nothing after the wait ran
    assert_eq!(gpu.puller.suspended, Some(SuspendReason::WaitVblank));
    assert_eq!(pixel(&mem, 0, 0), 0);

    // the vblank edge resumes the stream to completion
    gpu.vblank(&mut mem, true);
    assert_eq!(gpu.puller.suspended, None);
    assert_eq!(pixel(&mem, 0, 0), 0xDEAD_BEEF);
}

#[test]
fn test_end_to_end_jump_command() {
    let mut gpu = GpuContext::new();
    let mut mem = SystemMemory::new(0x20000);

    // a clear parked at 0x2000, reached through a jump, jumping back
    let mut far = Stream { cursor: 0x2000 };
    far.method(&mut mem, 0x1D90, &[0x0055_AA55]);
    far.method(&mut mem, 0x1D94, &[0xF0]);
    mem.write_u32(far.cursor, 0x0000_0154 | 1); // jump back to 0x154

    let mut s = Stream::new();
    configure_target(&mut s, &mut mem);
    s.method(&mut mem, 0x1D98, &[31 << 16]);
    s.method(&mut mem, 0x1D9C, &[31 << 16]);
    assert!(s.cursor < 0x150);
    // pad to a known jump target
    s.cursor = 0x150;
    mem.write_u32(s.cursor, 0x0000_2000 | 1); // jump to 0x2000
    s.cursor += 4;
    // resume point after the far block
    s.cursor = 0x154;
    s.kick(&mut gpu, &mut mem);

    assert_eq!(pixel(&mem, 4, 4), 0x0055_AA55);
    // GET drained to PUT
    assert_eq!(gpu.subch(0, 0).regs[0x44 / 4], 0x154);
}

#[test]
fn test_end_to_end_clip_fast_path_equivalence() {
    // an all-visible triangle renders identically with and without the
    // clipper armed
    let render = |clipping: bool| -> Vec<u8> {
        let mut gpu = GpuContext::new();
        let mut mem = SystemMemory::new(0x20000);
        if !clipping {
            gpu.toggle_clipping_w_support();
        }
        let mut s = Stream::new();
        configure_target(&mut s, &mut mem);
        identity_composite(&mut s, &mut mem);
        s.method(&mut mem, 0x17FC, &[5]);
        push_color(&mut s, &mut mem, [0.25, 0.5, 0.75, 1.0]);
        for (x, y) in [(3.0f32, 3.0f32), (29.0, 5.0), (8.0, 30.0)] {
            push_position(&mut s, &mut mem, x, y);
        }
        s.method(&mut mem, 0x17FC, &[0]);
        s.kick(&mut gpu, &mut mem);
        mem.slice(COLOR_BASE, (PITCH * 32) as usize).to_vec()
    };
    assert_eq!(render(true), render(false));
}

#[test]
fn test_bound_object_classification() {
    let mut gpu = GpuContext::new();
    let mut mem = SystemMemory::new(0x20000);

    // an object table entry: handle hashes to its slot, class 0x97
    let handle = 0x1234_5678u32;
    let h = ((((handle >> 11) ^ handle) >> 11) ^ handle) & 0x7FF;
    gpu.mmio_w(&mut mem, 0x0070_0000 + h * 8, handle);
    gpu.mmio_w(&mut mem, 0x0070_0000 + h * 8 + 4, 0x20); // instance 0x200
    gpu.mmio_w(&mut mem, 0x0070_0000 + 0x200, 0x97);

    // bind to subchannel 3 with a zero-method count-one command
    mem.write_u32(0, 3 << 13 | 1 << 18);
    mem.write_u32(4, handle);
    gpu.mmio_w(&mut mem, DMA_PUT, 8);

    assert_eq!(gpu.subch(0, 3).object.objclass, 0x97);
    assert_eq!(gpu.subch(0, 3).object.objhandle, 0x200);
}

#[test]
fn test_interrupt_roundtrip_through_mmio() {
    let mut gpu = GpuContext::new();
    let mut mem = SystemMemory::new(0x20000);

    // enable PGRAPH notify and the PMC hardware gate
    gpu.mmio_w(&mut mem, 0x0040_0140, 1);
    gpu.mmio_w(&mut mem, 0x0000_0140, 1);

    // the notify method raises the interrupt and parks the puller
    mem.write_u32(0, (1 << 18) | 0x0100);
    mem.write_u32(4, 0x42);
    gpu.mmio_w(&mut mem, DMA_PUT, 8);
    assert_eq!(gpu.puller.suspended, Some(SuspendReason::WaitPgraphIdle));
    assert!(gpu.irq.asserted());
    assert_ne!(gpu.mmio_r(0x0040_0100) & 1, 0);

    // acknowledge: write-1-to-clear the status, then release the puller
    gpu.mmio_w(&mut mem, 0x0040_0100, 1);
    assert!(!gpu.irq.asserted());
    gpu.mmio_w(&mut mem, 0x0040_0720, 1);
    assert_eq!(gpu.puller.suspended, None);
}

#[test]
fn test_screen_update_copies_scanout() {
    let mut gpu = GpuContext::new();
    let mut mem = SystemMemory::new(0x200000);
    gpu.mmio_w(&mut mem, 0x0060_0800, 0x40000);
    mem.write_u32(0x40000, 0x11223344);
    mem.write_u32(0x40000 + 4, 0x55667788);
    let mut frame = vec![0u32; 640 * 480];
    gpu.screen_update(&mem, &mut frame);
    assert_eq!(frame[0], 0x11223344);
    assert_eq!(frame[1], 0x55667788);
}

proptest! {
    /// FUNC_ADD with factors ONE/ZERO reproduces the source exactly for
    /// any source and destination color
    #[test]
    fn prop_blend_add_one_zero_is_identity(src in any::<u32>(), dst in any::<u32>()) {
        let mut gpu = GpuContext::new();
        gpu.rt.limits = crate::core::gpu::primitives::Rect::new(0, 0, 3, 3);
        gpu.rt.pitch_color = 16;
        gpu.rt.pitch_depth = 16;
        gpu.rt.size_color = 64;
        gpu.rt.size_depth = 64;
        gpu.rt.depth_offset = 0x100;
        let mut mem = SystemMemory::new(0x200);
        mem.write_u32(0, dst);
        let ps = PixelOpState {
            blending_enabled: true,
            blend_function_source: BlendFactor::One,
            blend_function_destination: BlendFactor::Zero,
            blend_equation: BlendEquation::FuncAdd,
            ..PixelOpState::default()
        };
        write_pixel(&gpu.rt, &ps, &gpu.dilate, &mut mem, 0, 0, src, 0);
        prop_assert_eq!(mem.read_u32(0), src);
    }
}
