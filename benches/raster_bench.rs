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

//! Rasterizer benchmarks
//!
//! Drives the GPU through the same command-stream path the emulated
//! machine uses, measuring full-screen clears and triangle fill.

use criterion::{criterion_group, criterion_main, Criterion};

use nvrx::core::gpu::primitives::attr;
use nvrx::core::gpu::GpuContext;
use nvrx::core::memory::SystemMemory;

const DMA_PUT: u32 = 0x0080_0040;
const DMA_GET: u32 = 0x0080_0044;
const COLOR_BASE: u32 = 0x100000;
const DEPTH_BASE: u32 = 0x200000;

struct Stream {
    cursor: u32,
}

impl Stream {
    fn method(&mut self, mem: &mut SystemMemory, maddress: u32, data: &[u32]) {
        mem.write_u32(self.cursor, ((data.len() as u32) << 18) | maddress);
        self.cursor += 4;
        for d in data {
            mem.write_u32(self.cursor, *d);
            self.cursor += 4;
        }
    }
}

fn setup() -> (GpuContext, SystemMemory) {
    let mut gpu = GpuContext::new();
    let mut mem = SystemMemory::new(4 * 1024 * 1024);
    let mut s = Stream { cursor: 0 };
    s.method(&mut mem, 0x0200, &[640 << 16]);
    s.method(&mut mem, 0x0204, &[480 << 16]);
    s.method(&mut mem, 0x0208, &[0x0128]);
    s.method(&mut mem, 0x020C, &[(0xA00 << 16) | 0xA00]);
    s.method(&mut mem, 0x0210, &[COLOR_BASE]);
    s.method(&mut mem, 0x0214, &[DEPTH_BASE]);
    s.method(&mut mem, 0x0354, &[0x0207]);
    // identity composite, fixed-function pipeline
    for i in 0..16u32 {
        let v = if i % 5 == 0 { 1.0f32 } else { 0.0 };
        s.method(&mut mem, 0x0680 + i * 4, &[v.to_bits()]);
    }
    s.method(&mut mem, 0x1E94, &[4]);
    gpu.mmio_w(&mut mem, DMA_PUT, s.cursor);
    (gpu, mem)
}

fn run_stream(
    gpu: &mut GpuContext,
    mem: &mut SystemMemory,
    build: impl Fn(&mut Stream, &mut SystemMemory),
) {
    let get = gpu.mmio_r(DMA_GET);
    let mut s = Stream { cursor: get };
    build(&mut s, mem);
    gpu.mmio_w(mem, DMA_PUT, s.cursor);
}

fn bench_clear(c: &mut Criterion) {
    c.bench_function("clear_640x480", |b| {
        let (mut gpu, mut mem) = setup();
        run_stream(&mut gpu, &mut mem, |s, m| {
            s.method(m, 0x1D98, &[639 << 16]);
            s.method(m, 0x1D9C, &[479 << 16]);
            s.method(m, 0x1D90, &[0x00112233]);
        });
        b.iter(|| {
            run_stream(&mut gpu, &mut mem, |s, m| {
                s.method(m, 0x1D94, &[0xF0]);
            });
        });
    });
}

fn bench_triangle_fill(c: &mut Criterion) {
    c.bench_function("triangle_fill_200px", |b| {
        let (mut gpu, mut mem) = setup();
        b.iter(|| {
            run_stream(&mut gpu, &mut mem, |s, m| {
                s.method(m, 0x17FC, &[5]);
                s.method(
                    m,
                    0x1A00 + (attr::COLOR0 as u32) * 16,
                    &[
                        1.0f32.to_bits(),
                        1.0f32.to_bits(),
                        1.0f32.to_bits(),
                        1.0f32.to_bits(),
                    ],
                );
                for (x, y) in [(100.0f32, 100.0f32), (300.0, 120.0), (150.0, 400.0)] {
                    s.method(m, 0x1A00, &[x.to_bits(), y.to_bits(), 0, 1.0f32.to_bits()]);
                }
                s.method(m, 0x17FC, &[0]);
            });
        });
    });
}

criterion_group!(benches, bench_clear, bench_triangle_fill);
criterion_main!(benches);
