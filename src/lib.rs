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

//! nvrx: an NV2A-class GPU command processor and software renderer
//!
//! This crate implements the 3D accelerator core of an NV2A-class GPU as a
//! reusable library: the DMA command puller, the register-mapped method
//! state machine, a vertex-program virtual machine, primitive assembly and
//! w-plane clipping, a scanline span renderer with texture sampling and
//! register combiners, and the full per-pixel depth/stencil/blend/logic-op
//! output stage writing into a software framebuffer.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`core::memory`]: the shared physical memory arena the GPU and the
//!   host CPU alias without synchronization
//! - [`core::interrupt`]: the PMC interrupt tree and IRQ line output
//! - [`core::gpu`]: the GPU itself (puller, methods, vertex program,
//!   rasterizer, combiners, pixel pipeline)
//!
//! # Example
//!
//! ```
//! use nvrx::core::gpu::GpuContext;
//! use nvrx::core::memory::SystemMemory;
//!
//! let mut mem = SystemMemory::new(16 * 1024 * 1024);
//! let mut gpu = GpuContext::new();
//!
//! // The host CPU talks to the GPU exclusively through its register
//! // window and the shared memory arena.
//! assert_eq!(gpu.mmio_r(0x00100200), 3);
//!
//! // An empty command ring (PUT == GET) leaves the puller idle.
//! gpu.mmio_w(&mut mem, 0x0080_0040, 0);
//! ```
//!
//! # Error Handling
//!
//! Fallible internal operations return [`core::error::Result<T>`], an alias
//! for `Result<T, EmulatorError>`. The command-stream boundary itself never
//! fails: malformed streams degrade to logged no-ops so a bad command can
//! never halt the emulated machine.

pub mod core;

// Re-export commonly used types
pub use core::error::{EmulatorError, Result};
