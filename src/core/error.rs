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

//! Error types for the emulator core
//!
//! Errors are used at internal seams (memory arena addressing, surface
//! offset computation). The command-processing boundary never propagates
//! them: a handler that hits one of these resolves it locally (zero read,
//! dropped write, clamped count) and logs, because a single bad command
//! must not halt emulation of the whole machine.

use thiserror::Error;

/// Emulator error type
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// An address fell outside the emulated physical memory window
    #[error("memory access out of range: address 0x{address:08X}, size {size} (arena is {arena} bytes)")]
    MemoryOutOfRange {
        /// Faulting byte address
        address: u32,
        /// Access width in bytes
        size: u32,
        /// Size of the memory arena
        arena: usize,
    },

    /// A computed surface offset fell outside the configured surface
    #[error("surface offset 0x{offset:08X} outside {what} (size 0x{size:08X})")]
    SurfaceOutOfRange {
        /// What surface was addressed ("render target", "depth buffer")
        what: &'static str,
        /// Faulting byte offset
        offset: u32,
        /// Configured surface size
        size: u32,
    },
}

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, EmulatorError>;
