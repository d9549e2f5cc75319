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

//! Shared physical memory arena
//!
//! The GPU does not own the memory it renders into. Command ring buffers,
//! vertex buffers, textures, the render target and the depth buffer all
//! live in the machine's physical memory, which the CPU cores write at the
//! same time through the system bus. This module models that memory as a
//! single owned byte arena with bounds-checked accessors.
//!
//! There is deliberately no locking here: real hardware provides no
//! automatic coherency between CPU stores and GPU fetches, and software is
//! expected to order its own accesses. Aliasing the same region from both
//! sides is by contract, not an accident.
//!
//! # Access policy
//!
//! The `try_*` accessors return [`EmulatorError::MemoryOutOfRange`] for
//! addresses outside the arena. The plain accessors are the tolerant
//! wrappers the rendering core uses: an out-of-range read returns zero, an
//! out-of-range write is dropped, and both log a warning, mirroring the
//! real chip's tolerance of bogus pointers instead of crashing the guest.
//!
//! # Example
//!
//! ```
//! use nvrx::core::memory::SystemMemory;
//!
//! let mut mem = SystemMemory::new(1024);
//! mem.write_u32(0x10, 0xDEADBEEF);
//! assert_eq!(mem.read_u32(0x10), 0xDEADBEEF);
//!
//! // Out of range is tolerated, not fatal
//! assert_eq!(mem.read_u32(0x10000), 0);
//! ```

use crate::core::error::{EmulatorError, Result};

/// Owned physical memory arena shared by the CPU side and the GPU
///
/// All GPU-visible "pointers" (render target base, texture base, vertex
/// buffer addresses, DMA ring positions) are byte offsets into this arena.
pub struct SystemMemory {
    /// Backing store, little-endian, byte addressable
    ram: Vec<u8>,
}

impl SystemMemory {
    /// Create an arena of `size` bytes, zero filled
    pub fn new(size: usize) -> Self {
        Self {
            ram: vec![0u8; size],
        }
    }

    /// Size of the arena in bytes
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.ram.len()
    }

    /// True if the arena has zero size
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.ram.is_empty()
    }

    /// Read a 32-bit little-endian word, failing on out-of-range addresses
    pub fn try_read_u32(&self, address: u32) -> Result<u32> {
        let a = address as usize;
        if a + 4 > self.ram.len() {
            return Err(EmulatorError::MemoryOutOfRange {
                address,
                size: 4,
                arena: self.ram.len(),
            });
        }
        Ok(u32::from_le_bytes([
            self.ram[a],
            self.ram[a + 1],
            self.ram[a + 2],
            self.ram[a + 3],
        ]))
    }

    /// Write a 32-bit little-endian word, failing on out-of-range addresses
    pub fn try_write_u32(&mut self, address: u32, value: u32) -> Result<()> {
        let a = address as usize;
        if a + 4 > self.ram.len() {
            return Err(EmulatorError::MemoryOutOfRange {
                address,
                size: 4,
                arena: self.ram.len(),
            });
        }
        self.ram[a..a + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Read a 32-bit word, tolerating out-of-range addresses as zero
    #[inline(always)]
    pub fn read_u32(&self, address: u32) -> u32 {
        match self.try_read_u32(address) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("dropped read: {}", e);
                0
            }
        }
    }

    /// Write a 32-bit word, dropping out-of-range writes
    #[inline(always)]
    pub fn write_u32(&mut self, address: u32, value: u32) {
        if let Err(e) = self.try_write_u32(address, value) {
            log::warn!("dropped write: {}", e);
        }
    }

    /// Read a 16-bit little-endian halfword, tolerating out-of-range as zero
    #[inline(always)]
    pub fn read_u16(&self, address: u32) -> u16 {
        let a = address as usize;
        if a + 2 > self.ram.len() {
            log::warn!(
                "dropped read: memory access out of range: address 0x{:08X}, size 2",
                address
            );
            return 0;
        }
        u16::from_le_bytes([self.ram[a], self.ram[a + 1]])
    }

    /// Write a 16-bit halfword, dropping out-of-range writes
    #[inline(always)]
    pub fn write_u16(&mut self, address: u32, value: u16) {
        let a = address as usize;
        if a + 2 > self.ram.len() {
            log::warn!(
                "dropped write: memory access out of range: address 0x{:08X}, size 2",
                address
            );
            return;
        }
        self.ram[a..a + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// Read a byte, tolerating out-of-range as zero
    #[inline(always)]
    pub fn read_u8(&self, address: u32) -> u8 {
        match self.ram.get(address as usize) {
            Some(&b) => b,
            None => {
                log::warn!(
                    "dropped read: memory access out of range: address 0x{:08X}, size 1",
                    address
                );
                0
            }
        }
    }

    /// Write a byte, dropping out-of-range writes
    #[inline(always)]
    pub fn write_u8(&mut self, address: u32, value: u8) {
        match self.ram.get_mut(address as usize) {
            Some(b) => *b = value,
            None => {
                log::warn!(
                    "dropped write: memory access out of range: address 0x{:08X}, size 1",
                    address
                );
            }
        }
    }

    /// Read a 64-bit little-endian doubleword, tolerating out-of-range as zero
    #[inline(always)]
    pub fn read_u64(&self, address: u32) -> u64 {
        let a = address as usize;
        if a + 8 > self.ram.len() {
            log::warn!(
                "dropped read: memory access out of range: address 0x{:08X}, size 8",
                address
            );
            return 0;
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.ram[a..a + 8]);
        u64::from_le_bytes(bytes)
    }

    /// Copy a block of bytes into the arena (test and loader convenience)
    ///
    /// The copy is truncated at the end of the arena.
    pub fn load(&mut self, address: u32, data: &[u8]) {
        let a = address as usize;
        if a >= self.ram.len() {
            return;
        }
        let n = data.len().min(self.ram.len() - a);
        self.ram[a..a + n].copy_from_slice(&data[..n]);
    }

    /// Borrow a byte range for readback (display output, tests)
    ///
    /// Returns an empty slice if the range is out of bounds.
    pub fn slice(&self, address: u32, len: usize) -> &[u8] {
        let a = address as usize;
        if a + len > self.ram.len() {
            return &[];
        }
        &self.ram[a..a + len]
    }
}
