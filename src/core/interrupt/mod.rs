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

//! GPU interrupt tree
//!
//! The GPU presents a two-level interrupt hierarchy. Each engine (PGRAPH,
//! PCRTC) has its own status/enable register pair; the master controller
//! (PMC) mirrors each engine's "any enabled bit pending" condition into a
//! summary bit of its own status register, and the single level IRQ line to
//! the host is asserted from the PMC status gated by the PMC enable.
//!
//! ## Registers
//!
//! - **PGRAPH_INTR** (PGRAPH+0x100) / **PGRAPH_INTR_EN** (PGRAPH+0x140)
//!   - Status is write-1-to-clear
//! - **PCRTC_INTR** (PCRTC+0x100) / **PCRTC_INTR_EN** (PCRTC+0x140)
//!   - Status is write-1-to-clear; bit 0 is the vblank interrupt
//! - **PMC_INTR** (PMC+0x100) / **PMC_INTR_EN** (PMC+0x140)
//!   - Bit 12 summarizes PGRAPH, bit 24 summarizes PCRTC
//!   - Enable bit 0 gates hardware sources (PMC_INTR bits 0-30),
//!     enable bit 1 gates the software source (PMC_INTR bit 31)

/// PMC summary status bits
pub mod pmc {
    /// PGRAPH has an enabled interrupt pending (bit 12)
    pub const INTR_PGRAPH: u32 = 1 << 12;

    /// PCRTC has an enabled interrupt pending (bit 24)
    pub const INTR_PCRTC: u32 = 1 << 24;

    /// Hardware interrupt sources (everything except the software bit)
    pub const INTR_HARDWARE: u32 = 0x7FFF_FFFF;

    /// Software interrupt source (bit 31)
    pub const INTR_SOFTWARE: u32 = 0x8000_0000;

    /// Enable for hardware sources
    pub const INTR_EN_HARDWARE: u32 = 1 << 0;

    /// Enable for the software source
    pub const INTR_EN_SOFTWARE: u32 = 1 << 1;
}

/// Fold an engine's (status, enable) pair into a PMC summary bit
///
/// Returns the new PMC status with `summary_bit` set when any enabled
/// engine interrupt is pending and cleared otherwise.
#[inline(always)]
pub fn fold_engine(pmc_status: u32, summary_bit: u32, status: u32, enable: u32) -> u32 {
    if status & enable != 0 {
        pmc_status | summary_bit
    } else {
        pmc_status & !summary_bit
    }
}

/// Evaluate the PMC gate: is the host IRQ line asserted?
#[inline(always)]
pub fn pmc_pending(pmc_status: u32, pmc_enable: u32) -> bool {
    ((pmc_status & pmc::INTR_HARDWARE) != 0 && (pmc_enable & pmc::INTR_EN_HARDWARE) != 0)
        || ((pmc_status & pmc::INTR_SOFTWARE) != 0 && (pmc_enable & pmc::INTR_EN_SOFTWARE) != 0)
}

/// Level IRQ line with edge-filtered callback delivery
///
/// The host registers a callback invoked with the new line level. The line
/// remembers its state so repeated evaluation of an unchanged condition
/// does not spam the callback.
#[derive(Default)]
pub struct IrqLine {
    callback: Option<Box<dyn FnMut(bool)>>,
    asserted: bool,
}

impl IrqLine {
    /// Create a disconnected line (updates are tracked but go nowhere)
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect the host callback
    pub fn connect(&mut self, callback: Box<dyn FnMut(bool)>) {
        self.callback = Some(callback);
    }

    /// Drive the line to `level`, notifying the host on change
    pub fn set(&mut self, level: bool) {
        if level != self.asserted {
            self.asserted = level;
            log::trace!("IRQ line {}", if level { "asserted" } else { "cleared" });
            if let Some(cb) = self.callback.as_mut() {
                cb(level);
            }
        }
    }

    /// Current line level
    #[inline(always)]
    pub fn asserted(&self) -> bool {
        self.asserted
    }
}
