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

//! Command puller (FIFO engine)
//!
//! Each channel exposes a DMA_PUT/DMA_GET register pair pointing into a
//! command ring in system memory. Whenever the two diverge the puller
//! drains the ring: it reads one 32-bit command word at GET, classifies
//! it, and either redirects GET (jump/call/return) or dispatches a burst
//! of method writes to the object bound on the addressed subchannel.
//!
//! A zero-method single-count command binds an object instead: the next
//! word is a handle hashed into the instance-memory table to resolve the
//! object's class.
//!
//! The puller is the machine's only asynchronous suspension point. The
//! wait-for-vblank and interrupt-notify methods park it in an explicit
//! [`SuspendReason`] state; [`GpuContext::vblank`] and the PGRAPH idle
//! register write resume it. Channels are drained in a fixed order, which
//! is indistinguishable from hardware interleaving for the single active
//! channel real software uses.

use crate::core::gpu::methods::MethodStatus;
use crate::core::gpu::{GpuContext, CHANNEL_COUNT};
use crate::core::memory::SystemMemory;

/// Word index of DMA_PUT in a channel's register window
pub(crate) const DMA_PUT_REG: usize = 0x40 / 4;

/// Word index of DMA_GET in a channel's register window
pub(crate) const DMA_GET_REG: usize = 0x44 / 4;

/// Why the puller is parked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendReason {
    /// The wait-for-vblank method ran; resume on the next vblank edge
    WaitVblank,
    /// The interrupt-notify method ran; resume when the host writes the
    /// PGRAPH idle register
    WaitPgraphIdle,
}

/// Puller execution state
#[derive(Default)]
pub(crate) struct PullerState {
    /// `Some` while parked on a wait condition
    pub suspended: Option<SuspendReason>,
    /// One pending return address per channel for call/return commands
    pub return_address: [Option<u32>; CHANNEL_COUNT],
}

/// Classification of one command word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Increasing,
    NonIncreasing,
    LongNonIncreasing,
    Jump,
    OldJump,
    Call,
    Return,
    SliConditional,
    Invalid,
}

impl CommandKind {
    /// Decode the command word's framing bits
    pub fn from_word(word: u32) -> Self {
        if word & 0x0000_0003 == 0x0000_0002 {
            return Self::Call;
        }
        if word & 0x0000_0003 == 0x0000_0001 {
            return Self::Jump;
        }
        if word & 0xE003_0003 == 0x4000_0000 {
            return Self::NonIncreasing;
        }
        if word & 0xE000_0003 == 0x2000_0000 {
            return Self::OldJump;
        }
        if word & 0xFFFF_0003 == 0x0003_0000 {
            return Self::LongNonIncreasing;
        }
        if word == 0x0002_0000 {
            return Self::Return;
        }
        if word & 0xFFFF_0003 == 0x0001_0000 {
            return Self::SliConditional;
        }
        if word & 0xE003_0003 == 0x0000_0000 {
            return Self::Increasing;
        }
        Self::Invalid
    }
}

/// Fields of a method-dispatch command word
#[inline(always)]
fn method_fields(cmd: u32) -> (u32, usize, i32) {
    let method = (cmd >> 2) & 2047;
    let subchannel = ((cmd >> 13) & 7) as usize;
    let count = ((cmd >> 18) & 2047) as i32;
    (method, subchannel, count)
}

impl GpuContext {
    /// Hash a handle into the instance-memory object table
    ///
    /// Falls back to a linear scan when the hashed slot holds a different
    /// handle (collision), matching the hardware's hash-table layout.
    pub(crate) fn object_offset(&self, handle: u32) -> u32 {
        let h = ((((handle >> 11) ^ handle) >> 11) ^ handle) & 0x7FF;
        let o = (self.pfifo[0x210 / 4] & 0x1FF) << 8;
        let mut e = o + h * 8;
        if self.ramin[(e / 4) as usize] != handle {
            let mut aa = (o / 4) as usize;
            while aa < self.ramin.len() {
                if self.ramin[aa] == handle {
                    e = (aa * 4) as u32;
                }
                aa += 2;
            }
        }
        let w = self.ramin[(e / 4 + 1) as usize];
        (w & 0xFFFF) * 0x10
    }

    /// Decode a DMA object into its (byte offset, byte size) pair
    pub(crate) fn read_dma_object(&self, handle: u32) -> (u32, u32) {
        let o = (self.object_offset(handle) / 4) as usize;
        let dma_adjust = (self.ramin[o] >> 20) & 0xFFF;
        let size = self.ramin[o + 1];
        let dma_frame = self.ramin[o + 2] & 0xFFFF_F000;
        (dma_frame + dma_adjust, size)
    }

    /// Bind the object whose handle sits at `address` to a subchannel
    pub(crate) fn assign_object(
        &mut self,
        mem: &SystemMemory,
        channel: usize,
        subchannel: usize,
        address: u32,
    ) {
        let handle = mem.read_u32(address);
        let offset = self.object_offset(handle);
        log::debug!(
            "assign object 0x{:08X} at instance offset 0x{:X} to subchannel {}",
            handle,
            offset,
            subchannel
        );
        let objclass = self.ramin[(offset / 4) as usize] & 0xFF;
        let obj = &mut self.subch_mut(channel, subchannel).object;
        obj.objhandle = offset;
        obj.objclass = objclass;
    }

    /// Kick the puller after a DMA register write on `channel`
    pub(crate) fn puller_kick(&mut self, mem: &mut SystemMemory, channel: usize) {
        let put = self.subch(channel, 0).regs[DMA_PUT_REG];
        let get = self.subch(channel, 0).regs[DMA_GET_REG];
        if get != put && self.puller.suspended.is_none() {
            self.puller_work(mem);
        }
    }

    /// Resume a puller parked on the vblank wait
    pub(crate) fn puller_resume_vblank(&mut self, mem: &mut SystemMemory) {
        if self.puller.suspended == Some(SuspendReason::WaitVblank) {
            self.puller.suspended = None;
            self.puller_work(mem);
        }
    }

    /// Resume a puller parked on the PGRAPH idle wait
    pub(crate) fn puller_resume_pgraph_idle(&mut self, mem: &mut SystemMemory) {
        if self.puller.suspended == Some(SuspendReason::WaitPgraphIdle) {
            self.puller.suspended = None;
            self.puller_work(mem);
        }
    }

    /// Drain every channel's command ring until empty or suspended
    pub(crate) fn puller_work(&mut self, mem: &mut SystemMemory) {
        for channel in 0..CHANNEL_COUNT {
            loop {
                let put = self.subch(channel, 0).regs[DMA_PUT_REG];
                let mut get = self.subch(channel, 0).regs[DMA_GET_REG];
                if get == put {
                    break;
                }
                let cmd = mem.read_u32(get);
                get += 4;
                let mut suspend = None;
                match CommandKind::from_word(cmd) {
                    CommandKind::Jump | CommandKind::OldJump => {
                        log::trace!("jump 0x{:08X} -> 0x{:08X}", get, cmd & 0xFFFF_FFFC);
                        get = cmd & 0xFFFF_FFFC;
                    }
                    CommandKind::Call => {
                        // one call in flight per channel; a nested call is
                        // dropped with a diagnostic and the stream continues
                        if self.puller.return_address[channel].is_some() {
                            log::warn!("nested call command at 0x{:08X} ignored", get - 4);
                        } else {
                            self.puller.return_address[channel] = Some(get);
                            get = cmd & 0xFFFF_FFFC;
                        }
                    }
                    CommandKind::Return => match self.puller.return_address[channel].take() {
                        Some(ret) => get = ret,
                        None => {
                            log::warn!("return command without a call at 0x{:08X}", get - 4)
                        }
                    },
                    CommandKind::Increasing => {
                        let (mut method, subchannel, mut count) = method_fields(cmd);
                        if method == 0 && count == 1 {
                            self.assign_object(mem, channel, subchannel, get);
                            get += 4;
                        } else {
                            let mut status = MethodStatus::Completed;
                            while count > 0 {
                                let mut countlen = 1;
                                status = self.exec_method(
                                    mem,
                                    channel,
                                    subchannel,
                                    method,
                                    get,
                                    &mut countlen,
                                );
                                count -= 1;
                                method += 1;
                                get += 4;
                                if status != MethodStatus::Completed {
                                    break;
                                }
                            }
                            suspend = match status {
                                MethodStatus::Completed => None,
                                MethodStatus::WaitVblank => Some(SuspendReason::WaitVblank),
                                MethodStatus::WaitPgraphIdle => {
                                    Some(SuspendReason::WaitPgraphIdle)
                                }
                            };
                        }
                    }
                    CommandKind::NonIncreasing | CommandKind::LongNonIncreasing => {
                        let (method, subchannel, mut count) = method_fields(cmd);
                        if CommandKind::from_word(cmd) == CommandKind::LongNonIncreasing {
                            count = mem.read_u32(get) as i32;
                            get += 4;
                        }
                        if method == 0 && count == 1 {
                            self.assign_object(mem, channel, subchannel, get);
                            get += 4;
                        } else {
                            while count > 0 {
                                let mut countlen = count;
                                self.exec_method(
                                    mem,
                                    channel,
                                    subchannel,
                                    method,
                                    get,
                                    &mut countlen,
                                );
                                if countlen >= count {
                                    // a short or non-consuming stream would
                                    // spin forever; drop one word and move on
                                    log::warn!(
                                        "method 0x{:04X} consumed nothing, skipping a word",
                                        method * 4
                                    );
                                    countlen = count - 1;
                                }
                                get += 4 * (count - countlen) as u32;
                                count = countlen;
                            }
                        }
                    }
                    CommandKind::SliConditional => {
                        log::warn!("unimplemented sli-conditional command 0x{:08X}", cmd);
                    }
                    CommandKind::Invalid => {
                        log::warn!("unimplemented command 0x{:08X}", cmd);
                    }
                }
                self.subch_mut(channel, 0).regs[DMA_GET_REG] = get;
                if let Some(reason) = suspend {
                    self.puller.suspended = Some(reason);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_classification() {
        assert_eq!(CommandKind::from_word(0x00000001), CommandKind::Jump);
        assert_eq!(CommandKind::from_word(0x12345001), CommandKind::Jump);
        assert_eq!(CommandKind::from_word(0x00000002), CommandKind::Call);
        assert_eq!(CommandKind::from_word(0x00020000), CommandKind::Return);
        assert_eq!(CommandKind::from_word(0x00030000), CommandKind::LongNonIncreasing);
        assert_eq!(CommandKind::from_word(0x00010000), CommandKind::SliConditional);
        assert_eq!(CommandKind::from_word(0x20000000), CommandKind::OldJump);
        // increasing: zero high bits, method/subchannel/count packed
        assert_eq!(
            CommandKind::from_word((1 << 18) | 0x100),
            CommandKind::Increasing
        );
        assert_eq!(
            CommandKind::from_word(0x40000000 | (1 << 18) | 0x100),
            CommandKind::NonIncreasing
        );
        assert_eq!(CommandKind::from_word(0x80000000), CommandKind::Invalid);
    }

    #[test]
    fn test_method_field_extraction() {
        // method 0x100 (word index 0x40), subchannel 3, count 5
        let cmd = (5 << 18) | (3 << 13) | 0x100;
        let (method, subch, count) = method_fields(cmd);
        assert_eq!(method, 0x40);
        assert_eq!(subch, 3);
        assert_eq!(count, 5);
    }

    #[test]
    fn test_object_hash_direct_hit() {
        let mut gpu = GpuContext::new();
        let handle = 0x1234_5678u32;
        let h = ((((handle >> 11) ^ handle) >> 11) ^ handle) & 0x7FF;
        // hash table at instance offset 0 (pfifo[0x210/4] = 0)
        let e = (h * 8 / 4) as usize;
        gpu.ramin[e] = handle;
        gpu.ramin[e + 1] = 0x0000_0042; // instance pointer
        assert_eq!(gpu.object_offset(handle), 0x42 * 0x10);
    }

    #[test]
    fn test_dma_object_decode() {
        let mut gpu = GpuContext::new();
        let handle = 0x0000_0777u32;
        let h = ((((handle >> 11) ^ handle) >> 11) ^ handle) & 0x7FF;
        let e = (h * 8 / 4) as usize;
        gpu.ramin[e] = handle;
        gpu.ramin[e + 1] = 0x0000_0010; // object at 0x100
        // dma object: adjust 0x123, size, frame
        gpu.ramin[0x100 / 4] = 0x123 << 20;
        gpu.ramin[0x100 / 4 + 1] = 0x8000;
        gpu.ramin[0x100 / 4 + 2] = 0x0030_0000;
        let (offset, size) = gpu.read_dma_object(handle);
        assert_eq!(offset, 0x0030_0123);
        assert_eq!(size, 0x8000);
    }
}
