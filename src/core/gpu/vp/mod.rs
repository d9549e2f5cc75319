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

//! Vertex program virtual machine
//!
//! Each uploaded instruction is a 128-bit word carrying one vector opcode
//! and one scalar opcode that execute side by side over up to three source
//! operands. Every operand selects a bank (temporary register, input
//! vertex attribute, or constant), a per-component swizzle and an optional
//! negate; the constant bank can additionally be indexed relative to the
//! address register `a0x` loaded by the ARL opcode.
//!
//! One instruction can retire up to three results, each gated by its own
//! write mask: the vector result to a temporary, the vector OR scalar
//! result to an output attribute or a constant (selected by a multiplexer
//! bit), and the scalar result to a temporary. Writing output 0 (the
//! transformed position) also mirrors the value into temporary r12, which
//! the instruction set defines as an alias of the position output.
//!
//! Instruction fields (bit layout of the four data words):
//!
//! ```text
//! word 1: |31-29 unused|28-25 scalar op|24-21 vector op|20-13 constant index|
//!         |12-9 input index|8 A sign|7-0 A swizzle x/y/z/w|
//! word 2: |31-28 A temp index|27-26 A type|25 B sign|24-17 B swizzle|
//!         |16-13 B temp index|12-11 B type|10 C sign|9-2 C swizzle|1-0 C temp hi|
//! word 3: |31-30 C temp lo|29-28 C type|27-24 vec temp mask|23-20 vec temp index|
//!         |19-16 sca temp mask|15-12 output mask|11 output-vs-constant|
//!         |10-3 output index|2 scalar-to-output mux|1 use a0x|0 end of program|
//! ```
//!
//! Execution is fully synchronous: [`VertexProgram::process`] runs each
//! vertex to the instruction with the end-of-program bit before touching
//! the next.

pub mod disasm;

use crate::core::gpu::primitives::{Vertex, ATTR_COUNT};

/// Instruction slots in the microcode store
pub const MAX_INSTRUCTIONS: usize = 256;

/// Four-float constant registers
pub const CONSTANT_COUNT: usize = 192;

/// Temporary registers (r12 aliases the position output)
pub const TEMP_COUNT: usize = 16;

/// Vector ALU opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VecOp {
    #[default]
    Nop,
    Mov,
    Mul,
    Add,
    Mad,
    Dp3,
    Dph,
    Dp4,
    Dst,
    Min,
    Max,
    Slt,
    Sge,
    Arl,
    Reserved14,
    Reserved15,
}

impl VecOp {
    fn from_raw(value: u32) -> Self {
        match value & 15 {
            0 => Self::Nop,
            1 => Self::Mov,
            2 => Self::Mul,
            3 => Self::Add,
            4 => Self::Mad,
            5 => Self::Dp3,
            6 => Self::Dph,
            7 => Self::Dp4,
            8 => Self::Dst,
            9 => Self::Min,
            10 => Self::Max,
            11 => Self::Slt,
            12 => Self::Sge,
            13 => Self::Arl,
            14 => Self::Reserved14,
            _ => Self::Reserved15,
        }
    }
}

/// Scalar ALU opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaOp {
    #[default]
    Nop,
    Imv,
    Rcp,
    Rcc,
    Rsq,
    Exp,
    Log,
    Lit,
    Reserved(u32),
}

impl ScaOp {
    fn from_raw(value: u32) -> Self {
        match value & 15 {
            0 => Self::Nop,
            1 => Self::Imv,
            2 => Self::Rcp,
            3 => Self::Rcc,
            4 => Self::Rsq,
            5 => Self::Exp,
            6 => Self::Log,
            7 => Self::Lit,
            v => Self::Reserved(v),
        }
    }
}

/// Decoded source operand descriptor
#[derive(Debug, Clone, Copy, Default)]
struct SourceField {
    negate: bool,
    /// 0 = unused, 1 = temporary, 2 = input attribute, 3 = constant
    param_type: u32,
    temp_index: usize,
    swizzle: [usize; 4],
}

/// Fully decoded instruction fields
#[derive(Debug, Clone, Copy, Default)]
struct Decoded {
    src: [SourceField; 3],
    vec_op: VecOp,
    sca_op: ScaOp,
    vec_temp_mask: u32,
    vec_temp_index: usize,
    sca_temp_mask: u32,
    output_mask: u32,
    /// true = write the output attribute bank, false = write a constant
    output_is_attribute: bool,
    output_index: usize,
    /// true = the output slot takes the scalar result instead of the vector
    scalar_to_output: bool,
    input_index: usize,
    constant_index: usize,
    use_a0x: bool,
    end_of_program: bool,
}

/// One microcode slot: raw words plus the decode cache
#[derive(Clone, Copy)]
struct Slot {
    words: [u32; 4],
    /// Bit per word written since the last decode
    modified: u32,
    decoded: Decoded,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            words: [0; 4],
            modified: 0,
            decoded: Decoded::default(),
        }
    }
}

/// The vertex-program execution engine
///
/// Microcode and constants persist across draw calls until re-uploaded;
/// temporaries, outputs and `a0x` are reset per vertex.
pub struct VertexProgram {
    slots: Box<[Slot; MAX_INSTRUCTIONS]>,
    constants: [[f32; 4]; CONSTANT_COUNT],
    temps: [[f32; 4]; TEMP_COUNT],
    /// Address register loaded by ARL
    a0x: i32,
    /// Instruction pointer
    ip: usize,
}

impl VertexProgram {
    pub fn new() -> Self {
        Self {
            slots: Box::new([Slot::default(); MAX_INSTRUCTIONS]),
            constants: [[0.0; 4]; CONSTANT_COUNT],
            temps: [[0.0; 4]; TEMP_COUNT],
            a0x: 0,
            ip: 0,
        }
    }

    /// Store one 32-bit word of an instruction being uploaded
    ///
    /// Decode happens incrementally: once all four constituent words have
    /// arrived the slot is decoded eagerly; partially updated slots decode
    /// lazily on first execution.
    pub fn upload_word(&mut self, slot: usize, component: usize, word: u32) {
        if slot >= MAX_INSTRUCTIONS {
            log::warn!("vertex program upload beyond microcode store: slot {}", slot);
            return;
        }
        let s = &mut self.slots[slot];
        s.words[component & 3] = word;
        s.modified |= 1 << (component & 3);
        if s.modified == 15 {
            s.modified = 0;
            s.decoded = Self::decode(&s.words);
        }
    }

    /// Raw words of a microcode slot (diagnostics)
    pub fn slot_words(&self, slot: usize) -> [u32; 4] {
        if slot < MAX_INSTRUCTIONS {
            self.slots[slot].words
        } else {
            [0; 4]
        }
    }

    /// Write one component of a constant register
    pub fn set_constant_word(&mut self, index: usize, component: usize, word: u32) {
        if index >= CONSTANT_COUNT {
            log::warn!("vertex program constant upload beyond bank: c[{}]", index);
            return;
        }
        self.constants[index][component & 3] = f32::from_bits(word);
    }

    /// Read back a constant register
    pub fn constant(&self, index: usize) -> [f32; 4] {
        self.constants[index.min(CONSTANT_COUNT - 1)]
    }

    fn decode(words: &[u32; 4]) -> Decoded {
        let mut d = Decoded {
            vec_op: VecOp::from_raw((words[1] >> 21) & 15),
            sca_op: ScaOp::from_raw((words[1] >> 25) & 15),
            vec_temp_mask: (words[3] >> 24) & 15,
            vec_temp_index: ((words[3] >> 20) & 15) as usize,
            sca_temp_mask: (words[3] >> 16) & 15,
            output_mask: (words[3] >> 12) & 15,
            output_is_attribute: words[3] & 0x800 != 0,
            output_index: ((words[3] >> 3) & 255) as usize,
            scalar_to_output: words[3] & 4 != 0,
            input_index: ((words[1] >> 9) & 15) as usize,
            constant_index: ((words[1] >> 13) & 255) as usize,
            use_a0x: words[3] & 2 != 0,
            end_of_program: words[3] & 1 != 0,
            ..Decoded::default()
        };
        d.src[0] = SourceField {
            negate: words[1] & (1 << 8) != 0,
            param_type: (words[2] >> 26) & 3,
            temp_index: ((words[2] >> 28) & 15) as usize,
            swizzle: [
                ((words[1] >> 6) & 3) as usize,
                ((words[1] >> 4) & 3) as usize,
                ((words[1] >> 2) & 3) as usize,
                (words[1] & 3) as usize,
            ],
        };
        d.src[1] = SourceField {
            negate: words[2] & (1 << 25) != 0,
            param_type: (words[2] >> 11) & 3,
            temp_index: ((words[2] >> 13) & 15) as usize,
            swizzle: [
                ((words[2] >> 23) & 3) as usize,
                ((words[2] >> 21) & 3) as usize,
                ((words[2] >> 19) & 3) as usize,
                ((words[2] >> 17) & 3) as usize,
            ],
        };
        d.src[2] = SourceField {
            negate: words[2] & (1 << 10) != 0,
            param_type: (words[3] >> 28) & 3,
            temp_index: (((words[2] & 3) << 2) + (words[3] >> 30)) as usize,
            swizzle: [
                ((words[2] >> 8) & 3) as usize,
                ((words[2] >> 6) & 3) as usize,
                ((words[2] >> 4) & 3) as usize,
                ((words[2] >> 2) & 3) as usize,
            ],
        };
        d
    }

    /// Run the program at `start` for each vertex of the batch
    pub fn process(&mut self, start: usize, input: &[Vertex], output: &mut [Vertex]) {
        for (vin, vout) in input.iter().zip(output.iter_mut()) {
            self.reset_per_vertex(vout);
            self.ip = start & (MAX_INSTRUCTIONS - 1);
            loop {
                let done = self.step(vin, vout);
                self.ip = (self.ip + 1) & (MAX_INSTRUCTIONS - 1);
                if done {
                    break;
                }
            }
        }
    }

    fn reset_per_vertex(&mut self, output: &mut Vertex) {
        self.a0x = 0;
        self.temps = [[0.0; 4]; TEMP_COUNT];
        for n in 0..ATTR_COUNT {
            output.attribute[n].fv = [0.0, 0.0, 0.0, 1.0];
        }
    }

    /// Execute one instruction; returns true on the end-of-program bit
    fn step(&mut self, input: &Vertex, output: &mut Vertex) -> bool {
        if self.slots[self.ip].modified != 0 {
            let s = &mut self.slots[self.ip];
            s.decoded = Self::decode(&s.words);
        }
        let d = self.slots[self.ip].decoded;

        let a = self.operand(&d, &d.src[0], input);
        let b = self.operand(&d, &d.src[1], input);
        let c = self.operand(&d, &d.src[2], input);

        let vec_result = Self::vector_alu(d.vec_op, a, b, c);
        let sca_result = Self::scalar_alu(d.sca_op, c);

        if d.vec_op != VecOp::Nop {
            if d.vec_op == VecOp::Arl {
                self.a0x = vec_result[0] as i32;
            } else {
                if d.vec_temp_mask != 0 {
                    Self::masked_write(&mut self.temps[d.vec_temp_index], vec_result, d.vec_temp_mask);
                }
                if d.output_mask != 0 && !d.scalar_to_output {
                    self.write_output(&d, vec_result, output);
                }
            }
        }
        if d.sca_op != ScaOp::Nop {
            if d.sca_temp_mask != 0 {
                // with an active vector op the scalar temp destination is
                // forced to r1; alone it shares the vector index field
                let index = if d.vec_op != VecOp::Nop {
                    1
                } else {
                    d.vec_temp_index
                };
                Self::masked_write(&mut self.temps[index], sca_result, d.sca_temp_mask);
            }
            if d.output_mask != 0 && d.scalar_to_output {
                self.write_output(&d, sca_result, output);
            }
        }
        d.end_of_program
    }

    fn write_output(&mut self, d: &Decoded, value: [f32; 4], output: &mut Vertex) {
        if d.output_is_attribute {
            let index = d.output_index & (ATTR_COUNT - 1);
            Self::masked_write(&mut output.attribute[index].fv, value, d.output_mask);
            // position output is architecturally aliased to r12
            if index == 0 {
                self.temps[12] = output.attribute[0].fv;
            }
        } else {
            let index = d.output_index.min(CONSTANT_COUNT - 1);
            Self::masked_write(&mut self.constants[index], value, d.output_mask);
        }
    }

    #[inline(always)]
    fn masked_write(dest: &mut [f32; 4], value: [f32; 4], mask: u32) {
        let mut m = mask;
        for (p, v) in dest.iter_mut().zip(value.iter()) {
            if m & 8 != 0 {
                *p = *v;
            }
            m <<= 1;
        }
    }

    /// Assemble a swizzled, optionally negated source operand
    fn operand(&self, d: &Decoded, f: &SourceField, input: &Vertex) -> [f32; 4] {
        let sign = if f.negate { -1.0 } else { 1.0 };
        let bank: &[f32; 4] = match f.param_type {
            1 => &self.temps[f.temp_index],
            2 => &input.attribute[d.input_index].fv,
            3 => {
                let mut index = d.constant_index as i32;
                if d.use_a0x {
                    index += self.a0x;
                }
                &self.constants[index.clamp(0, CONSTANT_COUNT as i32 - 1) as usize]
            }
            _ => return [0.0; 4],
        };
        [
            sign * bank[f.swizzle[0]],
            sign * bank[f.swizzle[1]],
            sign * bank[f.swizzle[2]],
            sign * bank[f.swizzle[3]],
        ]
    }

    fn vector_alu(op: VecOp, a: [f32; 4], b: [f32; 4], c: [f32; 4]) -> [f32; 4] {
        match op {
            VecOp::Nop | VecOp::Reserved14 | VecOp::Reserved15 => [0.0; 4],
            VecOp::Mov | VecOp::Arl => a,
            VecOp::Mul => [a[0] * b[0], a[1] * b[1], a[2] * b[2], a[3] * b[3]],
            VecOp::Add => [a[0] + c[0], a[1] + c[1], a[2] + c[2], a[3] + c[3]],
            VecOp::Mad => [
                a[0] * b[0] + c[0],
                a[1] * b[1] + c[1],
                a[2] * b[2] + c[2],
                a[3] * b[3] + c[3],
            ],
            VecOp::Dp3 => {
                let d = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
                [d; 4]
            }
            VecOp::Dph => {
                let d = a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + b[3];
                [d; 4]
            }
            VecOp::Dp4 => {
                let d = a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3];
                [d; 4]
            }
            VecOp::Dst => [1.0, a[1] * b[1], a[2], b[3]],
            VecOp::Min => [
                a[0].min(b[0]),
                a[1].min(b[1]),
                a[2].min(b[2]),
                a[3].min(b[3]),
            ],
            VecOp::Max => [
                a[0].max(b[0]),
                a[1].max(b[1]),
                a[2].max(b[2]),
                a[3].max(b[3]),
            ],
            VecOp::Slt => [
                if a[0] < b[0] { 1.0 } else { 0.0 },
                if a[1] < b[1] { 1.0 } else { 0.0 },
                if a[2] < b[2] { 1.0 } else { 0.0 },
                if a[3] < b[3] { 1.0 } else { 0.0 },
            ],
            VecOp::Sge => [
                if a[0] >= b[0] { 1.0 } else { 0.0 },
                if a[1] >= b[1] { 1.0 } else { 0.0 },
                if a[2] >= b[2] { 1.0 } else { 0.0 },
                if a[3] >= b[3] { 1.0 } else { 0.0 },
            ],
        }
    }

    /// Scalar operations read operand C only
    fn scalar_alu(op: ScaOp, c: [f32; 4]) -> [f32; 4] {
        match op {
            ScaOp::Nop | ScaOp::Reserved(_) => [0.0; 4],
            ScaOp::Imv => c,
            // RCC differs from RCP only in output-range clamping on real
            // hardware; both compute the plain reciprocal here
            ScaOp::Rcp | ScaOp::Rcc => [1.0 / c[0]; 4],
            ScaOp::Rsq => [1.0 / c[0].abs().sqrt(); 4],
            ScaOp::Exp => {
                let x = c[0];
                let full = truncate_mantissa(x.exp2());
                [x.floor().exp2(), x - x.floor(), full, 1.0]
            }
            ScaOp::Log => {
                let x = c[0];
                let (mantissa, exponent) = frexp(x);
                let full = truncate_mantissa(x.abs().log2());
                [(exponent - 1) as f32, mantissa * 2.0, full, 1.0]
            }
            ScaOp::Lit => {
                let diffuse = c[0];
                let specular = if diffuse > 0.0 {
                    c[1].max(0.0).powf(c[3])
                } else {
                    0.0
                };
                [1.0, diffuse.clamp(0.0, 1.0), specular, 1.0]
            }
        }
    }
}

impl Default for VertexProgram {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate an f32 mantissa to its top 15 bits (the hardware's reduced
/// precision for the full-accuracy EXP/LOG component)
#[inline(always)]
fn truncate_mantissa(value: f32) -> f32 {
    f32::from_bits(value.to_bits() & 0xFFFF_FF00)
}

/// Split into (mantissa in [0.5, 1), exponent) so that m * 2^e == x
fn frexp(x: f32) -> (f32, i32) {
    if x == 0.0 || !x.is_finite() {
        return (x, 0);
    }
    let mut bits = x.to_bits();
    let mut exponent = ((bits >> 23) & 0xFF) as i32;
    if exponent == 0 {
        // subnormal: renormalize first
        let scaled = x * f32::from_bits(0x4C00_0000); // 2^25
        bits = scaled.to_bits();
        exponent = ((bits >> 23) & 0xFF) as i32 - 25;
    }
    let mantissa = f32::from_bits((bits & 0x807F_FFFF) | 0x3F00_0000);
    (mantissa, exponent - 126)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gpu::primitives::attr;

    /// Assemble the four instruction words for simple test programs
    ///
    /// Only the fields the tests exercise are encoded: a MOV from one full
    /// source operand (type/index in A) to either an output or a temp.
    fn encode_mov_to_output(src_type: u32, src_index: u32, out_index: u32, end: bool) -> [u32; 4] {
        let mut w = [0u32; 4];
        // vector op MOV, input index (for Vn sources), identity swizzle xyzw
        w[1] = (1 << 21) | (src_index << 9) | (0 << 6) | (1 << 4) | (2 << 2) | 3;
        // A operand type and temp index
        w[2] = (src_type << 26) | (src_index << 28);
        // write all four lanes of the output attribute
        w[3] = (0xF << 12) | 0x800 | (out_index << 3) | u32::from(end);
        w
    }

    fn upload(vp: &mut VertexProgram, slot: usize, words: [u32; 4]) {
        for (i, w) in words.iter().enumerate() {
            vp.upload_word(slot, i, *w);
        }
    }

    #[test]
    fn test_mov_identity() {
        // MOV o[0], v[0] must reproduce attribute 0 exactly
        let mut vp = VertexProgram::new();
        upload(&mut vp, 0, encode_mov_to_output(2, 0, 0, true));

        let mut vin = Vertex::default();
        vin.attribute[attr::POS].fv = [1.5, -2.25, 1e-20, 42.0];
        let mut vout = Vertex::default();
        vp.process(0, &[vin], std::slice::from_mut(&mut vout));
        assert_eq!(vout.attribute[attr::POS].fv, [1.5, -2.25, 1e-20, 42.0]);
        // position mirrors to r12
        assert_eq!(vp.temps[12], [1.5, -2.25, 1e-20, 42.0]);
    }

    #[test]
    fn test_outputs_default_to_0001() {
        let mut vp = VertexProgram::new();
        upload(&mut vp, 0, encode_mov_to_output(2, 0, 0, true));
        let mut vout = Vertex::default();
        vp.process(0, &[Vertex::default()], std::slice::from_mut(&mut vout));
        // untouched outputs carry the (0,0,0,1) reset value
        assert_eq!(vout.attribute[attr::COLOR0].fv, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_exp_components() {
        let r = VertexProgram::scalar_alu(ScaOp::Exp, [2.5, 0.0, 0.0, 0.0]);
        assert_eq!(r[0], 4.0); // 2^floor(2.5)
        assert_eq!(r[1], 0.5); // fractional part
        let full = 2.0f32.powf(2.5);
        assert_eq!(r[2], f32::from_bits(full.to_bits() & 0xFFFF_FF00));
        assert_eq!(r[3], 1.0);
    }

    #[test]
    fn test_log_components() {
        let r = VertexProgram::scalar_alu(ScaOp::Log, [8.0, 0.0, 0.0, 0.0]);
        assert_eq!(r[0], 3.0); // exponent
        assert_eq!(r[1], 1.0); // mantissa * 2, 8.0 = 0.5 * 2^4
        assert_eq!(r[2], 3.0); // log2(8)
        assert_eq!(r[3], 1.0);
    }

    #[test]
    fn test_lit_formula() {
        // diffuse clamped, specular = max(y,0)^w when diffuse positive
        let r = VertexProgram::scalar_alu(ScaOp::Lit, [0.5, 0.25, 0.0, 2.0]);
        assert_eq!(r, [1.0, 0.5, 0.0625, 1.0]);
        // diffuse <= 0 kills the specular term
        let r = VertexProgram::scalar_alu(ScaOp::Lit, [-0.5, 4.0, 0.0, 2.0]);
        assert_eq!(r, [1.0, 0.0, 0.0, 1.0]);
        // diffuse above one clamps
        let r = VertexProgram::scalar_alu(ScaOp::Lit, [3.0, 1.0, 0.0, 0.0]);
        assert_eq!(r[1], 1.0);
    }

    #[test]
    fn test_rsq_uses_absolute_value() {
        let r = VertexProgram::scalar_alu(ScaOp::Rsq, [-4.0, 0.0, 0.0, 0.0]);
        assert_eq!(r[0], 0.5);
    }

    #[test]
    fn test_dst_shape() {
        let r = VertexProgram::vector_alu(
            VecOp::Dst,
            [9.0, 2.0, 5.0, 9.0],
            [9.0, 3.0, 9.0, 7.0],
            [0.0; 4],
        );
        assert_eq!(r, [1.0, 6.0, 5.0, 7.0]);
    }

    #[test]
    fn test_frexp() {
        assert_eq!(frexp(8.0), (0.5, 4));
        assert_eq!(frexp(0.75), (0.75, 0));
        assert_eq!(frexp(-3.0), (-0.75, 2));
        assert_eq!(frexp(0.0), (0.0, 0));
    }

    #[test]
    fn test_constant_relative_addressing_clamps() {
        let mut vp = VertexProgram::new();
        vp.set_constant_word(0, 0, 2.0f32.to_bits());
        // operand referencing constant index 0 with a0x = -5 must clamp
        // to the bottom of the bank instead of wrapping
        vp.a0x = -5;
        let d = Decoded {
            constant_index: 0,
            use_a0x: true,
            ..Decoded::default()
        };
        let f = SourceField {
            param_type: 3,
            swizzle: [0, 1, 2, 3],
            ..SourceField::default()
        };
        let v = vp.operand(&d, &f, &Vertex::default());
        assert_eq!(v[0], 2.0);
    }

    #[test]
    fn test_partial_upload_decodes_lazily() {
        let mut vp = VertexProgram::new();
        upload(&mut vp, 0, encode_mov_to_output(2, 0, 0, true));
        // rewrite only word 3 to retarget the output; the slot re-decodes
        // on execution even though the upload never completed
        let w = encode_mov_to_output(2, 0, attr::COLOR0 as u32, true);
        vp.upload_word(0, 3, w[3]);

        let mut vin = Vertex::default();
        vin.attribute[attr::POS].fv = [0.25, 0.5, 0.75, 1.0];
        let mut vout = Vertex::default();
        vp.process(0, &[vin], std::slice::from_mut(&mut vout));
        assert_eq!(vout.attribute[attr::COLOR0].fv, [0.25, 0.5, 0.75, 1.0]);
    }
}
