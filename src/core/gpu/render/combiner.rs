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

//! Register combiner engine
//!
//! The fixed-function per-pixel shading unit. Up to eight general stages
//! run in order over a shared register file of float RGBA values, followed
//! by one final stage that produces the pixel color. Each general stage
//! maps four inputs (A-D) for its RGB half and four for its alpha half,
//! computes the candidate results A·B (or A·B as a dot product), C·D
//! (likewise), and a third value that is either A·B+C·D or a mux between
//! the two selected by spare0's alpha, then writes each candidate through
//! a bias/scale/clamp to at most one destination register.
//!
//! The register file is process-wide scratch: it is reinitialized for
//! every pixel from the interpolated vertex color and the sampled texel
//! colors, never carried between pixels.
//!
//! Registers hold channels in (b, g, r, a) order to match the vertex
//! interpolants. Input mapping reads either the RGB triple or the alpha
//! replicated three times, through one of eight range-mapping functions
//! (identity, invert, expand, expand-negate, half-bias both signs, signed
//! identity, signed negate).

/// Input selector codes addressing the shared register file
mod reg {
    pub const ZERO: u32 = 0;
    pub const COLOR0: u32 = 1;
    pub const COLOR1: u32 = 2;
    pub const FOG: u32 = 3;
    pub const PRIMARY: u32 = 4;
    pub const SECONDARY: u32 = 5;
    pub const TEXTURE0: u32 = 8;
    pub const TEXTURE3: u32 = 11;
    pub const SPARE0: u32 = 12;
    pub const SPARE1: u32 = 13;
    pub const SUM_CLAMP: u32 = 14;
    pub const EF: u32 = 15;
}

/// One mapped input: source register, component half, mapping function
#[derive(Debug, Clone, Copy, Default)]
pub struct MapIn {
    /// Source register selector (see `reg`)
    pub input: u32,
    /// 0 = RGB triple, 1 = alpha replicated
    pub component: u32,
    /// Range-mapping function 0-7
    pub mapping: u32,
}

/// Output routing for one half (RGB or alpha) of a general stage
#[derive(Debug, Clone, Copy, Default)]
pub struct MapOut {
    /// Destination register for the C·D candidate
    pub cd_output: u32,
    /// Destination register for the A·B candidate
    pub ab_output: u32,
    /// Destination register for the mux/sum candidate
    pub sum_output: u32,
    pub cd_dot: bool,
    pub ab_dot: bool,
    /// true = mux on spare0 alpha, false = A·B + C·D
    pub muxsum: bool,
    /// Bias the candidates by -0.5 before scaling
    pub bias: bool,
    /// Scale code: 0 = x1, 1 = x2, 2 = x4, 3 = x0.5
    pub scale: u32,
}

/// Configuration of one general combiner stage
#[derive(Debug, Clone, Copy, Default)]
pub struct CombinerStage {
    pub constant_color0: [f32; 4],
    pub constant_color1: [f32; 4],
    /// RGB-half inputs A, B, C, D
    pub rgb_in: [MapIn; 4],
    /// Alpha-half inputs A, B, C, D
    pub alpha_in: [MapIn; 4],
    pub rgb_out: MapOut,
    pub alpha_out: MapOut,
}

/// Configuration of the final combiner stage
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalCombiner {
    pub constant_color0: [f32; 4],
    pub constant_color1: [f32; 4],
    /// RGB inputs A, B, C, D
    pub rgb_in: [MapIn; 4],
    /// Extra inputs E and F (multiplied into the EF register)
    pub e_in: MapIn,
    pub f_in: MapIn,
    /// Alpha input G
    pub g_in: MapIn,
    /// Clamp the spare0+secondary sum register to 1.0
    pub color_sum_clamp: bool,
}

/// The combiner engine: stage configuration plus per-pixel scratch
pub struct Combiner {
    /// Number of active general stages (0-8)
    pub stages: usize,
    /// Runtime toggle mirroring the hardware debug switch
    pub used: bool,
    pub stage: [CombinerStage; 8],
    pub final_stage: FinalCombiner,

    // shared register file, (b, g, r, a) per entry
    reg_primary: [f32; 4],
    reg_secondary: [f32; 4],
    reg_texture: [[f32; 4]; 4],
    reg_color0: [f32; 4],
    reg_color1: [f32; 4],
    reg_fog: [f32; 4],
    reg_spare0: [f32; 4],
    reg_spare1: [f32; 4],
    reg_zero: [f32; 4],

    // per-stage working variables
    var_a: [f32; 4],
    var_b: [f32; 4],
    var_c: [f32; 4],
    var_d: [f32; 4],
    var_e: [f32; 4],
    var_f: [f32; 4],
    var_g: f32,
    var_ef: [f32; 4],
    var_sum_clamp: [f32; 4],

    fn_rgb_ab: [f32; 4],
    fn_rgb_cd: [f32; 4],
    fn_rgb_sum: [f32; 4],
    fn_a_ab: f32,
    fn_a_cd: f32,
    fn_a_sum: f32,

    /// Final RGBA output of the pixel, (b, g, r, a)
    pub output: [f32; 4],
}

impl Combiner {
    pub fn new() -> Self {
        Self {
            stages: 0,
            used: true,
            stage: [CombinerStage::default(); 8],
            final_stage: FinalCombiner::default(),
            reg_primary: [0.0; 4],
            reg_secondary: [0.0; 4],
            reg_texture: [[0.0; 4]; 4],
            reg_color0: [0.0; 4],
            reg_color1: [0.0; 4],
            reg_fog: [0.0; 4],
            reg_spare0: [0.0; 4],
            reg_spare1: [0.0; 4],
            reg_zero: [0.0; 4],
            var_a: [0.0; 4],
            var_b: [0.0; 4],
            var_c: [0.0; 4],
            var_d: [0.0; 4],
            var_e: [0.0; 4],
            var_f: [0.0; 4],
            var_g: 0.0,
            var_ef: [0.0; 4],
            var_sum_clamp: [0.0; 4],
            fn_rgb_ab: [0.0; 4],
            fn_rgb_cd: [0.0; 4],
            fn_rgb_sum: [0.0; 4],
            fn_a_ab: 0.0,
            fn_a_cd: 0.0,
            fn_a_sum: 0.0,
            output: [0.0; 4],
        }
    }

    /// Run the whole combiner pipeline for one pixel
    ///
    /// `colors` are the six initial registers as A8R8G8B8: interpolated
    /// primary, secondary (lighting placeholder), then textures 0-3.
    /// Returns the final pixel as A8R8G8B8.
    pub fn run_pixel(&mut self, colors: [u32; 6]) -> u32 {
        self.initialize_registers(colors);
        for n in 0..self.stages {
            self.initialize_stage(n);
            self.map_input(n);
            self.compute_rgb_outputs(n);
            self.compute_alpha_outputs(n);
            self.map_output(n);
        }
        self.initialize_final();
        self.map_final_input();
        self.final_output();
        float_argb8(self.output)
    }

    /// Load the six per-pixel source registers
    pub fn initialize_registers(&mut self, argb8: [u32; 6]) {
        self.reg_primary = argb8_float(argb8[0]);
        self.reg_secondary = argb8_float(argb8[1]);
        for (t, c) in self.reg_texture.iter_mut().zip(argb8[2..].iter()) {
            *t = argb8_float(*c);
        }
        // spare0 alpha starts as texture0 alpha (feeds the mux test)
        self.reg_spare0[3] = self.reg_texture[0][3];
        self.reg_zero = [0.0; 4];
    }

    /// Latch a general stage's constant colors into color0/color1
    pub fn initialize_stage(&mut self, n: usize) {
        self.reg_color0 = self.stage[n].constant_color0;
        self.reg_color1 = self.stage[n].constant_color1;
    }

    /// Latch the final stage's constant colors into color0/color1
    pub fn initialize_final(&mut self) {
        self.reg_color0 = self.final_stage.constant_color0;
        self.reg_color1 = self.final_stage.constant_color1;
    }

    fn register(&self, code: u32) -> [f32; 4] {
        match code {
            reg::COLOR0 => self.reg_color0,
            reg::COLOR1 => self.reg_color1,
            reg::FOG => self.reg_fog,
            reg::PRIMARY => self.reg_primary,
            reg::SECONDARY => self.reg_secondary,
            reg::TEXTURE0..=reg::TEXTURE3 => self.reg_texture[(code - reg::TEXTURE0) as usize],
            reg::SPARE0 => self.reg_spare0,
            reg::SPARE1 => self.reg_spare1,
            reg::SUM_CLAMP => self.var_sum_clamp,
            reg::EF => self.var_ef,
            _ => self.reg_zero,
        }
    }

    /// Resolve an output selector to a writable register
    ///
    /// Zero, the constant colors, fog and the derived registers are not
    /// legal destinations; writes to them are discarded.
    fn register_mut(&mut self, code: u32) -> Option<&mut [f32; 4]> {
        match code {
            reg::PRIMARY => Some(&mut self.reg_primary),
            reg::SECONDARY => Some(&mut self.reg_secondary),
            reg::TEXTURE0..=reg::TEXTURE3 => {
                Some(&mut self.reg_texture[(code - reg::TEXTURE0) as usize])
            }
            reg::SPARE0 => Some(&mut self.reg_spare0),
            reg::SPARE1 => Some(&mut self.reg_spare1),
            _ => None,
        }
    }

    /// Read one scalar for an alpha-half input (blue or alpha component)
    fn select_scalar(&self, m: MapIn) -> f32 {
        self.register(m.input)[2 + m.component as usize]
    }

    /// Read the RGB triple (or replicated alpha) for an RGB-half input
    fn select_triple(&self, m: MapIn) -> [f32; 3] {
        let r = self.register(m.input);
        if m.component == 0 {
            [r[0], r[1], r[2]]
        } else {
            [r[3], r[3], r[3]]
        }
    }

    /// Map the stage's eight inputs into the A-D working variables
    pub fn map_input(&mut self, n: usize) {
        let stage = self.stage[n];
        for i in 0..4 {
            let alpha = map_function(
                stage.alpha_in[i].mapping,
                self.select_scalar(stage.alpha_in[i]),
            );
            let mut rgb = self.select_triple(stage.rgb_in[i]);
            map_function3(stage.rgb_in[i].mapping, &mut rgb);
            let dest = match i {
                0 => &mut self.var_a,
                1 => &mut self.var_b,
                2 => &mut self.var_c,
                _ => &mut self.var_d,
            };
            dest[0] = rgb[0];
            dest[1] = rgb[1];
            dest[2] = rgb[2];
            dest[3] = alpha;
        }
    }

    fn ab(&self) -> [f32; 3] {
        [
            self.var_a[0] * self.var_b[0],
            self.var_a[1] * self.var_b[1],
            self.var_a[2] * self.var_b[2],
        ]
    }

    fn cd(&self) -> [f32; 3] {
        [
            self.var_c[0] * self.var_d[0],
            self.var_c[1] * self.var_d[1],
            self.var_c[2] * self.var_d[2],
        ]
    }

    fn a_dot_b(&self) -> f32 {
        self.var_a[0] * self.var_b[0] + self.var_a[1] * self.var_b[1] + self.var_a[2] * self.var_b[2]
    }

    fn c_dot_d(&self) -> f32 {
        self.var_c[0] * self.var_d[0] + self.var_c[1] * self.var_d[1] + self.var_c[2] * self.var_d[2]
    }

    /// Compute the RGB half's three candidate outputs
    pub fn compute_rgb_outputs(&mut self, n: usize) {
        let out = self.stage[n].rgb_out;
        let bias = if out.bias { -0.5 } else { 0.0 };
        let scale = scale_factor(out.scale);
        let clamp = |v: f32| ((v + bias) * scale).clamp(-1.0, 1.0);

        let mut any_dot = false;
        self.fn_rgb_ab = if out.ab_dot {
            any_dot = true;
            let d = self.a_dot_b();
            [clamp(d), clamp(d), clamp(d), 0.0]
        } else {
            let p = self.ab();
            [clamp(p[0]), clamp(p[1]), clamp(p[2]), 0.0]
        };
        self.fn_rgb_cd = if out.cd_dot {
            any_dot = true;
            let d = self.c_dot_d();
            [clamp(d), clamp(d), clamp(d), 0.0]
        } else {
            let p = self.cd();
            [clamp(p[0]), clamp(p[1]), clamp(p[2]), 0.0]
        };
        // the third candidate only exists when neither half is a dot product
        if !any_dot {
            let s = if out.muxsum {
                if self.reg_spare0[3] >= 0.5 {
                    self.ab()
                } else {
                    self.cd()
                }
            } else {
                let ab = self.ab();
                let cd = self.cd();
                [ab[0] + cd[0], ab[1] + cd[1], ab[2] + cd[2]]
            };
            self.fn_rgb_sum = [clamp(s[0]), clamp(s[1]), clamp(s[2]), 0.0];
        }
    }

    /// Compute the alpha half's three candidate outputs
    pub fn compute_alpha_outputs(&mut self, n: usize) {
        let out = self.stage[n].alpha_out;
        let bias = if out.bias { -0.5 } else { 0.0 };
        let scale = scale_factor(out.scale);
        let clamp = |v: f32| ((v + bias) * scale).clamp(-1.0, 1.0);

        self.fn_a_ab = clamp(self.var_a[3] * self.var_b[3]);
        self.fn_a_cd = clamp(self.var_c[3] * self.var_d[3]);
        let s = if out.muxsum {
            if self.reg_spare0[3] >= 0.5 {
                self.var_a[3] * self.var_b[3]
            } else {
                self.var_c[3] * self.var_d[3]
            }
        } else {
            self.var_a[3] * self.var_b[3] + self.var_c[3] * self.var_d[3]
        };
        self.fn_a_sum = clamp(s);
    }

    /// Route the stage's candidates into their destination registers
    pub fn map_output(&mut self, n: usize) {
        let out = self.stage[n].rgb_out;
        let (ab, cd, sum) = (self.fn_rgb_ab, self.fn_rgb_cd, self.fn_rgb_sum);
        if let Some(f) = self.register_mut(out.ab_output) {
            f[0] = ab[0];
            f[1] = ab[1];
            f[2] = ab[2];
        }
        if let Some(f) = self.register_mut(out.cd_output) {
            f[0] = cd[0];
            f[1] = cd[1];
            f[2] = cd[2];
        }
        if !(out.ab_dot || out.cd_dot) {
            if let Some(f) = self.register_mut(out.sum_output) {
                f[0] = sum[0];
                f[1] = sum[1];
                f[2] = sum[2];
            }
        }
        let out = self.stage[n].alpha_out;
        let (a_ab, a_cd, a_sum) = (self.fn_a_ab, self.fn_a_cd, self.fn_a_sum);
        if let Some(f) = self.register_mut(out.ab_output) {
            f[3] = a_ab;
        }
        if let Some(f) = self.register_mut(out.cd_output) {
            f[3] = a_cd;
        }
        if let Some(f) = self.register_mut(out.sum_output) {
            f[3] = a_sum;
        }
    }

    /// Map the final stage's seven inputs
    pub fn map_final_input(&mut self) {
        let fs = self.final_stage;

        // E and F feed the derived EF product register
        let mut e = self.select_triple(fs.e_in);
        map_function3(fs.e_in.mapping, &mut e);
        self.var_e = [e[0], e[1], e[2], 0.0];
        let mut f = self.select_triple(fs.f_in);
        map_function3(fs.f_in.mapping, &mut f);
        self.var_f = [f[0], f[1], f[2], 0.0];
        self.var_ef = [
            self.var_e[0] * self.var_f[0],
            self.var_e[1] * self.var_f[1],
            self.var_e[2] * self.var_f[2],
            0.0,
        ];

        // the sum register is clamp(max(spare0,0) + max(secondary,0))
        for i in 0..3 {
            self.var_sum_clamp[i] =
                self.reg_spare0[i].max(0.0) + self.reg_secondary[i].max(0.0);
            if fs.color_sum_clamp {
                self.var_sum_clamp[i] = self.var_sum_clamp[i].min(1.0);
            }
        }

        for i in 0..4 {
            let mut rgb = self.select_triple(fs.rgb_in[i]);
            map_function3(fs.rgb_in[i].mapping, &mut rgb);
            let dest = match i {
                0 => &mut self.var_a,
                1 => &mut self.var_b,
                2 => &mut self.var_c,
                _ => &mut self.var_d,
            };
            dest[0] = rgb[0];
            dest[1] = rgb[1];
            dest[2] = rgb[2];
        }
        self.var_g = self.select_scalar(fs.g_in);
    }

    /// Final blend: rgb = A·B + (1-A)·C + D, alpha = mapped G
    pub fn final_output(&mut self) {
        for i in 0..3 {
            self.output[i] = (self.var_a[i] * self.var_b[i]
                + (1.0 - self.var_a[i]) * self.var_c[i]
                + self.var_d[i])
                .min(1.0);
        }
        self.output[3] = map_function(self.final_stage.g_in.mapping, self.var_g);
    }
}

impl Default for Combiner {
    fn default() -> Self {
        Self::new()
    }
}

/// Unpack A8R8G8B8 into float (b, g, r, a) in 0..1
#[inline(always)]
pub fn argb8_float(color: u32) -> [f32; 4] {
    [
        (color & 0xFF) as f32 / 255.0,
        ((color >> 8) & 0xFF) as f32 / 255.0,
        ((color >> 16) & 0xFF) as f32 / 255.0,
        ((color >> 24) & 0xFF) as f32 / 255.0,
    ]
}

/// Pack float (b, g, r, a) back into A8R8G8B8
#[inline(always)]
pub fn float_argb8(reg: [f32; 4]) -> u32 {
    let a = (reg[3] * 255.0) as u32;
    let r = (reg[2] * 255.0) as u32;
    let g = (reg[1] * 255.0) as u32;
    let b = (reg[0] * 255.0) as u32;
    (a << 24) | (r << 16) | (g << 8) | b
}

/// Input range-mapping function for a single scalar
fn map_function(code: u32, value: f32) -> f32 {
    match code {
        0 => value.max(0.0),
        1 => 1.0 - value.max(0.0).min(1.0),
        2 => 2.0 * value.max(0.0) - 1.0,
        3 => -2.0 * value.max(0.0) + 1.0,
        4 => value.max(0.0) - 0.5,
        5 => -value.max(0.0) + 0.5,
        6 => value,
        _ => -value,
    }
}

/// Input range-mapping function applied to an RGB triple in place
fn map_function3(code: u32, data: &mut [f32; 3]) {
    for v in data.iter_mut() {
        *v = map_function(code, *v);
    }
}

#[inline(always)]
fn scale_factor(code: u32) -> f32 {
    match code {
        1 => 2.0,
        2 => 4.0,
        3 => 0.5,
        _ => 1.0,
    }
}
