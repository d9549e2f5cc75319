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

//! Homogeneous w-plane clipping
//!
//! Triangles with any vertex at or behind the w = 0 plane cannot be
//! perspective divided, so they are clipped against a small positive
//! threshold first. The stored vertices already have the divide (and, on
//! the vertex-program path, the viewport translate) applied, so the
//! clipper runs a round trip: undo the transform, interpolate new
//! boundary vertices in homogeneous space, redo the transform, and
//! re-triangulate the resulting convex polygon as a fan.
//!
//! Triangles entirely on the visible side take a fast path straight to
//! the rasterizer; triangles entirely behind the plane are discarded.

use crate::core::gpu::primitives::{param, TransformedVertex};
use crate::core::gpu::GpuContext;
use crate::core::memory::SystemMemory;

/// Vertices below this w are treated as behind the near plane
pub const W_THRESHOLD: f64 = 0.000001;

/// Clip a triangle against the w threshold plane
///
/// Inputs are in pre-divide homogeneous form. Returns the vertices of the
/// clipped convex polygon (at most 4 for a triangle against one plane).
pub fn clip_triangle_w(vi: &[TransformedVertex; 3]) -> Vec<TransformedVertex> {
    let mut out = Vec::with_capacity(5);
    let mut idx_prev = 2usize;
    let mut neg_prev = vi[idx_prev].w < W_THRESHOLD;
    for idx_curr in 0..3 {
        let neg_curr = vi[idx_curr].w < W_THRESHOLD;
        if neg_curr != neg_prev {
            let a = &vi[idx_prev];
            let b = &vi[idx_curr];
            let t = (W_THRESHOLD - a.w) / (b.w - a.w);
            let mut v = TransformedVertex {
                x: (b.x - a.x) * t + a.x,
                y: (b.y - a.y) * t + a.y,
                w: (b.w - a.w) * t + a.w,
                p: [0.0; param::COUNT],
            };
            for n in 0..param::COUNT {
                v.p[n] = ((b.p[n] - a.p[n]) as f64 * t + a.p[n] as f64) as f32;
            }
            out.push(v);
        }
        if !neg_curr {
            out.push(vi[idx_curr]);
        }
        neg_prev = neg_curr;
        idx_prev = idx_curr;
    }
    out
}

impl GpuContext {
    /// Clip against the near plane, then cull and rasterize
    ///
    /// The fast path skips the round trip entirely when every w is
    /// positive, which must not change the rendered output.
    pub(crate) fn render_triangle_clipping(
        &mut self,
        mem: &mut SystemMemory,
        v1: TransformedVertex,
        v2: TransformedVertex,
        v3: TransformedVertex,
    ) {
        if v1.w > 0.0 && v2.w > 0.0 && v3.w > 0.0 {
            self.render_triangle_culling(mem, v1, v2, v3);
            return;
        }
        if !self.enable_clipping_w {
            return;
        }
        if v1.w <= 0.0 && v2.w <= 0.0 && v3.w <= 0.0 {
            return;
        }

        let mut vi = [v1, v2, v3];
        let ssx = self.rt.supersample_x as f64;
        let ssy = self.rt.supersample_y as f64;

        // back to the state before the perspective divide
        if self.vertex_pipeline == 4 {
            for v in vi.iter_mut() {
                v.x = (v.x / ssx) * v.w;
                v.y = (v.y / ssy) * v.w;
                v.p[param::Z] = ((v.p[param::Z] as f64) * v.w) as f32;
            }
        } else {
            // the vertex program also applied the viewport translate
            for v in vi.iter_mut() {
                v.x = (v.x - self.matrices.translate[0] as f64) * v.w;
                v.y = (v.y - self.matrices.translate[1] as f64) * v.w;
                v.p[param::Z] =
                    (((v.p[param::Z] - self.matrices.translate[2]) as f64) * v.w) as f32;
            }
        }

        let mut vo = clip_triangle_w(&vi);

        // back to screen coordinates
        if self.vertex_pipeline == 4 {
            for v in vo.iter_mut() {
                v.x = v.x * ssx / v.w;
                v.y = v.y * ssy / v.w;
                v.p[param::Z] = ((v.p[param::Z] as f64) / v.w) as f32;
            }
        } else {
            for v in vo.iter_mut() {
                v.x = v.x / v.w + self.matrices.translate[0] as f64;
                v.y = v.y / v.w + self.matrices.translate[1] as f64;
                v.p[param::Z] =
                    (((v.p[param::Z] as f64) / v.w) + self.matrices.translate[2] as f64) as f32;
            }
        }

        for n in 1..vo.len().saturating_sub(1) {
            self.render_triangle_culling(mem, vo[0], vo[n], vo[n + 1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hvtx(x: f64, y: f64, w: f64, z: f32) -> TransformedVertex {
        let mut v = TransformedVertex {
            x,
            y,
            w,
            p: [0.0; param::COUNT],
        };
        v.p[param::Z] = z;
        v
    }

    #[test]
    fn test_all_visible_passes_through() {
        let vi = [
            hvtx(0.0, 0.0, 1.0, 0.0),
            hvtx(1.0, 0.0, 2.0, 0.5),
            hvtx(0.0, 1.0, 3.0, 1.0),
        ];
        let out = clip_triangle_w(&vi);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].w, 1.0);
        assert_eq!(out[1].w, 2.0);
        assert_eq!(out[2].w, 3.0);
    }

    #[test]
    fn test_one_vertex_behind_makes_quad() {
        let vi = [
            hvtx(0.0, 0.0, 1.0, 0.0),
            hvtx(1.0, 0.0, 1.0, 0.0),
            hvtx(0.0, 1.0, -1.0, 0.0),
        ];
        let out = clip_triangle_w(&vi);
        // two crossings plus two surviving vertices
        assert_eq!(out.len(), 4);
        for v in &out {
            assert!(v.w >= W_THRESHOLD - 1e-12);
        }
    }

    #[test]
    fn test_two_vertices_behind_stays_triangle() {
        let vi = [
            hvtx(0.0, 0.0, 1.0, 0.0),
            hvtx(1.0, 0.0, -1.0, 0.0),
            hvtx(0.0, 1.0, -1.0, 0.0),
        ];
        let out = clip_triangle_w(&vi);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_crossing_interpolates_parameters() {
        let a = hvtx(0.0, 0.0, 1.0, 0.0);
        let mut b = hvtx(2.0, 0.0, -1.0, 0.0);
        b.p[param::COLOR_R] = 1.0;
        let vi = [a, b, hvtx(0.0, 2.0, 1.0, 0.0)];
        let out = clip_triangle_w(&vi);
        assert_eq!(out.len(), 4);
        // the boundary vertex between a and b sits at t ~ 0.5 and carries
        // interpolated parameters
        let boundary = out
            .iter()
            .find(|v| v.w < 1e-3 && v.p[param::COLOR_R] > 0.0)
            .expect("interpolated boundary vertex");
        assert!((boundary.p[param::COLOR_R] - 0.5).abs() < 1e-3);
        assert!((boundary.x - 1.0).abs() < 1e-3);
    }
}
