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

//! Primitive assembly
//!
//! Transforms incoming vertices (vertex program or fixed-function path)
//! and accumulates them into triangles according to the active topology.
//! Transformed vertices recycle through a 1024-entry ring; triangle fans
//! park their anchor vertex in a reserved slot outside the wrap range so
//! arbitrarily long fans never overwrite it.
//!
//! Strip winding alternates with vertex parity, and quads split along the
//! 0-2 diagonal; quad strips pair two new vertices with the previous two
//! using the hardware's (0,1,3)(3,2,0) corner order.

use crate::core::gpu::primitives::{attr, param, TransformedVertex, Vertex, FAN_ANCHOR_SLOT};
use crate::core::gpu::registers::PrimitiveType;
use crate::core::gpu::GpuContext;
use crate::core::memory::SystemMemory;

impl GpuContext {
    /// Transform one vertex into screen space
    ///
    /// The fixed-function path multiplies the position by the composite
    /// matrix and divides; the vertex-program path has the divide and the
    /// viewport transform already applied by the program, modulo a fixed
    /// half-pixel bias.
    pub(crate) fn convert_vertex(&mut self, source: &Vertex) -> TransformedVertex {
        let mut dest = TransformedVertex::default();
        let ssx = self.rt.supersample_x as f64;
        let ssy = self.rt.supersample_y as f64;
        if self.vertex_pipeline == 4 {
            // transformation matrices
            let mut v = [0.0f64; 4];
            for (i, out) in v.iter_mut().enumerate() {
                for j in 0..4 {
                    *out += self.matrices.composite[i][j] as f64
                        * source.attribute[attr::POS].fv[j] as f64;
                }
            }
            dest.w = v[3];
            dest.x = (v[0] / v[3]) * ssx;
            dest.y = (v[1] / v[3]) * ssy;
            dest.p[param::Z] = (v[2] / v[3]) as f32;
            for u in param::COLOR_B..=param::COLOR_A {
                dest.p[u] = source.attribute[attr::COLOR0].fv[u];
            }
            for u in 0..4 {
                dest.p[param::TEX0_U + u * 2] = source.attribute[attr::TEX0 + u].fv[0];
                dest.p[param::TEX0_V + u * 2] = source.attribute[attr::TEX0 + u].fv[1];
            }
        } else {
            // vertex program; output position is post-divide screen space
            let mut out = Vertex::default();
            self.vp.exec.process(
                self.vp.start_instruction,
                std::slice::from_ref(source),
                std::slice::from_mut(&mut out),
            );
            dest.w = out.attribute[attr::POS].fv[3] as f64;
            dest.x = (out.attribute[attr::POS].fv[0] as f64 - 0.53125) * ssx;
            dest.y = (out.attribute[attr::POS].fv[1] as f64 - 0.53125) * ssy;
            for u in param::COLOR_B..=param::COLOR_A {
                dest.p[u] = out.attribute[attr::COLOR0].fv[u];
            }
            for u in 0..4 {
                dest.p[param::TEX0_U + u * 2] = out.attribute[attr::TEX0 + u].fv[0];
                dest.p[param::TEX0_V + u * 2] = out.attribute[attr::TEX0 + u].fv[1];
            }
            dest.p[param::Z] = out.attribute[attr::POS].fv[2];
        }
        dest
    }

    /// Feed one vertex into the active primitive
    ///
    /// Completed triangles flow to the clipper and rasterizer before this
    /// returns. Unsupported topologies accumulate without emitting.
    pub(crate) fn assemble_primitive(&mut self, mem: &mut SystemMemory, source: &Vertex) {
        match self.primitive_type {
            PrimitiveType::Quads => {
                let slot = self.vertex_count + self.vertex_accumulated;
                self.vertex_ring[slot] = self.convert_vertex(source);
                self.vertex_accumulated += 1;
                if self.vertex_accumulated == 4 {
                    self.primitives_count += 1;
                    self.primitives_total += 1;
                    self.vertex_accumulated = 0;
                    let vc = self.vertex_count;
                    let (a, b, c, d) = (
                        self.vertex_ring[vc],
                        self.vertex_ring[vc + 1],
                        self.vertex_ring[vc + 2],
                        self.vertex_ring[vc + 3],
                    );
                    self.render_triangle_clipping(mem, a, b, c);
                    self.render_triangle_clipping(mem, a, c, d);
                    self.vertex_count = (self.vertex_count + 4) & 1023;
                }
            }
            PrimitiveType::Triangles => {
                let slot = self.vertex_count + self.vertex_accumulated;
                self.vertex_ring[slot] = self.convert_vertex(source);
                self.vertex_accumulated += 1;
                if self.vertex_accumulated == 3 {
                    self.primitives_count += 1;
                    self.primitives_total += 1;
                    self.vertex_accumulated = 0;
                    let vc = self.vertex_count;
                    let (a, b, c) = (
                        self.vertex_ring[vc],
                        self.vertex_ring[(vc + 1) & 1023],
                        self.vertex_ring[(vc + 2) & 1023],
                    );
                    self.render_triangle_clipping(mem, a, b, c);
                    self.vertex_count = (self.vertex_count + 3) & 1023;
                }
            }
            PrimitiveType::TriangleFan => {
                if self.vertex_accumulated == 0 {
                    self.vertex_ring[FAN_ANCHOR_SLOT] = self.convert_vertex(source);
                    self.vertex_accumulated = 1;
                } else if self.vertex_accumulated == 1 {
                    self.vertex_ring[0] = self.convert_vertex(source);
                    self.vertex_accumulated = 2;
                    self.vertex_count = 1;
                } else {
                    // vertices 0 1 2 3 4 ... draw (0,1,2) (0,2,3) (0,3,4) ...
                    self.primitives_count += 1;
                    self.primitives_total += 1;
                    let vc = self.vertex_count;
                    self.vertex_ring[vc] = self.convert_vertex(source);
                    let (a, b, c) = (
                        self.vertex_ring[FAN_ANCHOR_SLOT],
                        self.vertex_ring[(vc.wrapping_sub(1)) & 1023],
                        self.vertex_ring[vc],
                    );
                    self.render_triangle_clipping(mem, a, b, c);
                    self.vertex_count = (self.vertex_count + 1) & 1023;
                }
            }
            PrimitiveType::TriangleStrip => {
                if self.vertex_accumulated == 0 {
                    self.vertex_ring[0] = self.convert_vertex(source);
                    self.vertex_accumulated = 1;
                } else if self.vertex_accumulated == 1 {
                    self.vertex_ring[1] = self.convert_vertex(source);
                    self.vertex_accumulated = 2;
                    self.vertex_count = 2;
                } else {
                    // vertices 0 1 2 3 4 ... draw (0,1,2) (1,3,2) (2,3,4) ...
                    self.primitives_count += 1;
                    self.primitives_total += 1;
                    let vc = self.vertex_count;
                    self.vertex_ring[vc] = self.convert_vertex(source);
                    let (p2, p1, p0) = (
                        self.vertex_ring[(vc.wrapping_sub(2)) & 1023],
                        self.vertex_ring[(vc.wrapping_sub(1)) & 1023],
                        self.vertex_ring[vc],
                    );
                    if vc & 1 == 0 {
                        self.render_triangle_clipping(mem, p2, p1, p0);
                    } else {
                        self.render_triangle_clipping(mem, p2, p0, p1);
                    }
                    self.vertex_count = (self.vertex_count + 1) & 1023;
                }
            }
            PrimitiveType::QuadStrip => {
                if self.vertex_accumulated == 0 {
                    self.vertex_ring[0] = self.convert_vertex(source);
                    self.vertex_accumulated = 1;
                } else if self.vertex_accumulated == 1 {
                    self.vertex_ring[1] = self.convert_vertex(source);
                    self.vertex_accumulated = 2;
                    self.vertex_count = 0;
                } else {
                    let slot = (self.vertex_count + self.vertex_accumulated) & 1023;
                    self.vertex_ring[slot] = self.convert_vertex(source);
                    self.vertex_accumulated += 1;
                    if self.vertex_accumulated == 4 {
                        self.primitives_count += 1;
                        self.primitives_total += 1;
                        // quad corners arrive as +0 +1 +3 +2
                        let vc = self.vertex_count;
                        let (a, b, c, d) = (
                            self.vertex_ring[vc],
                            self.vertex_ring[vc + 1],
                            self.vertex_ring[(vc + 3) & 1023],
                            self.vertex_ring[(vc + 2) & 1023],
                        );
                        self.render_triangle_clipping(mem, a, b, c);
                        self.render_triangle_clipping(mem, c, d, a);
                        self.vertex_accumulated = 2;
                        self.vertex_count = (self.vertex_count + 2) & 1023;
                    }
                }
            }
            other => {
                if self.vertex_count == 0 {
                    log::warn!("unsupported primitive topology {:?}", other);
                }
                self.vertex_count += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gpu::primitives::Rect;
    use crate::core::gpu::registers::{ColorFormat, DepthFormat};

    fn test_gpu() -> (GpuContext, SystemMemory) {
        let mut gpu = GpuContext::new();
        gpu.rt.limits = Rect::new(0, 0, 31, 31);
        gpu.rt.pitch_color = 128;
        gpu.rt.pitch_depth = 128;
        gpu.rt.color_format = ColorFormat::A8R8G8B8;
        gpu.rt.depth_format = DepthFormat::Z24S8;
        gpu.rt.size_color = 128 * 32;
        gpu.rt.size_depth = 128 * 32;
        gpu.rt.depth_offset = 0x4000;
        // identity-ish fixed function transform: w = 1
        gpu.vertex_pipeline = 4;
        gpu.matrices.composite = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        (gpu, SystemMemory::new(0x8000))
    }

    fn white_vertex(x: f32, y: f32) -> Vertex {
        let mut v = Vertex::default();
        v.attribute[attr::POS].fv = [x, y, 0.0, 1.0];
        v.attribute[attr::COLOR0].fv = [1.0, 1.0, 1.0, 1.0];
        v
    }

    fn filled_pixels(mem: &SystemMemory) -> usize {
        let mut n = 0;
        for y in 0..32u32 {
            for x in 0..32u32 {
                if mem.read_u32(128 * y + x * 4) != 0 {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn test_triangle_list_emits_per_three_vertices() {
        let (mut gpu, mut mem) = test_gpu();
        gpu.primitive_type = PrimitiveType::Triangles;
        gpu.assemble_primitive(&mut mem, &white_vertex(2.0, 2.0));
        gpu.assemble_primitive(&mut mem, &white_vertex(20.0, 2.0));
        assert_eq!(gpu.primitives_count, 0);
        assert_eq!(filled_pixels(&mem), 0);
        gpu.assemble_primitive(&mut mem, &white_vertex(2.0, 20.0));
        assert_eq!(gpu.primitives_count, 1);
        assert!(filled_pixels(&mem) > 50);
    }

    #[test]
    fn test_quads_emit_two_triangles() {
        let (mut gpu, mut mem) = test_gpu();
        gpu.primitive_type = PrimitiveType::Quads;
        for (x, y) in [(2.0, 2.0), (20.0, 2.0), (20.0, 20.0), (2.0, 20.0)] {
            gpu.assemble_primitive(&mut mem, &white_vertex(x, y));
        }
        assert_eq!(gpu.primitives_count, 1);
        // a full quad: every pixel in the interior box is covered
        for y in 4..18u32 {
            for x in 4..18u32 {
                assert_eq!(mem.read_u32(128 * y + x * 4), 0xFFFFFFFF, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_fan_keeps_anchor() {
        let (mut gpu, mut mem) = test_gpu();
        gpu.primitive_type = PrimitiveType::TriangleFan;
        gpu.assemble_primitive(&mut mem, &white_vertex(2.0, 2.0)); // anchor
        gpu.assemble_primitive(&mut mem, &white_vertex(30.0, 2.0));
        gpu.assemble_primitive(&mut mem, &white_vertex(30.0, 16.0));
        assert_eq!(gpu.primitives_count, 1);
        gpu.assemble_primitive(&mut mem, &white_vertex(30.0, 30.0));
        assert_eq!(gpu.primitives_count, 2);
        // the anchor survives in its reserved slot
        assert_eq!(gpu.vertex_ring[FAN_ANCHOR_SLOT].x, 2.0);
    }

    #[test]
    fn test_strip_alternates_winding() {
        let (mut gpu, mut mem) = test_gpu();
        gpu.primitive_type = PrimitiveType::TriangleStrip;
        // a strip of two triangles over a band; with culling of one
        // winding enabled both must still draw because the strip flips
        // the vertex order on odd counts
        gpu.culling.enabled = true;
        gpu.culling.cull = crate::core::gpu::registers::CullFace::Back;
        gpu.culling.winding = crate::core::gpu::registers::FrontFace::Ccw;
        for (x, y) in [(2.0, 2.0), (2.0, 20.0), (16.0, 2.0), (16.0, 20.0)] {
            gpu.assemble_primitive(&mut mem, &white_vertex(x, y));
        }
        assert_eq!(gpu.primitives_count, 2);
        assert_eq!(gpu.stats.triangles_culled, 0);
        assert!(filled_pixels(&mem) > 200);
    }

    #[test]
    fn test_quad_strip_corner_order() {
        let (mut gpu, mut mem) = test_gpu();
        gpu.primitive_type = PrimitiveType::QuadStrip;
        for (x, y) in [(2.0, 2.0), (2.0, 20.0), (20.0, 2.0), (20.0, 20.0)] {
            gpu.assemble_primitive(&mut mem, &white_vertex(x, y));
        }
        assert_eq!(gpu.primitives_count, 1);
        for y in 4..18u32 {
            for x in 4..14u32 {
                assert_eq!(mem.read_u32(128 * y + x * 4), 0xFFFFFFFF, "({}, {})", x, y);
            }
        }
        // two more vertices extend the strip by another quad
        gpu.assemble_primitive(&mut mem, &white_vertex(30.0, 2.0));
        gpu.assemble_primitive(&mut mem, &white_vertex(30.0, 20.0));
        assert_eq!(gpu.primitives_count, 2);
    }

    #[test]
    fn test_unsupported_topology_accumulates_silently() {
        let (mut gpu, mut mem) = test_gpu();
        gpu.primitive_type = PrimitiveType::Lines;
        for _ in 0..5 {
            gpu.assemble_primitive(&mut mem, &white_vertex(1.0, 1.0));
        }
        assert_eq!(gpu.primitives_count, 0);
        assert_eq!(filled_pixels(&mem), 0);
    }

    #[test]
    fn test_fixed_function_transform_divides_by_w() {
        let (mut gpu, _mem) = test_gpu();
        let mut v = white_vertex(10.0, 6.0);
        v.attribute[attr::POS].fv = [10.0, 6.0, 3.0, 2.0];
        let t = gpu.convert_vertex(&v);
        assert_eq!(t.w, 2.0);
        assert_eq!(t.x, 5.0);
        assert_eq!(t.y, 3.0);
        assert_eq!(t.p[param::Z], 1.5);
    }
}
