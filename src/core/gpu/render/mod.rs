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

//! Software rendering pipeline
//!
//! From assembled primitive to framebuffer write: primitive assembly
//! ([`assembler`]), w-plane clipping ([`clipper`]), scanline span walking
//! with three pixel shaders ([`rasterizer`]), texel fetch ([`texture`]),
//! the register combiners ([`combiner`]) and the per-pixel output stage
//! ([`output`]).

pub mod assembler;
pub mod clipper;
pub mod combiner;
pub mod output;
pub mod rasterizer;
pub mod texture;
