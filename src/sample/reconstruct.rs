//! Chroma reconstruction strategies

use super::blend::{bilinear_blend, emit_chroma_weight};
use super::coords::{SampleCoordinates, implicit_chroma_uv, uv_offset};
use crate::address::ChromaDescriptors;
use crate::params::{ChromaLocation, Filter, PlaneCount, Subsampling, YCbCrConversionParams};
use crate::{Builder, FetchRequest, SampleInfo};

/// How the (Cr, Cb) pair of a sample is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChromaStrategy {
    /// One fetch per chroma plane at the chroma location adjusted coordinate, the sampler filters
    Implicit,
    /// One fetch per chroma plane at the luma coordinate
    Direct,
    /// Nearest chroma texels of the 4 luma neighbours blended with the luma weights
    NearestQuad,
    /// Chroma interpolated in x from 2 taps
    LinearX {
        /// Evaluate at the 4 luma neighbours and blend those
        luma_quad: bool,
    },
    /// Chroma interpolated in x and y from 4 taps
    LinearXY {
        /// Evaluate at the 4 luma neighbours and blend those
        luma_quad: bool,
    },
}

impl ChromaStrategy {
    pub fn select(params: &YCbCrConversionParams) -> Self {
        if !params.explicit_reconstruction() {
            return ChromaStrategy::Implicit;
        }

        let Subsampling { x, y } = params.subsampling;
        let linear = |luma_quad| {
            if y {
                ChromaStrategy::LinearXY { luma_quad }
            } else {
                ChromaStrategy::LinearX { luma_quad }
            }
        };

        match (params.luma_filter, params.chroma_filter) {
            _ if !x => ChromaStrategy::Direct,
            (Filter::Nearest, Filter::Nearest) => ChromaStrategy::Direct,
            (Filter::Nearest, Filter::Linear) => linear(false),
            (Filter::Linear, Filter::Nearest) => ChromaStrategy::NearestQuad,
            (Filter::Linear, Filter::Linear) => linear(true),
        }
    }

    /// Number of image fetches emitted for the chroma part of one sample
    pub fn fetch_count(self, planes: PlaneCount) -> usize {
        let per_tap = match planes {
            PlaneCount::Three => 2,
            PlaneCount::One | PlaneCount::Two => 1,
        };

        let taps = match self {
            ChromaStrategy::Implicit | ChromaStrategy::Direct => 1,
            ChromaStrategy::NearestQuad => 4,
            ChromaStrategy::LinearX { luma_quad } => 2 * if luma_quad { 4 } else { 1 },
            ChromaStrategy::LinearXY { luma_quad } => 4 * if luma_quad { 4 } else { 1 },
        };

        taps * per_tap
    }
}

/// Emits the chroma fetches of one sample
///
/// Every fetch uses the chroma sampler, results are 2 lane (Cr, Cb) vectors.
pub(crate) struct Reconstructor<'a, V> {
    pub(crate) params: &'a YCbCrConversionParams,
    pub(crate) info: &'a SampleInfo<V>,
    pub(crate) descriptors: &'a ChromaDescriptors<V>,
    pub(crate) sampler: V,
}

impl<V: Copy> Reconstructor<'_, V> {
    pub(crate) fn reconstruct<B>(&self, b: &mut B, strategy: ChromaStrategy, c: &SampleCoordinates<V>) -> V
    where
        B: Builder<Value = V>,
    {
        match strategy {
            ChromaStrategy::Implicit => self.implicit(b, c),
            ChromaStrategy::Direct => self.wrapped(b, c.u, c.v, Subsampling::NONE),
            ChromaStrategy::NearestQuad => self.nearest_quad(b, c),
            ChromaStrategy::LinearX { luma_quad: false } => self.linear_x(b, c.i, c.j),
            ChromaStrategy::LinearXY { luma_quad: false } => self.linear_xy(b, c.i, c.j),
            ChromaStrategy::LinearX { luma_quad: true } => {
                self.luma_quad(b, c, |this, b, i, j| this.linear_x(b, i, j))
            }
            ChromaStrategy::LinearXY { luma_quad: true } => {
                self.luma_quad(b, c, |this, b, i, j| this.linear_xy(b, i, j))
            }
        }
    }

    fn fetch<B>(&self, b: &mut B, coords: V, image: V) -> V
    where
        B: Builder<Value = V>,
    {
        b.image_fetch(FetchRequest {
            info: self.info,
            coords,
            image,
            sampler: self.sampler,
        })
    }

    /// Fetch (Cr, Cb) at normalized coordinates, `packed` is read by 1 and 2 plane images
    fn fetch_chroma<B>(&self, b: &mut B, x: V, y: V, packed: V) -> V
    where
        B: Builder<Value = V>,
    {
        let coords = b.compose(&[x, y]);

        match self.descriptors.chroma_cr {
            Some(cr_plane) => {
                let cb = self.fetch(b, coords, self.descriptors.chroma);
                let cr = self.fetch(b, coords, cr_plane);
                b.shuffle(cr, cb, &[0, 6])
            }
            None => {
                let texel = self.fetch(b, coords, packed);
                b.shuffle(texel, texel, &[0, 2])
            }
        }
    }

    /// Fetch at chroma texel coordinates `(i, j)`, halving the extent on `subsampled` axes
    fn wrapped<B>(&self, b: &mut B, i: V, j: V, subsampled: Subsampling) -> V
    where
        B: Builder<Value = V>,
    {
        let width = self.chroma_extent(b, self.descriptors.width, subsampled.x);
        let height = self.chroma_extent(b, self.descriptors.height, subsampled.y);

        let x = b.fdiv(i, width);
        let y = b.fdiv(j, height);

        let packed = match self.params.planes {
            PlaneCount::One if !subsampled.x => self.descriptors.luma,
            _ => self.descriptors.chroma,
        };

        self.fetch_chroma(b, x, y, packed)
    }

    fn chroma_extent<B>(&self, b: &mut B, extent: V, subsampled: bool) -> V
    where
        B: Builder<Value = V>,
    {
        if subsampled { b.fmul_f(extent, 0.5) } else { extent }
    }

    fn implicit<B>(&self, b: &mut B, c: &SampleCoordinates<V>) -> V
    where
        B: Builder<Value = V>,
    {
        let subsampling = self.params.subsampling;

        let i = if subsampling.x {
            implicit_chroma_uv(b, self.params.x_chroma_offset, c.u)
        } else {
            c.u
        };
        let j = if subsampling.y {
            implicit_chroma_uv(b, self.params.y_chroma_offset, c.v)
        } else {
            c.v
        };

        self.wrapped(b, i, j, subsampling)
    }

    fn nearest_quad<B>(&self, b: &mut B, c: &SampleCoordinates<V>) -> V
    where
        B: Builder<Value = V>,
    {
        let subsampling = self.params.subsampling;

        let luma_a = uv_offset(b, c.u);
        let luma_b = uv_offset(b, c.v);

        let mut i0 = c.i;
        let mut i1 = b.fadd_f(c.i, 1.0);
        let mut j0 = c.j;
        let mut j1 = b.fadd_f(c.j, 1.0);

        if subsampling.x {
            i0 = b.fdiv_f(i0, 2.0);
            i1 = b.fdiv_f(i1, 2.0);
        }
        if subsampling.y {
            j0 = b.fdiv_f(j0, 2.0);
            j1 = b.fdiv_f(j1, 2.0);
        }

        let tl = self.wrapped(b, i0, j0, subsampling);
        let tr = self.wrapped(b, i1, j0, subsampling);
        let br = self.wrapped(b, i1, j1, subsampling);
        let bl = self.wrapped(b, i0, j1, subsampling);

        bilinear_blend(b, luma_a, luma_b, tl, tr, bl, br)
    }

    /// Run `f` at the 4 luma texels around the sample and blend with the luma weights
    fn luma_quad<B>(
        &self,
        b: &mut B,
        c: &SampleCoordinates<V>,
        mut f: impl FnMut(&Self, &mut B, V, V) -> V,
    ) -> V
    where
        B: Builder<Value = V>,
    {
        let luma_a = uv_offset(b, c.u);
        let luma_b = uv_offset(b, c.v);
        let i1 = b.fadd_f(c.i, 1.0);
        let j1 = b.fadd_f(c.j, 1.0);

        let tl = f(self, b, c.i, c.j);
        let tr = f(self, b, i1, c.j);
        let br = f(self, b, i1, j1);
        let bl = f(self, b, c.i, j1);

        bilinear_blend(b, luma_a, luma_b, tl, tr, bl, br)
    }

    /// Index of the lower chroma tap and the weight towards the upper one
    fn axis<B>(&self, b: &mut B, ij: V, location: ChromaLocation) -> (V, V)
    where
        B: Builder<Value = V>,
    {
        let index = b.fptosi(ij);
        let two = b.const_u32(2);
        let rem = b.srem(index, two);
        let zero = b.const_u32(0);
        let is_even = b.icmp_eq(rem, zero);

        let half = b.fdiv_f(ij, 2.0);
        let mut sub = b.floor(half);
        if location == ChromaLocation::Midpoint {
            let lower = b.fsub_f(sub, 1.0);
            sub = b.select(is_even, lower, sub);
        }

        let weight = emit_chroma_weight(b, location, is_even);
        (sub, weight)
    }

    /// Tap order (near, far) of Vulkan explicit chroma reconstruction: the lower tap for cosited
    /// chroma, the upper tap for midpoint
    fn order(location: ChromaLocation, lower: V, upper: V) -> (V, V) {
        match location {
            ChromaLocation::CositedEven => (lower, upper),
            ChromaLocation::Midpoint => (upper, lower),
        }
    }

    fn linear_x<B>(&self, b: &mut B, i: V, j: V) -> V
    where
        B: Builder<Value = V>,
    {
        let location = self.params.x_chroma_offset;

        let width = b.fmul_f(self.descriptors.width, 0.5);
        let t = b.fdiv(j, self.descriptors.height);

        let (sub_i, alpha) = self.axis(b, i, location);
        let x0 = b.fdiv(sub_i, width);
        let sub_i1 = b.fadd_f(sub_i, 1.0);
        let x1 = b.fdiv(sub_i1, width);

        let lower = self.fetch_chroma(b, x0, t, self.descriptors.chroma);
        let upper = self.fetch_chroma(b, x1, t, self.descriptors.chroma);

        let (near, far) = Self::order(location, lower, upper);
        b.fmix(near, far, alpha)
    }

    fn linear_xy<B>(&self, b: &mut B, i: V, j: V) -> V
    where
        B: Builder<Value = V>,
    {
        let (x_location, y_location) = (self.params.x_chroma_offset, self.params.y_chroma_offset);

        let width = b.fmul_f(self.descriptors.width, 0.5);
        let height = b.fmul_f(self.descriptors.height, 0.5);

        let (sub_i, alpha) = self.axis(b, i, x_location);
        let (sub_j, beta) = self.axis(b, j, y_location);

        let x0 = b.fdiv(sub_i, width);
        let sub_i1 = b.fadd_f(sub_i, 1.0);
        let x1 = b.fdiv(sub_i1, width);
        let y0 = b.fdiv(sub_j, height);
        let sub_j1 = b.fadd_f(sub_j, 1.0);
        let y1 = b.fdiv(sub_j1, height);

        let chroma = self.descriptors.chroma;
        let tl = self.fetch_chroma(b, x0, y0, chroma);
        let tr = self.fetch_chroma(b, x1, y0, chroma);
        let bl = self.fetch_chroma(b, x0, y1, chroma);
        let br = self.fetch_chroma(b, x1, y1, chroma);

        let (tl, tr) = Self::order(x_location, tl, tr);
        let (bl, br) = Self::order(x_location, bl, br);
        let (tl, bl) = Self::order(y_location, tl, bl);
        let (tr, br) = Self::order(y_location, tr, br);

        bilinear_blend(b, alpha, beta, tl, tr, bl, br)
    }
}
