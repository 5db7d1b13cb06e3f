use crate::Builder;
use crate::params::{ChromaLocation, Filter};

/// Normalized coordinate to texel space, `st * size`
pub fn st_to_uv<B: Builder>(b: &mut B, st: B::Value, size: B::Value) -> B::Value {
    b.fmul(st, size)
}

/// Integer texel coordinate of `uv`
///
/// Linear filtering centers on texel boundaries, so the coordinate is biased by -0.5 first.
pub fn uv_to_ij<B: Builder>(b: &mut B, filter: Filter, uv: B::Value) -> B::Value {
    let uv = match filter {
        Filter::Nearest => uv,
        Filter::Linear => b.fsub_f(uv, 0.5),
    };

    b.floor(uv)
}

/// Chroma texel coordinate of a luma texel coordinate on a subsampled axis
pub fn implicit_chroma_uv<B: Builder>(b: &mut B, location: ChromaLocation, uv: B::Value) -> B::Value {
    let uv = match location {
        ChromaLocation::CositedEven => b.fadd_f(uv, 0.5),
        ChromaLocation::Midpoint => uv,
    };

    b.fmul_f(uv, 0.5)
}

/// Weight of the top left texel of a linear footprint, `fract(uv - 0.5)`
pub fn uv_offset<B: Builder>(b: &mut B, uv: B::Value) -> B::Value {
    let biased = b.fsub_f(uv, 0.5);
    let ij = b.floor(biased);
    b.fsub(biased, ij)
}

/// Coordinates of one sample in all spaces used during reconstruction
#[derive(Debug, Clone, Copy)]
pub struct SampleCoordinates<V> {
    pub s: V,
    pub t: V,
    pub u: V,
    pub v: V,
    pub i: V,
    pub j: V,
}

impl<V: Copy> SampleCoordinates<V> {
    pub fn new<B>(b: &mut B, luma_filter: Filter, s: V, t: V, width: V, height: V) -> Self
    where
        B: Builder<Value = V>,
    {
        let u = st_to_uv(b, s, width);
        let v = st_to_uv(b, t, height);
        let i = uv_to_ij(b, luma_filter, u);
        let j = uv_to_ij(b, luma_filter, v);

        Self { s, t, u, v, i, j }
    }
}
