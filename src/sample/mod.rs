//! Lowering of a YCbCr sample into plain image fetches

use crate::address::{ChromaDescriptors, ImageDescriptorBuilder, chroma_sampler};
use crate::descriptor::Generation;
use crate::params::{ComponentSwizzle, YCbCrConversionParams};
use crate::{Builder, FetchRequest, SampleInfo, convert_color};
use reconstruct::Reconstructor;
use tracing::debug;

mod blend;
mod coords;
mod reconstruct;

pub use blend::{bilinear_blend, chroma_weight, emit_chroma_weight};
pub use coords::{SampleCoordinates, implicit_chroma_uv, st_to_uv, uv_offset, uv_to_ij};
pub use reconstruct::ChromaStrategy;

/// State of one YCbCr sample site
///
/// Creating it emits the chroma descriptors and the chroma sampler, [`ChromaSampler::sample`]
/// emits the fetches and the color conversion. One instance must not be shared between sample
/// sites.
pub struct ChromaSampler<'a, V> {
    params: &'a YCbCrConversionParams,
    info: &'a SampleInfo<V>,
    descriptors: ChromaDescriptors<V>,
    chroma_sampler: V,
    strategy: ChromaStrategy,
}

impl<'a, V: Copy> ChromaSampler<'a, V> {
    pub fn new<B>(
        b: &mut B,
        params: &'a YCbCrConversionParams,
        generation: Generation,
        info: &'a SampleInfo<V>,
    ) -> Self
    where
        B: Builder<Value = V>,
    {
        let descriptors = ImageDescriptorBuilder::new(generation, info.image).synthesize(b, params);
        let chroma_sampler = chroma_sampler(
            b,
            generation,
            info.sampler,
            params.chroma_filter,
            params.force_explicit_reconstruct,
        );
        let strategy = ChromaStrategy::select(params);

        debug!(
            ?strategy,
            luma_filter = ?params.luma_filter,
            chroma_filter = ?params.chroma_filter,
            subsampling = ?params.subsampling,
            "selected chroma reconstruction"
        );

        Self {
            params,
            info,
            descriptors,
            chroma_sampler,
            strategy,
        }
    }

    pub fn strategy(&self) -> ChromaStrategy {
        self.strategy
    }

    pub fn descriptors(&self) -> &ChromaDescriptors<V> {
        &self.descriptors
    }

    pub fn chroma_sampler_descriptor(&self) -> V {
        self.chroma_sampler
    }

    pub fn coordinates<B>(&self, b: &mut B, s: V, t: V) -> SampleCoordinates<V>
    where
        B: Builder<Value = V>,
    {
        SampleCoordinates::new(
            b,
            self.params.luma_filter,
            s,
            t,
            self.descriptors.width,
            self.descriptors.height,
        )
    }

    /// Swizzled (Cr, Y, Cb, A) at the normalized coordinate `(s, t)`
    pub fn sample_ycbcr<B>(&self, b: &mut B, s: V, t: V) -> V
    where
        B: Builder<Value = V>,
    {
        let coords = self.coordinates(b, s, t);

        let st = b.compose(&[s, t]);
        let luma = b.image_fetch(FetchRequest {
            info: self.info,
            coords: st,
            image: self.descriptors.luma,
            sampler: self.info.sampler,
        });
        // (Y, A)
        let luma = b.shuffle(luma, luma, &[1, 3]);

        let chroma = Reconstructor {
            params: self.params,
            info: self.info,
            descriptors: &self.descriptors,
            sampler: self.chroma_sampler,
        }
        .reconstruct(b, self.strategy, &coords);

        let ycbcr = b.shuffle(luma, chroma, &[2, 0, 3, 1]);

        self.swizzle(b, ycbcr)
    }

    fn swizzle<B>(&self, b: &mut B, ycbcr: V) -> V
    where
        B: Builder<Value = V>,
    {
        let swizzle = self.params.swizzle;

        if swizzle == ComponentSwizzle::IDENTITY {
            return ycbcr;
        }

        if let [Some(r), Some(g), Some(bl), Some(a)] = swizzle.map(ComponentSwizzle::lane) {
            return b.shuffle(ycbcr, ycbcr, &[r, g, bl, a]);
        }

        let lanes = swizzle.map(|component| match component {
            ComponentSwizzle::Zero => b.const_f32(0.0),
            ComponentSwizzle::One => b.const_f32(1.0),
            ComponentSwizzle::R => b.extract(ycbcr, 0),
            ComponentSwizzle::G => b.extract(ycbcr, 1),
            ComponentSwizzle::B => b.extract(ycbcr, 2),
            ComponentSwizzle::A => b.extract(ycbcr, 3),
        });

        b.compose(&lanes)
    }

    /// Converted RGBA at the normalized coordinate `(s, t)`
    pub fn sample<B>(&self, b: &mut B, s: V, t: V) -> V
    where
        B: Builder<Value = V>,
    {
        let ycbcr = self.sample_ycbcr(b, s, t);

        convert_color(b, self.params.model, self.params.range, self.params.channel_bits, ycbcr)
    }
}

/// Lower a YCbCr sample at `(s, t)` into image fetches and color conversion
///
/// Returns the 4 lane RGBA result replacing the lowered sample.
pub fn lower_ycbcr_sample<B: Builder>(
    b: &mut B,
    params: &YCbCrConversionParams,
    generation: Generation,
    info: &SampleInfo<B::Value>,
    s: B::Value,
    t: B::Value,
) -> B::Value {
    ChromaSampler::new(b, params, generation, info).sample(b, s, t)
}
