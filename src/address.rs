//! Plane geometry and chroma descriptor synthesis

use crate::Builder;
use crate::descriptor::{Generation, ImageDescriptor, ImageField, SamplerDescriptor, TexFilterMode, XyFilter};
use crate::params::{Filter, PlaneCount, Subsampling, YCbCrConversionParams};
use tracing::debug;

/// Border color swizzle of packed (1 and 2 plane) chroma descriptors
const BC_SWIZZLE_PACKED: u32 = 6;
/// Border color swizzle of the Cb plane of a 3 plane image
const BC_SWIZZLE_CB: u32 = 4;
/// Border color swizzle of the Cr plane of a 3 plane image
const BC_SWIZZLE_CR: u32 = 5;
/// Destination select of the Cb plane of a 3 plane image, Cb lands in z
const DST_SEL_CB: u32 = 0x300;
/// Destination select of the Cr plane of a 3 plane image, Cr lands in x
const DST_SEL_CR: u32 = 0x204;

/// Pitch alignment of linear images in bytes
const LINEAR_PITCH_ALIGN: u32 = 256;
/// log2 of the size of a tile optimal block in bytes
const LOG2_TILE_BYTES: u32 = 16;

/// Format facts the plane geometry depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneFormat {
    /// Bits of the first channel
    pub channel_bits: u32,
    pub bits_per_pixel: u32,
    pub effective_channel_bits: u32,
    pub tile_optimal: bool,
    pub subsampling: Subsampling,
    pub planes: PlaneCount,
}

impl PlaneFormat {
    pub fn from_params(params: &YCbCrConversionParams) -> Self {
        Self {
            channel_bits: params.channel_bits[0].bits(),
            bits_per_pixel: params.bits_per_pixel(),
            effective_channel_bits: params.effective_channel_bits(),
            tile_optimal: params.tile_optimal,
            subsampling: params.subsampling,
            planes: params.planes,
        }
    }

    fn x_shift(&self) -> u32 {
        u32::from(self.subsampling.x)
    }

    fn y_shift(&self) -> u32 {
        u32::from(self.subsampling.y)
    }
}

/// Pitch (bytes) and height (rows) of the luma and chroma planes
#[derive(Debug, Clone, Copy)]
pub struct PlaneGeometry<V> {
    pub pitch_y: V,
    pub height_y: V,
    pub pitch_cb: V,
    pub height_cb: V,
}

/// Base addresses of all planes, in units of 256 bytes
#[derive(Debug, Clone, Copy)]
pub struct PlaneAddresses<V> {
    pub plane0: V,
    pub plane1: V,
    /// Only present for 3 plane images
    pub plane2: Option<V>,
}

/// Image descriptors of every plane of a YCbCr image
#[derive(Debug, Clone, Copy)]
pub struct ChromaDescriptors<V> {
    pub luma: V,
    /// Packed chroma descriptor (1 and 2 plane) or the Cb plane (3 plane)
    pub chroma: V,
    /// Cr plane of a 3 plane image
    pub chroma_cr: Option<V>,
    /// Luma width as float
    pub width: V,
    /// Luma height as float
    pub height: V,
}

/// `(x + align - 1) & !(align - 1)`, `align` must be a power of two
pub fn power2_align<B: Builder>(b: &mut B, x: B::Value, align: u32) -> B::Value {
    assert!(align.is_power_of_two(), "alignment {align} is not a power of two");

    let x = b.iadd_u(x, align - 1);
    b.and_u(x, !(align - 1))
}

/// Derives per plane geometry from the luma descriptor and builds the chroma descriptors
pub struct ImageDescriptorBuilder<V> {
    luma: V,
    desc: ImageDescriptor<V>,
}

impl<V: Copy> ImageDescriptorBuilder<V> {
    pub fn new(generation: Generation, luma: V) -> Self {
        Self {
            luma,
            desc: ImageDescriptor::bind(generation, luma),
        }
    }

    pub fn generation(&self) -> Generation {
        self.desc.generation()
    }

    /// Compute the pitch and height of the luma and chroma planes
    ///
    /// If the format may be tile optimal both the linear and tiled variants are emitted and
    /// picked at run time by the descriptor's tiling flag.
    pub fn gen_height_and_pitch<B>(&mut self, b: &mut B, format: &PlaneFormat) -> PlaneGeometry<V>
    where
        B: Builder<Value = V>,
    {
        match self.generation() {
            Generation::GenA => self.gen_height_and_pitch_gen_a(b, format),
            Generation::GenB => self.gen_height_and_pitch_gen_b(b, format),
        }
    }

    fn gen_height_and_pitch_gen_a<B>(&mut self, b: &mut B, format: &PlaneFormat) -> PlaneGeometry<V>
    where
        B: Builder<Value = V>,
    {
        let pitch = self.desc.get(b, ImageField::Pitch);
        let height = self.desc.get(b, ImageField::Height);
        let pitch_cb_elements = b.lshr_u(pitch, format.x_shift());

        let bytes = format.effective_channel_bits >> 3;
        let mut geometry = PlaneGeometry {
            pitch_y: b.imul_u(pitch, bytes),
            height_y: height,
            pitch_cb: b.imul_u(pitch_cb_elements, bytes),
            height_cb: b.lshr_u(height, format.y_shift()),
        };

        if format.tile_optimal {
            let is_tiled = self.desc.get(b, ImageField::IsTileOpt);
            let tile_bytes = format.channel_bits >> 3;

            let pitch_y = b.imul_u(pitch, tile_bytes);
            let pitch_y = b.shl_u(pitch_y, 5);
            geometry.pitch_y = b.select(is_tiled, pitch_y, geometry.pitch_y);

            let pitch_cb = b.imul_u(pitch_cb_elements, tile_bytes);
            let pitch_cb = b.shl_u(pitch_cb, 5);
            geometry.pitch_cb = b.select(is_tiled, pitch_cb, geometry.pitch_cb);
        }

        geometry
    }

    fn gen_height_and_pitch_gen_b<B>(&mut self, b: &mut B, format: &PlaneFormat) -> PlaneGeometry<V>
    where
        B: Builder<Value = V>,
    {
        let element_bytes = format.bits_per_pixel >> 3;
        assert!(
            element_bytes.is_power_of_two() && element_bytes <= LINEAR_PITCH_ALIGN,
            "unsupported element size of {} bits",
            format.bits_per_pixel
        );

        let width = self.desc.get(b, ImageField::Width);
        let height = self.desc.get(b, ImageField::Height);
        let width_cb = b.lshr_u(width, format.x_shift());
        let height_cb = b.lshr_u(height, format.y_shift());

        let pitch_align = LINEAR_PITCH_ALIGN / element_bytes;

        let pitch_y = power2_align(b, width, pitch_align);
        let pitch_cb = power2_align(b, width_cb, pitch_align);

        let mut geometry = PlaneGeometry {
            pitch_y: b.imul_u(pitch_y, element_bytes),
            height_y: height,
            pitch_cb: b.imul_u(pitch_cb, element_bytes),
            height_cb,
        };

        if format.tile_optimal {
            let is_tiled = self.desc.get(b, ImageField::IsTileOpt);

            // Width takes the larger half of an odd number of element bits
            let log2_elements = LOG2_TILE_BYTES - element_bytes.ilog2();
            let log2_width = log2_elements.div_ceil(2);
            let tile_pitch_align = 1 << log2_width;
            let tile_height_align = 1 << (log2_elements - log2_width);

            let pitch_y = power2_align(b, width, tile_pitch_align);
            let pitch_y = b.imul_u(pitch_y, element_bytes);
            geometry.pitch_y = b.select(is_tiled, pitch_y, geometry.pitch_y);

            let pitch_cb = power2_align(b, width_cb, tile_pitch_align);
            let pitch_cb = b.imul_u(pitch_cb, element_bytes);
            geometry.pitch_cb = b.select(is_tiled, pitch_cb, geometry.pitch_cb);

            let height_y = power2_align(b, height, tile_height_align);
            geometry.height_y = b.select(is_tiled, height_y, geometry.height_y);

            let height_cb_aligned = power2_align(b, height_cb, tile_height_align);
            geometry.height_cb = b.select(is_tiled, height_cb_aligned, geometry.height_cb);
        }

        geometry
    }

    /// Base addresses of all planes, planes are laid out back to back
    pub fn gen_base_address<B>(
        &mut self,
        b: &mut B,
        geometry: &PlaneGeometry<V>,
        planes: PlaneCount,
    ) -> PlaneAddresses<V>
    where
        B: Builder<Value = V>,
    {
        let plane0 = self.desc.get(b, ImageField::BaseAddress);

        let luma_size = b.imul(geometry.pitch_y, geometry.height_y);
        let luma_size = b.lshr_u(luma_size, 8);
        let plane1 = b.iadd(plane0, luma_size);

        let plane2 = match planes {
            PlaneCount::Three => {
                let chroma_size = b.imul(geometry.pitch_cb, geometry.height_cb);
                let chroma_size = b.lshr_u(chroma_size, 8);
                Some(b.iadd(plane1, chroma_size))
            }
            PlaneCount::One | PlaneCount::Two => None,
        };

        PlaneAddresses {
            plane0,
            plane1,
            plane2,
        }
    }

    /// Build the descriptors of all chroma planes out of the luma descriptor
    pub fn synthesize<B>(mut self, b: &mut B, params: &YCbCrConversionParams) -> ChromaDescriptors<V>
    where
        B: Builder<Value = V>,
    {
        let format = PlaneFormat::from_params(params);
        let has_pitch = self.generation().has_pitch();

        let geometry = self.gen_height_and_pitch(b, &format);
        let addresses = self.gen_base_address(b, &geometry, params.planes);

        let width = self.desc.get(b, ImageField::Width);
        let height = self.desc.get(b, ImageField::Height);
        let width_f = b.uitofp(width);
        let height_f = b.uitofp(height);

        let pitch = if has_pitch {
            Some(self.desc.get(b, ImageField::Pitch))
        } else {
            None
        };

        let chroma_width = b.lshr_u(width, format.x_shift());
        let chroma_height = b.lshr_u(height, format.y_shift());
        let chroma_pitch = pitch.map(|pitch| b.lshr_u(pitch, format.x_shift()));

        self.desc.set(b, ImageField::Width, chroma_width);
        let chroma_format = b.const_u32(params.chroma_format);
        self.desc.set(b, ImageField::Format, chroma_format);

        let (chroma, chroma_cr) = match params.planes {
            PlaneCount::One => {
                self.set_const(b, ImageField::DstSelXYZW, params.chroma_dst_sel);
                self.set_const(b, ImageField::BcSwizzle, BC_SWIZZLE_PACKED);
                if has_pitch {
                    self.desc.set(b, ImageField::Pitch, geometry.pitch_cb);
                }

                (self.desc.materialize(b), None)
            }
            PlaneCount::Two => {
                self.desc.set(b, ImageField::BaseAddress, addresses.plane1);
                self.desc.set(b, ImageField::Height, chroma_height);
                self.set_const(b, ImageField::DstSelXYZW, params.chroma_dst_sel);
                self.set_const(b, ImageField::BcSwizzle, BC_SWIZZLE_PACKED);
                if let Some(chroma_pitch) = chroma_pitch {
                    self.desc.set(b, ImageField::Pitch, chroma_pitch);
                }

                (self.desc.materialize(b), None)
            }
            PlaneCount::Three => {
                self.desc.set(b, ImageField::BaseAddress, addresses.plane1);
                self.desc.set(b, ImageField::Height, chroma_height);
                self.set_const(b, ImageField::DstSelXYZW, DST_SEL_CB);
                self.set_const(b, ImageField::BcSwizzle, BC_SWIZZLE_CB);
                if let Some(chroma_pitch) = chroma_pitch {
                    self.desc.set(b, ImageField::Pitch, chroma_pitch);
                }
                let cb = self.desc.materialize(b);

                let Some(plane2) = addresses.plane2 else {
                    unreachable!("3 plane images always have a third base address")
                };
                self.desc.set(b, ImageField::BaseAddress, plane2);
                self.set_const(b, ImageField::DstSelXYZW, DST_SEL_CR);
                self.set_const(b, ImageField::BcSwizzle, BC_SWIZZLE_CR);
                let cr = self.desc.materialize(b);

                (cb, Some(cr))
            }
        };

        debug!(
            generation = ?self.generation(),
            planes = params.planes.count(),
            tile_optimal = params.tile_optimal,
            "synthesized chroma descriptors"
        );

        ChromaDescriptors {
            luma: self.luma,
            chroma,
            chroma_cr,
            width: width_f,
            height: height_f,
        }
    }

    fn set_const<B>(&mut self, b: &mut B, field: ImageField, value: u32)
    where
        B: Builder<Value = V>,
    {
        let value = b.const_u32(value);
        self.desc.set(b, field, value);
    }
}

/// Derive the sampler descriptor used for every chroma fetch
///
/// Chroma reconstructed in the shader must not be filtered by the sampler again.
pub fn chroma_sampler<B: Builder>(
    b: &mut B,
    generation: Generation,
    sampler: B::Value,
    chroma_filter: Filter,
    force_explicit_reconstruct: bool,
) -> B::Value {
    let mut desc = SamplerDescriptor::bind(generation, sampler);

    desc.set_filter_mode(b, TexFilterMode::Blend);

    let filter = if chroma_filter == Filter::Nearest || force_explicit_reconstruct {
        XyFilter::Point
    } else {
        XyFilter::Linear
    };
    desc.set_xy_filter(b, filter);

    desc.materialize(b)
}
