//! Lowering of YCbCr image samples
//!
//! A sample from a multi planar, possibly subsampled YCbCr image is rewritten into plain image
//! fetches from each plane, explicit chroma reconstruction where required and a conversion to
//! RGBA. All code is emitted through the [`Builder`] trait, [`builder::interp::Interpreter`]
//! evaluates it on the CPU.

pub use address::{
    ChromaDescriptors, ImageDescriptorBuilder, PlaneAddresses, PlaneFormat, PlaneGeometry, chroma_sampler,
    power2_align,
};
pub use builder::{Builder, FetchRequest, SampleInfo};
pub use color::convert_color;
pub use descriptor::{
    FieldSpec, FieldView, Generation, ImageDescriptor, ImageField, SamplerDescriptor, SamplerField, TexFilterMode,
    XyFilter,
};
pub use params::{
    BitDepth, ChromaLocation, ColorModel, ColorRange, ComponentSwizzle, Filter, InvalidConversionParams, PlaneCount,
    Subsampling, YCbCrConversionParams,
};
pub use sample::{ChromaSampler, ChromaStrategy, lower_ycbcr_sample};

pub mod address;
pub mod builder;
pub mod color;
pub mod descriptor;
pub mod params;
pub mod sample;
