use super::view::FieldView;
use super::{FieldSpec, Generation, IMAGE_DESC_WORDS, SAMPLER_DESC_WORDS};
use crate::Builder;

/// Semantic fields of an image descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageField {
    BaseAddress,
    BaseAddressHi,
    Format,
    /// Stored as `width - 1`
    Width,
    /// Stored as `height - 1`
    Height,
    DstSelXYZW,
    /// Read only, reads as a bool
    IsTileOpt,
    Depth,
    /// Stored as `pitch - 1`, not present on [`Generation::GenB`]
    Pitch,
    BcSwizzle,
}

impl ImageField {
    pub const COUNT: usize = 10;

    pub const ALL: [ImageField; Self::COUNT] = [
        ImageField::BaseAddress,
        ImageField::BaseAddressHi,
        ImageField::Format,
        ImageField::Width,
        ImageField::Height,
        ImageField::DstSelXYZW,
        ImageField::IsTileOpt,
        ImageField::Depth,
        ImageField::Pitch,
        ImageField::BcSwizzle,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn is_biased(self) -> bool {
        matches!(
            self,
            ImageField::Width | ImageField::Height | ImageField::Pitch
        )
    }
}

/// Semantic fields of a sampler descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerField {
    FilterMode,
    XYMagFilter,
    XYMinFilter,
}

impl SamplerField {
    pub const ALL: [SamplerField; 3] = [
        SamplerField::FilterMode,
        SamplerField::XYMagFilter,
        SamplerField::XYMinFilter,
    ];
}

/// Where a semantic field lives in a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Single(FieldSpec),
    /// `value = (hi << lo.width) | lo`
    Split {
        lo: FieldSpec,
        hi: FieldSpec,
    },
    Absent,
}

use Layout::{Absent, Single, Split};

const fn spec(word: usize, offset: u32, width: u32) -> Layout {
    Single(FieldSpec::new(word, offset, width))
}

// Indexed by ImageField
#[rustfmt::skip]
const GEN_A_IMAGE: [Layout; ImageField::COUNT] = [
    spec(0,  0, 32), // BaseAddress
    spec(1,  0,  8), // BaseAddressHi
    spec(1, 20,  9), // Format
    spec(2,  0, 14), // Width
    spec(2, 14, 14), // Height
    spec(3,  0, 12), // DstSelXYZW
    spec(3, 20,  5), // IsTileOpt
    spec(4,  0, 13), // Depth
    spec(4, 13, 12), // Pitch
    spec(4, 29,  3), // BcSwizzle
];

#[rustfmt::skip]
const GEN_B_IMAGE: [Layout; ImageField::COUNT] = [
    spec(0,  0, 32), // BaseAddress
    spec(1,  0,  8), // BaseAddressHi
    spec(1, 20,  9), // Format
    Split {          // Width
        lo: FieldSpec::new(1, 30,  2),
        hi: FieldSpec::new(2,  0, 14),
    },
    spec(2, 14, 16), // Height
    spec(3,  0, 12), // DstSelXYZW
    spec(3, 20,  5), // IsTileOpt
    spec(4,  0, 16), // Depth
    Absent,          // Pitch
    spec(3, 25,  3), // BcSwizzle
];

// Indexed by SamplerField, shared by all generations
#[rustfmt::skip]
const SAMPLER: [FieldSpec; 3] = [
    FieldSpec::new(0, 30, 2), // FilterMode
    FieldSpec::new(2, 20, 2), // XYMagFilter
    FieldSpec::new(2, 22, 2), // XYMinFilter
];

impl Generation {
    fn image_layout(self, field: ImageField) -> Layout {
        match self {
            Generation::GenA => GEN_A_IMAGE[field.index()],
            Generation::GenB => GEN_B_IMAGE[field.index()],
        }
    }

    pub fn has_image_field(self, field: ImageField) -> bool {
        self.image_layout(field) != Absent
    }

    /// Every raw bit range of the image descriptor, split fields yield both halves
    pub fn image_field_specs(self) -> impl Iterator<Item = FieldSpec> {
        ImageField::ALL
            .into_iter()
            .flat_map(move |field| match self.image_layout(field) {
                Single(spec) => vec![spec],
                Split { lo, hi } => vec![lo, hi],
                Absent => vec![],
            })
    }

    pub fn sampler_field_spec(self, field: SamplerField) -> FieldSpec {
        SAMPLER[field as usize]
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldCache<V> {
    value: Option<V>,
    modified: bool,
}

impl<V> FieldCache<V> {
    const EMPTY: Self = Self {
        value: None,
        modified: false,
    };
}

/// Typed accessor for an image descriptor
///
/// Biased fields (width, height, pitch) are exposed with their real value, the split width of
/// [`Generation::GenB`] is exposed as a single value.
#[derive(Debug, Clone)]
pub struct ImageDescriptor<V> {
    generation: Generation,
    view: FieldView<V, IMAGE_DESC_WORDS>,
    cache: [FieldCache<V>; ImageField::COUNT],
}

impl<V: Copy> ImageDescriptor<V> {
    pub fn bind(generation: Generation, words: V) -> Self {
        Self {
            generation,
            view: FieldView::bind(words),
            cache: [FieldCache::EMPTY; ImageField::COUNT],
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    fn layout(&self, field: ImageField) -> (FieldSpec, Option<FieldSpec>) {
        match self.generation.image_layout(field) {
            Single(spec) => (spec, None),
            Split { lo, hi } => (lo, Some(hi)),
            Absent => panic!("{field:?} is not present on {:?}", self.generation),
        }
    }

    fn get_raw<B>(&mut self, b: &mut B, field: ImageField) -> V
    where
        B: Builder<Value = V>,
    {
        let cache = self.cache[field.index()];

        if let (Some(value), false) = (cache.value, cache.modified) {
            return value;
        }

        let value = match self.layout(field) {
            (spec, None) => self.view.get(b, spec),
            (lo, Some(hi)) => {
                let lo_value = self.view.get(b, lo);
                let hi_value = self.view.get(b, hi);
                let hi_value = b.shl_u(hi_value, lo.width);
                b.or(hi_value, lo_value)
            }
        };

        self.cache[field.index()] = FieldCache {
            value: Some(value),
            modified: false,
        };

        value
    }

    fn set_raw<B>(&mut self, b: &mut B, field: ImageField, value: V)
    where
        B: Builder<Value = V>,
    {
        match self.layout(field) {
            (spec, None) => self.view.set(b, spec, value),
            (lo, Some(hi)) => {
                let lo_value = b.and_u(value, lo.value_mask());
                let hi_value = b.lshr_u(value, lo.width);
                self.view.set(b, lo, lo_value);
                self.view.set(b, hi, hi_value);
            }
        }

        self.cache[field.index()].modified = true;
    }

    /// # Panics
    ///
    /// If the field is not present on this descriptor's generation
    pub fn get<B>(&mut self, b: &mut B, field: ImageField) -> V
    where
        B: Builder<Value = V>,
    {
        let raw = self.get_raw(b, field);

        match field {
            ImageField::IsTileOpt => {
                let zero = b.const_u32(0);
                b.icmp_ne(raw, zero)
            }
            field if field.is_biased() => b.iadd_u(raw, 1),
            _ => raw,
        }
    }

    /// # Panics
    ///
    /// If the field is not present on this descriptor's generation or is [`ImageField::IsTileOpt`]
    pub fn set<B>(&mut self, b: &mut B, field: ImageField, value: V)
    where
        B: Builder<Value = V>,
    {
        assert!(field != ImageField::IsTileOpt, "IsTileOpt is read-only");

        let raw = if field.is_biased() {
            b.isub_u(value, 1)
        } else {
            value
        };

        self.set_raw(b, field, raw);
    }

    /// Merge all pending writes and return the packed descriptor
    pub fn materialize<B>(&mut self, b: &mut B) -> V
    where
        B: Builder<Value = V>,
    {
        self.view.materialize(b)
    }
}

/// Blend mode applied on top of the xy filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexFilterMode {
    /// Use the xy filter
    Blend = 0,
    Min = 1,
    Max = 2,
}

/// Magnification / minification filter encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XyFilter {
    Point = 0,
    Linear = 1,
    AnisotropicPoint = 2,
    AnisotropicLinear = 3,
}

/// Typed accessor for a sampler descriptor
#[derive(Debug, Clone)]
pub struct SamplerDescriptor<V> {
    generation: Generation,
    view: FieldView<V, SAMPLER_DESC_WORDS>,
}

impl<V: Copy> SamplerDescriptor<V> {
    pub fn bind(generation: Generation, words: V) -> Self {
        Self {
            generation,
            view: FieldView::bind(words),
        }
    }

    pub fn get<B>(&mut self, b: &mut B, field: SamplerField) -> V
    where
        B: Builder<Value = V>,
    {
        let spec = self.generation.sampler_field_spec(field);
        self.view.get(b, spec)
    }

    pub fn set<B>(&mut self, b: &mut B, field: SamplerField, value: V)
    where
        B: Builder<Value = V>,
    {
        let spec = self.generation.sampler_field_spec(field);
        self.view.set(b, spec, value);
    }

    pub fn set_filter_mode<B>(&mut self, b: &mut B, mode: TexFilterMode)
    where
        B: Builder<Value = V>,
    {
        let mode = b.const_u32(mode as u32);
        self.set(b, SamplerField::FilterMode, mode);
    }

    pub fn set_xy_filter<B>(&mut self, b: &mut B, filter: XyFilter)
    where
        B: Builder<Value = V>,
    {
        let filter = b.const_u32(filter as u32);
        self.set(b, SamplerField::XYMagFilter, filter);
        self.set(b, SamplerField::XYMinFilter, filter);
    }

    pub fn materialize<B>(&mut self, b: &mut B) -> V
    where
        B: Builder<Value = V>,
    {
        self.view.materialize(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::interp::{FetchRecord, Interpreter, TexelFetch, Value};

    fn interp() -> Interpreter<impl TexelFetch> {
        Interpreter::new(|_: &FetchRecord| [0.0; 4])
    }

    #[test]
    fn raw_fields_round_trip() {
        for generation in Generation::variants() {
            for spec in generation.image_field_specs().filter(|s| !s.is_full_word()) {
                for fill in [0, u32::MAX] {
                    for v in [0, 1, 0xAAAA_AAAA, u32::MAX] {
                        let mut b = interp();
                        let mut view = FieldView::<Value, 8>::bind(Value::u32_vec(&[fill; 8]));

                        let value = b.const_u32(v);
                        view.set(&mut b, spec, value);

                        assert_eq!(
                            view.get(&mut b, spec).as_u32(),
                            &[v & spec.value_mask()],
                            "{generation:?} {spec:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn width_bias_round_trips() {
        for generation in Generation::variants() {
            for fill in [0, u32::MAX] {
                let mut b = interp();
                let mut desc = ImageDescriptor::bind(generation, Value::u32_vec(&[fill; 8]));

                for w in 1..=(1u32 << 14) {
                    let value = b.const_u32(w);
                    desc.set(&mut b, ImageField::Width, value);

                    assert_eq!(desc.get(&mut b, ImageField::Width).as_u32(), &[w]);
                }
            }
        }
    }

    #[test]
    fn height_and_pitch_are_biased() {
        let mut b = interp();
        let mut desc = ImageDescriptor::bind(Generation::GenA, Value::u32_vec(&[0; 8]));

        let h = b.const_u32(1080);
        let p = b.const_u32(2048);
        desc.set(&mut b, ImageField::Height, h);
        desc.set(&mut b, ImageField::Pitch, p);

        let words = desc.materialize(&mut b);
        assert_eq!(words.as_u32()[2] >> 14, 1079);
        assert_eq!((words.as_u32()[4] >> 13) & 0xFFF, 2047);
    }

    #[test]
    fn split_width_lands_in_both_words() {
        let mut b = interp();
        let mut desc = ImageDescriptor::bind(Generation::GenB, Value::u32_vec(&[0; 8]));

        // stored value 0b101101 -> lo = 0b01, hi = 0b1011
        let w = b.const_u32(0b101101 + 1);
        desc.set(&mut b, ImageField::Width, w);

        let words = desc.materialize(&mut b);
        assert_eq!(words.as_u32()[1] >> 30, 0b01);
        assert_eq!(words.as_u32()[2] & 0x3FFF, 0b1011);
    }

    #[test]
    fn get_after_set_sees_new_value() {
        let mut b = interp();
        let mut desc = ImageDescriptor::bind(Generation::GenA, Value::u32_vec(&[0x10, 0, 0, 0, 0, 0, 0, 0]));

        assert_eq!(desc.get(&mut b, ImageField::BaseAddress).as_u32(), &[0x10]);

        let v = b.const_u32(0x20);
        desc.set(&mut b, ImageField::BaseAddress, v);
        assert_eq!(desc.get(&mut b, ImageField::BaseAddress).as_u32(), &[0x20]);
    }

    #[test]
    fn cached_fields_are_not_reextracted() {
        let mut b = interp();
        let mut desc = ImageDescriptor::bind(Generation::GenA, Value::u32_vec(&[0; 8]));

        desc.get(&mut b, ImageField::Format);
        let ops = b.op_count();
        desc.get(&mut b, ImageField::Format);

        assert_eq!(ops, b.op_count());
    }

    #[test]
    fn is_tile_opt_reads_as_bool() {
        let mut b = interp();
        let mut words = [0; 8];
        words[3] = 2 << 20;
        let mut desc = ImageDescriptor::bind(Generation::GenA, Value::u32_vec(&words));

        assert_eq!(desc.get(&mut b, ImageField::IsTileOpt).as_bool(), &[true]);
    }

    #[test]
    #[should_panic(expected = "read-only")]
    fn is_tile_opt_cannot_be_set() {
        let mut b = interp();
        let mut desc = ImageDescriptor::bind(Generation::GenA, Value::u32_vec(&[0; 8]));

        let v = b.const_u32(1);
        desc.set(&mut b, ImageField::IsTileOpt, v);
    }

    #[test]
    #[should_panic(expected = "not present")]
    fn gen_b_has_no_pitch() {
        let mut b = interp();
        let mut desc = ImageDescriptor::bind(Generation::GenB, Value::u32_vec(&[0; 8]));

        desc.get(&mut b, ImageField::Pitch);
    }

    #[test]
    fn sampler_filters() {
        let mut b = interp();
        let mut desc = SamplerDescriptor::bind(Generation::GenA, Value::u32_vec(&[u32::MAX; 4]));

        desc.set_filter_mode(&mut b, TexFilterMode::Blend);
        desc.set_xy_filter(&mut b, XyFilter::Linear);

        let words = desc.materialize(&mut b);
        assert_eq!(words.as_u32()[0] >> 30, 0);
        assert_eq!((words.as_u32()[2] >> 20) & 0xF, 0b0101);
        assert_eq!(words.as_u32()[1], u32::MAX);
    }
}
