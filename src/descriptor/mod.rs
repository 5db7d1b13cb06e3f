//! Packed hardware descriptors and typed access to their bit fields

mod fields;
mod view;

pub use fields::{ImageDescriptor, ImageField, SamplerDescriptor, SamplerField, TexFilterMode, XyFilter};
pub use view::FieldView;

/// Number of words in an image descriptor
pub const IMAGE_DESC_WORDS: usize = 8;

/// Number of words in a sampler descriptor
pub const SAMPLER_DESC_WORDS: usize = 4;

/// Location of a bit field inside a packed descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub word: usize,
    pub offset: u32,
    pub width: u32,
}

impl FieldSpec {
    pub const fn new(word: usize, offset: u32, width: u32) -> Self {
        assert!(width > 0 && offset + width <= 32);

        Self {
            word,
            offset,
            width,
        }
    }

    pub const fn is_full_word(self) -> bool {
        self.width == 32
    }

    /// Mask of the field's value before shifting it into place
    pub const fn value_mask(self) -> u32 {
        if self.is_full_word() {
            u32::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// Mask of the field's bits inside its word
    pub const fn word_mask(self) -> u32 {
        self.value_mask() << self.offset
    }
}

/// Hardware generation, selects the descriptor field layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Generation {
    /// Pitch stored in the descriptor, width in a single field
    GenA,
    /// No pitch field, width split across two words
    GenB,
}

impl Generation {
    pub fn variants() -> impl Iterator<Item = Self> {
        [Generation::GenA, Generation::GenB].into_iter()
    }

    /// Whether the image descriptor of this generation carries an explicit pitch
    pub fn has_pitch(self) -> bool {
        match self {
            Generation::GenA => true,
            Generation::GenB => false,
        }
    }
}
