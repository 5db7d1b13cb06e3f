//! YCbCr conversion parameters of a single sample site

use crate::descriptor::ImageField;

#[derive(Debug, thiserror::Error)]
#[error("unsupported plane count {0}, expected 1, 2 or 3")]
pub struct UnsupportedPlaneCountError(pub u32);

#[derive(Debug, thiserror::Error)]
#[error("unsupported channel bit depth {0}, expected 8, 10, 12 or 16")]
pub struct UnsupportedBitDepthError(pub u32);

#[derive(Debug, thiserror::Error)]
#[error("invalid {kind} value {value}")]
pub struct InvalidEnumValueError {
    pub kind: &'static str,
    pub value: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("bits per pixel must be a power of two number of bytes up to 256, got {0} bits")]
pub struct UnsupportedElementSizeError(pub u32);

#[derive(Debug, thiserror::Error)]
#[error("value {value:#x} doesn't fit into the {width} bits of {field:?}")]
pub struct FieldOverflowError {
    pub field: ImageField,
    pub value: u32,
    pub width: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum InvalidConversionParams {
    #[error(transparent)]
    PlaneCount(#[from] UnsupportedPlaneCountError),
    #[error(transparent)]
    BitDepth(#[from] UnsupportedBitDepthError),
    #[error(transparent)]
    EnumValue(#[from] InvalidEnumValueError),
    #[error(transparent)]
    ElementSize(#[from] UnsupportedElementSizeError),
    #[error(transparent)]
    FieldOverflow(#[from] FieldOverflowError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlaneCount {
    /// Packed luma and chroma
    One = 1,
    /// Luma plane and interleaved CbCr plane
    Two = 2,
    /// Separate Y, Cb and Cr planes
    Three = 3,
}

impl PlaneCount {
    /// # Panics
    ///
    /// If `count` is not 1, 2 or 3
    pub fn new(count: u32) -> Self {
        match Self::try_from(count) {
            Ok(planes) => planes,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn count(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for PlaneCount {
    type Error = UnsupportedPlaneCountError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PlaneCount::One),
            2 => Ok(PlaneCount::Two),
            3 => Ok(PlaneCount::Three),
            _ => Err(UnsupportedPlaneCountError(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitDepth {
    B8 = 8,
    B10 = 10,
    B12 = 12,
    B16 = 16,
}

impl BitDepth {
    pub fn bits(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for BitDepth {
    type Error = UnsupportedBitDepthError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            8 => Ok(BitDepth::B8),
            10 => Ok(BitDepth::B10),
            12 => Ok(BitDepth::B12),
            16 => Ok(BitDepth::B16),
            _ => Err(UnsupportedBitDepthError(value)),
        }
    }
}

macro_rules! raw_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident = $raw:literal,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl TryFrom<u32> for $name {
            type Error = InvalidEnumValueError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $($raw => Ok($name::$variant),)*
                    _ => Err(InvalidEnumValueError {
                        kind: stringify!($name),
                        value,
                    }),
                }
            }
        }

        impl From<$name> for u32 {
            fn from(v: $name) -> u32 {
                match v {
                    $($name::$variant => $raw,)*
                }
            }
        }
    };
}

raw_enum! {
    /// Location of subsampled chroma samples relative to luma samples
    ChromaLocation {
        CositedEven = 0,
        Midpoint = 1,
    }
}

raw_enum! {
    Filter {
        Nearest = 0,
        Linear = 1,
    }
}

raw_enum! {
    ColorModel {
        RgbIdentity = 0,
        /// Range expansion only
        YCbCrIdentity = 1,
        /// Rec. ITU-R BT.709
        BT709 = 2,
        /// Rec. ITU-R BT.601
        BT601 = 3,
        /// Rec. ITU-R BT.2020
        BT2020 = 4,
    }
}

raw_enum! {
    ColorRange {
        /// Channels use the full numeric range
        Full = 0,
        /// Y in 16..=235, Cb/Cr in 16..=240 (scaled to the bit depth)
        Narrow = 1,
    }
}

raw_enum! {
    /// Source of one output channel
    ComponentSwizzle {
        Zero = 0,
        One = 1,
        R = 4,
        G = 5,
        B = 6,
        A = 7,
    }
}

impl ComponentSwizzle {
    pub const IDENTITY: [ComponentSwizzle; 4] = [
        ComponentSwizzle::R,
        ComponentSwizzle::G,
        ComponentSwizzle::B,
        ComponentSwizzle::A,
    ];

    /// Lane of the (Cr, Y, Cb, A) vector this swizzle reads, `None` for constants
    pub fn lane(self) -> Option<usize> {
        match self {
            ComponentSwizzle::Zero | ComponentSwizzle::One => None,
            ComponentSwizzle::R => Some(0),
            ComponentSwizzle::G => Some(1),
            ComponentSwizzle::B => Some(2),
            ComponentSwizzle::A => Some(3),
        }
    }
}

/// Which axes store chroma at half resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Subsampling {
    pub x: bool,
    pub y: bool,
}

impl Subsampling {
    /// 4:4:4
    pub const NONE: Self = Self { x: false, y: false };
    /// 4:2:2
    pub const X: Self = Self { x: true, y: false };
    /// 4:2:0
    pub const XY: Self = Self { x: true, y: true };

    pub fn any(self) -> bool {
        self.x || self.y
    }
}

/// Default destination select, (X, Y, Z, W) read from (X, Y, Z, W)
pub const IDENTITY_DST_SEL: u32 = 4 | (5 << 3) | (6 << 6) | (7 << 9);

/// Everything known at compile time about a YCbCr sample site
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct YCbCrConversionParams {
    pub planes: PlaneCount,
    /// Bit depth of the (Cr, Y, Cb) channels
    pub channel_bits: [BitDepth; 3],
    /// Storage bits of the x, y, z, w components of the plane 0 format
    pub storage_bits: [u32; 4],
    pub subsampling: Subsampling,
    pub x_chroma_offset: ChromaLocation,
    pub y_chroma_offset: ChromaLocation,
    pub luma_filter: Filter,
    pub chroma_filter: Filter,
    pub force_explicit_reconstruct: bool,
    /// The image may be tile optimal, the actual tiling is read from the descriptor
    pub tile_optimal: bool,
    pub model: ColorModel,
    pub range: ColorRange,
    /// Output (R, G, B, A) swizzle
    pub swizzle: [ComponentSwizzle; 4],
    /// Format field written into the chroma descriptors
    pub chroma_format: u32,
    /// Destination select written into 1 and 2 plane chroma descriptors
    pub chroma_dst_sel: u32,
}

impl Default for YCbCrConversionParams {
    fn default() -> Self {
        Self {
            planes: PlaneCount::Two,
            channel_bits: [BitDepth::B8; 3],
            storage_bits: [8, 8, 8, 0],
            subsampling: Subsampling::XY,
            x_chroma_offset: ChromaLocation::CositedEven,
            y_chroma_offset: ChromaLocation::CositedEven,
            luma_filter: Filter::Nearest,
            chroma_filter: Filter::Nearest,
            force_explicit_reconstruct: false,
            tile_optimal: false,
            model: ColorModel::BT709,
            range: ColorRange::Narrow,
            swizzle: ComponentSwizzle::IDENTITY,
            chroma_format: 0,
            chroma_dst_sel: IDENTITY_DST_SEL,
        }
    }
}

impl YCbCrConversionParams {
    /// Bits of one element of plane 0
    ///
    /// Packed formats hold all components in one element, planar formats only the first.
    pub fn bits_per_pixel(&self) -> u32 {
        match self.planes {
            PlaneCount::One => self.storage_bits.iter().sum(),
            PlaneCount::Two | PlaneCount::Three => self.storage_bits[0],
        }
    }

    pub fn effective_channel_bits(&self) -> u32 {
        self.storage_bits[0]
    }

    pub fn element_bytes(&self) -> u32 {
        self.bits_per_pixel() >> 3
    }

    /// Chroma is reconstructed explicitly from neighbouring texels instead of one implicit fetch
    pub fn explicit_reconstruction(&self) -> bool {
        self.force_explicit_reconstruct || !self.subsampling.any()
    }

    /// Check everything the lowering treats as an internal invariant
    pub fn validate(&self) -> Result<(), InvalidConversionParams> {
        let bpp = self.bits_per_pixel();
        let bytes = bpp >> 3;

        if bpp % 8 != 0 || !bytes.is_power_of_two() || bytes > 256 {
            return Err(UnsupportedElementSizeError(bpp).into());
        }

        if self.effective_channel_bits() < 8 {
            return Err(UnsupportedElementSizeError(self.effective_channel_bits()).into());
        }

        check_fits(ImageField::Format, self.chroma_format, 9)?;
        check_fits(ImageField::DstSelXYZW, self.chroma_dst_sel, 12)?;

        Ok(())
    }
}

fn check_fits(field: ImageField, value: u32, width: u32) -> Result<(), FieldOverflowError> {
    if value >> width != 0 {
        return Err(FieldOverflowError {
            field,
            value,
            width,
        });
    }

    Ok(())
}
