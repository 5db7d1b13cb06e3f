use crate::Builder;
use crate::params::{BitDepth, ColorRange};

/// `2^(n-1) / (2^n - 1)`, the encoded value of a zero chroma sample at full range
pub fn full_range_bias(bits: BitDepth) -> f32 {
    let n = bits.bits();
    (f64::from(1u32 << (n - 1)) / f64::from((1u32 << n) - 1)) as f32
}

/// `(2^n - 1) / (224 * 2^(n-8))` for chroma, `(2^n - 1) / (219 * 2^(n-8))` for luma
pub fn narrow_range_gain(bits: BitDepth, chroma: bool) -> f32 {
    let n = bits.bits();
    let excursion = if chroma { 224 } else { 219 };

    (f64::from((1u32 << n) - 1) / f64::from(excursion * (1u32 << (n - 8)))) as f32
}

/// `128 * 2^(n-8) / (224 * 2^(n-8))` for chroma, `16 * 2^(n-8) / (219 * 2^(n-8))` for luma
pub fn narrow_range_offset(bits: BitDepth, chroma: bool) -> f32 {
    let n = bits.bits();
    let (zero, excursion) = if chroma { (128, 224) } else { (16, 219) };
    let scale = 1u32 << (n - 8);

    (f64::from(zero * scale) / f64::from(excursion * scale)) as f32
}

/// Constants of `expanded = encoded * scale - bias` for (Cr, Y, Cb)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeExpansion {
    pub scale: Option<[f32; 3]>,
    pub bias: [f32; 3],
}

impl RangeExpansion {
    pub fn new(range: ColorRange, bits: [BitDepth; 3]) -> Self {
        let [cr, y, cb] = bits;

        match range {
            ColorRange::Full => Self {
                scale: None,
                bias: [full_range_bias(cr), 0.0, full_range_bias(cb)],
            },
            ColorRange::Narrow => Self {
                scale: Some([
                    narrow_range_gain(cr, true),
                    narrow_range_gain(y, false),
                    narrow_range_gain(cb, true),
                ]),
                bias: [
                    narrow_range_offset(cr, true),
                    narrow_range_offset(y, false),
                    narrow_range_offset(cb, true),
                ],
            },
        }
    }

    /// Expand a 3 lane (Cr, Y, Cb) sample
    pub fn emit<B: Builder>(&self, b: &mut B, sample: B::Value) -> B::Value {
        let scaled = match self.scale {
            Some(scale) => {
                let scale = b.const_f32_vec(&scale);
                b.fmul(sample, scale)
            }
            None => sample,
        };

        let bias = b.const_f32_vec(&self.bias);
        b.fsub(scaled, bias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_8bit() {
        let e = RangeExpansion::new(ColorRange::Full, [BitDepth::B8; 3]);

        assert_eq!(e.scale, None);
        assert!((e.bias[0] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(e.bias[1], 0.0);
        assert!((e.bias[2] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn narrow_range_8bit() {
        let e = RangeExpansion::new(ColorRange::Narrow, [BitDepth::B8; 3]);
        let scale = e.scale.unwrap();

        assert!((scale[0] - 255.0 / 224.0).abs() < 1e-6);
        assert!((scale[1] - 255.0 / 219.0).abs() < 1e-6);
        assert!((scale[2] - 255.0 / 224.0).abs() < 1e-6);

        assert!((e.bias[0] - 128.0 / 224.0).abs() < 1e-6);
        assert!((e.bias[1] - 16.0 / 219.0).abs() < 1e-6);
        assert!((e.bias[2] - 128.0 / 224.0).abs() < 1e-6);
    }

    #[test]
    fn narrow_range_10bit() {
        assert!((narrow_range_gain(BitDepth::B10, false) - 1023.0 / (219.0 * 4.0)).abs() < 1e-6);
        assert!((narrow_range_offset(BitDepth::B10, true) - 512.0 / 896.0).abs() < 1e-6);
    }

    #[test]
    fn narrow_range_maps_reference_levels() {
        let gain = narrow_range_gain(BitDepth::B8, false);
        let offset = narrow_range_offset(BitDepth::B8, false);

        let black = (16.0 / 255.0) * gain - offset;
        let white = (235.0 / 255.0) * gain - offset;

        assert!(black.abs() < 1e-6);
        assert!((white - 1.0).abs() < 1e-6);
    }

    #[test]
    fn full_range_16bit() {
        assert!((full_range_bias(BitDepth::B16) - 32768.0 / 65535.0).abs() < 1e-6);
    }
}
