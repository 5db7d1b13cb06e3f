//! Conversion of reconstructed (Cr, Y, Cb, A) samples to RGBA

pub(crate) mod model;
pub(crate) mod range;

pub use range::{RangeExpansion, full_range_bias, narrow_range_gain, narrow_range_offset};

use crate::Builder;
use crate::params::{BitDepth, ColorModel, ColorRange};

pub(crate) mod lane_idxs {
    pub(crate) const CR: usize = 0;
    pub(crate) const Y: usize = 1;
    pub(crate) const CB: usize = 2;
    pub(crate) const A: usize = 3;
}

use lane_idxs::*;

/// Range expand the (Cr, Y, Cb) lanes and clamp them to their nominal range
fn expand_and_clamp<B: Builder>(
    b: &mut B,
    range: ColorRange,
    bits: [BitDepth; 3],
    ycbcr: B::Value,
) -> B::Value {
    let sub = b.shuffle(ycbcr, ycbcr, &[CR, Y, CB]);
    let expanded = RangeExpansion::new(range, bits).emit(b, sub);

    let min = b.const_f32_vec(&[-0.5, 0.0, -0.5]);
    let max = b.const_f32_vec(&[0.5, 1.0, 0.5]);
    b.fclamp(expanded, min, max)
}

/// Convert a 4 lane (Cr, Y, Cb, A) vector to RGBA
///
/// Every model but [`ColorModel::YCbCrIdentity`] clamps all four output lanes, alpha included,
/// to `[0, 1]`.
pub fn convert_color<B: Builder>(
    b: &mut B,
    model: ColorModel,
    range: ColorRange,
    bits: [BitDepth; 3],
    ycbcra: B::Value,
) -> B::Value {
    let converted = match model {
        ColorModel::RgbIdentity => ycbcra,
        ColorModel::YCbCrIdentity => {
            let expanded = expand_and_clamp(b, range, bits, ycbcra);
            let alpha = b.extract(ycbcra, A);

            let lanes = [
                b.extract(expanded, 0),
                b.extract(expanded, 1),
                b.extract(expanded, 2),
                alpha,
            ];

            return b.compose(&lanes);
        }
        ColorModel::BT601 | ColorModel::BT709 | ColorModel::BT2020 => {
            let Some(rows) = model.ycbcr_to_rgb() else {
                unreachable!("{model:?} has a conversion matrix")
            };

            let input = expand_and_clamp(b, range, bits, ycbcra);

            let mut lanes = [input; 4];
            for (lane, row) in lanes.iter_mut().zip(rows) {
                let row = b.const_f32_vec(row);
                *lane = b.dot(row, input);
            }
            lanes[3] = b.extract(ycbcra, A);

            b.compose(&lanes)
        }
    };

    let zero = b.const_f32(0.0);
    let one = b.const_f32(1.0);
    b.fclamp(converted, zero, one)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::interp::{FetchRecord, Interpreter, TexelFetch};

    fn interp() -> Interpreter<impl TexelFetch> {
        Interpreter::new(|_: &FetchRecord| [0.0; 4])
    }

    fn convert(model: ColorModel, range: ColorRange, ycbcra: [f32; 4]) -> Vec<f32> {
        let mut b = interp();
        let v = b.const_f32_vec(&ycbcra);
        convert_color(&mut b, model, range, [BitDepth::B8; 3], v)
            .as_f32()
            .to_vec()
    }

    #[test]
    fn rgb_identity_passes_through_clamped() {
        let out = convert(ColorModel::RgbIdentity, ColorRange::Full, [0.25, 1.5, -0.5, 0.5]);

        assert_eq!(out, [0.25, 1.0, 0.0, 0.5]);
    }

    #[test]
    fn ycbcr_identity_keeps_alpha_unclamped() {
        let out = convert(ColorModel::YCbCrIdentity, ColorRange::Full, [1.0, 0.5, 0.0, 2.0]);

        assert!((out[0] - 127.0 / 255.0).abs() < 1e-6);
        assert_eq!(out[1], 0.5);
        // -128/255 clamped to the nominal chroma range
        assert_eq!(out[2], -0.5);
        assert_eq!(out[3], 2.0);
    }

    #[test]
    fn bt709_narrow_white_and_black() {
        let white = convert(
            ColorModel::BT709,
            ColorRange::Narrow,
            [128.0 / 255.0, 235.0 / 255.0, 128.0 / 255.0, 1.0],
        );
        for c in &white[..3] {
            assert!((c - 1.0).abs() < 1e-5, "{white:?}");
        }

        let black = convert(
            ColorModel::BT709,
            ColorRange::Narrow,
            [128.0 / 255.0, 16.0 / 255.0, 128.0 / 255.0, 1.0],
        );
        for c in &black[..3] {
            assert!(c.abs() < 1e-5, "{black:?}");
        }
    }

    #[test]
    fn bt601_full_red() {
        // Full range chroma is centered on 128/255, so Cr = 0.5 + bias expands to exactly 0.5
        let bias = full_range_bias(BitDepth::B8);
        let y = 0.299;
        let cb = bias - 0.299 / 1.772;
        let cr = bias + 0.5;

        let out = convert(ColorModel::BT601, ColorRange::Full, [cr, y, cb, 1.0]);

        assert!((out[0] - 1.0).abs() < 1e-5, "{out:?}");
        assert!(out[1].abs() < 1e-5, "{out:?}");
        assert!(out[2].abs() < 1e-5, "{out:?}");
        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn alpha_is_clamped_for_matrix_models() {
        let out = convert(ColorModel::BT2020, ColorRange::Full, [0.5, 0.5, 0.5, 1.5]);

        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn matrix_output_is_clamped() {
        let out = convert(ColorModel::BT601, ColorRange::Full, [1.0, 1.0, 0.5, 1.0]);

        assert!(out.iter().all(|c| (0.0..=1.0).contains(c)), "{out:?}");
    }
}
