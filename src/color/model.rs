use crate::params::ColorModel;

// Coefficients are combined in f64 and rounded once
macro_rules! make_matrices {
    ($($name:ident: $kr:expr, $kb:expr;)*) => {
        $(
        pub(crate) const $name: [[f32; 3]; 3] = {
            let kr: f64 = $kr;
            let kb: f64 = $kb;
            let kg = 1.0 - kr - kb;

            [
                // Cr                                       Y    Cb
                [(2.0 - 2.0 * kr) as f32,                   1.0, 0.0                        ], // R
                [(-(2.0 - 2.0 * kr) * kr / kg) as f32,      1.0, (-(2.0 - 2.0 * kb) * kb / kg) as f32], // G
                [0.0,                                       1.0, (2.0 - 2.0 * kb) as f32    ], // B
            ]
        };
        )*
    };
}

make_matrices! {
    BT601_YCBCR_TO_RGB: 0.299, 0.114;
    BT709_YCBCR_TO_RGB: 0.2126, 0.0722;
    BT2020_YCBCR_TO_RGB: 0.2627, 0.0593;
}

impl ColorModel {
    /// Rows producing (R, G, B) from a range expanded (Cr, Y, Cb) vector
    pub fn ycbcr_to_rgb(self) -> Option<&'static [[f32; 3]; 3]> {
        match self {
            ColorModel::RgbIdentity | ColorModel::YCbCrIdentity => None,
            ColorModel::BT601 => Some(&BT601_YCBCR_TO_RGB),
            ColorModel::BT709 => Some(&BT709_YCBCR_TO_RGB),
            ColorModel::BT2020 => Some(&BT2020_YCBCR_TO_RGB),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    fn assert_close(a: f32, b: f64) {
        assert!((f64::from(a) - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn bt601_rows() {
        let m = BT601_YCBCR_TO_RGB;

        assert_close(m[0][0], 1.402);
        assert_close(m[1][0], -0.419198 / 0.587);
        assert_close(m[1][2], -0.202008 / 0.587);
        assert_close(m[2][2], 1.772);
    }

    #[test]
    fn bt709_rows() {
        let m = BT709_YCBCR_TO_RGB;

        assert_close(m[0][0], 1.5748);
        assert_close(m[1][0], -0.33480248 / 0.7152);
        assert_close(m[1][2], -0.13397432 / 0.7152);
        assert_close(m[2][2], 1.8556);
    }

    #[test]
    fn bt2020_rows() {
        let m = BT2020_YCBCR_TO_RGB;

        assert_close(m[0][0], 1.4746);
        assert_close(m[1][0], -0.38737742 / 0.6780);
        assert_close(m[1][2], -0.11156702 / 0.6780);
        assert_close(m[2][2], 1.8814);
    }

    /// Every matrix must be the inverse of the forward RGB -> (Cr, Y, Cb) transform
    #[test]
    fn inverse_of_forward_transform() {
        for (model, kr, kb) in [
            (ColorModel::BT601, 0.299, 0.114),
            (ColorModel::BT709, 0.2126, 0.0722),
            (ColorModel::BT2020, 0.2627, 0.0593),
        ] {
            let kg: f64 = 1.0 - kr - kb;

            #[rustfmt::skip]
            let forward = Matrix3::new(
                0.5,                       -0.5 * kg / (1.0 - kr), -0.5 * kb / (1.0 - kr), // Cr
                kr,                        kg,                     kb,                     // Y
                -0.5 * kr / (1.0 - kb),    -0.5 * kg / (1.0 - kb), 0.5,                    // Cb
            );

            let inverse = forward.try_inverse().unwrap();
            let m = model.ycbcr_to_rgb().unwrap();

            for row in 0..3 {
                for col in 0..3 {
                    assert!(
                        (f64::from(m[row][col]) - inverse[(row, col)]).abs() < 1e-5,
                        "{model:?} [{row}][{col}] {} != {}",
                        m[row][col],
                        inverse[(row, col)]
                    );
                }
            }
        }
    }

    #[test]
    fn identity_models_have_no_matrix() {
        assert!(ColorModel::RgbIdentity.ycbcr_to_rgb().is_none());
        assert!(ColorModel::YCbCrIdentity.ycbcr_to_rgb().is_none());
    }
}
