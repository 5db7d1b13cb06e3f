use crate::Builder;
use crate::params::ChromaLocation;

/// `mix(mix(tl, tr, alpha), mix(bl, br, alpha), beta)`
pub fn bilinear_blend<B: Builder>(
    b: &mut B,
    alpha: B::Value,
    beta: B::Value,
    tl: B::Value,
    tr: B::Value,
    bl: B::Value,
    br: B::Value,
) -> B::Value {
    let top = b.fmix(tl, tr, alpha);
    let bottom = b.fmix(bl, br, alpha);

    b.fmix(top, bottom, beta)
}

/// Interpolation weight between two chroma taps for an even or odd luma texel
pub const fn chroma_weight(location: ChromaLocation, even: bool) -> f32 {
    match (location, even) {
        (ChromaLocation::CositedEven, true) => 0.0,
        (ChromaLocation::CositedEven, false) => 0.5,
        (ChromaLocation::Midpoint, true) => 0.25,
        (ChromaLocation::Midpoint, false) => 0.75,
    }
}

/// Select the weight of [`chroma_weight`] at run time
pub fn emit_chroma_weight<B: Builder>(b: &mut B, location: ChromaLocation, is_even: B::Value) -> B::Value {
    b.select_f(
        is_even,
        chroma_weight(location, true),
        chroma_weight(location, false),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::interp::{FetchRecord, Interpreter, TexelFetch, Value};

    fn interp() -> Interpreter<impl TexelFetch> {
        Interpreter::new(|_: &FetchRecord| [0.0; 4])
    }

    #[test]
    fn weight_table() {
        assert_eq!(chroma_weight(ChromaLocation::CositedEven, true), 0.0);
        assert_eq!(chroma_weight(ChromaLocation::CositedEven, false), 0.5);
        assert_eq!(chroma_weight(ChromaLocation::Midpoint, true), 0.25);
        assert_eq!(chroma_weight(ChromaLocation::Midpoint, false), 0.75);
    }

    #[test]
    fn weight_is_selected_per_lane() {
        let mut b = interp();
        let i = b.const_u32_vec(&[0, 1, 2, 3]);
        let zero = b.const_u32(0);
        let one = b.const_u32(1);
        let odd = b.and(i, one);
        let even = b.icmp_eq(odd, zero);

        let w = emit_chroma_weight(&mut b, ChromaLocation::Midpoint, even);

        assert_eq!(w.as_f32(), &[0.25, 0.75, 0.25, 0.75]);
    }

    #[test]
    fn corners_and_center() {
        let mut b = interp();
        let tl = b.const_f32_vec(&[0.1, 1.0]);
        let tr = b.const_f32_vec(&[0.2, 2.0]);
        let bl = b.const_f32_vec(&[0.3, 3.0]);
        let br = b.const_f32_vec(&[0.4, 4.0]);

        let mut blend = |alpha: f32, beta: f32| -> Value {
            let (alpha, beta) = (Value::f32(alpha), Value::f32(beta));
            bilinear_blend(&mut b, alpha, beta, tl, tr, bl, br)
        };

        assert_eq!(blend(0.0, 0.0), tl);
        assert_eq!(blend(1.0, 0.0), tr);
        assert_eq!(blend(0.0, 1.0), bl);
        assert_eq!(blend(1.0, 1.0), br);

        let center = blend(0.5, 0.5);
        let expected = [(0.1 + 0.2 + 0.3 + 0.4) / 4.0, 2.5];
        for (c, e) in center.as_f32().iter().zip(expected) {
            assert!((c - e).abs() < 1e-6, "{center:?}");
        }
    }
}
