use std::fmt::Debug;

pub mod interp;

/// Static information of the sample instruction being lowered
///
/// Every image fetch emitted for one sample site shares these operands, only the coordinates
/// and descriptors change between fetches.
#[derive(Debug, Clone)]
pub struct SampleInfo<V> {
    /// Image dimension of the lowered instruction
    pub dim: u32,
    /// Sample flags of the lowered instruction, passed through unchanged
    pub flags: u32,
    /// Luma (plane 0) image descriptor, 8 words
    pub image: V,
    /// Sampler descriptor of the lowered instruction, 4 words
    pub sampler: V,
    /// Extra address operands (lod, bias, offsets, ..), passed through unchanged
    pub extra_address: Vec<V>,
    /// `true` for a sample, `false` for a gather
    pub is_sample: bool,
}

/// A single image fetch
///
/// The descriptors are always explicit, a request never inherits a previously used descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a, V> {
    pub info: &'a SampleInfo<V>,
    /// 2 lane float coordinates
    pub coords: V,
    pub image: V,
    pub sampler: V,
}

/// Abstraction over the IR builder used to emit the lowered sample
///
/// Implementations must not reassociate float math, results are expected to be bit exact with
/// the operation sequence emitted here. Scalar operands broadcast against vector operands.
pub trait Builder {
    /// Handle to an emitted value (scalar or vector of u32, f32 or bool lanes)
    type Value: Debug + Copy;

    fn const_u32(&mut self, v: u32) -> Self::Value;
    fn const_f32(&mut self, v: f32) -> Self::Value;
    fn const_u32_vec(&mut self, v: &[u32]) -> Self::Value;
    fn const_f32_vec(&mut self, v: &[f32]) -> Self::Value;

    fn iadd(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn isub(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn imul(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn shl(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn lshr(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn and(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn or(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    /// Signed remainder, the result has the sign of `a`
    fn srem(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn icmp_eq(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn icmp_ne(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;

    /// Unsigned extract of `width` bits starting at `offset`
    fn ubfe(&mut self, v: Self::Value, offset: u32, width: u32) -> Self::Value;

    /// Lane wise `cond ? a : b`
    fn select(&mut self, cond: Self::Value, a: Self::Value, b: Self::Value) -> Self::Value;

    fn uitofp(&mut self, v: Self::Value) -> Self::Value;
    fn fptosi(&mut self, v: Self::Value) -> Self::Value;

    fn fadd(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn fsub(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn fmul(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn fdiv(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;
    fn floor(&mut self, v: Self::Value) -> Self::Value;
    fn fclamp(&mut self, v: Self::Value, min: Self::Value, max: Self::Value) -> Self::Value;

    /// `a + (b - a) * t`
    fn fmix(&mut self, a: Self::Value, b: Self::Value, t: Self::Value) -> Self::Value;

    /// Dot product, accumulated from lane 0 upwards
    fn dot(&mut self, a: Self::Value, b: Self::Value) -> Self::Value;

    fn extract(&mut self, v: Self::Value, lane: usize) -> Self::Value;
    fn insert(&mut self, v: Self::Value, elem: Self::Value, lane: usize) -> Self::Value;

    /// Pick lanes out of the concatenation of `a` and `b`
    fn shuffle(&mut self, a: Self::Value, b: Self::Value, lanes: &[usize]) -> Self::Value;

    /// Build a vector out of scalars
    fn compose(&mut self, lanes: &[Self::Value]) -> Self::Value;

    /// Emit an image sample or gather, returns a 4 lane float vector
    fn image_fetch(&mut self, request: FetchRequest<'_, Self::Value>) -> Self::Value;

    fn fadd_f(&mut self, a: Self::Value, b: f32) -> Self::Value {
        let b = self.const_f32(b);
        self.fadd(a, b)
    }

    fn fsub_f(&mut self, a: Self::Value, b: f32) -> Self::Value {
        let b = self.const_f32(b);
        self.fsub(a, b)
    }

    fn fmul_f(&mut self, a: Self::Value, b: f32) -> Self::Value {
        let b = self.const_f32(b);
        self.fmul(a, b)
    }

    fn fdiv_f(&mut self, a: Self::Value, b: f32) -> Self::Value {
        let b = self.const_f32(b);
        self.fdiv(a, b)
    }

    fn iadd_u(&mut self, a: Self::Value, b: u32) -> Self::Value {
        let b = self.const_u32(b);
        self.iadd(a, b)
    }

    fn isub_u(&mut self, a: Self::Value, b: u32) -> Self::Value {
        let b = self.const_u32(b);
        self.isub(a, b)
    }

    fn imul_u(&mut self, a: Self::Value, b: u32) -> Self::Value {
        let b = self.const_u32(b);
        self.imul(a, b)
    }

    fn shl_u(&mut self, a: Self::Value, b: u32) -> Self::Value {
        let b = self.const_u32(b);
        self.shl(a, b)
    }

    fn lshr_u(&mut self, a: Self::Value, b: u32) -> Self::Value {
        let b = self.const_u32(b);
        self.lshr(a, b)
    }

    fn and_u(&mut self, a: Self::Value, b: u32) -> Self::Value {
        let b = self.const_u32(b);
        self.and(a, b)
    }

    /// Select between two float constants
    fn select_f(&mut self, cond: Self::Value, a: f32, b: f32) -> Self::Value {
        let a = self.const_f32(a);
        let b = self.const_f32(b);
        self.select(cond, a, b)
    }
}
