//! Eager CPU backend for [`Builder`]
//!
//! Every operation is evaluated immediately, image fetches are forwarded to a [`TexelFetch`]
//! implementation and recorded so the emitted fetch sequence can be inspected afterwards.

use super::{Builder, FetchRequest};
use tracing::trace;

const MAX_LANES: usize = 8;

/// Fixed capacity vector of up to 8 lanes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lanes<T> {
    len: usize,
    data: [T; MAX_LANES],
}

impl<T: Copy + Default> Lanes<T> {
    pub fn splat(v: T) -> Self {
        Self::from_slice(&[v])
    }

    /// # Panics
    ///
    /// If `v` is empty or has more than 8 elements
    pub fn from_slice(v: &[T]) -> Self {
        assert!(
            (1..=MAX_LANES).contains(&v.len()),
            "vector must have between 1 and {MAX_LANES} lanes, got {}",
            v.len()
        );

        let mut data = [T::default(); MAX_LANES];
        data[..v.len()].copy_from_slice(v);

        Self { len: v.len(), data }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len]
    }

    fn lane(&self, i: usize) -> T {
        if self.len == 1 { self.data[0] } else { self.data[i] }
    }

    fn map<R: Copy + Default>(self, mut f: impl FnMut(T) -> R) -> Lanes<R> {
        let mut data = [R::default(); MAX_LANES];

        for (out, v) in data.iter_mut().zip(self.as_slice()) {
            *out = f(*v);
        }

        Lanes {
            len: self.len,
            data,
        }
    }

    fn zip_with<U, R>(self, other: Lanes<U>, mut f: impl FnMut(T, U) -> R) -> Lanes<R>
    where
        U: Copy + Default,
        R: Copy + Default,
    {
        let len = broadcast_len(self.len, other.len);
        let mut data = [R::default(); MAX_LANES];

        for (i, out) in data.iter_mut().enumerate().take(len) {
            *out = f(self.lane(i), other.lane(i));
        }

        Lanes { len, data }
    }
}

fn broadcast_len(a: usize, b: usize) -> usize {
    match (a, b) {
        (a, b) if a == b => a,
        (1, b) => b,
        (a, 1) => a,
        (a, b) => panic!("lane count mismatch, {a} vs {b}"),
    }
}

/// Value handle of the [`Interpreter`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U32(Lanes<u32>),
    F32(Lanes<f32>),
    Bool(Lanes<bool>),
}

impl Value {
    pub fn u32(v: u32) -> Self {
        Value::U32(Lanes::splat(v))
    }

    pub fn f32(v: f32) -> Self {
        Value::F32(Lanes::splat(v))
    }

    pub fn u32_vec(v: &[u32]) -> Self {
        Value::U32(Lanes::from_slice(v))
    }

    pub fn f32_vec(v: &[f32]) -> Self {
        Value::F32(Lanes::from_slice(v))
    }

    pub fn len(&self) -> usize {
        match self {
            Value::U32(l) => l.len(),
            Value::F32(l) => l.len(),
            Value::Bool(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Panics
    ///
    /// If the value doesn't hold u32 lanes
    pub fn as_u32(&self) -> &[u32] {
        match self {
            Value::U32(l) => l.as_slice(),
            other => panic!("expected u32 lanes, got {other:?}"),
        }
    }

    /// # Panics
    ///
    /// If the value doesn't hold f32 lanes
    pub fn as_f32(&self) -> &[f32] {
        match self {
            Value::F32(l) => l.as_slice(),
            other => panic!("expected f32 lanes, got {other:?}"),
        }
    }

    /// # Panics
    ///
    /// If the value doesn't hold bool lanes
    pub fn as_bool(&self) -> &[bool] {
        match self {
            Value::Bool(l) => l.as_slice(),
            other => panic!("expected bool lanes, got {other:?}"),
        }
    }

    fn into_u32(self, op: &str) -> Lanes<u32> {
        match self {
            Value::U32(l) => l,
            other => panic!("{op}: expected u32 operand, got {other:?}"),
        }
    }

    fn into_f32(self, op: &str) -> Lanes<f32> {
        match self {
            Value::F32(l) => l,
            other => panic!("{op}: expected f32 operand, got {other:?}"),
        }
    }

    fn into_bool(self, op: &str) -> Lanes<bool> {
        match self {
            Value::Bool(l) => l,
            other => panic!("{op}: expected bool operand, got {other:?}"),
        }
    }
}

/// Everything the texture unit would see for a single fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRecord {
    pub dim: u32,
    pub flags: u32,
    pub coords: [f32; 2],
    pub image: [u32; 8],
    pub sampler: [u32; 4],
    pub extra_address: usize,
    pub is_sample: bool,
}

/// Texel source of the [`Interpreter`]
pub trait TexelFetch {
    fn fetch(&mut self, record: &FetchRecord) -> [f32; 4];
}

impl<F> TexelFetch for F
where
    F: FnMut(&FetchRecord) -> [f32; 4],
{
    fn fetch(&mut self, record: &FetchRecord) -> [f32; 4] {
        self(record)
    }
}

/// [`Builder`] which evaluates everything on the CPU
pub struct Interpreter<F> {
    fetcher: F,
    fetches: Vec<FetchRecord>,
    ops: usize,
}

impl<F: TexelFetch> Interpreter<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            fetches: Vec::new(),
            ops: 0,
        }
    }

    /// All fetches emitted so far, in emission order
    pub fn fetches(&self) -> &[FetchRecord] {
        &self.fetches
    }

    pub fn take_fetches(&mut self) -> Vec<FetchRecord> {
        std::mem::take(&mut self.fetches)
    }

    /// Number of operations emitted so far, constants and fetches included
    pub fn op_count(&self) -> usize {
        self.ops
    }

    fn int_op(&mut self, op: &str, a: Value, b: Value, f: impl FnMut(u32, u32) -> u32) -> Value {
        self.ops += 1;
        Value::U32(a.into_u32(op).zip_with(b.into_u32(op), f))
    }

    fn float_op(&mut self, op: &str, a: Value, b: Value, f: impl FnMut(f32, f32) -> f32) -> Value {
        self.ops += 1;
        Value::F32(a.into_f32(op).zip_with(b.into_f32(op), f))
    }
}

fn to_array<const N: usize>(v: Value, what: &str) -> [u32; N] {
    let words = v.into_u32(what);
    assert_eq!(words.len(), N, "{what} must have {N} words");

    let mut out = [0; N];
    out.copy_from_slice(words.as_slice());
    out
}

impl<F: TexelFetch> Builder for Interpreter<F> {
    type Value = Value;

    fn const_u32(&mut self, v: u32) -> Value {
        self.ops += 1;
        Value::u32(v)
    }

    fn const_f32(&mut self, v: f32) -> Value {
        self.ops += 1;
        Value::f32(v)
    }

    fn const_u32_vec(&mut self, v: &[u32]) -> Value {
        self.ops += 1;
        Value::u32_vec(v)
    }

    fn const_f32_vec(&mut self, v: &[f32]) -> Value {
        self.ops += 1;
        Value::f32_vec(v)
    }

    fn iadd(&mut self, a: Value, b: Value) -> Value {
        self.int_op("iadd", a, b, u32::wrapping_add)
    }

    fn isub(&mut self, a: Value, b: Value) -> Value {
        self.int_op("isub", a, b, u32::wrapping_sub)
    }

    fn imul(&mut self, a: Value, b: Value) -> Value {
        self.int_op("imul", a, b, u32::wrapping_mul)
    }

    fn shl(&mut self, a: Value, b: Value) -> Value {
        self.int_op("shl", a, b, |a, b| a.checked_shl(b).unwrap_or(0))
    }

    fn lshr(&mut self, a: Value, b: Value) -> Value {
        self.int_op("lshr", a, b, |a, b| a.checked_shr(b).unwrap_or(0))
    }

    fn and(&mut self, a: Value, b: Value) -> Value {
        self.int_op("and", a, b, |a, b| a & b)
    }

    fn or(&mut self, a: Value, b: Value) -> Value {
        self.int_op("or", a, b, |a, b| a | b)
    }

    fn srem(&mut self, a: Value, b: Value) -> Value {
        self.int_op("srem", a, b, |a, b| (a as i32).wrapping_rem(b as i32) as u32)
    }

    fn icmp_eq(&mut self, a: Value, b: Value) -> Value {
        self.ops += 1;
        Value::Bool(a.into_u32("icmp_eq").zip_with(b.into_u32("icmp_eq"), |a, b| a == b))
    }

    fn icmp_ne(&mut self, a: Value, b: Value) -> Value {
        self.ops += 1;
        Value::Bool(a.into_u32("icmp_ne").zip_with(b.into_u32("icmp_ne"), |a, b| a != b))
    }

    fn ubfe(&mut self, v: Value, offset: u32, width: u32) -> Value {
        assert!(offset + width <= 32, "bit range {offset}+{width} exceeds 32 bits");

        self.ops += 1;
        let mask = if width == 32 { u32::MAX } else { (1 << width) - 1 };
        Value::U32(v.into_u32("ubfe").map(|v| (v >> offset) & mask))
    }

    fn select(&mut self, cond: Value, a: Value, b: Value) -> Value {
        self.ops += 1;
        let cond = cond.into_bool("select");

        match (a, b) {
            (Value::U32(a), Value::U32(b)) => {
                let picked = cond.zip_with(a, |c, a| (c, a)).zip_with(b, |(c, a), b| if c { a } else { b });
                Value::U32(picked)
            }
            (Value::F32(a), Value::F32(b)) => {
                let picked = cond.zip_with(a, |c, a| (c, a)).zip_with(b, |(c, a), b| if c { a } else { b });
                Value::F32(picked)
            }
            (Value::Bool(a), Value::Bool(b)) => {
                let picked = cond.zip_with(a, |c, a| (c, a)).zip_with(b, |(c, a), b| if c { a } else { b });
                Value::Bool(picked)
            }
            (a, b) => panic!("select: operand types differ, {a:?} vs {b:?}"),
        }
    }

    fn uitofp(&mut self, v: Value) -> Value {
        self.ops += 1;
        Value::F32(v.into_u32("uitofp").map(|v| v as f32))
    }

    fn fptosi(&mut self, v: Value) -> Value {
        self.ops += 1;
        Value::U32(v.into_f32("fptosi").map(|v| v as i32 as u32))
    }

    fn fadd(&mut self, a: Value, b: Value) -> Value {
        self.float_op("fadd", a, b, |a, b| a + b)
    }

    fn fsub(&mut self, a: Value, b: Value) -> Value {
        self.float_op("fsub", a, b, |a, b| a - b)
    }

    fn fmul(&mut self, a: Value, b: Value) -> Value {
        self.float_op("fmul", a, b, |a, b| a * b)
    }

    fn fdiv(&mut self, a: Value, b: Value) -> Value {
        self.float_op("fdiv", a, b, |a, b| a / b)
    }

    fn floor(&mut self, v: Value) -> Value {
        self.ops += 1;
        Value::F32(v.into_f32("floor").map(f32::floor))
    }

    fn fclamp(&mut self, v: Value, min: Value, max: Value) -> Value {
        self.ops += 1;
        let v = v.into_f32("fclamp");
        let clamped = v
            .zip_with(min.into_f32("fclamp"), f32::max)
            .zip_with(max.into_f32("fclamp"), f32::min);
        Value::F32(clamped)
    }

    fn fmix(&mut self, a: Value, b: Value, t: Value) -> Value {
        self.ops += 1;
        let a = a.into_f32("fmix");
        let mixed = a
            .zip_with(b.into_f32("fmix"), |a, b| (a, b))
            .zip_with(t.into_f32("fmix"), |(a, b), t| a + (b - a) * t);
        Value::F32(mixed)
    }

    fn dot(&mut self, a: Value, b: Value) -> Value {
        self.ops += 1;
        let (a, b) = (a.into_f32("dot"), b.into_f32("dot"));
        assert_eq!(a.len(), b.len(), "dot: operands must have the same lane count");

        let mut acc = a.as_slice()[0] * b.as_slice()[0];
        for (a, b) in a.as_slice().iter().zip(b.as_slice()).skip(1) {
            acc += a * b;
        }

        Value::f32(acc)
    }

    fn extract(&mut self, v: Value, lane: usize) -> Value {
        self.ops += 1;
        assert!(lane < v.len(), "extract: lane {lane} out of range for {v:?}");

        match v {
            Value::U32(l) => Value::U32(Lanes::splat(l.data[lane])),
            Value::F32(l) => Value::F32(Lanes::splat(l.data[lane])),
            Value::Bool(l) => Value::Bool(Lanes::splat(l.data[lane])),
        }
    }

    fn insert(&mut self, v: Value, elem: Value, lane: usize) -> Value {
        self.ops += 1;
        assert!(lane < v.len(), "insert: lane {lane} out of range for {v:?}");
        assert_eq!(elem.len(), 1, "insert: element must be a scalar");

        match (v, elem) {
            (Value::U32(mut l), Value::U32(e)) => {
                l.data[lane] = e.data[0];
                Value::U32(l)
            }
            (Value::F32(mut l), Value::F32(e)) => {
                l.data[lane] = e.data[0];
                Value::F32(l)
            }
            (Value::Bool(mut l), Value::Bool(e)) => {
                l.data[lane] = e.data[0];
                Value::Bool(l)
            }
            (v, e) => panic!("insert: element {e:?} doesn't match vector {v:?}"),
        }
    }

    fn shuffle(&mut self, a: Value, b: Value, lanes: &[usize]) -> Value {
        self.ops += 1;

        fn pick<T: Copy + Default>(a: Lanes<T>, b: Lanes<T>, lanes: &[usize]) -> Lanes<T> {
            let concat: Vec<T> = a.as_slice().iter().chain(b.as_slice()).copied().collect();
            let picked: Vec<T> = lanes
                .iter()
                .map(|&i| {
                    assert!(i < concat.len(), "shuffle: lane {i} out of range");
                    concat[i]
                })
                .collect();
            Lanes::from_slice(&picked)
        }

        match (a, b) {
            (Value::U32(a), Value::U32(b)) => Value::U32(pick(a, b, lanes)),
            (Value::F32(a), Value::F32(b)) => Value::F32(pick(a, b, lanes)),
            (Value::Bool(a), Value::Bool(b)) => Value::Bool(pick(a, b, lanes)),
            (a, b) => panic!("shuffle: operand types differ, {a:?} vs {b:?}"),
        }
    }

    fn compose(&mut self, lanes: &[Value]) -> Value {
        self.ops += 1;
        assert!(!lanes.is_empty(), "compose: no lanes given");

        match lanes[0] {
            Value::U32(_) => {
                let v: Vec<u32> = lanes.iter().map(|l| l.into_u32("compose").data[0]).collect();
                Value::u32_vec(&v)
            }
            Value::F32(_) => {
                let v: Vec<f32> = lanes.iter().map(|l| l.into_f32("compose").data[0]).collect();
                Value::f32_vec(&v)
            }
            Value::Bool(_) => {
                let v: Vec<bool> = lanes.iter().map(|l| l.into_bool("compose").data[0]).collect();
                Value::Bool(Lanes::from_slice(&v))
            }
        }
    }

    fn image_fetch(&mut self, request: FetchRequest<'_, Value>) -> Value {
        self.ops += 1;

        let coords = request.coords.into_f32("image_fetch");
        assert_eq!(coords.len(), 2, "image_fetch: expected 2 coordinates");

        let record = FetchRecord {
            dim: request.info.dim,
            flags: request.info.flags,
            coords: [coords.data[0], coords.data[1]],
            image: to_array(request.image, "image descriptor"),
            sampler: to_array(request.sampler, "sampler descriptor"),
            extra_address: request.info.extra_address.len(),
            is_sample: request.info.is_sample,
        };

        trace!(
            s = record.coords[0],
            t = record.coords[1],
            base = record.image[0],
            "image fetch"
        );

        let texel = self.fetcher.fetch(&record);
        self.fetches.push(record);

        Value::f32_vec(&texel)
    }
}
