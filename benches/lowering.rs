use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use ycbcr_sampler::builder::interp::{FetchRecord, Interpreter, Value};
use ycbcr_sampler::{
    Builder, ColorModel, Filter, Generation, PlaneCount, SampleInfo, Subsampling, YCbCrConversionParams,
    lower_ycbcr_sample,
};

const IMAGE_WIDTH: u32 = 1920;
const IMAGE_HEIGHT: u32 = 1080;

fn sample_info() -> SampleInfo<Value> {
    let mut image = [0u32; 8];
    image[0] = 0x1000;
    image[2] = (IMAGE_WIDTH - 1) | ((IMAGE_HEIGHT - 1) << 14);
    image[4] = (2048 - 1) << 13;

    SampleInfo {
        dim: 1,
        flags: 0,
        image: Value::u32_vec(&image),
        sampler: Value::u32_vec(&[0; 4]),
        extra_address: Vec::new(),
        is_sample: true,
    }
}

fn do_lower(params: &YCbCrConversionParams, info: &SampleInfo<Value>) -> Value {
    let mut b = Interpreter::new(|record: &FetchRecord| [record.coords[0], 0.5, record.coords[1], 1.0]);

    let s = b.const_f32(0.3);
    let t = b.const_f32(0.7);

    lower_ycbcr_sample(&mut b, black_box(params), Generation::GenA, info, s, t)
}

fn run_benchmarks(c: &mut Criterion) {
    let info = sample_info();

    let nv12 = YCbCrConversionParams::default();

    let cases = [
        ("NV12 implicit", nv12.clone()),
        (
            "NV12 direct",
            YCbCrConversionParams {
                force_explicit_reconstruct: true,
                ..nv12.clone()
            },
        ),
        (
            "NV12 nearest quad",
            YCbCrConversionParams {
                luma_filter: Filter::Linear,
                force_explicit_reconstruct: true,
                ..nv12.clone()
            },
        ),
        (
            "I422 linear x",
            YCbCrConversionParams {
                planes: PlaneCount::Three,
                subsampling: Subsampling::X,
                chroma_filter: Filter::Linear,
                force_explicit_reconstruct: true,
                ..nv12.clone()
            },
        ),
        (
            "I420 linear xy nested",
            YCbCrConversionParams {
                planes: PlaneCount::Three,
                luma_filter: Filter::Linear,
                chroma_filter: Filter::Linear,
                force_explicit_reconstruct: true,
                model: ColorModel::BT2020,
                ..nv12.clone()
            },
        ),
    ];

    for (name, params) in &cases {
        c.bench_function(&format!("lower {name}"), |b| {
            b.iter(|| {
                black_box(do_lower(params, &info));
            })
        });
    }
}

criterion_group!(benches, run_benchmarks);
criterion_main!(benches);
