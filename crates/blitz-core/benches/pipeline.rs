//! Benchmarks for the Blitz transform pipeline.
//!
//! Run with: cargo bench -p blitz-core

use std::io::Cursor;

use blitz_core::config::LimitsConfig;
use blitz_core::exif::{self, tags, IfdMap, IfdValue};
use blitz_core::pipeline::resize::resize;
use blitz_core::pipeline::{AnchoredBox, ProcessOptions, TransformPipeline};
use blitz_core::{Anchor, OutputFormat, ResizeMode, SourceFile, TransformSettings};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat, RgbImage};

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn jpeg_fixture(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

fn camera_ifd() -> IfdMap {
    let mut map = IfdMap::default();
    map.zeroth
        .insert(tags::MAKE, IfdValue::Ascii("Canon".into()));
    map.zeroth
        .insert(tags::MODEL, IfdValue::Ascii("EOS R5".into()));
    map.exif.insert(
        tags::DATE_TIME_ORIGINAL,
        IfdValue::Ascii("2024:05:01 10:20:30".into()),
    );
    map.exif
        .insert(tags::EXPOSURE_TIME, IfdValue::Rational(vec![(1, 250)]));
    map.gps.insert(
        tags::GPS_LATITUDE,
        IfdValue::Rational(vec![(48, 1), (51, 1), (2955, 100)]),
    );
    map
}

fn benchmark_anchor_resolve(c: &mut Criterion) {
    c.bench_function("anchor_resolve_all", |b| {
        b.iter(|| {
            for anchor in Anchor::ALL {
                let placed = AnchoredBox {
                    anchor,
                    content_width: 200,
                    content_height: 100,
                    canvas_width: 1920,
                    canvas_height: 1080,
                    padding: 20,
                };
                black_box(placed.resolve());
            }
        })
    });
}

fn benchmark_exif(c: &mut Criterion) {
    let map = camera_ifd();
    let blob = exif::dump(&map).unwrap();

    c.bench_function("exif_dump", |b| b.iter(|| exif::dump(black_box(&map))));
    c.bench_function("exif_load", |b| b.iter(|| exif::load(black_box(&blob))));
}

fn benchmark_resize(c: &mut Criterion) {
    let img = gradient(1920, 1080);
    let mut settings = TransformSettings::default().resize;
    settings.enabled = true;
    settings.mode = ResizeMode::Percentage;
    settings.value = 50.0;

    c.bench_function("resize_1920x1080_half", |b| {
        b.iter(|| resize(black_box(img.clone()), &settings))
    });
}

fn benchmark_full_transform(c: &mut Criterion) {
    let source = SourceFile::new("bench.jpg", "image/jpeg", jpeg_fixture(1920, 1080));
    let pipeline = TransformPipeline::new(LimitsConfig::default(), ProcessOptions::default());

    let mut settings = TransformSettings::default();
    settings.resize.enabled = true;
    settings.resize.mode = ResizeMode::AbsoluteWidth;
    settings.resize.value = 1280.0;
    settings.watermark.enabled = true;
    settings.watermark.anchor = Anchor::BottomRight;
    settings.output.format = OutputFormat::Jpeg;
    settings.output.quality = 0.8;

    c.bench_function("transform_1920x1080_jpeg", |b| {
        b.iter(|| pipeline.run(black_box(&source), &settings))
    });
}

criterion_group!(
    benches,
    benchmark_anchor_resolve,
    benchmark_exif,
    benchmark_resize,
    benchmark_full_transform,
);
criterion_main!(benches);
