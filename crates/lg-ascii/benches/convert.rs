use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lg_ascii::Converter;
use lg_ascii::markup::render_html;
use lg_core::config::{ColorMode, ConvertConfig};
use lg_core::frame::FrameBuffer;

fn gradient(width: u32, height: u32) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = ((x + y) % 256) as u8;
            fb.set_pixel(x, y, (r, g, b, 255));
        }
    }
    fb
}

fn bench_convert(c: &mut Criterion) {
    let frame = gradient(640, 360);
    let mut group = c.benchmark_group("convert_640x360_160col");

    for (name, mode) in [
        ("monochrome", ColorMode::Monochrome),
        ("truecolor", ColorMode::Truecolor),
        ("fixed_palette", ColorMode::FixedPalette),
        ("adaptive", ColorMode::Adaptive),
    ] {
        let config = ConvertConfig {
            color_mode: mode,
            histogram_eq: true,
            ..ConvertConfig::default()
        };
        let mut converter = Converter::new();
        group.bench_function(name, |b| {
            b.iter(|| converter.convert(black_box(&frame), 160, &config));
        });
    }

    // Palette reconstruite à chaque frame : pire cas vidéo.
    let config = ConvertConfig {
        color_mode: ColorMode::Adaptive,
        ..ConvertConfig::default()
    };
    let mut converter = Converter::new();
    group.bench_function("adaptive_uncached", |b| {
        b.iter(|| {
            converter.invalidate_palette();
            converter.convert(black_box(&frame), 160, &config)
        });
    });
    group.finish();
}

fn bench_markup(c: &mut Criterion) {
    let config = ConvertConfig {
        color_mode: ColorMode::Adaptive,
        brightness_as_opacity: true,
        ..ConvertConfig::default()
    };
    let Ok(result) = Converter::new().convert(&gradient(640, 360), 160, &config) else {
        return;
    };
    c.bench_function("render_html_160col", |b| {
        b.iter(|| render_html(black_box(&result)));
    });
}

criterion_group!(benches, bench_convert, bench_markup);
criterion_main!(benches);
