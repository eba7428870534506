//! Benchmarks for report encoding and reply parsing.

use criterion::{Criterion, criterion_group, criterion_main};
use fffb_hid_common::Report;
use fffb_hid_logitech_protocol::hidpp::{
    Framing, HidppMessage, build_request, effects, negotiate::match_ping_reply,
};
use fffb_hid_logitech_protocol::ids::{BASELINE_AUTOCENTER, ff_functions};
use fffb_hid_logitech_protocol::{Force, SpringParams, amplitude_to_level, classic};
use std::hint::black_box;

fn bench_amplitude_to_level(c: &mut Criterion) {
    c.bench_function("amplitude_to_level", |b| {
        b.iter(|| {
            for amplitude in 0..=u8::MAX {
                black_box(amplitude_to_level(black_box(amplitude)));
            }
        });
    });
}

fn bench_classic_download(c: &mut Criterion) {
    let constant = Force::constant(200);
    let spring = Force::spring(SpringParams::default());

    c.bench_function("classic_download_constant", |b| {
        b.iter(|| black_box(classic::download_report(black_box(&constant))));
    });
    c.bench_function("classic_download_spring", |b| {
        b.iter(|| black_box(classic::download_report(black_box(&spring))));
    });
}

fn bench_hidpp_download_request(c: &mut Criterion) {
    let framing = Framing::for_tier(0x11, false);
    let force = Force::constant(180);

    c.bench_function("hidpp_download_request", |b| {
        b.iter(|| {
            let params = effects::force_download_params(black_box(2), black_box(&force));
            if let Ok(params) = params {
                black_box(build_request(
                    &framing,
                    0x03,
                    0x0B,
                    ff_functions::DOWNLOAD_EFFECT,
                    &params,
                ))
                .ok();
            }
        });
    });

    c.bench_function("hidpp_autocenter_params", |b| {
        b.iter(|| black_box(effects::autocenter_params(black_box(1), BASELINE_AUTOCENTER)));
    });
}

fn bench_reply_parsing(c: &mut Criterion) {
    let mut bytes = [0u8; 19];
    bytes[..6].copy_from_slice(&[0x03, 0x00, 0x1E, 0x04, 0x02, 0xAA]);
    let reply = Report::truncated(fffb_hid_common::ReportKind::Input, 0x11, &bytes);

    c.bench_function("normalize_reply", |b| {
        b.iter(|| black_box(HidppMessage::normalize(black_box(&reply))));
    });

    let msg = HidppMessage::normalize(&reply);
    c.bench_function("match_ping_reply", |b| {
        b.iter(|| black_box(match_ping_reply(black_box(&msg), 0x03, 0x0E, 0xAA)));
    });
}

criterion_group!(
    benches,
    bench_amplitude_to_level,
    bench_classic_download,
    bench_hidpp_download_request,
    bench_reply_parsing,
);

criterion_main!(benches);
