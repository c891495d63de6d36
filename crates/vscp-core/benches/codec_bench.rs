//! Criterion benchmarks for the VSCP event codecs.
//!
//! Measures frame encode/decode and JSON record transcription for empty,
//! typical, and maximum-size payloads.
//!
//! Run with:
//! ```bash
//! cargo bench --package vscp-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vscp_core::protocol::constants::MAX_DATA;
use vscp_core::{decode_event, encode_event, Event};

// ── Event fixtures ────────────────────────────────────────────────────────────

fn make_event(payload_len: usize) -> Event {
    let mut event = Event::new(10, 6)
        .with_guid(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0x00, 0x16])
        .with_payload(vec![0x5A; payload_len]);
    event.set_priority(3);
    event.set_current_time();
    event
}

fn fixtures() -> Vec<(&'static str, Event)> {
    vec![
        ("empty", make_event(0)),
        ("typical_8", make_event(8)),
        ("max_512", make_event(MAX_DATA)),
    ]
}

fn bench_frame_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_event");
    for (name, event) in fixtures() {
        group.bench_with_input(BenchmarkId::new("payload", name), &event, |b, event| {
            b.iter(|| encode_event(black_box(event)).expect("encode must succeed"))
        });
    }
    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_event");
    for (name, event) in fixtures() {
        let bytes = encode_event(&event).expect("encode must succeed for benchmark setup");
        group.bench_with_input(BenchmarkId::new("payload", name), &bytes, |b, bytes| {
            b.iter(|| decode_event(black_box(bytes)).expect("decode must succeed"))
        });
    }
    group.finish();
}

/// The JSON record is the persistence path; it is expected to be far slower
/// than the frame and is tracked so regressions stay visible.
fn bench_json_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_record_roundtrip");
    for (name, event) in fixtures() {
        group.bench_with_input(BenchmarkId::new("payload", name), &event, |b, event| {
            b.iter(|| {
                let json = black_box(event).to_json().expect("serialize");
                Event::from_json(black_box(&json)).expect("deserialize")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frame_encode, bench_frame_decode, bench_json_record);
criterion_main!(benches);
