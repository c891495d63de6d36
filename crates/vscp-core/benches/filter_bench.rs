//! Criterion benchmarks for `EventFilter::matches`.
//!
//! Drivers run the predicate once per inbound event, so the accept-all,
//! class/type, and full-GUID cases are measured separately.
//!
//! Run with:
//! ```bash
//! cargo bench --package vscp-core --bench filter_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vscp_core::{Event, EventFilter, Guid};

fn bench_matches(c: &mut Criterion) {
    let guid = Guid::from_slice(&[0xAA; 16]);
    let event = Event::new(10, 6).with_guid(guid.as_bytes()).with_priority(2);

    let accept_all = EventFilter::default();
    let class_type = EventFilter::class_and_type(10, 6);
    let mut full = EventFilter::class_and_type(10, 6);
    full.set_priority(2);
    full.set_guid(&guid);
    let mut rejecting = EventFilter::default();
    rejecting.set_class_and_type(11, 6);

    let mut group = c.benchmark_group("filter_matches");
    group.bench_function("accept_all", |b| {
        b.iter(|| black_box(&accept_all).matches(black_box(&event)))
    });
    group.bench_function("class_and_type", |b| {
        b.iter(|| black_box(&class_type).matches(black_box(&event)))
    });
    group.bench_function("full_guid", |b| {
        b.iter(|| black_box(&full).matches(black_box(&event)))
    });
    group.bench_function("reject_on_class", |b| {
        b.iter(|| black_box(&rejecting).matches(black_box(&event)))
    });
    group.finish();
}

criterion_group!(benches, bench_matches);
criterion_main!(benches);
