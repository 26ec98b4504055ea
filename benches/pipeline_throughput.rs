//! Benchmarks for the receive pipeline
//!
//! Measures the per-chunk cost of the stages a receiver runs between reads:
//! - Frame decoding from the 24-byte wire format
//! - Reassembly of frames from chunks that split frame boundaries
//! - Full session ingest (reassemble, decode, track latency, render)
//!
//! Platform: Cross-platform (synthetic frames, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gpsrx::codec;
use gpsrx::latency::{DEFAULT_WINDOW_SIZE, LatencyTracker};
use gpsrx::reassembler::StreamReassembler;
use gpsrx::test_utils::{TEST_PEER, fix_with_timestamp, fixed_clock, frames_to_bytes};
use gpsrx::{FRAME_SIZE, RenderEvent, ReceiverSession};
use std::hint::black_box;
use std::time::{Duration, UNIX_EPOCH};

const CHUNK_SIZES: [usize; 3] = [24, 1024, 16 * 1024];

fn stream_of(len: usize) -> Vec<u8> {
    let fixes: Vec<_> =
        (0..len.div_ceil(FRAME_SIZE)).map(|i| fix_with_timestamp(1000.0 + i as f64)).collect();
    frames_to_bytes(&fixes)
}

fn bench_decode(c: &mut Criterion) {
    let frame = codec::encode(&fix_with_timestamp(1_729_000_000.125));

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(FRAME_SIZE as u64));
    group.bench_function("decode", |b| b.iter(|| black_box(codec::decode(black_box(&frame)))));
    group.finish();
}

fn bench_reassembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassembly");

    for size in CHUNK_SIZES {
        let stream = stream_of(size * 4);
        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(BenchmarkId::new("append", size), &stream, |b, stream| {
            b.iter(|| {
                let mut reassembler = StreamReassembler::with_capacity(size);
                let mut frames = 0;
                // one byte short so chunks keep splitting frames
                for chunk in stream.chunks(size - 1) {
                    frames += reassembler.append(chunk).len();
                }
                black_box(frames)
            })
        });
    }

    group.finish();
}

fn bench_latency_update(c: &mut Criterion) {
    let fix = fix_with_timestamp(1000.0);
    let now = UNIX_EPOCH + Duration::from_secs_f64(1000.05);

    c.bench_function("latency_update", |b| {
        let mut tracker = LatencyTracker::new(DEFAULT_WINDOW_SIZE);
        b.iter(|| black_box(tracker.update(black_box(&fix), now)))
    });
}

fn bench_session_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_ingest");

    for size in CHUNK_SIZES {
        let stream = stream_of(size);
        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &stream, |b, stream| {
            let mut session = ReceiverSession::with_clock(DEFAULT_WINDOW_SIZE, fixed_clock(2000.0));
            session.on_connected(TEST_PEER);
            let mut sink = |event: &RenderEvent| {
                black_box(event);
            };

            b.iter(|| black_box(session.ingest(black_box(stream), &mut sink)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_decode,
    bench_reassembly,
    bench_latency_update,
    bench_session_ingest
);
criterion_main!(benches);
