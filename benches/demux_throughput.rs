//! Benchmarks for index generation and packet pulling
//!
//! Runs against a synthetic interleaved file held in memory.

#[path = "../crates/rmdemux-media/tests/common/mod.rs"]
mod common;

use common::{RmfBuilder, StreamSpec};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rmdemux_media::{DemuxOptions, IndexMode, IoSource, RmDemuxer};
use std::io::Cursor;

fn synthetic_file(packets: u32) -> Vec<u8> {
    let mut builder = RmfBuilder::new()
        .stream(StreamSpec::audio(0, *b"dnet"))
        .stream(StreamSpec::video(1, *b"RV20"));
    for i in 0..packets {
        let flags = if i % 10 == 0 { 0x02 } else { 0 };
        builder = builder
            .packet(0, i * 3000, 0x02, vec![(i & 0xff) as u8; 96])
            .packet(1, i * 3000 + 1500, flags, vec![0x5a; 512]);
    }
    builder.with_index().build()
}

fn open(data: &[u8], index_mode: IndexMode) -> RmDemuxer<IoSource<Cursor<&[u8]>>> {
    let options = DemuxOptions {
        index_mode,
        ..DemuxOptions::default()
    };
    let source = IoSource::new(Cursor::new(data)).unwrap();
    RmDemuxer::open(source, options).unwrap()
}

fn bench_pull(c: &mut Criterion) {
    let mut group = c.benchmark_group("pull_packets");

    for packets in [100u32, 1000, 5000] {
        let data = synthetic_file(packets);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(packets), &data, |b, data| {
            b.iter(|| {
                let mut demuxer = open(data, IndexMode::Off);
                let mut bytes = 0usize;
                while let Some(packet) = demuxer.next_packet().unwrap() {
                    bytes += packet.len();
                }
                black_box(bytes)
            })
        });
    }

    group.finish();
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");
    let data = synthetic_file(5000);

    group.bench_function("embedded", |b| {
        b.iter(|| black_box(open(black_box(&data), IndexMode::Embedded).is_seekable()))
    });

    group.bench_function("generate", |b| {
        b.iter(|| black_box(open(black_box(&data), IndexMode::Generate).is_seekable()))
    });

    group.finish();
}

criterion_group!(benches, bench_pull, bench_index);
criterion_main!(benches);
