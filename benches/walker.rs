//! Benchmarks for instruction decoding and control flow discovery.
//!
//! Uses a synthetic image of small functions, each loading constants, touching memory
//! through `IX` and calling the next function, so that every handler family is exercised.

extern crate z80scope;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use z80scope::{
    disassembler::{decode_instruction, DecodeContext, DecompileWalker, WalkerOptions},
    Parser,
};

const LOAD_ADDRESS: u16 = 0x8000;

/// Build `count` chained functions.
fn synthetic_image(count: u16) -> Vec<u8> {
    let mut image = Vec::new();
    for index in 0..count {
        let next = LOAD_ADDRESS.wrapping_add(((index + 1) * 20) % (count * 20));
        image.extend_from_slice(&[
            0x3E, 0x2A, // LD A, $2A
            0xDD, 0x21, 0x00, 0xC0, // LD IX, $C000
            0xDD, 0x77, 0x05, // LD (IX+$05), A
            0xCB, 0x47, // BIT 0, A
            0x28, 0x02, // JR Z, +2
            0xED, 0x44, // NEG
            0xCD, // CALL next
        ]);
        image.extend_from_slice(&next.to_le_bytes());
        image.extend_from_slice(&[0xC9, 0x00]); // RET ; padding
    }
    image
}

/// Benchmark decoding the image linearly, instruction by instruction.
fn bench_decode_linear(c: &mut Criterion) {
    let image = synthetic_image(256);

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(image.len() as u64));
    group.bench_function("decode_linear", |b| {
        b.iter(|| {
            let mut parser = Parser::new(black_box(&image));
            let mut context =
                DecodeContext::new(LOAD_ADDRESS, image.len(), WalkerOptions::default());
            let mut count = 0;
            while parser.has_more_data() {
                if decode_instruction(&mut parser, &mut context).is_err() {
                    break;
                }
                count += 1;
            }
            black_box(count)
        });
    });
    group.finish();
}

/// Benchmark a full walk followed by rendering the listing.
fn bench_walk_and_dump(c: &mut Criterion) {
    let image = synthetic_image(256);

    let mut group = c.benchmark_group("walker");
    group.throughput(Throughput::Bytes(image.len() as u64));
    group.bench_function("run", |b| {
        b.iter(|| {
            let mut walker =
                DecompileWalker::new(black_box(&image), LOAD_ADDRESS, LOAD_ADDRESS).unwrap();
            black_box(walker.run().unwrap())
        });
    });
    group.bench_function("run_and_dump", |b| {
        b.iter(|| {
            let mut walker =
                DecompileWalker::new(black_box(&image), LOAD_ADDRESS, LOAD_ADDRESS).unwrap();
            walker.run().unwrap();
            black_box(walker.dump().unwrap())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_decode_linear, bench_walk_and_dump);
criterion_main!(benches);
