use criterion::{black_box, criterion_group, criterion_main, Criterion};

use plcwire::prelude::*;
use plcwire::protocols::cbus::{CBusCommand, CBusOptions, RequestCommand};
use plcwire::BitParser;

const COMMAND: &[u8] = &[0x05, 0x38, 0x00, 0x79, 0x05];
const FRAME: &[u8] = b"\\053800790545g\r";

fn bit_bench(c: &mut Criterion) {
    c.bench_function("bitparser_read_3_5", |b| {
        b.iter(|| {
            let mut p = BitParser::new(black_box(COMMAND));
            while p.has_more(8) {
                black_box(p.read_u8("hi", 3).unwrap());
                black_box(p.read_u8("lo", 5).unwrap());
            }
        })
    });
}

fn command_bench(c: &mut Criterion) {
    c.bench_function("cbus_command_decode", |b| {
        b.iter(|| black_box(CBusCommand::try_decode(black_box(COMMAND)).unwrap()))
    });
}

fn request_bench(c: &mut Criterion) {
    let options = CBusOptions {
        srchk: true,
        ..CBusOptions::default()
    };
    c.bench_function("cbus_request_decode", |b| {
        b.iter(|| black_box(RequestCommand::try_decode_with(black_box(FRAME), options).unwrap()))
    });
}

criterion_group! {
    name = parser_benches;
    config = Criterion::default();
    targets = bit_bench, command_bench, request_bench
}

criterion_main!(parser_benches);
