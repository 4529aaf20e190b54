//! Benchmarks for the per-message hot path: classification and header
//! decoding.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mailsweep::address::parse_sender;
use mailsweep::classify::is_promotional;
use mailsweep::decode::decode_header;

fn bench_classify(c: &mut Criterion) {
    let subject = "Last chance: 50% off everything, this weekend only";
    let sender = "newsletter@shop.example";

    c.bench_function("classify_keyword_hit", |bench| {
        bench.iter(|| {
            black_box(is_promotional(
                black_box(subject),
                black_box(sender),
                None,
                false,
            ))
        })
    });

    let quiet_subject = "notes from thursday";
    let quiet_sender = "alice@friend.example";

    c.bench_function("classify_keyword_miss", |bench| {
        bench.iter(|| {
            black_box(is_promotional(
                black_box(quiet_subject),
                black_box(quiet_sender),
                None,
                false,
            ))
        })
    });
}

fn bench_decode(c: &mut Criterion) {
    let encoded = "=?UTF-8?B?U3BlY2lhbCBvZmZlciBqdXN0IGZvciB5b3U=?=";

    c.bench_function("decode_encoded_word", |bench| {
        bench.iter(|| black_box(decode_header(black_box(encoded))))
    });

    let plain = "Special offer just for you";

    c.bench_function("decode_plain_header", |bench| {
        bench.iter(|| black_box(decode_header(black_box(plain))))
    });
}

fn bench_parse_sender(c: &mut Criterion) {
    let from = "\"Shop News\" <News@Shop.Example>";

    c.bench_function("parse_sender_display_form", |bench| {
        bench.iter(|| black_box(parse_sender(black_box(from))))
    });
}

criterion_group!(benches, bench_classify, bench_decode, bench_parse_sender);
criterion_main!(benches);
