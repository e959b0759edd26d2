// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hrq::http::{content_type, encode_body, encode_form, sniff_encoding};
use hrq::Payload;
use reqwest::Method;

fn form_encoding_benchmark(c: &mut Criterion) {
    let payload = Payload::form((0..64).map(|i| (format!("field{}", i), format!("value {} & more", i))));
    let Payload::Form(data) = &payload else {
        unreachable!()
    };

    c.bench_function("encode_form", |b| b.iter(|| black_box(encode_form(data))));
}

fn gzip_body_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let payload = Payload::json(&serde_json::json!({
        "items": (0..256).map(|i| format!("item-{}", i)).collect::<Vec<_>>()
    }))
    .unwrap();

    c.bench_function("encode_json_gzip", |b| {
        b.iter(|| {
            runtime.block_on(async {
                black_box(
                    encode_body(&Method::POST, Some(content_type::JSON), Some(&payload), Vec::new(), true)
                        .await
                        .unwrap(),
                )
            })
        })
    });
}

fn charset_sniff_benchmark(c: &mut Criterion) {
    let html = r#"
        <!DOCTYPE html>
        <html>
        <head><meta charset="windows-1252"><title>Test</title></head>
        <body><p>Hello</p></body>
        </html>
    "#;

    c.bench_function("sniff_encoding", |b| {
        b.iter(|| black_box(sniff_encoding(html.as_bytes(), "text/html")))
    });
}

criterion_group!(
    benches,
    form_encoding_benchmark,
    gzip_body_benchmark,
    charset_sniff_benchmark
);
criterion_main!(benches);
