use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use nob_parser::lexer::tokenize;
use nob_parser::parser::Parser;

fn expr(source: &str) {
    let source = source.into();
    let tokens = tokenize(&source).unwrap();
    let _ast = Parser::new(tokens).parse_expr().unwrap();
    assert!(source.has_no_errors());
}

fn chain(source: &str) {
    let source = source.into();
    let tokens = tokenize(&source).unwrap();
    let _ast = Parser::new(tokens).parse_chain().unwrap();
}

fn long_expr(c: &mut Criterion) {
    let mut group = c.benchmark_group("long-expr");

    let mut source = "1".to_string();
    for _i in 0..1000 {
        source.push_str(" + 1");
    }
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("long-expr", |b| b.iter(|| expr(&source)));
}

fn stress_precedence(c: &mut Criterion) {
    let mut group = c.benchmark_group("stress-precedence");

    let mut source = "1".to_string();
    for _i in 0..200 {
        source.push_str(" - 2 / 3 + 5 * (5 - x)");
    }
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("stress-precedence", |b| b.iter(|| expr(&source)));
}

fn long_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("long-chain");

    let mut source = "a < 1".to_string();
    for i in 0..200 {
        source.push_str(if i % 2 == 0 { " && b >= 2" } else { " || c == 3" });
    }
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("long-chain", |b| b.iter(|| chain(&source)));
}

criterion_group!(benches, long_expr, stress_precedence, long_chain);
criterion_main!(benches);
