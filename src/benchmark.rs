use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reg_automaton::{matching::Matcher, CompileOptions, Compiler};

const PATTERN: &str = "((a|b)*c(de)+|f(g|h|ij)*)*k";

fn do_the_work(compiler: &Compiler, text: &str) {
    let automaton = compiler.compile(PATTERN).unwrap();
    assert!(automaton.is_match(text));
}

fn criterion_benchmark_compile(c: &mut Criterion) {
    let text = "abcdedefgijhk";
    let ast = Compiler::default();
    let legacy = Compiler::new(CompileOptions::legacy());
    c.bench_function("compile nested pattern", |b| {
        b.iter(|| do_the_work(black_box(&ast), black_box(text)))
    });
    c.bench_function("compile nested pattern (legacy)", |b| {
        b.iter(|| legacy.compile(black_box(PATTERN)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark_compile);
criterion_main!(benches);
