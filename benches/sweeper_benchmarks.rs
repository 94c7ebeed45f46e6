use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use datasweeper::export::write_csv;
use datasweeper::*;

/// CSV text with a duplicate every tenth row and a gap every seventh value.
fn sample_csv(rows: usize) -> String {
    let mut text = String::from("id,region,units,price\n");
    for i in 0..rows {
        let key = if i % 10 == 9 { i - 1 } else { i };
        let units = if i % 7 == 3 { String::new() } else { (key % 50).to_string() };
        text.push_str(&format!("{},r{},{},{}\n", key, key % 4, units, key as f64 * 0.25));
    }
    text
}

fn sample_file(rows: usize) -> UploadedFile {
    UploadedFile::new("bench.csv", sample_csv(rows))
}

fn bench_read_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_csv");

    for size in [100, 1000, 10000].iter() {
        let file = sample_file(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| read_table(black_box(&file)).unwrap());
        });
    }
    group.finish();
}

fn bench_drop_duplicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("drop_duplicates");

    for size in [100, 1000, 10000].iter() {
        let table = read_table(&sample_file(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut t = table.clone();
                black_box(t.drop_duplicates())
            });
        });
    }
    group.finish();
}

fn bench_fill_missing(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_missing_with_mean");

    for size in [100, 1000, 10000].iter() {
        let table = read_table(&sample_file(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut t = table.clone();
                black_box(t.fill_missing_with_mean())
            });
        });
    }
    group.finish();
}

fn bench_write_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_csv");

    for size in [100, 1000, 10000].iter() {
        let table = read_table(&sample_file(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| write_csv(black_box(&table)).unwrap());
        });
    }
    group.finish();
}

fn bench_full_sweep(c: &mut Criterion) {
    let sweeper = Sweeper::default();
    let file = sample_file(1000);
    let options = SweepOptions {
        remove_duplicates: true,
        fill_missing: true,
        columns: Some(vec!["region".to_string(), "units".to_string()]),
        show_chart: false,
    };

    c.bench_function("sweep_1000_rows", |b| {
        b.iter(|| sweeper.sweep(black_box(&file), black_box(&options)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_read_csv,
    bench_drop_duplicates,
    bench_fill_missing,
    bench_write_csv,
    bench_full_sweep,
);
criterion_main!(benches);
