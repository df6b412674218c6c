//! Performance benchmarks for tablesync-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tablesync_engine::{
    Column, DataType, Key, Merger, RowStates, Set, SetSnapshot, Table, Value,
};

fn create_test_table() -> Table {
    let mut table = Table::new("Users");
    table.add_column(Column::new("Id", DataType::Int32)).unwrap();
    table.add_column(Column::new("Name", DataType::String)).unwrap();
    table.add_column(Column::new("Age", DataType::Int16)).unwrap();
    let key = Key::new(&table, &["Id"]).unwrap();
    table.set_primary_key(key).unwrap();
    table
}

fn populated(rows: i32) -> Table {
    let mut table = create_test_table();
    for i in 0..rows {
        table
            .add_values([Value::from(i), Value::from(format!("user {}", i)), Value::from(30)])
            .unwrap();
    }
    table.accept_changes().unwrap();
    table
}

fn bench_row_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_operations");

    group.bench_function("add_row", |b| {
        let mut table = create_test_table();
        let mut id = 0i32;
        b.iter(|| {
            id += 1;
            table
                .add_values(black_box([Value::from(id), Value::from("Test User"), Value::from(20)]))
                .unwrap()
        })
    });

    group.bench_function("edit_and_accept", |b| {
        let mut table = populated(1);
        let row = table.row_ids()[0];
        let mut age = 0i16;
        b.iter(|| {
            age = age.wrapping_add(1);
            let mut edit = table.row_mut(row).unwrap();
            edit.set("Age", black_box(age)).unwrap();
            edit.accept_changes().unwrap();
        })
    });

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");

    for size in [100, 1000, 10000] {
        let table = populated(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| table.find(black_box(&[Value::Int32(size - 1)])).unwrap())
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [100, 1000] {
        let source = populated(size);
        for preserve in [false, true] {
            let name = if preserve { "preserve" } else { "overwrite" };
            group.bench_with_input(BenchmarkId::new(name, size), &source, |b, source| {
                b.iter_batched(
                    || populated(size),
                    |mut target| Merger::new(preserve).merge_table(&mut target, source).unwrap(),
                    criterion::BatchSize::LargeInput,
                )
            });
        }
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    let mut set = Set::new("Bench");
    set.add_table(populated(1000)).unwrap();
    let snapshot = set.to_snapshot(RowStates::ALL).unwrap();
    let json = snapshot.to_json().unwrap();

    group.bench_function("to_json_1000", |b| {
        b.iter(|| set.to_snapshot(RowStates::ALL).unwrap().to_json().unwrap())
    });

    group.bench_function("rebuild_1000", |b| {
        b.iter_batched(
            || set.clone_schema(),
            |mut target| {
                let snapshot = SetSnapshot::from_json(black_box(&json)).unwrap();
                target.apply_snapshot(&snapshot).unwrap()
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_row_operations,
    bench_find,
    bench_merge,
    bench_snapshot,
);
criterion_main!(benches);
