use criterion::{criterion_group, criterion_main, Criterion};

use recall_storage::{SqlValue, Statement, Store};

fn insert_statement(id: &str) -> Statement {
    Statement::new(
        "INSERT INTO memories (id, memory_type, content, confidence, created_at, last_accessed_at, project_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        vec![
            SqlValue::from(id),
            SqlValue::from("gotcha"),
            SqlValue::from("bench content"),
            SqlValue::from(1.0),
            SqlValue::from("2026-01-01T00:00:00Z"),
            SqlValue::from("2026-01-01T00:00:00Z"),
            SqlValue::from("bench-project"),
        ],
    )
}

fn bench_single_execute(c: &mut Criterion) {
    let store = Store::open_in_memory().unwrap();
    let mut counter = 0u64;

    c.bench_function("store_execute_single_insert", |b| {
        b.iter(|| {
            counter += 1;
            let stmt = insert_statement(&format!("single-{counter}"));
            store.execute(&stmt.sql, stmt.params).unwrap();
        });
    });
}

fn bench_batch_of_50(c: &mut Criterion) {
    let store = Store::open_in_memory().unwrap();
    let mut counter = 0u64;

    c.bench_function("store_batch_50_inserts", |b| {
        b.iter(|| {
            let statements: Vec<Statement> = (0..50)
                .map(|i| {
                    counter += 1;
                    insert_statement(&format!("batch-{counter}-{i}"))
                })
                .collect();
            store.batch(statements).unwrap();
        });
    });
}

criterion_group!(benches, bench_single_execute, bench_batch_of_50);
criterion_main!(benches);
