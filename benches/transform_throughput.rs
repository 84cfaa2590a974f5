//! Preprocessing throughput benchmarks.
//!
//! Measures `InputPreproc::transform` on synthetic batches in both modes:
//! - **train**: vocabulary fitting plus encoding.
//! - **eval**: encoding only, against a vocabulary fitted on a separate batch,
//!   with a share of unseen categories.
//!
//! # Running
//!
//! ```sh
//! cargo bench --bench transform_throughput
//! ```

use std::sync::Arc;

use arrow::array::{ArrayRef, FixedSizeListArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::Float32Type;
use confluence::features::FeatureAssembler;
use confluence::intake::{FeatureGroups, InputBatch, InputPreproc, Mode};
use criterion::{BenchmarkId, Criterion, Throughput};
use rand::Rng;

const EMBEDDING_WIDTH: i32 = 16;

// ============================================================================
// Test data generators
// ============================================================================

fn schema() -> FeatureGroups {
    FeatureGroups::new("label")
        .with_float_features(["age", "income"])
        .with_id_list_features(["country", "device"])
        .with_id_score_list_features(["topic_weight"])
        .with_embedding_features(["user_vec"])
}

/// A batch whose categorical columns draw from `num_categories` distinct tokens.
fn generate_batch(num_rows: usize, num_categories: usize) -> InputBatch {
    let mut rng = rand::rng();

    let age = Float64Array::from_iter_values((0..num_rows).map(|_| rng.random_range(18.0..90.0)));
    let income = Float64Array::from_iter_values((0..num_rows).map(|_| rng.random_range(0.0..1e6)));
    let country = StringArray::from_iter_values(
        (0..num_rows).map(|_| format!("country_{}", rng.random_range(0..num_categories))),
    );
    let device = Int64Array::from_iter_values(
        (0..num_rows).map(|_| rng.random_range(0..num_categories as i64)),
    );
    let topic_weight = Int64Array::from_iter_values((0..num_rows).map(|_| rng.random_range(0..100)));
    let user_vec = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
        (0..num_rows).map(|_| {
            Some(
                (0..EMBEDDING_WIDTH)
                    .map(|_| Some(rng.random_range(-1.0f32..1.0)))
                    .collect::<Vec<_>>(),
            )
        }),
        EMBEDDING_WIDTH,
    );
    let labels: ArrayRef = Arc::new(Int64Array::from_iter_values(
        (0..num_rows).map(|_| rng.random_range(0..2)),
    ));

    let features = RecordBatch::try_from_iter(vec![
        ("age", Arc::new(age) as ArrayRef),
        ("income", Arc::new(income) as ArrayRef),
        ("country", Arc::new(country) as ArrayRef),
        ("device", Arc::new(device) as ArrayRef),
        ("topic_weight", Arc::new(topic_weight) as ArrayRef),
        ("user_vec", Arc::new(user_vec) as ArrayRef),
    ])
    .expect("synthetic batch");
    InputBatch::try_new(features, labels).expect("aligned synthetic batch")
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_train_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_train");
    for num_rows in [1_000usize, 10_000, 100_000] {
        let batch = generate_batch(num_rows, 1_000);
        group.throughput(Throughput::Elements(num_rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_rows), &batch, |b, batch| {
            let mut preproc = InputPreproc::new(schema(), Mode::Train);
            b.iter(|| preproc.transform(batch).expect("transform"));
        });
    }
    group.finish();
}

fn bench_eval_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_eval");
    for num_rows in [1_000usize, 10_000, 100_000] {
        // Train on half the category range so roughly half the eval values are unseen.
        let mut preproc = InputPreproc::new(schema(), Mode::Train);
        preproc
            .transform(&generate_batch(num_rows, 500))
            .expect("fit vocabulary");
        preproc.set_mode(Mode::Eval);

        let batch = generate_batch(num_rows, 1_000);
        group.throughput(Throughput::Elements(num_rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_rows), &batch, |b, batch| {
            b.iter(|| preproc.transform(batch).expect("transform"));
        });
    }
    group.finish();
}

fn bench_one_hot_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("one_hot_assembly");
    for num_rows in [1_000usize, 10_000] {
        let mut preproc = InputPreproc::new(schema(), Mode::Train);
        let batch = preproc
            .transform(&generate_batch(num_rows, 1_000))
            .expect("transform");
        let assembler = FeatureAssembler::default();

        group.throughput(Throughput::Elements(num_rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_rows), &batch, |b, batch| {
            b.iter(|| {
                assembler
                    .assemble(batch, preproc.vocabulary())
                    .expect("assemble")
            });
        });
    }
    group.finish();
}

// ============================================================================
// Criterion main
// ============================================================================

fn main() {
    let mut criterion = Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .configure_from_args();

    bench_train_transform(&mut criterion);
    bench_eval_transform(&mut criterion);
    bench_one_hot_assembly(&mut criterion);

    criterion.final_summary();
}
