//! Condensed-matrix linkage benchmarks.
//!
//! Times each matrix driver on seeded clustered points whose Euclidean
//! distances are precomputed once per size. Every iteration clones the
//! matrix because the drivers overwrite it.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
#![expect(
    clippy::shadow_reuse,
    reason = "Criterion bench_with_input closures rebind parameter names"
)]
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use agglo_benches::{
    error::BenchSetupError,
    params::LinkageBenchParams,
    source::{BlobConfig, euclidean_matrix, generate_blobs},
};
use agglo_core::{Algorithm, LinkageBuilder, LinkageMethod};

const SEED: u64 = 42;

const DIMENSIONS: usize = 8;

const POINT_COUNTS: &[usize] = &[100, 500, 1_000];

const CASES: &[(LinkageMethod, Algorithm)] = &[
    (LinkageMethod::Single, Algorithm::Mst),
    (LinkageMethod::Single, Algorithm::Generic),
    (LinkageMethod::Complete, Algorithm::NnChain),
    (LinkageMethod::Average, Algorithm::NnChain),
    (LinkageMethod::Average, Algorithm::Generic),
    (LinkageMethod::Ward, Algorithm::NnChain),
    (LinkageMethod::Centroid, Algorithm::Generic),
    (LinkageMethod::Median, Algorithm::Generic),
];

fn matrix_linkage_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("matrix_linkage");
    group.sample_size(20);

    for &point_count in POINT_COUNTS {
        let points = generate_blobs(&BlobConfig::new(point_count, DIMENSIONS, SEED))?;
        let matrix = euclidean_matrix(&points)?;

        for &(method, algorithm) in CASES {
            let linkage = LinkageBuilder::new()
                .with_method(method)
                .with_algorithm(algorithm)
                .build()?;
            let params = LinkageBenchParams {
                method,
                algorithm,
                point_count,
            };
            group.bench_with_input(
                BenchmarkId::from_parameter(params),
                &matrix,
                |b, matrix| {
                    b.iter_batched(
                        || matrix.clone(),
                        |mut matrix| linkage.run_matrix(&mut matrix),
                        BatchSize::LargeInput,
                    );
                },
            );
        }
    }

    group.finish();
    Ok(())
}

fn matrix_linkage(c: &mut Criterion) {
    if let Err(err) = matrix_linkage_impl(c) {
        panic!("matrix_linkage benchmark setup failed: {err}");
    }
}

criterion_group!(benches, matrix_linkage);
criterion_main!(benches);
