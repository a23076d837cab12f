use super::DenseMatrixProviderError;
use agglo_core::LinkageError;
use arrow_schema::{ArrowError, DataType};
use parquet::errors::ParquetError;
use rstest::rstest;
use std::io;

#[rstest]
#[case::arrow(DenseMatrixProviderError::from(ArrowError::ComputeError("boom".into())), "arrow")]
#[case::parquet(DenseMatrixProviderError::from(ParquetError::General("boom".into())), "parquet")]
#[case::io(DenseMatrixProviderError::from(io::Error::other("boom")), "io")]
#[case::points(
    DenseMatrixProviderError::from(LinkageError::ZeroDimension),
    "points"
)]
fn wraps_underlying_failures(#[case] err: DenseMatrixProviderError, #[case] kind: &str) {
    let observed = match err {
        DenseMatrixProviderError::Arrow(_) => "arrow",
        DenseMatrixProviderError::Parquet(_) => "parquet",
        DenseMatrixProviderError::Io(_) => "io",
        DenseMatrixProviderError::Points(_) => "points",
        _ => "other",
    };
    assert_eq!(observed, kind);
}

#[rstest]
fn messages_name_the_column() {
    let err = DenseMatrixProviderError::InvalidColumnType {
        column: "features".into(),
        actual: DataType::Utf8,
    };
    assert!(err.to_string().contains("`features`"));
    let err = DenseMatrixProviderError::InconsistentBatchDimension {
        expected: 3,
        actual: 2,
    };
    assert_eq!(
        err.to_string(),
        "inconsistent dimensions across batches: expected 3, got 2"
    );
}
