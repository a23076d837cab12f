use super::{DenseMatrixProviderError, PointMatrixProvider, support::*};
use agglo_core::{LinkageError, LinkageMethod, linkage_vector};
use arrow_array::builder::{FixedSizeListBuilder, Float32Builder};
use arrow_array::{ArrayRef, FixedSizeListArray, Int32Array};
use arrow_schema::{DataType, Field};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
fn loads_points_from_fixed_size_list() {
    let array = build_array(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    let provider =
        PointMatrixProvider::try_from_fixed_size_list("demo", &array).expect("valid matrix");
    assert_eq!(provider.len(), 2);
    assert!(!provider.is_empty());
    assert_eq!(provider.dimension(), 3);
    assert_eq!(provider.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[rstest]
fn float32_values_widen_exactly() {
    let array = build_list_array(&[vec![0.1, 1.5]], 2, false);
    let provider =
        PointMatrixProvider::try_from_fixed_size_list("demo", &array).expect("valid matrix");
    assert_eq!(provider.data(), &[f64::from(0.1_f32), 1.5]);
}

#[rstest]
fn into_points_feeds_the_vector_drivers() {
    let array = build_array(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [10.0, 0.0, 0.0]]);
    let points = PointMatrixProvider::try_from_fixed_size_list("demo", &array)
        .expect("valid matrix")
        .into_points()
        .expect("valid points");
    assert_eq!(points.rows(), 3);
    assert_eq!(points.row(2), &[10.0, 0.0, 0.0]);
    let dendrogram = linkage_vector(points, LinkageMethod::Single).expect("linkage");
    assert_eq!(dendrogram.distances().collect::<Vec<_>>(), vec![1.0, 9.0]);
}

#[rstest]
fn into_points_rejects_nan_coordinates() {
    let array = build_list_array(&[vec![1.0, f32::NAN]], 2, false);
    let provider =
        PointMatrixProvider::try_from_fixed_size_list("demo", &array).expect("valid matrix");
    let err = provider.into_points().expect_err("NaN must be rejected");
    assert!(matches!(
        err,
        DenseMatrixProviderError::Points(LinkageError::NanInput { index: 1 })
    ));
}

#[rstest]
fn rejects_null_rows() {
    let mut builder = FixedSizeListBuilder::new(Float32Builder::new(), 2);
    builder.values().append_value(1.0);
    builder.values().append_value(2.0);
    builder.append(true);
    builder.values().append_null();
    builder.values().append_null();
    builder.append(false);
    let array = builder.finish();
    let err = PointMatrixProvider::try_from_fixed_size_list("demo", &array)
        .expect_err("null rows must be rejected");
    assert!(matches!(err, DenseMatrixProviderError::NullRow { row: 1 }));
}

#[rstest]
fn rejects_null_values() {
    let mut builder = FixedSizeListBuilder::new(Float32Builder::new(), 2);
    builder.values().append_value(1.0);
    builder.values().append_value(2.0);
    builder.append(true);
    builder.values().append_value(3.0);
    builder.values().append_null();
    builder.append(true);
    let array = builder.finish();
    let err = PointMatrixProvider::try_from_fixed_size_list("demo", &array)
        .expect_err("null values must be rejected");
    assert!(matches!(
        err,
        DenseMatrixProviderError::NullValue {
            row: 1,
            value_index: 1
        }
    ));
}

#[rstest]
fn rejects_non_float_children() {
    let field = Arc::new(Field::new("item", DataType::Int32, true));
    let values: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3, 4]));
    let array = FixedSizeListArray::new(field, 2, values, None);
    let err = PointMatrixProvider::try_from_fixed_size_list("demo", &array)
        .expect_err("non-float children must be rejected");
    assert!(matches!(
        err,
        DenseMatrixProviderError::InvalidListValueType { .. }
    ));
}

#[rstest]
fn missing_file_is_an_io_error() {
    let err = PointMatrixProvider::try_from_parquet_path(
        "demo",
        "/nonexistent/agglo/points.parquet",
        "features",
    )
    .expect_err("missing file");
    assert!(matches!(err, DenseMatrixProviderError::Io(_)));
}
