use agglo_core::{Algorithm, LinkageError, LinkageErrorCode, LinkageMethod};
use rstest::rstest;

#[rstest]
#[case(LinkageError::TooFewPoints { points: 1 }, LinkageErrorCode::TooFewPoints, "LINKAGE_TOO_FEW_POINTS")]
#[case(
    LinkageError::LengthMismatch { len: 2, expected: 3 },
    LinkageErrorCode::LengthMismatch,
    "LINKAGE_LENGTH_MISMATCH",
)]
#[case(LinkageError::NanInput { index: 4 }, LinkageErrorCode::NanInput, "LINKAGE_NAN_INPUT")]
#[case(
    LinkageError::UnsupportedMethod {
        method: LinkageMethod::Centroid,
        algorithm: Algorithm::NnChain,
    },
    LinkageErrorCode::UnsupportedMethod,
    "LINKAGE_UNSUPPORTED_METHOD",
)]
#[case(
    LinkageError::UnsupportedMetric { metric: "cosine", method: LinkageMethod::Ward },
    LinkageErrorCode::UnsupportedMetric,
    "LINKAGE_UNSUPPORTED_METRIC",
)]
#[case(LinkageError::NanDistance { step: 7 }, LinkageErrorCode::NanDistance, "LINKAGE_NAN_DISTANCE")]
#[case(
    LinkageError::UnknownMetric { name: "mahalanobis".to_owned() },
    LinkageErrorCode::UnknownMetric,
    "LINKAGE_UNKNOWN_METRIC",
)]
fn returns_expected_linkage_code(
    #[case] error: LinkageError,
    #[case] expected: LinkageErrorCode,
    #[case] text: &str,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), text);
    assert_eq!(expected.to_string(), text);
}

#[test]
fn messages_name_the_offending_values() {
    let err = LinkageError::UnsupportedMethod {
        method: LinkageMethod::Median,
        algorithm: Algorithm::Mst,
    };
    assert_eq!(
        err.to_string(),
        "method `median` is not supported by the mst algorithm"
    );
    assert_eq!(
        LinkageError::NanDistance { step: 2 }.to_string(),
        "NaN dissimilarity encountered at merge step 2"
    );
}

#[rstest]
#[case(LinkageError::UnknownAlgorithm { name: "kmeans".to_owned() }, true)]
#[case(LinkageError::InvalidMinkowskiExponent { p: -1.0 }, true)]
#[case(LinkageError::ZeroVariance { dimension: 0 }, false)]
#[case(LinkageError::TooFewPoints { points: 0 }, false)]
fn classifies_configuration_errors(#[case] error: LinkageError, #[case] configuration: bool) {
    assert_eq!(error.is_configuration(), configuration);
}
