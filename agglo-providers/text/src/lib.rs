//! Text provider turning line-based UTF-8 sources into condensed
//! Levenshtein dissimilarity matrices.
//!
//! Strings have no vector representation, so the provider only supplies
//! matrix-form input to the linkage drivers.

use std::io::BufRead;

use agglo_core::{CondensedMatrix, LinkageError};
use thiserror::Error;
use tracing::instrument;

/// Errors raised while reading or comparing text items.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TextProviderError {
    /// The source contained no non-empty lines.
    #[error("text source contains no items")]
    EmptyInput,
    /// An item index was outside the provider.
    #[error("item index {index} is out of bounds")]
    OutOfBounds {
        /// The offending index.
        index: usize,
    },
    /// Reading the source failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The pairwise distances could not form a condensed matrix.
    #[error("invalid dissimilarity matrix: {0}")]
    Matrix(#[from] LinkageError),
}

/// Line-oriented UTF-8 items compared by Levenshtein edit distance.
///
/// # Examples
/// ```
/// use agglo_providers_text::TextProvider;
///
/// let provider = TextProvider::new("demo", vec!["kitten".into(), "sitting".into()])?;
/// assert_eq!(provider.distance(0, 1)?, 3.0);
/// # Ok::<(), agglo_providers_text::TextProviderError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TextProvider {
    name: String,
    lines: Vec<String>,
}

impl TextProvider {
    /// Creates a provider over `lines`.
    ///
    /// # Errors
    /// Returns [`TextProviderError::EmptyInput`] when `lines` is empty.
    pub fn new(name: impl Into<String>, lines: Vec<String>) -> Result<Self, TextProviderError> {
        if lines.is_empty() {
            return Err(TextProviderError::EmptyInput);
        }
        Ok(Self {
            name: name.into(),
            lines,
        })
    }

    /// Reads one item per non-empty line, stripping `\n` and `\r\n`
    /// terminators.
    ///
    /// # Errors
    /// Returns [`TextProviderError::Io`] when reading fails and
    /// [`TextProviderError::EmptyInput`] when no item remains.
    pub fn try_from_reader<R: BufRead>(
        name: impl Into<String>,
        reader: R,
    ) -> Result<Self, TextProviderError> {
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let item = line.strip_suffix('\r').unwrap_or(&line);
            if !item.is_empty() {
                lines.push(item.to_owned());
            }
        }
        Self::new(name, lines)
    }

    /// Returns the provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` when the provider holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the items in source order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Levenshtein distance between items `i` and `j`, counted in Unicode
    /// scalar values.
    ///
    /// # Errors
    /// Returns [`TextProviderError::OutOfBounds`] for an invalid index.
    pub fn distance(&self, i: usize, j: usize) -> Result<f64, TextProviderError> {
        let left = self.item(i)?;
        let right = self.item(j)?;
        Ok(strsim::levenshtein(left, right) as f64)
    }

    /// Builds the condensed matrix of pairwise Levenshtein distances.
    ///
    /// # Errors
    /// Propagates [`CondensedMatrix::from_fn`] failures as
    /// [`TextProviderError::Matrix`].
    ///
    /// # Examples
    /// ```
    /// use agglo_providers_text::TextProvider;
    ///
    /// let provider = TextProvider::new("demo", vec!["ab".into(), "abc".into(), "xyz".into()])?;
    /// let matrix = provider.condensed_matrix()?;
    /// assert_eq!(matrix.as_slice(), &[1.0, 3.0, 3.0]);
    /// # Ok::<(), agglo_providers_text::TextProviderError>(())
    /// ```
    #[instrument(name = "text.condensed_matrix", err, skip(self), fields(data_source = %self.name, items = self.lines.len()))]
    pub fn condensed_matrix(&self) -> Result<CondensedMatrix, TextProviderError> {
        let lines = &self.lines;
        let matrix = CondensedMatrix::from_fn(lines.len(), |i, j| {
            strsim::levenshtein(&lines[i], &lines[j]) as f64
        })?;
        Ok(matrix)
    }

    fn item(&self, index: usize) -> Result<&str, TextProviderError> {
        self.lines
            .get(index)
            .map(String::as_str)
            .ok_or(TextProviderError::OutOfBounds { index })
    }
}
