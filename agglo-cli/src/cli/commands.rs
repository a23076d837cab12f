//! Command implementations and argument parsing for the `agglo` CLI.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use agglo_core::{
    Algorithm, Dendrogram, LinkageBuilder, LinkageError, LinkageErrorCode, LinkageMethod, Metric,
};
use agglo_providers_dense::{DenseMatrixProviderError, PointMatrixProvider};
use agglo_providers_text::{TextProvider, TextProviderError};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "agglo", about = "Hierarchical agglomerative clustering.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Cluster an input source and print the linkage matrix.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Linkage method (`single`, `complete`, `average`, `weighted`, `ward`,
    /// `ward_d`, `centroid` or `median`).
    #[arg(long, default_value_t = LinkageMethod::Single)]
    pub method: LinkageMethod,

    /// Clustering algorithm; `auto` picks one from the method and input.
    #[arg(long, default_value_t = Algorithm::Auto)]
    pub algorithm: Algorithm,

    /// Input source configuration.
    #[command(subcommand)]
    pub source: RunSource,
}

/// Input sources accepted by `run`.
#[derive(Debug, Subcommand, Clone)]
pub enum RunSource {
    /// Cluster rows of a Parquet `FixedSizeList<Float32 | Float64, D>` column.
    Parquet(ParquetArgs),
    /// Cluster the lines of a UTF-8 text file by Levenshtein distance.
    Text(TextArgs),
}

/// Parquet ingestion arguments.
#[derive(Debug, Args, Clone)]
pub struct ParquetArgs {
    /// Path to the Parquet file containing feature vectors.
    pub path: PathBuf,

    /// Column containing the point rows.
    #[arg(long)]
    pub column: String,

    /// Dissimilarity between rows, e.g. `euclidean`, `cosine` or
    /// `minkowski:3`.
    #[arg(long, default_value = "euclidean")]
    pub metric: Metric,

    /// Override name for the data source (defaults to the file stem).
    #[arg(long)]
    pub name: Option<String>,
}

/// Text ingestion arguments.
#[derive(Debug, Args, Clone)]
pub struct TextArgs {
    /// Path to a UTF-8 text file with one string per line.
    pub path: PathBuf,

    /// Override name for the data source (defaults to the file stem).
    #[arg(long)]
    pub name: Option<String>,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while loading an input source.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Dense point ingestion failed.
    #[error(transparent)]
    Dense(#[from] DenseMatrixProviderError),
    /// Text ingestion failed.
    #[error(transparent)]
    Text(#[from] TextProviderError),
    /// Configuring or running the linkage failed.
    #[error(transparent)]
    Core(#[from] LinkageError),
}

impl CliError {
    /// Returns the stable linkage error code behind this failure, if any.
    #[must_use]
    pub fn code(&self) -> Option<LinkageErrorCode> {
        match self {
            Self::Core(err)
            | Self::Dense(DenseMatrixProviderError::Points(err))
            | Self::Text(TextProviderError::Matrix(err)) => Some(err.code()),
            _ => None,
        }
    }
}

/// Outcome of a `run` command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Name of the data source.
    pub data_source: String,
    /// Merge tree produced by the linkage.
    pub dendrogram: Dendrogram,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading the input or running the linkage fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use agglo_cli::cli::{Cli, Command, RunCommand, RunSource, TextArgs, run_cli};
/// # use agglo_core::{Algorithm, LinkageMethod};
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "alpha\nbeta\ngamma\n")?;
/// let cli = Cli {
///     command: Command::Run(RunCommand {
///         method: LinkageMethod::Average,
///         algorithm: Algorithm::Auto,
///         source: RunSource::Text(TextArgs {
///             path: file.path().to_path_buf(),
///             name: None,
///         }),
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.dendrogram.len(), 2);
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(method = %command.method, algorithm = %command.algorithm, source = field::Empty),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let builder = LinkageBuilder::new()
        .with_method(command.method)
        .with_algorithm(command.algorithm);

    let span = Span::current();
    let summary = match command.source {
        RunSource::Parquet(args) => {
            span.record("source", field::display("parquet"));
            run_parquet(builder, args)?
        }
        RunSource::Text(args) => {
            span.record("source", field::display("text"));
            run_text(builder, args)?
        }
    };

    info!(
        data_source = summary.data_source.as_str(),
        steps = summary.dendrogram.len(),
        "command completed"
    );
    Ok(summary)
}

#[instrument(
    name = "cli.run_parquet",
    err,
    skip(builder, args),
    fields(
        path = %args.path.display(),
        column = %args.column,
        metric = %args.metric,
        override_name = field::Empty,
    ),
)]
pub(super) fn run_parquet(
    builder: LinkageBuilder,
    args: ParquetArgs,
) -> Result<ExecutionSummary, CliError> {
    let ParquetArgs {
        path,
        column,
        metric,
        name,
    } = args;
    Span::current().record(
        "override_name",
        field::display(name.as_deref().unwrap_or("<derived>")),
    );
    let linkage = builder.with_metric(metric).build()?;
    let chosen_name = derive_data_source_name(&path, name.as_deref());
    let provider = PointMatrixProvider::try_from_parquet_path(chosen_name, &path, &column)?;
    let data_source = provider.name().to_owned();
    let points = provider.into_points()?;
    let dendrogram = linkage.run_points(points)?;
    Ok(ExecutionSummary {
        data_source,
        dendrogram,
    })
}

#[instrument(
    name = "cli.run_text",
    err,
    skip(builder, args),
    fields(path = %args.path.display(), override_name = field::Empty),
)]
pub(super) fn run_text(
    builder: LinkageBuilder,
    args: TextArgs,
) -> Result<ExecutionSummary, CliError> {
    let TextArgs { path, name } = args;
    Span::current().record(
        "override_name",
        field::display(name.as_deref().unwrap_or("<derived>")),
    );
    let linkage = builder.build()?;
    let chosen_name = derive_data_source_name(&path, name.as_deref());
    let reader = open_text_reader(&path)?;
    let provider = TextProvider::try_from_reader(chosen_name, reader)?;
    let mut matrix = provider.condensed_matrix()?;
    let dendrogram = linkage.run_matrix(&mut matrix)?;
    Ok(ExecutionSummary {
        data_source: provider.name().to_owned(),
        dendrogram,
    })
}

#[instrument(name = "cli.open_text_reader", err, fields(path = %path.display()))]
pub(super) fn open_text_reader(path: &Path) -> Result<BufReader<File>, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

pub(super) fn derive_data_source_name(path: &Path, override_name: Option<&str>) -> String {
    if let Some(name) = override_name {
        return name.to_owned();
    }

    path.file_stem()
        .and_then(|value| value.to_str())
        .map_or_else(|| "data_source".to_owned(), ToOwned::to_owned)
}

/// Writes a header line followed by one `left right distance size` line per
/// merge step, tab separated.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use agglo_cli::cli::{ExecutionSummary, render_summary};
/// # use agglo_core::{CondensedMatrix, LinkageMethod, linkage};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let mut matrix = CondensedMatrix::new(3, vec![1.0, 4.0, 2.0])?;
/// let summary = ExecutionSummary {
///     data_source: "demo".into(),
///     dendrogram: linkage(&mut matrix, LinkageMethod::Single)?,
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(
///     String::from_utf8(buffer)?,
///     "data source: demo (3 points)\n0\t1\t1\t2\n2\t3\t2\t3\n",
/// );
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let dendrogram = &summary.dendrogram;
    writeln!(
        writer,
        "data source: {} ({} points)",
        summary.data_source,
        dendrogram.point_count()
    )?;
    for step in dendrogram.steps() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            step.left(),
            step.right(),
            step.distance(),
            step.size()
        )?;
    }
    Ok(())
}
