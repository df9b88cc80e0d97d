use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this
/// library can potentially return.
///
/// Note that decode failures are deliberately *not* errors: an unreadable
/// instruction truncates the current basic block, which then classifies as
/// [`BlockType::Error`](crate::flowchart::BlockType::Error), and chart
/// construction continues. Cancellation is not an error either; it yields a
/// partial graph. The variants below cover the remaining failure modes,
/// which are all on the export/render path.
///
/// # Examples
///
/// ```rust,ignore
/// use flowscope::{render, CancelToken, Error};
///
/// match render::gen_gdl(&chart, Path::new("out.gdl"), &CancelToken::new()) {
///     Ok(()) => println!("exported"),
///     Err(Error::FileError(io)) => eprintln!("I/O error: {io}"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A graph operation received structurally invalid input.
    ///
    /// Used for malformed graph descriptions on the import path and for
    /// internal consistency violations surfaced by the render bridge.
    #[error("{0}")]
    GraphError(String),

    /// File I/O error.
    ///
    /// Wraps standard I/O errors from writing export files or reading them
    /// back.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The requested output format or feature is not implemented.
    ///
    /// Currently returned for DOT generation, which is a reserved flag.
    #[error("The requested output format is not supported")]
    NotSupported,

    /// Provided input was empty.
    ///
    /// Returned when an operation that needs at least one node or one
    /// address range receives none.
    #[error("Provided input was empty")]
    Empty,
}
