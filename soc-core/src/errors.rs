use thiserror::Error;

/// Error type for invalid operations.
///
/// Missing input data is never an error: records that cannot participate in a
/// calculation are silently excluded and the models narrow their output
/// instead. Errors are reserved for broken contracts with the reference data,
/// e.g. a stock-change factor that should exist for a validated category but
/// has no row in the eco-climate zone table.
#[derive(Error, Debug)]
pub enum SocError {
    #[error("{0}")]
    Error(String),
    #[error("No value in eco-climate zone table. Zone={0}, column={1}")]
    MissingLookup(u32, String),
}

/// Convenience type for `Result<T, SocError>`.
pub type SocResult<T> = Result<T, SocError>;
