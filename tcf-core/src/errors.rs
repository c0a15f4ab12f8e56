use thiserror::Error;

/// Error type for invalid model construction or invocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TcfError {
    #[error("Required parameter \"{name}\" is missing from the parameter table")]
    MissingParameter { name: String },
    #[error("Parameter \"{name}\" cannot be vectorized: {details}")]
    ParameterShape { name: String, details: String },
    #[error("Land-cover class {code} has no entry for \"{name}\" (table has {classes} classes)")]
    UnknownLandCover {
        code: u16,
        classes: usize,
        name: String,
    },
    #[error("Land-cover map should be 1-dimensional, got {ndim} dimensions")]
    LandCoverDimensionality { ndim: usize },
    #[error("Expected one SOC state value for each of the 3 pools, got {found}")]
    WrongPoolCount { found: usize },
    #[error("SOC pool {pool} is negative ({value}) at pixel {pixel}")]
    NegativeSoc {
        pool: usize,
        pixel: usize,
        value: f64,
    },
    #[error("{what} has {found} pixels but the land-cover map has {expected}")]
    PixelCountMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
    #[error("{interface} expects {expected} driver fields, got {found}")]
    DriverFieldCount {
        interface: String,
        expected: String,
        found: usize,
    },
    #[error("{interface} expects a {expected}-dimensional driver stack, got {found} dimensions")]
    DriverDimensionality {
        interface: String,
        expected: usize,
        found: usize,
    },
    #[error("Driver field \"{field}\" has shape {found:?}, expected {expected:?}")]
    DriverShapeMismatch {
        field: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("xmax ({xmax}) must be greater than or equal to xmin ({xmin})")]
    InvalidConstraintBounds { xmin: f64, xmax: f64 },
    #[error("Litterfall was not provided at construction, so dates must be provided at runtime")]
    MissingLitterfall,
    #[error("At least 365 daily time steps are required to compute the annual NPP sum, got {found}")]
    TooFewSteps { found: usize },
    #[error("Got {dates} dates for {steps} time steps")]
    DateCountMismatch { dates: usize, steps: usize },
    #[error("No observations fall on day {day} of the climatological year")]
    IncompleteClimatology { day: usize },
    #[error("No SOC state was provided at construction or at runtime")]
    MissingState,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Could not parse parameter table: {0}")]
    Config(String),
}

/// Convenience type for `Result<T, TcfError>`.
pub type TcfResult<T> = Result<T, TcfError>;
