use std::fmt;

//--------------------------------------------------------------------------------------------------

/// Failure modes a search can report to its caller without panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// The queue emptied (or the threshold search gave up) before a path/connection was found.
    NoPath,
    /// The label store grew past `queue_capacity` labels; the caller may retry with a
    /// smaller `cost_factor` to shrink the explored frontier.
    CapacityExceeded,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SearchError::NoPath => write!(f, "no path found between origin and destination"),
            SearchError::CapacityExceeded => write!(f, "label store exceeded queue capacity"),
        }
    }
}

impl std::error::Error for SearchError {}

//--------------------------------------------------------------------------------------------------

/// Fatal errors: the external graph did not uphold its contract. These are not part of the
/// normal control flow and are only raised at debug boundaries, since the `Graph` trait is
/// trusted input.
#[derive(Debug)]
pub enum GraphError {
    MissingCoordinate(String),
    MissingEdge(String),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GraphError::MissingCoordinate(msg) => write!(f, "missing coordinate: {}", msg),
            GraphError::MissingEdge(msg) => write!(f, "missing edge: {}", msg),
        }
    }
}

impl std::error::Error for GraphError {}
