use std::fmt;

pub type Result<T> = std::result::Result<T, ViewerError>;

/// Express whether the error seems to be happening in the viewer state, the
/// data, or somewhere in between.
#[derive(Debug)]
pub enum ErrorLayer {
    /// The caller asked for something that can never work, like a malformed
    /// URL or an interaction on a node that was never loaded.
    BadInput,
    /// The settings file could not be read or parsed.
    ConfigLayer,
    /// The problem seems to be with the graph data itself, for example a
    /// hierarchy map that references nodes that are not in the scenario.
    DataLayer,
    /// The data source (graph database backend) misbehaved.
    ServerLayer,
    /// The in-memory graph state is not in the shape an operation expects.
    /// These are programming errors or the fallout of malformed hierarchies.
    StateLayer,
    /// The rendering collaborator failed to accept the DOT text.
    RenderLayer,
}

/// Payload to provide details about what went wrong for investigation
/// purposes.
#[derive(Debug)]
pub struct ErrorDetails {
    pub layer: ErrorLayer,
    /// Stringified version of the lower level error.
    pub message: String,
}

/// Unified error for the graph state engine, the viewer session and the data
/// source layer.
///
/// The first three variants are the structural failures of the graph state;
/// the last two mirror the sticky/transient split used for fetch problems so
/// that callers can decide whether a retry makes sense.
#[derive(Debug)]
pub enum ViewerError {
    /// An edge endpoint could not be mapped to any currently visible node.
    ResolutionFailure(ErrorDetails),
    /// A node was added to a cluster name that was never registered.
    MissingCluster(ErrorDetails),
    /// A node or edge identity that an operation requires is not present.
    MissingLookup(ErrorDetails),
    /// An error that will persist, for example a 404 or a parse failure.
    StickyProblem(ErrorDetails),
    /// An error that might go away if retried later, for example a 504.
    TransientProblem(ErrorDetails),
}

impl ViewerError {
    pub fn details(&self) -> &ErrorDetails {
        match self {
            ViewerError::ResolutionFailure(d)
            | ViewerError::MissingCluster(d)
            | ViewerError::MissingLookup(d)
            | ViewerError::StickyProblem(d)
            | ViewerError::TransientProblem(d) => d,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ViewerError::TransientProblem(_))
    }
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ViewerError::ResolutionFailure(_) => "resolution failure",
            ViewerError::MissingCluster(_) => "missing cluster",
            ViewerError::MissingLookup(_) => "missing lookup",
            ViewerError::StickyProblem(_) => "sticky problem",
            ViewerError::TransientProblem(_) => "transient problem",
        };
        let details = self.details();
        write!(f, "{} ({:?}): {}", kind, details.layer, details.message)
    }
}

impl std::error::Error for ViewerError {}

pub fn resolution_failure(message: String) -> ViewerError {
    ViewerError::ResolutionFailure(ErrorDetails {
        layer: ErrorLayer::StateLayer,
        message,
    })
}

pub fn missing_cluster(message: String) -> ViewerError {
    ViewerError::MissingCluster(ErrorDetails {
        layer: ErrorLayer::StateLayer,
        message,
    })
}

pub fn missing_lookup(message: String) -> ViewerError {
    ViewerError::MissingLookup(ErrorDetails {
        layer: ErrorLayer::BadInput,
        message,
    })
}

// JSON parse errors are sticky data problems.
impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> ViewerError {
        ViewerError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::DataLayer,
            message: err.to_string(),
        })
    }
}

/// IO errors amount to a 404 for our purposes which means a sticky problem.
impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> ViewerError {
        ViewerError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::DataLayer,
            message: err.to_string(),
        })
    }
}

/// reqwest won't return an error for an unhappy status code itself, so
/// anything that surfaces here is assumed to be a transient network problem.
impl From<reqwest::Error> for ViewerError {
    fn from(err: reqwest::Error) -> ViewerError {
        ViewerError::TransientProblem(ErrorDetails {
            layer: ErrorLayer::ServerLayer,
            message: err.to_string(),
        })
    }
}

impl From<url::ParseError> for ViewerError {
    fn from(err: url::ParseError) -> ViewerError {
        ViewerError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::BadInput,
            message: err.to_string(),
        })
    }
}

impl From<toml::de::Error> for ViewerError {
    fn from(err: toml::de::Error) -> ViewerError {
        ViewerError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::ConfigLayer,
            message: err.to_string(),
        })
    }
}
