//! Error types for grid filtering.

use thiserror::Error;

use crate::grid::Region;

/// Fatal conditions detected before or while setting up a filter run.
///
/// Per-node problems (no usable samples, ambiguous modes) are never errors;
/// they resolve to NaN or a tie-break and are tallied in the run report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid filter configuration: {0}")]
    Configuration(String),

    #[error("Output region {output} is not inside input region {input}")]
    Domain { output: Region, input: Region },

    #[error("Failed to allocate {bytes} bytes for {what}")]
    Allocation { what: &'static str, bytes: usize },

    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn alloc(what: &'static str) -> impl FnOnce(common::AllocError) -> Self {
        move |e| Self::Allocation {
            what,
            bytes: e.bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message() {
        let err = Error::config("filter width must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid filter configuration: filter width must be positive"
        );
    }

    #[test]
    fn test_domain_message_names_both_regions() {
        let err = Error::Domain {
            output: Region::new(-10.0, 10.0, 0.0, 5.0),
            input: Region::new(0.0, 10.0, 0.0, 5.0),
        };
        let msg = err.to_string();
        assert!(msg.contains("-10"));
        assert!(msg.contains("0/10/0/5"));
    }

    #[test]
    fn test_allocation_from_common() {
        let err = Error::alloc("weight matrix")(common::AllocError { bytes: 64 });
        assert_eq!(
            err.to_string(),
            "Failed to allocate 64 bytes for weight matrix"
        );
    }

    #[test]
    fn test_error_is_debug() {
        let err = Error::InvalidGrid("empty".into());
        assert!(format!("{:?}", err).contains("InvalidGrid"));
    }
}
