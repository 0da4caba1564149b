use super::remote_write_models::WriteRequest;
use std::collections::HashSet;
use thiserror::Error;

/// Structural problems found in a decoded write request.
///
/// The index is the position of the time serie in the request.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The write request contains no time series")]
    EmptyRequest,

    #[error("Time serie {index} has no samples")]
    EmptySeries { index: usize },

    #[error("Time serie {index} has the label {name} more than once")]
    DuplicateLabel { index: usize, name: String },

    #[error("Time serie {index} has a label with an empty name")]
    EmptyLabelName { index: usize },
}

/// Checks that a write request is well formed before it is forwarded.
///
/// The request is never modified.
pub fn validate_write_request(write_request: &WriteRequest) -> Result<(), ValidationError> {
    if write_request.timeseries.is_empty() {
        return Err(ValidationError::EmptyRequest);
    }

    let mut seen = HashSet::new();
    for (index, time_serie) in write_request.timeseries.iter().enumerate() {
        if time_serie.samples.is_empty() {
            return Err(ValidationError::EmptySeries { index });
        }

        seen.clear();
        for label in &time_serie.labels {
            if label.name.is_empty() {
                return Err(ValidationError::EmptyLabelName { index });
            }
            if !seen.insert(label.name.as_str()) {
                return Err(ValidationError::DuplicateLabel {
                    index,
                    name: label.name.clone(),
                });
            }
        }
    }

    Ok(())
}
