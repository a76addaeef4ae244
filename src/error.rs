use thiserror::Error;

/// Failure of a single document's trip through the pipeline.
///
/// Every variant is terminal for the document it was raised on; the driver
/// records it and moves on to the next document.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("cannot read {path}: {diagnostic} (hint: {hint})")]
    InputUnreadable {
        path: String,
        diagnostic: String,
        hint: &'static str,
    },

    #[error("paragraph {paragraph}: {reason}: {text:?}")]
    Recognition {
        paragraph: usize,
        reason: &'static str,
        text: String,
    },

    #[error("paragraph {paragraph}: {message}")]
    StructuralOrder { paragraph: usize, message: String },

    #[error("{message} [{location}]")]
    Validation { message: String, location: String },

    #[error("cannot cluster questions [{location}]: {message}")]
    ClusteringInfeasible { location: String, message: String },
}

impl QuizError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputUnreadable { .. } => "input_unreadable",
            Self::Recognition { .. } => "recognition_failure",
            Self::StructuralOrder { .. } => "structural_order_violation",
            Self::Validation { .. } => "validation_failure",
            Self::ClusteringInfeasible { .. } => "clustering_infeasible",
        }
    }

    pub(crate) fn validation(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            location: location.into(),
        }
    }

    pub(crate) fn structural(paragraph: usize, message: impl Into<String>) -> Self {
        Self::StructuralOrder {
            paragraph,
            message: message.into(),
        }
    }
}
