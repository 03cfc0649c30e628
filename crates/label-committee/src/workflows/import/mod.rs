//! Offline loading of evaluation exports.

mod parser;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::workflows::committee::{ApplicationId, Evaluation};

#[derive(Debug, thiserror::Error)]
pub enum EvaluationImportError {
    #[error("failed to read evaluation export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid evaluation CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },
}

/// Reads evaluation rows from a CSV export with an
/// `evaluator_id,application_id,recommendation,total_score,is_submitted` header.
pub struct EvaluationImporter;

impl EvaluationImporter {
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Evaluation>, EvaluationImportError> {
        parser::parse_evaluations(reader)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<Evaluation>, EvaluationImportError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows belonging to a single application.
    pub fn for_application(
        evaluations: Vec<Evaluation>,
        application_id: &ApplicationId,
    ) -> Vec<Evaluation> {
        evaluations
            .into_iter()
            .filter(|evaluation| &evaluation.application_id == application_id)
            .collect()
    }
}
