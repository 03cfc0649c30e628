use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::workflows::committee::{ApplicationId, Evaluation, EvaluatorId, Recommendation};

use super::EvaluationImportError;

#[derive(Debug, Deserialize)]
struct EvaluationRow {
    evaluator_id: String,
    application_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    recommendation: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    total_score: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    is_submitted: Option<String>,
}

pub(crate) fn parse_evaluations<R: Read>(
    reader: R,
) -> Result<Vec<Evaluation>, EvaluationImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut evaluations = Vec::new();

    for (index, record) in csv_reader.deserialize::<EvaluationRow>().enumerate() {
        let row = record?;
        // Header occupies line 1.
        let line = index + 2;

        let recommendation = match row.recommendation.as_deref() {
            None => None,
            Some(raw) => Some(Recommendation::parse(raw).ok_or_else(|| {
                EvaluationImportError::InvalidRow {
                    line,
                    reason: format!("unknown recommendation '{raw}'"),
                }
            })?),
        };

        let total_score = match row.total_score.as_deref() {
            None => None,
            Some(raw) => {
                let score = raw.parse::<f64>().map_err(|_| EvaluationImportError::InvalidRow {
                    line,
                    reason: format!("score '{raw}' is not a number"),
                })?;
                if !(0.0..=100.0).contains(&score) {
                    return Err(EvaluationImportError::InvalidRow {
                        line,
                        reason: format!("score {score} is outside 0-100"),
                    });
                }
                Some(score)
            }
        };

        let is_submitted = match row.is_submitted.as_deref() {
            None => false,
            Some(raw) => parse_flag(raw).ok_or_else(|| EvaluationImportError::InvalidRow {
                line,
                reason: format!("'{raw}' is not a yes/no value"),
            })?,
        };

        evaluations.push(Evaluation {
            evaluator_id: EvaluatorId(row.evaluator_id),
            application_id: ApplicationId(row.application_id),
            recommendation,
            total_score,
            is_submitted,
        });
    }

    Ok(evaluations)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
