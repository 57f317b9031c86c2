//! The structured record handed to the presentation layer at the end
//! of a survey. The collaborator serializes it as JSON, or as CSV with
//! one row per problem.

use crate::{
    error::SurveyResult,
    prospect::Domain,
    types::{Money, SessionId},
    valuation::RiskAttitude,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Write as _;

pub const CSV_HEADER: &str =
    "Name,Age,Problem,Domain,Prospect,Expected_Value,Certainty_Equivalent,Risk_Attitude";

/// Outcome of one completed problem. Append-only; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemResult {
    /// 1-based position in the participant's sequence.
    pub problem_index:        usize,
    pub prospect:             String,
    pub expected_value:       Money,
    pub certainty_equivalent: Money,
    pub domain:               Domain,
    pub risk_attitude:        RiskAttitude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub name:       String,
    pub age:        u32,
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCounts {
    pub total_problems:     usize,
    pub gain_problems:      usize,
    pub loss_problems:      usize,
    pub risk_averse_count:  usize,
    pub risk_seeking_count: usize,
    pub risk_neutral_count: usize,
}

impl SummaryCounts {
    pub fn tally(results: &[ProblemResult]) -> Self {
        let mut counts = Self { total_problems: results.len(), ..Self::default() };
        for r in results {
            match r.domain {
                Domain::Gain => counts.gain_problems += 1,
                Domain::Loss => counts.loss_problems += 1,
            }
            match r.risk_attitude {
                RiskAttitude::RiskAverse => counts.risk_averse_count += 1,
                RiskAttitude::RiskSeeking => counts.risk_seeking_count += 1,
                RiskAttitude::RiskNeutral => counts.risk_neutral_count += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyExport {
    pub participant: ParticipantRecord,
    pub results:     Vec<ProblemResult>,
    pub summary:     SummaryCounts,
    /// False when exported before the last problem was answered.
    pub completed:   bool,
}

/// One CSV line, named the way the columns are headed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Problem")]
    pub problem: usize,
    #[serde(rename = "Domain")]
    pub domain: Domain,
    #[serde(rename = "Prospect")]
    pub prospect: String,
    #[serde(rename = "Expected_Value")]
    pub expected_value: Money,
    #[serde(rename = "Certainty_Equivalent")]
    pub certainty_equivalent: Money,
    #[serde(rename = "Risk_Attitude")]
    pub risk_attitude: RiskAttitude,
}

impl SurveyExport {
    pub fn new(participant: ParticipantRecord, results: Vec<ProblemResult>, completed: bool) -> Self {
        let summary = SummaryCounts::tally(&results);
        Self { participant, results, summary, completed }
    }

    pub fn to_json_pretty(&self) -> SurveyResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> SurveyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn csv_rows(&self) -> Vec<CsvRow> {
        self.results
            .iter()
            .map(|r| CsvRow {
                name: self.participant.name.clone(),
                age: self.participant.age,
                problem: r.problem_index,
                domain: r.domain,
                prospect: r.prospect.clone(),
                expected_value: r.expected_value,
                certainty_equivalent: r.certainty_equivalent,
                risk_attitude: r.risk_attitude,
            })
            .collect()
    }

    /// Header plus one line per result, RFC 4180 quoting.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(128 * (self.results.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');
        for row in self.csv_rows() {
            // Writing to a String cannot fail.
            let _ = writeln!(
                out,
                "{},{},{},{},{},{:.2},{:.2},{}",
                csv_field(&row.name),
                row.age,
                row.problem,
                row.domain,
                csv_field(&row.prospect),
                row.expected_value,
                row.certainty_equivalent,
                row.risk_attitude,
            );
        }
        out
    }
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
