//! In-memory audit log of everything that happens in a session.
//!
//! RULE: every state transition and every rejected edit appends
//! exactly one event. The log lives and dies with the session.

use crate::{
    choice::Choice,
    error::SurveyResult,
    types::{Money, Phase, SessionId},
    valuation::RiskAttitude,
};
use serde::{Deserialize, Serialize};

/// Every event a session can emit.
/// Variants are only appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurveyEvent {
    SessionStarted {
        participant: String,
        age:         u32,
        problems:    usize,
    },
    ChoiceRecorded {
        problem: usize,
        phase:   Phase,
        row:     usize,
        amount:  Money,
        choice:  Choice,
    },
    ChoiceCleared {
        problem: usize,
        phase:   Phase,
        row:     usize,
    },
    ChoiceRejected {
        problem:    usize,
        phase:      Phase,
        row:        usize,
        choice:     Choice,
        gamble_row: usize,
        sure_row:   usize,
    },
    PhaseRejected {
        problem: usize,
        phase:   Phase,
        reason:  String,
    },
    PhaseAdvanced {
        problem: usize,
        amounts: Vec<Money>,
    },
    ProblemCompleted {
        problem:              usize,
        expected_value:       Money,
        certainty_equivalent: Money,
        risk_attitude:        RiskAttitude,
    },
    SurveyCompleted {
        problems: usize,
    },
    SessionReset {
        previous_session: SessionId,
    },
}

/// One log row; `payload` is the JSON-serialized SurveyEvent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub seq:        u64,
    pub session_id: SessionId,
    pub event_type: String,
    pub payload:    String,
}

impl EventLogEntry {
    pub fn event(&self) -> SurveyResult<SurveyEvent> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries:  Vec<EventLogEntry>,
    next_seq: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, session_id: SessionId, event: &SurveyEvent) -> SurveyResult<()> {
        let entry = EventLogEntry {
            seq: self.next_seq,
            session_id,
            event_type: event_type_name(event).to_string(),
            payload: serde_json::to_string(event)?,
        };
        self.next_seq += 1;
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn of_type<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a EventLogEntry> + 'a {
        self.entries.iter().filter(move |e| e.event_type == event_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_seq = 0;
    }
}

/// Extract a stable string name from a SurveyEvent variant.
/// Used for the event_type column.
fn event_type_name(event: &SurveyEvent) -> &'static str {
    match event {
        SurveyEvent::SessionStarted { .. }   => "session_started",
        SurveyEvent::ChoiceRecorded { .. }   => "choice_recorded",
        SurveyEvent::ChoiceCleared { .. }    => "choice_cleared",
        SurveyEvent::ChoiceRejected { .. }   => "choice_rejected",
        SurveyEvent::PhaseRejected { .. }    => "phase_rejected",
        SurveyEvent::PhaseAdvanced { .. }    => "phase_advanced",
        SurveyEvent::ProblemCompleted { .. } => "problem_completed",
        SurveyEvent::SurveyCompleted { .. }  => "survey_completed",
        SurveyEvent::SessionReset { .. }     => "session_reset",
    }
}
