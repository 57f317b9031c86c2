//! The survey session: one participant's run through the choice lists.
//!
//! STATES (fixed, documented):
//!   NotStarted   --start()-------------------------> Phase1Active
//!   Phase1Active --confirm_phase()-----------------> Phase2Active
//!   Phase2Active --confirm_phase(), problems left--> Phase1Active (next problem)
//!   Phase2Active --confirm_phase(), none left------> Complete
//!   any state    --reset()-------------------------> NotStarted
//!
//! RULES:
//!   - A Session is owned by exactly one participant. No globals.
//!   - Fallible transitions compute everything first and commit only
//!     on success. An error never leaves a half-applied step.
//!   - A rejected edit reverts only the offending row.
//!   - All randomness flows through the session's RNG streams.

use crate::{
    amounts::{AmountGenerator, AmountSet},
    choice::{self, Choice, ChoiceVector, EMPTY_CHOICES},
    config::SurveyConfig,
    error::{SurveyError, SurveyResult},
    event::{EventLog, SurveyEvent},
    export::{ParticipantRecord, ProblemResult, SurveyExport},
    monotonicity,
    prospect::{Domain, Prospect},
    rng::{RngBank, StreamSlot, SurveyRng},
    types::{round_cents, Money, Phase, SessionId, ROWS},
    valuation,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyState {
    NotStarted,
    Phase1Active,
    Phase2Active,
    Complete,
}

impl SurveyState {
    /// The phase being answered, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Phase1Active => Some(Phase::One),
            Self::Phase2Active => Some(Phase::Two),
            Self::NotStarted | Self::Complete => None,
        }
    }
}

impl fmt::Display for SurveyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::Phase1Active => f.write_str("in phase 1"),
            Self::Phase2Active => f.write_str("in phase 2"),
            Self::Complete => f.write_str("complete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub age:  u32,
}

/// One prospect's full elicitation, frozen once phase 2 is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub prospect:       Prospect,
    pub phase1_amounts: AmountSet,
    pub phase1_choices: ChoiceVector,
    pub phase2_amounts: AmountSet,
    pub phase2_choices: ChoiceVector,
}

/// What a successful `confirm_phase` leads to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// Phase 1 accepted; answer these zoomed-in amounts next.
    Refine { amounts: AmountSet },
    /// Problem recorded; the next problem's phase 1 starts with these amounts.
    Recorded { result: ProblemResult, next_amounts: AmountSet },
    /// Last problem recorded; the survey is over.
    Complete { result: ProblemResult },
}

/// Everything a presentation layer needs to render the current screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id:       SessionId,
    pub state:            SurveyState,
    /// 1-based problem number while a problem is active.
    pub problem:          Option<usize>,
    pub total_problems:   usize,
    pub phase:            Option<Phase>,
    pub prospect:         Option<String>,
    pub domain:           Option<Domain>,
    pub expected_value:   Option<Money>,
    pub amounts:          Option<AmountSet>,
    pub choices:          ChoiceVector,
    /// Share of phases confirmed, in [0, 1].
    pub progress:         f64,
    pub results_recorded: usize,
}

pub struct Session {
    config:      SurveyConfig,
    generator:   AmountGenerator,
    catalog_rng: SurveyRng,
    id_rng:      SurveyRng,
    id:          SessionId,
    state:       SurveyState,
    participant: Option<Participant>,
    started_at:  Option<DateTime<Utc>>,
    prospects:   Vec<Prospect>,
    index:       usize,
    amounts:     Option<AmountSet>,
    choices:     ChoiceVector,
    /// Frozen phase-1 answers of the active problem, set during phase 2.
    phase1:      Option<(AmountSet, ChoiceVector)>,
    trials:      Vec<Trial>,
    results:     Vec<ProblemResult>,
    events:      EventLog,
}

impl Session {
    pub fn new(config: SurveyConfig, seed: u64) -> SurveyResult<Self> {
        config.validate()?;
        let bank = RngBank::new(seed);
        let mut id_rng = bank.for_stream(StreamSlot::SessionId);
        let id = next_session_id(&mut id_rng);
        log::debug!("session {id}: created with seed {}", bank.master_seed());

        Ok(Self {
            generator: AmountGenerator::new(config.amount_policy),
            catalog_rng: bank.for_stream(StreamSlot::Catalog),
            id_rng,
            id,
            state: SurveyState::NotStarted,
            participant: None,
            started_at: None,
            prospects: Vec::new(),
            index: 0,
            amounts: None,
            choices: EMPTY_CHOICES,
            phase1: None,
            trials: Vec::new(),
            results: Vec::new(),
            events: EventLog::new(),
            config,
        })
    }

    // ── Transitions ─────────────────────────────────────────────

    /// Register the participant, draw the prospect sequence and return
    /// the first problem's phase-1 amounts.
    pub fn start(&mut self, name: &str, age: u32) -> SurveyResult<AmountSet> {
        if self.state != SurveyState::NotStarted {
            return Err(self.invalid_state("start a survey"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(SurveyError::InvalidParticipant {
                reason: "name must not be empty".into(),
            });
        }
        if age < self.config.min_age {
            return Err(SurveyError::InvalidParticipant {
                reason: format!("age must be at least {}, got {age}", self.config.min_age),
            });
        }

        let prospects = self.config.catalog.sample(
            self.config.gain_problems,
            self.config.loss_problems,
            &mut self.catalog_rng,
        )?;
        let first = prospects.first().ok_or_else(|| SurveyError::InvalidConfig {
            reason: "a survey needs at least one problem".into(),
        })?;
        let amounts = self.generator.generate(first, Phase::One, None)?;

        self.participant = Some(Participant { name: name.to_string(), age });
        self.started_at = Some(Utc::now());
        self.prospects = prospects;
        self.index = 0;
        self.choices = EMPTY_CHOICES;
        self.phase1 = None;
        self.trials.clear();
        self.results.clear();
        self.amounts = Some(amounts.clone());
        self.state = SurveyState::Phase1Active;

        log::info!(
            "session {}: started for {name} ({age}), {} problems",
            self.id,
            self.prospects.len()
        );
        self.record(SurveyEvent::SessionStarted {
            participant: name.to_string(),
            age,
            problems: self.prospects.len(),
        })?;
        Ok(amounts)
    }

    /// Live per-row check. On a monotonicity violation the row is
    /// cleared, the rest of the vector is kept, and the violation is
    /// returned for display.
    pub fn submit_choice(&mut self, row: usize, choice: Choice) -> SurveyResult<()> {
        let phase = self.require_active("submit a choice")?;
        if row >= ROWS {
            return Err(SurveyError::RowOutOfRange { row });
        }
        let (verdict, amount) = {
            let amounts = self.active_amounts()?;
            (
                monotonicity::check_edit(&self.choices, amounts, choice, row),
                amounts[row],
            )
        };
        let problem = self.index + 1;

        match verdict {
            Ok(()) => {
                self.choices[row] = Some(choice);
                log::debug!("session {}: problem {problem} {phase} row {row} = {choice}", self.id);
                self.record(SurveyEvent::ChoiceRecorded { problem, phase, row, amount, choice })
            }
            Err(SurveyError::MonotonicityViolation(violation)) => {
                self.choices[row] = None;
                log::warn!(
                    "session {}: rejected {choice} on problem {problem} {phase} row {row}: rows {:?} conflict",
                    self.id,
                    violation.rows()
                );
                self.record(SurveyEvent::ChoiceRejected {
                    problem,
                    phase,
                    row,
                    choice,
                    gamble_row: violation.gamble_row,
                    sure_row: violation.sure_row,
                })?;
                Err(SurveyError::MonotonicityViolation(violation))
            }
            Err(other) => Err(other),
        }
    }

    /// Un-answer a row.
    pub fn clear_choice(&mut self, row: usize) -> SurveyResult<()> {
        let phase = self.require_active("clear a choice")?;
        if row >= ROWS {
            return Err(SurveyError::RowOutOfRange { row });
        }
        self.choices[row] = None;
        let problem = self.index + 1;
        self.record(SurveyEvent::ChoiceCleared { problem, phase, row })
    }

    /// Run the phase gate on `choices` and make them the live choices
    /// only if they pass. For presentation layers that keep their own
    /// widget state.
    pub fn confirm_phase_with(&mut self, choices: ChoiceVector) -> SurveyResult<PhaseOutcome> {
        let phase = self.require_active("confirm a phase")?;
        self.gate_phase(phase, &choices)?;
        self.choices = choices;
        self.advance(phase)
    }

    /// Phase-completion gate: all rows answered and monotonic.
    pub fn confirm_phase(&mut self) -> SurveyResult<PhaseOutcome> {
        let phase = self.require_active("confirm a phase")?;
        let choices = self.choices;
        self.gate_phase(phase, &choices)?;
        self.advance(phase)
    }

    /// Export participant, results and summary counts. Allowed once
    /// started; `completed` tells whether every problem was answered.
    pub fn export(&self) -> SurveyResult<SurveyExport> {
        let (Some(participant), Some(started_at)) = (&self.participant, self.started_at) else {
            return Err(self.invalid_state("export results"));
        };
        Ok(SurveyExport::new(
            ParticipantRecord {
                name: participant.name.clone(),
                age: participant.age,
                session_id: self.id,
                started_at,
            },
            self.results.clone(),
            self.state == SurveyState::Complete,
        ))
    }

    /// Discard every piece of session state and return to NotStarted
    /// under a fresh session id. The catalog stream keeps advancing,
    /// so the next survey draws a new sequence.
    pub fn reset(&mut self) -> SurveyResult<()> {
        let previous = self.id;
        self.id = next_session_id(&mut self.id_rng);
        self.state = SurveyState::NotStarted;
        self.participant = None;
        self.started_at = None;
        self.prospects.clear();
        self.index = 0;
        self.amounts = None;
        self.choices = EMPTY_CHOICES;
        self.phase1 = None;
        self.trials.clear();
        self.results.clear();
        self.events.clear();

        log::info!("session {previous}: reset, continuing as {}", self.id);
        self.record(SurveyEvent::SessionReset { previous_session: previous })
    }

    /// Check a candidate vector against the active amounts. A failure is
    /// logged as a PhaseRejected event and nothing else changes.
    fn gate_phase(&mut self, phase: Phase, choices: &ChoiceVector) -> SurveyResult<()> {
        let verdict = if choice::is_complete(choices) {
            monotonicity::check_consistency(choices, self.active_amounts()?)
        } else {
            Err(SurveyError::IncompletePhase {
                answered: choice::answered(choices),
                required: ROWS,
            })
        };
        if let Err(err) = verdict {
            log::warn!(
                "session {}: phase gate failed on problem {} {phase}: {err}",
                self.id,
                self.index + 1
            );
            self.reject_phase(phase, &err)?;
            return Err(err);
        }
        Ok(())
    }

    fn advance(&mut self, phase: Phase) -> SurveyResult<PhaseOutcome> {
        match phase {
            Phase::One => self.advance_to_phase2(),
            Phase::Two => self.complete_problem(),
        }
    }

    fn advance_to_phase2(&mut self) -> SurveyResult<PhaseOutcome> {
        let phase1_amounts = self.active_amounts()?.clone();
        let next = self
            .generator
            .generate(self.active_prospect()?, Phase::Two, Some(&self.choices))?;

        self.phase1 = Some((phase1_amounts, self.choices));
        self.choices = EMPTY_CHOICES;
        self.amounts = Some(next.clone());
        self.state = SurveyState::Phase2Active;

        let problem = self.index + 1;
        log::info!("session {}: problem {problem} advanced to phase 2", self.id);
        self.record(SurveyEvent::PhaseAdvanced {
            problem,
            amounts: next.as_slice().to_vec(),
        })?;
        Ok(PhaseOutcome::Refine { amounts: next })
    }

    fn complete_problem(&mut self) -> SurveyResult<PhaseOutcome> {
        let prospect = self.active_prospect()?.clone();
        let phase2_amounts = self.active_amounts()?.clone();
        let Some((phase1_amounts, phase1_choices)) = self.phase1.clone() else {
            return Err(self.invalid_state("record a problem without phase 1 answers"));
        };

        let ce = valuation::compute_ce(&self.choices, &phase2_amounts)?;
        let ev = prospect.expected_value();
        let risk_attitude = valuation::classify(ce, ev, self.config.neutral_tolerance);
        let problem = self.index + 1;
        let result = ProblemResult {
            problem_index: problem,
            prospect: prospect.describe(),
            expected_value: round_cents(ev),
            certainty_equivalent: ce,
            domain: prospect.domain(),
            risk_attitude,
        };
        let next_amounts = match self.prospects.get(problem) {
            Some(next) => Some(self.generator.generate(next, Phase::One, None)?),
            None => None,
        };

        self.trials.push(Trial {
            prospect,
            phase1_amounts,
            phase1_choices,
            phase2_amounts,
            phase2_choices: self.choices,
        });
        self.results.push(result.clone());
        self.choices = EMPTY_CHOICES;
        self.phase1 = None;
        self.index = problem;

        log::info!(
            "session {}: problem {problem} CE={ce:.2} EV={ev:.2} -> {risk_attitude}",
            self.id
        );
        self.record(SurveyEvent::ProblemCompleted {
            problem,
            expected_value: result.expected_value,
            certainty_equivalent: ce,
            risk_attitude,
        })?;

        match next_amounts {
            Some(amounts) => {
                self.amounts = Some(amounts.clone());
                self.state = SurveyState::Phase1Active;
                Ok(PhaseOutcome::Recorded { result, next_amounts: amounts })
            }
            None => {
                self.amounts = None;
                self.state = SurveyState::Complete;
                log::info!("session {}: survey complete, {problem} problems", self.id);
                self.record(SurveyEvent::SurveyCompleted { problems: problem })?;
                Ok(PhaseOutcome::Complete { result })
            }
        }
    }

    fn reject_phase(&mut self, phase: Phase, err: &SurveyError) -> SurveyResult<()> {
        let problem = self.index + 1;
        self.record(SurveyEvent::PhaseRejected {
            problem,
            phase,
            reason: err.to_string(),
        })
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SurveyState {
        self.state
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    pub fn participant(&self) -> Option<&Participant> {
        self.participant.as_ref()
    }

    pub fn prospects(&self) -> &[Prospect] {
        &self.prospects
    }

    pub fn current_prospect(&self) -> Option<&Prospect> {
        self.state.phase().and(self.prospects.get(self.index))
    }

    pub fn current_amounts(&self) -> Option<&AmountSet> {
        self.amounts.as_ref()
    }

    pub fn choices(&self) -> &ChoiceVector {
        &self.choices
    }

    /// 1-based number of the active problem.
    pub fn problem_number(&self) -> Option<usize> {
        self.state.phase().map(|_| self.index + 1)
    }

    pub fn total_problems(&self) -> usize {
        self.prospects.len()
    }

    pub fn results(&self) -> &[ProblemResult] {
        &self.results
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Share of phases confirmed so far; two phases per problem.
    pub fn progress(&self) -> f64 {
        let total_steps = self.prospects.len() * 2;
        match self.state {
            SurveyState::NotStarted => 0.0,
            SurveyState::Complete => 1.0,
            _ if total_steps == 0 => 0.0,
            SurveyState::Phase1Active => (self.index * 2) as f64 / total_steps as f64,
            SurveyState::Phase2Active => (self.index * 2 + 1) as f64 / total_steps as f64,
        }
    }

    pub fn snapshot(&self) -> SessionView {
        let prospect = self.current_prospect();
        SessionView {
            session_id: self.id,
            state: self.state,
            problem: self.problem_number(),
            total_problems: self.total_problems(),
            phase: self.state.phase(),
            prospect: prospect.map(Prospect::describe),
            domain: prospect.map(Prospect::domain),
            expected_value: prospect.map(|p| round_cents(p.expected_value())),
            amounts: self.amounts.clone(),
            choices: self.choices,
            progress: self.progress(),
            results_recorded: self.results.len(),
        }
    }

    // ── Helpers ─────────────────────────────────────────────────

    fn record(&mut self, event: SurveyEvent) -> SurveyResult<()> {
        self.events.append(self.id, &event)
    }

    fn require_active(&self, action: &'static str) -> SurveyResult<Phase> {
        self.state.phase().ok_or_else(|| self.invalid_state(action))
    }

    fn active_amounts(&self) -> SurveyResult<&AmountSet> {
        self.amounts
            .as_ref()
            .ok_or_else(|| self.invalid_state("read amounts"))
    }

    fn active_prospect(&self) -> SurveyResult<&Prospect> {
        self.prospects
            .get(self.index)
            .ok_or_else(|| self.invalid_state("read the current prospect"))
    }

    fn invalid_state(&self, action: &'static str) -> SurveyError {
        SurveyError::InvalidState {
            action,
            state: self.state.to_string(),
        }
    }
}

fn next_session_id(rng: &mut SurveyRng) -> SessionId {
    uuid::Builder::from_random_bytes(rng.next_bytes_16()).into_uuid()
}
