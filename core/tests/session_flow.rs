//! The session state machine over a whole survey.

use riskpref_core::{
    choice::{Choice, ChoiceVector, EMPTY_CHOICES},
    config::SurveyConfig,
    error::{SurveyError, SurveyResult},
    monotonicity::check_consistency,
    prospect::Domain,
    session::{PhaseOutcome, Session, SurveyState},
    types::{Phase, ROWS},
};

fn build_session(seed: u64) -> Session {
    let _ = env_logger::builder().is_test(true).try_init();
    Session::new(SurveyConfig::default_test(), seed).expect("session")
}

/// Answer the active phase as a participant who takes any sure amount
/// at or above `threshold`, then confirm it.
fn answer_phase(session: &mut Session, threshold: f64) -> SurveyResult<PhaseOutcome> {
    let amounts = session.current_amounts().expect("active amounts").clone();
    for (row, amount) in amounts.iter().enumerate() {
        let choice = if *amount >= threshold { Choice::Sure } else { Choice::Gamble };
        session.submit_choice(row, choice)?;
    }
    session.confirm_phase()
}

fn answer_at_ev(session: &mut Session) -> SurveyResult<PhaseOutcome> {
    let ev = session.current_prospect().expect("active prospect").expected_value();
    answer_phase(session, ev)
}

#[test]
fn full_survey_walks_every_state() {
    let mut session = build_session(1);
    assert_eq!(session.state(), SurveyState::NotStarted);
    assert_eq!(session.progress(), 0.0);

    session.start("Ada Lovelace", 36).expect("start");
    assert_eq!(session.state(), SurveyState::Phase1Active);
    assert_eq!(session.total_problems(), 4);

    let gains = session.prospects().iter().filter(|p| p.domain() == Domain::Gain).count();
    assert_eq!(gains, 2);

    for problem in 1..=4 {
        assert_eq!(session.problem_number(), Some(problem));
        assert_eq!(session.state().phase(), Some(Phase::One));

        let outcome = answer_at_ev(&mut session).expect("phase 1");
        assert!(matches!(outcome, PhaseOutcome::Refine { .. }));
        assert_eq!(session.state(), SurveyState::Phase2Active);
        assert_eq!(session.choices(), &EMPTY_CHOICES);

        let outcome = answer_at_ev(&mut session).expect("phase 2");
        match outcome {
            PhaseOutcome::Recorded { result, .. } => {
                assert!(problem < 4);
                assert_eq!(result.problem_index, problem);
                assert_eq!(session.state(), SurveyState::Phase1Active);
            }
            PhaseOutcome::Complete { result } => {
                assert_eq!(problem, 4);
                assert_eq!(result.problem_index, 4);
            }
            PhaseOutcome::Refine { .. } => panic!("phase 2 cannot refine again"),
        }
    }

    assert_eq!(session.state(), SurveyState::Complete);
    assert_eq!(session.progress(), 1.0);
    assert_eq!(session.results().len(), 4);
    assert_eq!(session.trials().len(), 4);
    assert!(session.current_amounts().is_none());
    assert!(session.current_prospect().is_none());
    assert_eq!(session.events().of_type("survey_completed").count(), 1);
    assert_eq!(session.events().of_type("problem_completed").count(), 4);
}

#[test]
fn progress_counts_confirmed_phases() {
    let mut session = build_session(2);
    session.start("Ada", 30).expect("start");
    assert_eq!(session.progress(), 0.0);
    answer_at_ev(&mut session).expect("phase 1");
    assert_eq!(session.progress(), 1.0 / 8.0);
    answer_at_ev(&mut session).expect("phase 2");
    assert_eq!(session.progress(), 2.0 / 8.0);
}

#[test]
fn incomplete_phase_is_rejected_and_state_kept() {
    let mut session = build_session(3);
    session.start("Ada", 30).expect("start");
    for row in 0..ROWS - 1 {
        session.submit_choice(row, Choice::Sure).expect("sure");
    }

    let err = session.confirm_phase().unwrap_err();
    assert!(matches!(err, SurveyError::IncompletePhase { answered: 6, required: 7 }));
    assert!(err.to_string().contains("7"));
    assert_eq!(session.state(), SurveyState::Phase1Active);
    assert_eq!(session.choices()[0], Some(Choice::Sure));
    assert_eq!(session.events().of_type("phase_rejected").count(), 1);
}

#[test]
fn inconsistent_bulk_submission_is_rejected() {
    let mut session = build_session(4);
    session.start("Ada", 30).expect("start");
    let mut choices: ChoiceVector = [Some(Choice::Sure); ROWS];
    choices[0] = Some(Choice::Gamble);

    let err = session.confirm_phase_with(choices).unwrap_err();
    match err {
        SurveyError::MonotonicityViolation(v) => assert_eq!(v.rows(), (0, 1)),
        other => panic!("expected a monotonicity violation, got {other:?}"),
    }
    assert_eq!(session.state(), SurveyState::Phase1Active);
    assert_eq!(session.problem_number(), Some(1));
    assert!(session.results().is_empty());
}

#[test]
fn rejected_bulk_submission_keeps_the_live_choices() {
    use riskpref_core::choice::Choice::{Gamble, Sure};

    let mut session = build_session(10);
    session.start("Ada", 30).expect("start");
    session.submit_choice(0, Sure).expect("row 0 sure");
    session.submit_choice(6, Gamble).expect("row 6 gamble");
    let before = *session.choices();

    let candidate = [Some(Sure), Some(Gamble), Some(Sure), None, Some(Sure), Some(Sure), Some(Sure)];
    assert!(session.confirm_phase_with(candidate).is_err());
    assert_eq!(session.choices(), &before);

    let amounts = session.current_amounts().expect("active amounts").clone();
    assert!(check_consistency(session.choices(), &amounts).is_ok());

    // Unrelated rows still accept edits.
    session.submit_choice(3, Sure).expect("row 3 sure");
    assert_eq!(session.choices()[3], Some(Sure));

    // Both the incomplete and the inconsistent attempt are logged.
    let mut inconsistent: ChoiceVector = [Some(Sure); ROWS];
    inconsistent[1] = Some(Gamble);
    let err = session.confirm_phase_with(inconsistent).unwrap_err();
    assert!(matches!(err, SurveyError::MonotonicityViolation(_)));
    assert_eq!(session.choices()[1], None);
    assert_eq!(session.events().of_type("phase_rejected").count(), 2);
}

#[test]
fn participant_is_validated() {
    let mut session = build_session(5);
    assert!(matches!(
        session.start("Teen", 17),
        Err(SurveyError::InvalidParticipant { .. })
    ));
    assert!(matches!(
        session.start("   ", 30),
        Err(SurveyError::InvalidParticipant { .. })
    ));
    assert_eq!(session.state(), SurveyState::NotStarted);
    assert!(session.events().is_empty());

    session.start("  Ada  ", 18).expect("18 is old enough");
    assert_eq!(session.participant().map(|p| p.name.as_str()), Some("Ada"));
}

#[test]
fn actions_out_of_state_are_refused() {
    let mut session = build_session(6);
    assert!(matches!(
        session.submit_choice(0, Choice::Sure),
        Err(SurveyError::InvalidState { .. })
    ));
    assert!(matches!(session.confirm_phase(), Err(SurveyError::InvalidState { .. })));
    assert!(matches!(session.export(), Err(SurveyError::InvalidState { .. })));

    session.start("Ada", 30).expect("start");
    let err = session.start("Ada", 30).unwrap_err();
    assert_eq!(err.to_string(), "Cannot start a survey while session is in phase 1");

    while session.state() != SurveyState::Complete {
        answer_at_ev(&mut session).expect("answer");
    }
    assert!(matches!(
        session.submit_choice(0, Choice::Sure),
        Err(SurveyError::InvalidState { .. })
    ));
    assert!(matches!(session.clear_choice(0), Err(SurveyError::InvalidState { .. })));
}

#[test]
fn reset_discards_everything() {
    let mut session = build_session(7);
    session.start("Ada", 30).expect("start");
    answer_at_ev(&mut session).expect("phase 1");
    answer_at_ev(&mut session).expect("phase 2");
    session.submit_choice(0, Choice::Sure).expect("sure");
    let old_id = session.id();

    session.reset().expect("reset");
    assert_eq!(session.state(), SurveyState::NotStarted);
    assert_ne!(session.id(), old_id);
    assert!(session.participant().is_none());
    assert!(session.prospects().is_empty());
    assert!(session.results().is_empty());
    assert!(session.trials().is_empty());
    assert!(session.current_amounts().is_none());
    assert_eq!(session.choices(), &EMPTY_CHOICES);
    assert!(session.export().is_err());

    let entries = session.events().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, "session_reset");

    session.start("Grace", 41).expect("start again");
    assert_eq!(session.state(), SurveyState::Phase1Active);
    assert_eq!(session.problem_number(), Some(1));
}

#[test]
fn snapshot_describes_the_active_screen() {
    let mut session = build_session(8);
    let idle = session.snapshot();
    assert_eq!(idle.state, SurveyState::NotStarted);
    assert!(idle.prospect.is_none());
    assert!(idle.amounts.is_none());

    let amounts = session.start("Ada", 30).expect("start");
    session.submit_choice(0, Choice::Sure).expect("sure");
    let view = session.snapshot();
    let prospect = session.current_prospect().expect("active prospect");

    assert_eq!(view.session_id, session.id());
    assert_eq!(view.problem, Some(1));
    assert_eq!(view.total_problems, 4);
    assert_eq!(view.phase, Some(Phase::One));
    assert_eq!(view.prospect.as_deref(), Some(prospect.describe().as_str()));
    assert_eq!(view.domain, Some(prospect.domain()));
    assert_eq!(view.amounts, Some(amounts));
    assert_eq!(view.choices[0], Some(Choice::Sure));
    assert_eq!(view.results_recorded, 0);
}

#[test]
fn trials_keep_both_phases() {
    let mut session = build_session(9);
    session.start("Ada", 30).expect("start");
    let phase1 = session.current_amounts().expect("phase 1").clone();
    answer_at_ev(&mut session).expect("phase 1");
    let phase2 = session.current_amounts().expect("phase 2").clone();
    answer_at_ev(&mut session).expect("phase 2");

    let trial = &session.trials()[0];
    assert_eq!(trial.phase1_amounts, phase1);
    assert_eq!(trial.phase2_amounts, phase2);
    assert!(trial.phase1_choices.iter().all(Option::is_some));
    assert!(trial.phase2_choices.iter().all(Option::is_some));
    assert_eq!(trial.prospect, session.prospects()[0]);
}
