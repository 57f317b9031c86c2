//! Live edit checks through a session: a contradicting answer is
//! rejected, only its row is cleared, and the rest of the list stands.

use riskpref_core::{
    choice::Choice::{Gamble, Sure},
    config::SurveyConfig,
    error::SurveyError,
    event::SurveyEvent,
    monotonicity::check_consistency,
    session::{Session, SurveyState},
};

fn started_session(seed: u64) -> Session {
    let mut session = Session::new(SurveyConfig::default_test(), seed).expect("session");
    session.start("Grace", 41).expect("start");
    session
}

#[test]
fn gamble_above_a_sure_row_is_rejected() {
    let mut session = started_session(3);
    session.submit_choice(2, Sure).expect("row 2 sure");
    session.submit_choice(5, Gamble).expect("row 5 gamble");

    let err = session.submit_choice(1, Gamble).unwrap_err();
    let violation = match err {
        SurveyError::MonotonicityViolation(v) => v,
        other => panic!("expected a monotonicity violation, got {other:?}"),
    };
    assert_eq!(violation.rows(), (1, 2));
    assert_eq!(violation.edited_row, Some(1));

    let choices = session.choices();
    assert_eq!(choices[1], None);
    assert_eq!(choices[2], Some(Sure));
    assert_eq!(choices[5], Some(Gamble));
    assert_eq!(session.state(), SurveyState::Phase1Active);

    // Rows in the message are numbered from 1.
    let text = violation.explanation();
    assert!(text.contains("row 2"), "{text}");
    assert!(text.contains("row 3"), "{text}");
}

#[test]
fn sure_below_a_gamble_row_is_rejected() {
    let mut session = started_session(5);
    session.submit_choice(3, Gamble).expect("row 3 gamble");

    let err = session.submit_choice(6, Sure).unwrap_err();
    let SurveyError::MonotonicityViolation(violation) = err else {
        panic!("expected a monotonicity violation");
    };
    assert_eq!(violation.rows(), (3, 6));
    assert!(violation.explanation().contains("larger sure amount"));
    assert_eq!(session.choices()[6], None);
    assert_eq!(session.choices()[3], Some(Gamble));
}

#[test]
fn overwriting_an_answered_row_clears_only_that_row() {
    let mut session = started_session(9);
    session.submit_choice(0, Sure).expect("row 0 sure");
    session.submit_choice(1, Sure).expect("row 1 sure");
    session.submit_choice(4, Gamble).expect("row 4 gamble");

    assert!(session.submit_choice(0, Gamble).is_err());
    let choices = session.choices();
    assert_eq!(choices[0], None);
    assert_eq!(choices[1], Some(Sure));
    assert_eq!(choices[4], Some(Gamble));
}

#[test]
fn rejected_edit_is_logged_with_the_conflicting_rows() {
    let mut session = started_session(17);
    session.submit_choice(2, Sure).expect("row 2 sure");
    let _ = session.submit_choice(1, Gamble);

    let rejected: Vec<SurveyEvent> = session
        .events()
        .of_type("choice_rejected")
        .map(|entry| entry.event().expect("payload parses"))
        .collect();
    assert_eq!(rejected.len(), 1);
    match &rejected[0] {
        SurveyEvent::ChoiceRejected { row, gamble_row, sure_row, .. } => {
            assert_eq!((*row, *gamble_row, *sure_row), (1, 1, 2));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn accepted_edits_never_leave_an_inconsistent_list() {
    let mut session = started_session(21);
    let edits = [
        (3, Sure), (4, Gamble), (0, Gamble), (6, Sure), (2, Sure),
        (5, Gamble), (3, Gamble), (1, Sure), (6, Gamble), (0, Sure),
    ];
    for (row, choice) in edits {
        let _ = session.submit_choice(row, choice);
        let amounts = session.current_amounts().expect("active amounts");
        assert!(check_consistency(session.choices(), amounts).is_ok());
    }
}

#[test]
fn clearing_a_row_lifts_its_constraint() {
    let mut session = started_session(23);
    session.submit_choice(2, Sure).expect("row 2 sure");
    assert!(session.submit_choice(1, Gamble).is_err());

    session.clear_choice(2).expect("clear row 2");
    session.submit_choice(1, Gamble).expect("row 1 gamble now fits");
    assert_eq!(session.choices()[2], None);
}

#[test]
fn row_out_of_range_is_an_error_not_a_violation() {
    let mut session = started_session(29);
    assert!(matches!(
        session.submit_choice(7, Sure),
        Err(SurveyError::RowOutOfRange { row: 7 })
    ));
}
