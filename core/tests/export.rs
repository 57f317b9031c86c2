use riskpref_core::{
    choice::Choice,
    config::SurveyConfig,
    export::{SurveyExport, CSV_HEADER},
    prospect::Domain,
    session::{Session, SurveyState},
    valuation::RiskAttitude,
};

/// Run the whole default test survey with a participant who wants a
/// small premium over EV before taking the sure amount.
fn completed_session(seed: u64) -> Session {
    let mut session = Session::new(SurveyConfig::default_test(), seed).expect("session");
    session.start("Ada Lovelace", 36).expect("start");
    while session.state() != SurveyState::Complete {
        let ev = session.current_prospect().expect("prospect").expected_value();
        let threshold = ev + 0.1 * ev.abs();
        let amounts = session.current_amounts().expect("amounts").clone();
        for (row, amount) in amounts.iter().enumerate() {
            let choice = if *amount >= threshold { Choice::Sure } else { Choice::Gamble };
            session.submit_choice(row, choice).expect("monotonic edit");
        }
        session.confirm_phase().expect("phase gate");
    }
    session
}

#[test]
fn json_round_trip_keeps_every_result() {
    let session = completed_session(31);
    let export = session.export().expect("export");
    assert!(export.completed);
    assert_eq!(export.participant.name, "Ada Lovelace");
    assert_eq!(export.participant.age, 36);
    assert_eq!(export.participant.session_id, session.id());

    let json = export.to_json_pretty().expect("serialize");
    assert!(json.contains("\"riskAverseCount\""));
    assert!(json.contains("\"Risk Averse\"") || json.contains("\"Risk Seeking\""));

    let back = SurveyExport::from_json(&json).expect("parse");
    assert_eq!(back.results, export.results);
    assert_eq!(back, export);
}

#[test]
fn summary_counts_add_up() {
    let export = completed_session(37).export().expect("export");
    let s = &export.summary;
    assert_eq!(s.total_problems, 4);
    assert_eq!(s.gain_problems, 2);
    assert_eq!(s.loss_problems, 2);
    assert_eq!(
        s.risk_averse_count + s.risk_seeking_count + s.risk_neutral_count,
        s.total_problems
    );
    let averse = export
        .results
        .iter()
        .filter(|r| r.risk_attitude == RiskAttitude::RiskAverse)
        .count();
    assert_eq!(s.risk_averse_count, averse);
}

#[test]
fn csv_has_header_and_one_line_per_problem() {
    let export = completed_session(41).export().expect("export");
    let csv = export.to_csv();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines.len(), 1 + export.results.len());

    for (line, result) in lines[1..].iter().zip(&export.results) {
        assert!(line.starts_with(&format!("Ada Lovelace,36,{},", result.problem_index)));
        // Descriptions contain a comma, so the field is quoted.
        assert!(line.contains(&format!("\"{}\"", result.prospect)));
        assert!(line.contains(&format!("{:.2},{:.2}", result.expected_value, result.certainty_equivalent)));
        assert!(line.ends_with(&result.risk_attitude.to_string()));
    }
}

#[test]
fn csv_rows_carry_participant_columns() {
    let export = completed_session(43).export().expect("export");
    let rows = export.csv_rows();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.name == "Ada Lovelace" && r.age == 36));
    assert_eq!(rows.iter().filter(|r| r.domain == Domain::Loss).count(), 2);
}

#[test]
fn partial_export_is_marked_incomplete() {
    let mut session = Session::new(SurveyConfig::default_test(), 47).expect("session");
    session.start("Ada", 30).expect("start");
    let export = session.export().expect("export after start");
    assert!(!export.completed);
    assert!(export.results.is_empty());
    assert_eq!(export.summary.total_problems, 0);
}
