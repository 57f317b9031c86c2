use crate::{
    amounts::AmountSet,
    choice::{Choice, ChoiceVector},
    error::SurveyResult,
    export::SurveyExport,
    session::{PhaseOutcome, Session, SessionView},
    types::SessionId,
};
use serde::{Deserialize, Serialize};

/// Every action a presentation layer can take on a session.
/// Variants are only appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum SurveyCommand {
    Start { name: String, age: u32 },
    SubmitChoice { row: usize, choice: Choice },
    ClearChoice { row: usize },
    /// With `choices`, the given vector replaces the live one before the gate runs.
    ConfirmPhase {
        #[serde(default)]
        choices: Option<ChoiceVector>,
    },
    GetState,
    Export,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum CommandReply {
    Started { amounts: AmountSet },
    ChoiceAccepted { row: usize, choice: Option<Choice> },
    PhaseConfirmed { outcome: PhaseOutcome },
    State { view: SessionView },
    Exported { export: SurveyExport },
    Reset { session_id: SessionId },
}

/// Apply one command to the session.
pub fn dispatch(session: &mut Session, command: SurveyCommand) -> SurveyResult<CommandReply> {
    match command {
        SurveyCommand::Start { name, age } => {
            let amounts = session.start(&name, age)?;
            Ok(CommandReply::Started { amounts })
        }
        SurveyCommand::SubmitChoice { row, choice } => {
            session.submit_choice(row, choice)?;
            Ok(CommandReply::ChoiceAccepted { row, choice: Some(choice) })
        }
        SurveyCommand::ClearChoice { row } => {
            session.clear_choice(row)?;
            Ok(CommandReply::ChoiceAccepted { row, choice: None })
        }
        SurveyCommand::ConfirmPhase { choices } => {
            let outcome = match choices {
                Some(choices) => session.confirm_phase_with(choices)?,
                None => session.confirm_phase()?,
            };
            Ok(CommandReply::PhaseConfirmed { outcome })
        }
        SurveyCommand::GetState => Ok(CommandReply::State { view: session.snapshot() }),
        SurveyCommand::Export => Ok(CommandReply::Exported { export: session.export()? }),
        SurveyCommand::Reset => {
            session.reset()?;
            Ok(CommandReply::Reset { session_id: session.id() })
        }
    }
}
