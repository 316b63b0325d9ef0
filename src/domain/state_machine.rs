use crate::domain::errors::TransitionError;
use crate::domain::types::{TokenizationEvent, TokenizationState};

pub fn transition(
    current: &TokenizationState,
    event: &TokenizationEvent,
) -> Result<TokenizationState, TransitionError> {
    match (current, event) {
        (TokenizationState::Uninitialized, TokenizationEvent::Initialized(pending)) => {
            Ok(TokenizationState::PendingHandover(pending.clone()))
        }
        (TokenizationState::PendingHandover(pending), TokenizationEvent::HandoverConfirmed) => {
            Ok(TokenizationState::ReadyToFinalize(pending.clone()))
        }
        (TokenizationState::ReadyToFinalize(_), TokenizationEvent::Finalized) => {
            Ok(TokenizationState::Finalized)
        }
        (TokenizationState::Finalized, _) => Err(TransitionError {
            from: current.to_string(),
            event: event_name(event).to_string(),
            reason: "tokenization already finalized".to_string(),
        }),
        _ => Err(TransitionError {
            from: current.to_string(),
            event: event_name(event).to_string(),
            reason: "invalid transition".to_string(),
        }),
    }
}

fn event_name(event: &TokenizationEvent) -> &'static str {
    match event {
        TokenizationEvent::Initialized(_) => "Initialized",
        TokenizationEvent::HandoverConfirmed => "HandoverConfirmed",
        TokenizationEvent::Finalized => "Finalized",
    }
}
