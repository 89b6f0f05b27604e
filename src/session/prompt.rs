use uuid::Uuid;

use crate::session::controller::{AuthController, AuthState};
use crate::session::error::ProfileUpdateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Closed,
    Open { user: Uuid },
    /// Answered for this user; never reopens for them
    Done { user: Uuid },
}

/// One-shot display-name prompt shown while a session is `Incomplete`.
///
/// The prompt keeps whatever the user typed across failed submits and only
/// closes on success, or when the session it was opened for goes away.
#[derive(Debug, Clone)]
pub struct DisplayNamePrompt {
    phase: Phase,
    email: Option<String>,
    input: String,
    error: Option<String>,
}

impl Default for DisplayNamePrompt {
    fn default() -> Self {
        Self {
            phase: Phase::Closed,
            email: None,
            input: String::new(),
            error: None,
        }
    }
}

impl DisplayNamePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sync with the controller state. Opens for an `Incomplete` session that
    /// has not answered yet, closes for anything else.
    pub fn open_for(&mut self, state: &AuthState) {
        match state {
            AuthState::Incomplete(session) => match self.phase {
                Phase::Open { user } if user == session.id => {}
                Phase::Done { user } if user == session.id => {}
                _ => {
                    self.phase = Phase::Open { user: session.id };
                    self.email = session.email.clone();
                    self.input.clear();
                    self.error = None;
                }
            },
            AuthState::Ready { session, .. } => {
                if matches!(self.phase, Phase::Open { user } if user == session.id) {
                    self.phase = Phase::Done { user: session.id };
                }
            }
            AuthState::Loading | AuthState::Unauthenticated => self.close(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.phase, Phase::Open { .. })
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Message from the last failed submit
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        self.is_open() && !self.input.trim().is_empty()
    }

    /// Submit the current input through the controller
    pub async fn submit(&mut self, controller: &AuthController) -> Result<(), ProfileUpdateError> {
        let user = match self.phase {
            Phase::Open { user } => user,
            _ => return Err(ProfileUpdateError::NotAwaitingName),
        };

        match controller.update_display_name(&self.input).await {
            Ok(()) => {
                self.phase = Phase::Done { user };
                self.error = None;
                Ok(())
            }
            Err(e @ (ProfileUpdateError::Superseded | ProfileUpdateError::NotAwaitingName)) => {
                self.close();
                Err(e)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.phase = Phase::Closed;
        self.email = None;
        self.input.clear();
        self.error = None;
    }
}
