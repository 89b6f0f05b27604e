use crate::session::controller::AuthState;

/// The single view a client shows for a given auth state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView {
    Loading,
    Login,
    /// Main content stays on screen but inert behind the prompt
    NamePrompt { email: Option<String> },
    Main { display_name: String },
}

impl GateView {
    pub fn from_state(state: &AuthState) -> Self {
        match state {
            AuthState::Loading => GateView::Loading,
            AuthState::Unauthenticated => GateView::Login,
            AuthState::Incomplete(session) => GateView::NamePrompt {
                email: session.email.clone(),
            },
            AuthState::Ready { display_name, .. } => GateView::Main {
                display_name: display_name.clone(),
            },
        }
    }

    pub fn main_visible(&self) -> bool {
        matches!(self, GateView::NamePrompt { .. } | GateView::Main { .. })
    }

    pub fn main_interactive(&self) -> bool {
        matches!(self, GateView::Main { .. })
    }

    pub fn shows_prompt(&self) -> bool {
        matches!(self, GateView::NamePrompt { .. })
    }
}
