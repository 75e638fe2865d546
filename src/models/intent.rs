/// Symbolic classification of an inbound message. Capture variants carry the
/// user's text as typed (trimmed, not normalized) so names keep their
/// original casing and accents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    BookPractical,
    BookTheory,
    SimulationLink,
    HumanHandoff,
    EndSession,
    CaptureName(String),
    CaptureDatetime(String),
    Fallback,
}

impl Intent {
    /// Stable label for logging. Deliberately omits capture payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::BookPractical => "book_practical",
            Intent::BookTheory => "book_theory",
            Intent::SimulationLink => "simulation_link",
            Intent::HumanHandoff => "human_handoff",
            Intent::EndSession => "end_session",
            Intent::CaptureName(_) => "capture_name",
            Intent::CaptureDatetime(_) => "capture_datetime",
            Intent::Fallback => "fallback",
        }
    }
}
