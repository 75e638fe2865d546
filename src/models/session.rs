use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LessonType {
    Practical,
    Theory,
}

impl LessonType {
    /// Human-facing label, used in replies and sheet rows.
    pub fn label(&self) -> &'static str {
        match self {
            LessonType::Practical => "aula prática",
            LessonType::Theory => "aula teórica",
        }
    }
}

/// Position inside the booking flow. `AwaitingDate` owns the captured name,
/// so a date prompt without a name cannot be represented.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    AwaitingName,
    AwaitingDate { full_name: String },
}

/// Per-user conversation state. Created lazily on first contact; cleared on
/// terminal intents and after a successful booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Menu,
    Booking {
        lesson_type: LessonType,
        step: BookingStep,
    },
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Menu => "menu",
            ConversationState::Booking {
                step: BookingStep::AwaitingName,
                ..
            } => "awaiting_name",
            ConversationState::Booking {
                step: BookingStep::AwaitingDate { .. },
                ..
            } => "awaiting_date",
        }
    }
}
