use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{BookingStep, ConversationState, Intent};

/// Canonicalizes raw text for matching: lower-case, diacritics folded to
/// their base letters, punctuation replaced by spaces, whitespace collapsed.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Maps a raw message plus the current conversation state to an intent.
/// Pure function; all side effects live in the dialogue engine.
pub fn classify(message: &str, state: &ConversationState) -> Intent {
    let text = normalize(message);
    if text.is_empty() {
        return Intent::Fallback;
    }

    // Once inside the booking flow, free text is data, not a command, even
    // when it collides with a greeting or a menu keyword.
    if let ConversationState::Booking { step, .. } = state {
        return match step {
            BookingStep::AwaitingName => Intent::CaptureName(message.trim().to_string()),
            BookingStep::AwaitingDate { .. } => {
                Intent::CaptureDatetime(message.trim().to_string())
            }
        };
    }

    if is_greeting(&text) {
        return Intent::Greeting;
    }

    // Exact match only, no substring matching.
    menu_intent(&text).unwrap_or(Intent::Fallback)
}

fn is_greeting(text: &str) -> bool {
    matches!(text, "oi" | "oie" | "ola" | "menu")
}

fn menu_intent(text: &str) -> Option<Intent> {
    match text {
        "1" | "pratica" => Some(Intent::BookPractical),
        "2" | "teorica" => Some(Intent::BookTheory),
        "3" | "simulado" => Some(Intent::SimulationLink),
        "4" | "atendente" => Some(Intent::HumanHandoff),
        "5" | "finalizar" | "cancelar" => Some(Intent::EndSession),
        _ => None,
    }
}
