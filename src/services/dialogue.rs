use std::sync::Arc;

use crate::models::{BookingRecord, BookingStep, ConversationState, Intent, LessonType};
use crate::services::availability::AvailabilityError;
use crate::services::nlu;
use crate::state::AppState;

const MENU_OPTIONS: &str = "1️⃣ - Marcar aula prática\n\
2️⃣ - Marcar aula teórica\n\
3️⃣ - Fazer simulado teórico (link do Detran)\n\
4️⃣ - Falar com um atendente humano\n\
5️⃣ - Finalizar atendimento";

const SIMULADO_REPLY: &str =
    "Aqui está o link para o simulado teórico do Detran: https://www.detran.sp.gov.br/simulado";

const HANDOFF_REPLY: &str = "Certo, vou te encaminhar para um atendente humano 👨‍💼\n\
Por favor, aguarde um momento...";

const GOODBYE_REPLY: &str = "Tudo bem! Atendimento finalizado. 😊 Tenha um ótimo dia!";

const SLOT_TAKEN_REPLY: &str =
    "Esse horário já está reservado 😕 Pode escolher outra data ou horário, por favor?";

const BACKEND_TROUBLE_REPLY: &str = "Tivemos um problema para registrar seu agendamento agora 😔 \
Pode tentar de novo em instantes?";

/// Runs one turn of the conversation: load state, classify, execute the
/// transition, persist, reply.
pub async fn process_message(
    state: &Arc<AppState>,
    user_id: &str,
    message: &str,
) -> anyhow::Result<String> {
    let current = state.sessions.get(user_id);
    let intent = nlu::classify(message, &current);

    tracing::info!(
        user = %user_id,
        intent = intent.label(),
        state = current.as_str(),
        "processing message"
    );

    let reply = match intent {
        Intent::Greeting => {
            state.sessions.set(user_id, ConversationState::Menu);
            menu_text()
        }

        Intent::BookPractical => {
            start_booking(state, user_id, LessonType::Practical);
            "Perfeito! Vamos marcar sua aula prática. Qual seu nome completo?".to_string()
        }

        Intent::BookTheory => {
            start_booking(state, user_id, LessonType::Theory);
            "Certo! Vamos agendar sua aula teórica. Pode me dizer seu nome completo?".to_string()
        }

        Intent::CaptureName(name) => match current {
            ConversationState::Booking {
                lesson_type,
                step: BookingStep::AwaitingName,
            } => {
                let reply = format!(
                    "Obrigado, {}! Para qual data e horário você quer a {}? (ex: 2025-11-05T15:00)",
                    first_name(&name),
                    lesson_type.label(),
                );
                state.sessions.set(
                    user_id,
                    ConversationState::Booking {
                        lesson_type,
                        step: BookingStep::AwaitingDate { full_name: name },
                    },
                );
                reply
            }
            _ => fallback_text(),
        },

        Intent::CaptureDatetime(slot) => match current {
            ConversationState::Booking {
                lesson_type,
                step: BookingStep::AwaitingDate { full_name },
            } => confirm_booking(state, user_id, lesson_type, full_name, slot).await,
            _ => fallback_text(),
        },

        Intent::SimulationLink => {
            state.sessions.clear(user_id);
            SIMULADO_REPLY.to_string()
        }

        Intent::HumanHandoff => {
            state.sessions.clear(user_id);
            HANDOFF_REPLY.to_string()
        }

        Intent::EndSession => {
            state.sessions.clear(user_id);
            GOODBYE_REPLY.to_string()
        }

        Intent::Fallback => fallback_text(),
    };

    Ok(reply)
}

fn start_booking(state: &Arc<AppState>, user_id: &str, lesson_type: LessonType) {
    state.sessions.set(
        user_id,
        ConversationState::Booking {
            lesson_type,
            step: BookingStep::AwaitingName,
        },
    );
}

/// The two-phase slot confirmation. The pre-check is a fast rejection for
/// the common case; `book_slot` re-checks under the backend's lock and is
/// the authoritative decision, so a lost race comes back as `Conflict`.
async fn confirm_booking(
    state: &Arc<AppState>,
    user_id: &str,
    lesson_type: LessonType,
    full_name: String,
    slot: String,
) -> String {
    match state.availability.check_availability(&slot).await {
        Ok(false) => return SLOT_TAKEN_REPLY.to_string(),
        Ok(true) => {}
        Err(e) => {
            tracing::warn!(error = %e, "availability pre-check failed, attempting booking anyway");
        }
    }

    let record = BookingRecord {
        full_name: full_name.clone(),
        lesson_type,
        slot: slot.clone(),
        user_id: user_id.to_string(),
    };

    match state.availability.book_slot(&record).await {
        Ok(()) => {
            state.sessions.clear(user_id);
            format!(
                "Prontinho, {}! Sua {} está confirmada para {slot} ✅",
                first_name(&full_name),
                lesson_type.label(),
            )
        }
        // Someone else won the race between the pre-check and the booking.
        // Stay on the same step so the user just picks another time.
        Err(AvailabilityError::Conflict) => SLOT_TAKEN_REPLY.to_string(),
        Err(AvailabilityError::Backend(reason)) => {
            tracing::error!(user = %user_id, reason = %reason, "booking failed at the backend");
            BACKEND_TROUBLE_REPLY.to_string()
        }
    }
}

fn first_name(full_name: &str) -> &str {
    full_name.split_whitespace().next().unwrap_or(full_name)
}

fn menu_text() -> String {
    format!(
        "Olá! Eu sou o assistente virtual da autoescola Brasília.\n\
         Como posso te ajudar hoje?\n\n{MENU_OPTIONS}"
    )
}

fn fallback_text() -> String {
    format!(
        "Desculpe, não entendi o que você quis dizer 😅\n\
         Mas posso te ajudar com as seguintes opções:\n\n{MENU_OPTIONS}"
    )
}
