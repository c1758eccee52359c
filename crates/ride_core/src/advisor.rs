//! Chat/tips collaborator. Replies are opaque text: a failing or unconfigured
//! advisor degrades to fixed fallback strings and never affects ride state.

use bevy_ecs::prelude::Resource;
use thiserror::Error;
use tracing::warn;

/// Tip used when the advisor call fails.
pub const TIP_FALLBACK: &str = "Viaje com segurança!";
/// Tip used when no advisor is configured.
pub const TIP_UNAVAILABLE: &str = "Informação indisponível.";
/// Tip used when the advisor answers with empty text.
pub const TIP_EMPTY: &str = "Boa viagem!";

pub const REPLY_FALLBACK: &str =
    "Estamos enfrentando dificuldades técnicas. Tente novamente mais tarde.";
pub const REPLY_UNAVAILABLE: &str = "Erro: Chave de API não configurada.";
pub const REPLY_EMPTY: &str = "Desculpe, não consegui processar sua solicitação no momento.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdvisorError {
    #[error("advisor is not configured")]
    Unconfigured,
    #[error("advisor request failed: {0}")]
    Upstream(String),
}

pub trait RideAdvisor: Send + Sync {
    /// One-sentence traffic tip or curiosity for a trip.
    fn ride_tip(&self, brand: &str, origin: &str, destination: &str) -> Result<String, AdvisorError>;

    /// Support reply given the conversation so far.
    fn support_reply(
        &self,
        brand: &str,
        history: &[String],
        message: &str,
    ) -> Result<String, AdvisorError>;
}

/// Advisor installed in a session world.
#[derive(Resource)]
pub struct AdvisorResource(pub Box<dyn RideAdvisor>);

impl AdvisorResource {
    pub fn new(advisor: impl RideAdvisor + 'static) -> Self {
        Self(Box::new(advisor))
    }
}

impl Default for AdvisorResource {
    fn default() -> Self {
        Self::new(CannedAdvisor)
    }
}

pub fn advised_tip(advisor: &dyn RideAdvisor, brand: &str, origin: &str, destination: &str) -> String {
    match advisor.ride_tip(brand, origin, destination) {
        Ok(tip) if tip.trim().is_empty() => TIP_EMPTY.to_string(),
        Ok(tip) => tip,
        Err(AdvisorError::Unconfigured) => TIP_UNAVAILABLE.to_string(),
        Err(err) => {
            warn!(error = %err, "ride tip unavailable, using fallback");
            TIP_FALLBACK.to_string()
        }
    }
}

pub fn advised_reply(advisor: &dyn RideAdvisor, brand: &str, history: &[String], message: &str) -> String {
    match advisor.support_reply(brand, history, message) {
        Ok(reply) if reply.trim().is_empty() => REPLY_EMPTY.to_string(),
        Ok(reply) => reply,
        Err(AdvisorError::Unconfigured) => REPLY_UNAVAILABLE.to_string(),
        Err(err) => {
            warn!(error = %err, "support reply unavailable, using fallback");
            REPLY_FALLBACK.to_string()
        }
    }
}

/// Offline advisor with deterministic canned answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedAdvisor;

const CANNED_TIPS: [&str; 4] = [
    "Evite a Marginal ao fim da tarde, o trânsito aperta depois das 17h.",
    "A Ilha do Cabo fica cheia ao fim de semana, saia cedo.",
    "Pela Avenida 21 de Janeiro costuma ser mais rápido até ao aeroporto.",
    "Tenha trocado à mão, facilita o pagamento em dinheiro.",
];

impl RideAdvisor for CannedAdvisor {
    fn ride_tip(&self, _brand: &str, origin: &str, destination: &str) -> Result<String, AdvisorError> {
        let index = (origin.len() + destination.len()) % CANNED_TIPS.len();
        Ok(CANNED_TIPS[index].to_string())
    }

    fn support_reply(
        &self,
        brand: &str,
        _history: &[String],
        message: &str,
    ) -> Result<String, AdvisorError> {
        let lowered = message.to_lowercase();
        let reply = if lowered.contains("pagamento") || lowered.contains("pagar") {
            format!("Na {brand} podes pagar em dinheiro ou com Multicaixa Express.")
        } else if lowered.contains("cancel") {
            "Podes cancelar enquanto o motorista ainda não chegou, sem custos.".to_string()
        } else if lowered.contains("perdi") || lowered.contains("esqueci") {
            "Lamentamos! Indica o objeto e a viagem, e contactamos o motorista.".to_string()
        } else {
            format!("Olá! Sou o assistente da {brand}. Em que posso ajudar?")
        };
        Ok(reply)
    }
}

/// Advisor for sessions with no chat backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredAdvisor;

impl RideAdvisor for UnconfiguredAdvisor {
    fn ride_tip(&self, _brand: &str, _origin: &str, _destination: &str) -> Result<String, AdvisorError> {
        Err(AdvisorError::Unconfigured)
    }

    fn support_reply(
        &self,
        _brand: &str,
        _history: &[String],
        _message: &str,
    ) -> Result<String, AdvisorError> {
        Err(AdvisorError::Unconfigured)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// Support conversation transcript.
#[derive(Debug, Default, Resource)]
pub struct SupportChat {
    messages: Vec<ChatMessage>,
}

impl SupportChat {
    /// Record `message`, ask the advisor with the prior transcript, record and return the reply.
    pub fn ask(&mut self, advisor: &dyn RideAdvisor, brand: &str, message: &str) -> String {
        let history: Vec<String> = self
            .messages
            .iter()
            .map(|m| match m.role {
                ChatRole::User => format!("Usuário: {}", m.text),
                ChatRole::Model => format!("Assistente: {}", m.text),
            })
            .collect();
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            text: message.to_string(),
        });
        let reply = advised_reply(advisor, brand, &history, message);
        self.messages.push(ChatMessage {
            role: ChatRole::Model,
            text: reply.clone(),
        });
        reply
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingAdvisor;

    impl RideAdvisor for FailingAdvisor {
        fn ride_tip(&self, _: &str, _: &str, _: &str) -> Result<String, AdvisorError> {
            Err(AdvisorError::Upstream("timeout".into()))
        }

        fn support_reply(&self, _: &str, _: &[String], _: &str) -> Result<String, AdvisorError> {
            Ok("   ".into())
        }
    }

    #[test]
    fn failures_degrade_to_fallbacks() {
        assert_eq!(advised_tip(&FailingAdvisor, "Mbora", "a", "b"), TIP_FALLBACK);
        assert_eq!(advised_reply(&FailingAdvisor, "Mbora", &[], "olá"), REPLY_EMPTY);
        assert_eq!(advised_tip(&UnconfiguredAdvisor, "Mbora", "a", "b"), TIP_UNAVAILABLE);
        assert_eq!(advised_reply(&UnconfiguredAdvisor, "Mbora", &[], "olá"), REPLY_UNAVAILABLE);
    }

    #[test]
    fn canned_replies_use_configured_brand() {
        let reply = advised_reply(&CannedAdvisor, "Yango Angola", &[], "Como posso pagar?");
        assert!(reply.contains("Yango Angola"));
    }

    #[test]
    fn support_chat_keeps_transcript() {
        let mut chat = SupportChat::default();
        chat.ask(&CannedAdvisor, "Mbora", "olá");
        chat.ask(&CannedAdvisor, "Mbora", "quero cancelar");

        let roles: Vec<_> = chat.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Model, ChatRole::User, ChatRole::Model]);
        assert!(chat.messages()[3].text.contains("cancelar"));
    }
}
