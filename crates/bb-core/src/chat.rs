//! Chat session with a persona: an ordered message log.
//!
//! User messages are appended as soon as they are sent; the persona reply is
//! appended later by whoever drives the session (the CLI waits
//! [`RESPONSE_DELAY_MS`](crate::constants::RESPONSE_DELAY_MS) first). Replies
//! are computed per user message, so several quick sends each get their own
//! reply with no de-duplication.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{Catalog, Persona};
use crate::category::Category;
use crate::error::Result;
use crate::selection::select_response;

/// Categories assumed when the user has not picked any yet.
pub const DEFAULT_CHAT_CATEGORIES: &[Category] = &[Category::SocialMedia];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Persona,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub sent_at: u64,
}

impl ChatMessage {
    fn new(text: String, sender: Sender) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            sender,
            sent_at: now_unix_secs(),
        }
    }
}

pub struct ChatSession {
    persona: Persona,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Start a session; the persona speaks first.
    pub fn new(persona: Persona) -> Self {
        let greeting = format!("I'm {}. {}", persona.name, persona.style.greeting());
        Self {
            messages: vec![ChatMessage::new(greeting, Sender::Persona)],
            persona,
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a user message. Blank input is ignored.
    pub fn send(&mut self, text: &str) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.messages
            .push(ChatMessage::new(text.to_string(), Sender::User));
        self.messages.last()
    }

    /// Compute and append the persona's reply to `message`.
    pub fn reply_to(
        &mut self,
        catalog: &Catalog,
        message: &str,
        member_categories: &[Category],
        rng: &mut impl Rng,
    ) -> Result<&ChatMessage> {
        let members = if member_categories.is_empty() {
            DEFAULT_CHAT_CATEGORIES
        } else {
            member_categories
        };
        let text = select_response(catalog, message, self.persona.style, members, rng)?;
        Ok(self.push_reply(text))
    }

    /// Append a persona message verbatim.
    pub fn push_reply(&mut self, text: &str) -> &ChatMessage {
        self.messages
            .push(ChatMessage::new(text.to_string(), Sender::Persona));
        &self.messages[self.messages.len() - 1]
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::PersonaStyle;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn coach_session(catalog: &Catalog) -> ChatSession {
        ChatSession::new(catalog.persona("bully_coach").unwrap().clone())
    }

    #[test]
    fn test_session_opens_with_greeting() {
        let catalog = Catalog::reference();
        let session = coach_session(&catalog);
        assert_eq!(session.messages().len(), 1);
        let first = &session.messages()[0];
        assert_eq!(first.sender, Sender::Persona);
        assert!(first.text.starts_with("I'm Bully Coach."));
        assert!(first.text.ends_with(PersonaStyle::Coach.greeting()));
    }

    #[test]
    fn test_blank_message_ignored() {
        let catalog = Catalog::reference();
        let mut session = coach_session(&catalog);
        assert!(session.send("   ").is_none());
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_send_then_reply_ordering() {
        let catalog = Catalog::reference();
        let mut rng = rng();
        let mut session = coach_session(&catalog);

        let sent = session.send("  one more cigarette ").unwrap().text.clone();
        assert_eq!(sent, "one more cigarette");

        let reply = session
            .reply_to(&catalog, &sent, &[Category::Substance], &mut rng)
            .unwrap()
            .text
            .clone();
        let bucket = catalog
            .lookup_responses(PersonaStyle::Coach, Category::Substance)
            .unwrap();
        assert!(bucket.contains(&reply));

        let senders: Vec<Sender> = session.messages().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::Persona, Sender::User, Sender::Persona]);
    }

    #[test]
    fn test_quick_sends_each_get_a_reply() {
        let catalog = Catalog::reference();
        let mut rng = rng();
        let mut session = coach_session(&catalog);

        let a = session.send("first").unwrap().text.clone();
        let b = session.send("second").unwrap().text.clone();
        session
            .reply_to(&catalog, &a, &[Category::Porn], &mut rng)
            .unwrap();
        session
            .reply_to(&catalog, &b, &[Category::Porn], &mut rng)
            .unwrap();

        let senders: Vec<Sender> = session.messages().iter().map(|m| m.sender).collect();
        assert_eq!(
            senders,
            vec![
                Sender::Persona,
                Sender::User,
                Sender::User,
                Sender::Persona,
                Sender::Persona
            ]
        );
    }

    #[test]
    fn test_reply_without_categories_uses_social_media() {
        let catalog = Catalog::reference();
        let mut rng = rng();
        let mut session = coach_session(&catalog);
        let reply = session
            .reply_to(&catalog, "hello", &[], &mut rng)
            .unwrap()
            .text
            .clone();
        let bucket = catalog
            .lookup_responses(PersonaStyle::Coach, Category::SocialMedia)
            .unwrap();
        assert!(bucket.contains(&reply));
    }
}
