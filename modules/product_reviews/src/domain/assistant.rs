use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::contract::client::ReviewApi;
use crate::domain::error::{DomainError, DomainResult};

pub const SUGGESTED_QUESTIONS: [&str; 5] = [
    "How many reviews are there?",
    "What do customers say about quality?",
    "When were most reviews posted?",
    "What are the main complaints?",
    "Any common praise patterns?",
];

const FOLLOW_UP: &str = "Do you have more questions?";
const FOLLOW_UP_OPTIONS: [&str; 2] = ["Yes", "No"];
const CONNECTION_APOLOGY: &str = "Sorry, I had trouble connecting to the server. Please try again.";
const RESTART: &str = "Great! What would you like to know?";
const FAREWELL: &str = "Thank you for using AI Assistant! Feel free to come back anytime.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    /// Quick replies offered with this message.
    pub options: Vec<String>,
}

impl ChatMessage {
    fn user(text: &str) -> Self {
        Self {
            role: ChatRole::User,
            text: text.to_string(),
            options: Vec::new(),
        }
    }

    fn assistant(text: &str, options: &[&str]) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// Chat transcript about one product's reviews.
pub struct AssistantSession {
    api: Arc<dyn ReviewApi>,
    product_id: u64,
    transcript: watch::Sender<Vec<ChatMessage>>,
    asking: AtomicBool,
    ended: AtomicBool,
}

impl AssistantSession {
    pub fn new(api: Arc<dyn ReviewApi>, product_id: u64, product_name: &str) -> Self {
        let welcome = ChatMessage::assistant(
            &format!(
                "Hi! I'm your AI assistant for {product_name}. I can help you understand customer reviews better."
            ),
            &SUGGESTED_QUESTIONS,
        );
        let (transcript, _rx) = watch::channel(vec![welcome]);
        Self {
            api,
            product_id,
            transcript,
            asking: AtomicBool::new(false),
            ended: AtomicBool::new(false),
        }
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.transcript.subscribe()
    }

    pub fn is_asking(&self) -> bool {
        self.asking.load(Ordering::Acquire)
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    fn push(&self, messages: impl IntoIterator<Item = ChatMessage>) {
        self.transcript.send_modify(|t| t.extend(messages));
    }

    /// Ask one question. The answer (or an apology) is followed by a
    /// "more questions?" prompt either way.
    #[instrument(name = "product_reviews.assistant.ask", skip(self, question), fields(product_id = self.product_id))]
    pub async fn ask(&self, question: &str) -> DomainResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("question", "must not be empty"));
        }
        if self.is_ended() {
            return Err(DomainError::validation("question", "the conversation has ended"));
        }
        let _asking = AskingGuard::acquire(&self.asking)
            .ok_or(DomainError::Busy { operation: "question" })?;

        self.push([ChatMessage::user(question)]);
        match self.api.chat(self.product_id, question).await {
            Ok(response) => {
                info!(answer_len = response.answer.len(), "assistant answered");
                self.push([
                    ChatMessage::assistant(&response.answer, &[]),
                    ChatMessage::assistant(FOLLOW_UP, &FOLLOW_UP_OPTIONS),
                ]);
                Ok(response.answer)
            }
            Err(e) => {
                warn!(error = %e, "assistant request failed");
                self.push([
                    ChatMessage::assistant(CONNECTION_APOLOGY, &[]),
                    ChatMessage::assistant(FOLLOW_UP, &FOLLOW_UP_OPTIONS),
                ]);
                Err(DomainError::Api(e))
            }
        }
    }

    /// Answer the "more questions?" prompt.
    pub fn continue_conversation(&self, more: bool) -> DomainResult<()> {
        if self.is_asking() {
            return Err(DomainError::Busy { operation: "question" });
        }
        if self.ended.load(Ordering::Acquire) {
            return Ok(());
        }
        let choice = if more { FOLLOW_UP_OPTIONS[0] } else { FOLLOW_UP_OPTIONS[1] };
        if more {
            self.push([
                ChatMessage::user(choice),
                ChatMessage::assistant(RESTART, &SUGGESTED_QUESTIONS),
            ]);
        } else {
            self.ended.store(true, Ordering::Release);
            self.push([ChatMessage::user(choice), ChatMessage::assistant(FAREWELL, &[])]);
        }
        Ok(())
    }
}

struct AskingGuard<'a>(&'a AtomicBool);

impl<'a> AskingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for AskingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
