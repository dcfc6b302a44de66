use std::time::Duration;

use tokio::time::Instant;

use crate::models::AttendanceSnapshot;
use crate::respond;

pub const GREETING: &str = "Hello! How can I help you with your attendance?";
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub text: String,
    pub sender: Sender,
}

impl ConversationTurn {
    fn user(text: &str) -> Self {
        Self {
            text: text.to_string(),
            sender: Sender::User,
        }
    }

    fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingDisplay,
}

#[derive(Debug)]
struct PendingReply {
    due: Instant,
    seq: u64,
    text: String,
}

#[derive(Debug)]
pub struct ConversationSession {
    turns: Vec<ConversationTurn>,
    pending: Vec<PendingReply>,
    reply_delay: Duration,
    next_seq: u64,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_DELAY)
    }
}

impl ConversationSession {
    pub fn new(reply_delay: Duration) -> Self {
        Self {
            turns: vec![ConversationTurn::bot(GREETING)],
            pending: Vec::new(),
            reply_delay,
            next_seq: 0,
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn state(&self) -> SessionState {
        if self.pending.is_empty() {
            SessionState::Idle
        } else {
            SessionState::AwaitingDisplay
        }
    }

    /// Records the query, computes its reply and schedules the reply for display.
    /// Blank queries are ignored and return `false`.
    pub fn submit(&mut self, query: &str, snapshot: Option<&AttendanceSnapshot>) -> bool {
        if query.trim().is_empty() {
            return false;
        }

        self.turns.push(ConversationTurn::user(query));
        let text = respond::answer(query, snapshot);

        let seq = self.next_seq;
        self.next_seq += 1;
        let due = Instant::now() + self.reply_delay;
        self.pending.push(PendingReply { due, seq, text });

        tracing::info!(seq, pending = self.pending.len(), "query submitted");
        true
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|reply| reply.due).min()
    }

    /// Appends every reply whose delay has elapsed by `now`, earliest first.
    pub fn deliver_due(&mut self, now: Instant) -> usize {
        let (mut ready, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|reply| reply.due <= now);
        self.pending = waiting;

        ready.sort_by_key(|reply| (reply.due, reply.seq));
        let delivered = ready.len();
        for reply in ready {
            tracing::debug!(seq = reply.seq, "reply displayed");
            self.turns.push(ConversationTurn::bot(reply.text));
        }
        delivered
    }

    /// Waits out every pending reply and displays it.
    pub async fn settle(&mut self) {
        while let Some(due) = self.next_due() {
            tokio::time::sleep_until(due).await;
            self.deliver_due(Instant::now());
        }
    }

    /// Drops the conversation and any undisplayed replies.
    pub fn reset(&mut self) {
        self.turns = vec![ConversationTurn::bot(GREETING)];
        self.pending.clear();
        tracing::info!("session reset");
    }
}
