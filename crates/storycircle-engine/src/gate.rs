// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stateless policy deciding whether a new AI question may be generated.

use std::time::Duration;

use chrono::{DateTime, Utc};
use storycircle_config::model::QuestionsConfig;
use storycircle_core::{Message, Sender};

/// Thresholds the gate checks, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOptions {
    /// Minimum trimmed length, in characters, of the triggering comment.
    pub min_comment_length: usize,
    pub max_questions_per_conversation: usize,
    /// Minimum time between two AI messages.
    pub cooldown: Duration,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            min_comment_length: 10,
            max_questions_per_conversation: 3,
            cooldown: Duration::from_secs(300),
        }
    }
}

impl From<&QuestionsConfig> for GateOptions {
    fn from(config: &QuestionsConfig) -> Self {
        Self {
            min_comment_length: config.min_comment_length,
            max_questions_per_conversation: config.max_questions_per_conversation,
            cooldown: Duration::from_secs(config.cooldown_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    CommentTooShort,
    MaxQuestionsReached,
    CooldownActive,
    Approved,
}

impl std::fmt::Display for GateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateReason::CommentTooShort => write!(f, "comment too short"),
            GateReason::MaxQuestionsReached => write!(f, "max questions reached"),
            GateReason::CooldownActive => write!(f, "cooldown active"),
            GateReason::Approved => write!(f, "approved"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    pub approved: bool,
    pub reason: GateReason,
}

impl GateDecision {
    fn reject(reason: GateReason) -> Self {
        Self {
            approved: false,
            reason,
        }
    }
}

/// Number of AI-authored questions in `history`.
pub fn count_ai_questions(history: &[Message]) -> usize {
    history.iter().filter(|m| m.is_ai_question()).count()
}

/// Decides whether to generate a question after `comment`.
///
/// Time is observed only through `now`; the function holds no state.
pub fn should_generate(
    history: &[Message],
    comment: &str,
    options: &GateOptions,
    now: DateTime<Utc>,
) -> GateDecision {
    if comment.trim().chars().count() < options.min_comment_length {
        return GateDecision::reject(GateReason::CommentTooShort);
    }

    if count_ai_questions(history) >= options.max_questions_per_conversation {
        return GateDecision::reject(GateReason::MaxQuestionsReached);
    }

    let last_ai = history
        .iter()
        .filter(|m| m.sender == Sender::Ai)
        .map(|m| m.created_at)
        .max();
    if let Some(last) = last_ai {
        // A timestamp in the future counts as inside the cooldown.
        let within = match (now - last).to_std() {
            Ok(elapsed) => elapsed < options.cooldown,
            Err(_) => true,
        };
        if within {
            return GateDecision::reject(GateReason::CooldownActive);
        }
    }

    GateDecision {
        approved: true,
        reason: GateReason::Approved,
    }
}
