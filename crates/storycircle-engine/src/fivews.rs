// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic Five W's completeness analysis.
//!
//! Derives who/what/where/when/why statuses from the ember context and the
//! narrative written so far. Pure and cheap: recompute it for every question,
//! never cache it, since the context changes between turns.

use storycircle_core::{EmberContext, Message, Sender, VOICE_PLACEHOLDER};

/// Qualitative status of one W.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WStatus {
    Unidentified,
    PartiallyIdentified,
    Identified,
}

impl std::fmt::Display for WStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WStatus::Unidentified => write!(f, "unidentified"),
            WStatus::PartiallyIdentified => write!(f, "partially identified"),
            WStatus::Identified => write!(f, "identified"),
        }
    }
}

/// One of the five questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum W {
    Who,
    What,
    Where,
    When,
    Why,
}

impl std::fmt::Display for W {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            W::Who => write!(f, "who"),
            W::What => write!(f, "what"),
            W::Where => write!(f, "where"),
            W::When => write!(f, "when"),
            W::Why => write!(f, "why"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiveWs {
    pub who: WStatus,
    pub what: WStatus,
    pub where_: WStatus,
    pub when: WStatus,
    pub why: WStatus,
}

impl FiveWs {
    /// All five statuses in who/what/where/when/why order.
    pub fn entries(&self) -> [(W, WStatus); 5] {
        [
            (W::Who, self.who),
            (W::What, self.what),
            (W::Where, self.where_),
            (W::When, self.when),
            (W::Why, self.why),
        ]
    }

    /// The first W that is least identified, if any is not fully identified.
    pub fn weakest(&self) -> Option<W> {
        let entries = self.entries();
        let lowest = entries.iter().map(|(_, s)| *s).min()?;
        if lowest == WStatus::Identified {
            return None;
        }
        entries.iter().find(|(_, s)| *s == lowest).map(|(w, _)| *w)
    }

    /// "who: identified, what: unidentified, ..." for prompts and logs.
    pub fn summary(&self) -> String {
        self.entries()
            .iter()
            .map(|(w, s)| format!("{w}: {s}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Narrative length at which "what" counts as identified.
const WHAT_IDENTIFIED_CHARS: usize = 80;

/// People references, matched as whole words.
const PEOPLE_WORDS: &[&str] = &[
    "mom", "mum", "dad", "mother", "father", "brother", "sister", "grandma",
    "grandpa", "grandmother", "grandfather", "aunt", "uncle", "cousin", "friend",
    "wife", "husband", "son", "daughter", "family", "kids", "children", "we",
];

/// Place references, matched as whole words or phrases.
const PLACE_WORDS: &[&str] = &[
    "at the", "in the", "beach", "park", "house", "home", "church", "school",
    "lake", "garden", "city", "town", "village", "restaurant", "trip to",
];

/// Time references, matched as whole words or phrases.
const TIME_WORDS: &[&str] = &[
    "summer", "winter", "spring", "autumn", "fall of", "christmas", "birthday",
    "holiday", "wedding", "years ago", "when i was", "morning", "evening",
    "weekend", "anniversary", "graduation",
];

/// Emotionally significant language, matched as whole words or phrases.
const AFFECT_WORDS: &[&str] = &[
    "love", "loved", "happy", "happiest", "sad", "miss", "missed", "proud", "remember",
    "remembered", "special", "favorite", "favourite", "laugh", "laughed", "cried", "tears",
    "grateful", "meant", "beautiful", "best day", "never forget", "heart",
];

/// Alphanumeric runs of `text`, in order.
fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whether `phrase` occurs in `tokens` as consecutive whole words.
fn has_phrase(tokens: &[&str], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    !needle.is_empty() && tokens.windows(needle.len()).any(|w| w == needle.as_slice())
}

fn contains_any(tokens: &[&str], phrases: &[&str]) -> bool {
    phrases.iter().any(|p| has_phrase(tokens, p))
}

fn has_year(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_digit())
        .any(|run| run.len() == 4 && (run.starts_with("19") || run.starts_with("20")))
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Participant-written text: answers plus the ember description.
fn narrative(context: &EmberContext, messages: &[Message]) -> String {
    let mut parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.sender == Sender::Participant)
        .map(|m| m.content.as_str())
        .filter(|c| *c != VOICE_PLACEHOLDER)
        .collect();
    if let Some(description) = context.description.as_deref() {
        parts.push(description);
    }
    parts.join("\n").to_lowercase()
}

/// Analyzes the current context and narrative.
pub fn analyze(context: &EmberContext, messages: &[Message]) -> FiveWs {
    let text = narrative(context, messages);
    let tokens = tokenize(&text);

    let who = if context.tagged_people.iter().any(|p| !p.trim().is_empty()) {
        WStatus::Identified
    } else if contains_any(&tokens, PEOPLE_WORDS) {
        WStatus::PartiallyIdentified
    } else {
        WStatus::Unidentified
    };

    let narrative_chars = text.trim().chars().count();
    let what = if narrative_chars >= WHAT_IDENTIFIED_CHARS {
        WStatus::Identified
    } else if narrative_chars > 0 || non_blank(&context.title) {
        WStatus::PartiallyIdentified
    } else {
        WStatus::Unidentified
    };

    let where_ = match &context.location {
        Some(loc)
            if non_blank(&loc.name) || (loc.latitude.is_some() && loc.longitude.is_some()) =>
        {
            WStatus::Identified
        }
        Some(loc) if non_blank(&loc.city) || non_blank(&loc.country) => {
            WStatus::PartiallyIdentified
        }
        _ if contains_any(&tokens, PLACE_WORDS) => WStatus::PartiallyIdentified,
        _ => WStatus::Unidentified,
    };

    let when = if context.captured_at.is_some() {
        WStatus::Identified
    } else if non_blank(&context.manual_date) || contains_any(&tokens, TIME_WORDS) || has_year(&text)
    {
        WStatus::PartiallyIdentified
    } else {
        WStatus::Unidentified
    };

    let affect_hits = AFFECT_WORDS
        .iter()
        .filter(|p| has_phrase(&tokens, p))
        .count();
    let why = match affect_hits {
        0 => WStatus::Unidentified,
        1 => WStatus::PartiallyIdentified,
        _ => WStatus::Identified,
    };

    FiveWs {
        who,
        what,
        where_,
        when,
        why,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use storycircle_core::{EmberLocation, MessageType, TranscriptionStatus};

    use super::*;

    fn answer(content: &str) -> Message {
        Message {
            id: "m".into(),
            conversation_id: "c".into(),
            sequence_number: 1,
            sender: Sender::Participant,
            message_type: MessageType::Answer,
            content: content.into(),
            author_user_id: Some("u".into()),
            has_audio: false,
            audio_ref: None,
            audio_duration_seconds: None,
            audio_size_bytes: None,
            transcription_status: TranscriptionStatus::None,
            transcription_confidence: None,
            created_at: Utc::now(),
        }
    }

    fn empty() -> EmberContext {
        EmberContext {
            ember_id: "e1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_context_is_unidentified() {
        let ws = analyze(&empty(), &[]);
        assert!(ws.entries().iter().all(|(_, s)| *s == WStatus::Unidentified));
        assert_eq!(ws.weakest(), Some(W::Who));
    }

    #[test]
    fn structured_fields_identify() {
        let ctx = EmberContext {
            tagged_people: vec!["Ana".into()],
            location: Some(EmberLocation {
                name: Some("Golden Gate Park".into()),
                ..Default::default()
            }),
            captured_at: Some(Utc::now()),
            ..empty()
        };
        let ws = analyze(&ctx, &[]);
        assert_eq!(ws.who, WStatus::Identified);
        assert_eq!(ws.where_, WStatus::Identified);
        assert_eq!(ws.when, WStatus::Identified);
        assert_eq!(ws.what, WStatus::Unidentified);
        assert_eq!(ws.weakest(), Some(W::What));
    }

    #[test]
    fn city_only_is_partial() {
        let ctx = EmberContext {
            location: Some(EmberLocation {
                city: Some("Lisbon".into()),
                ..Default::default()
            }),
            manual_date: Some("summer 1998".into()),
            ..empty()
        };
        let ws = analyze(&ctx, &[]);
        assert_eq!(ws.where_, WStatus::PartiallyIdentified);
        assert_eq!(ws.when, WStatus::PartiallyIdentified);
    }

    #[test]
    fn narrative_drives_keyword_signals() {
        let msgs = [answer(
            "We went to the park with my sister in 1998. I loved that day and I still remember the smell of the grass.",
        )];
        let ws = analyze(&empty(), &msgs);
        assert_eq!(ws.who, WStatus::PartiallyIdentified);
        assert_eq!(ws.what, WStatus::Identified);
        assert_eq!(ws.where_, WStatus::PartiallyIdentified);
        assert_eq!(ws.when, WStatus::PartiallyIdentified);
        assert_eq!(ws.why, WStatus::Identified);
    }

    #[test]
    fn one_affect_word_is_partial() {
        let ws = analyze(&empty(), &[answer("It was a special afternoon")]);
        assert_eq!(ws.why, WStatus::PartiallyIdentified);
    }

    #[test]
    fn keywords_match_whole_words_only() {
        let ws = analyze(
            &empty(),
            &[answer("That season a person had no reason to parkour")],
        );
        assert_eq!(ws.who, WStatus::Unidentified);
        assert_eq!(ws.where_, WStatus::Unidentified);

        let ws = analyze(&empty(), &[answer("My son, Tom, came to the beach.")]);
        assert_eq!(ws.who, WStatus::PartiallyIdentified);
        assert_eq!(ws.where_, WStatus::PartiallyIdentified);
    }

    #[test]
    fn phrases_match_across_punctuation() {
        let ws = analyze(&empty(), &[answer("It was the best  day, truly. Years ago!")]);
        assert_eq!(ws.why, WStatus::PartiallyIdentified);
        assert_eq!(ws.when, WStatus::PartiallyIdentified);
    }

    #[test]
    fn placeholder_is_not_narrative() {
        let ws = analyze(&empty(), &[answer(VOICE_PLACEHOLDER)]);
        assert_eq!(ws.what, WStatus::Unidentified);
    }

    #[test]
    fn summary_lists_all_five() {
        let s = analyze(&empty(), &[]).summary();
        assert!(s.starts_with("who: unidentified"));
        assert!(s.contains("where: unidentified"));
        assert!(s.ends_with("why: unidentified"));
    }

    #[test]
    fn fully_identified_has_no_weakest() {
        let ws = FiveWs {
            who: WStatus::Identified,
            what: WStatus::Identified,
            where_: WStatus::Identified,
            when: WStatus::Identified,
            why: WStatus::Identified,
        };
        assert_eq!(ws.weakest(), None);
    }
}
