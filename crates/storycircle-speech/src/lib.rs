// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech adapters for Story Circle.
//!
//! [`HttpTranscriber`] talks to an OpenAI-compatible speech-to-text API and
//! [`HttpSynthesizer`] to an ElevenLabs-style text-to-speech API. Both are
//! optional enhancements: callers recover from their errors locally.
//! [`VoiceSynthesis`] gates synthesis on a trained voice, and [`PlaybackSlot`]
//! keeps at most one clip active per session.

mod http;
pub mod playback;
pub mod synthesizer;
pub mod training;
pub mod transcriber;
pub mod voice;

pub use http::resolve_api_key;
pub use playback::{ActivePlayback, PlaybackKind, PlaybackSlot, PlaybackTicket};
pub use synthesizer::HttpSynthesizer;
pub use training::forward_training;
pub use transcriber::HttpTranscriber;
pub use voice::{PlaybackControl, VoiceSynthesis};
