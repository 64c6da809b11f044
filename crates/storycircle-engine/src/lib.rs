// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question policy, generation and the submission state machine.
//!
//! [`SubmissionOrchestrator`] is the entry point a presentation layer drives.
//! The pure pieces ([`fivews::analyze`], [`gate::should_generate`],
//! [`content::merge_content`]) carry no state and are re-evaluated per call.

pub mod content;
pub mod fivews;
pub mod gate;
pub mod generator;
pub mod moderation;
pub mod orchestrator;
pub mod reader;
pub mod timeout;

pub use content::{MergedContent, TranscriptionOutcome, merge_content};
pub use fivews::{FiveWs, W, WStatus, analyze};
pub use gate::{GateDecision, GateOptions, GateReason, should_generate};
pub use generator::{GeneratedQuestion, GeneratorSettings, QuestionGenerator, QuestionSource};
pub use moderation::{Moderator, PendingClear, PendingDelete};
pub use orchestrator::{
    CircleServices, OpenedCircle, OrchestratorSettings, SubmissionOrchestrator,
    SubmissionOutcome, SubmissionState, capture_device_from_config, service_encodings,
};
pub use reader::CircleReader;
pub use timeout::{NetworkProfile, TimeoutPolicy, with_timeout};
