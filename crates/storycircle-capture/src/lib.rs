// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device-adaptive audio capture.
//!
//! Capture is split into a pure negotiation step ([`negotiate_encoding`],
//! [`CaptureProfile::for_class`]) and a hardware step behind the
//! [`CaptureBackend`] trait. [`AudioCaptureDevice`] ties the two together and
//! hands out [`CaptureHandle`]s that release the device when dropped.

pub mod backend;
#[cfg(feature = "cpal")]
pub mod cpal_backend;
pub mod device;
pub mod encoding;
pub mod profile;
pub mod virtual_backend;
pub mod wav;

pub use backend::{CaptureBackend, CaptureStream, DeviceDescriptor, PcmRecording};
#[cfg(feature = "cpal")]
pub use cpal_backend::CpalBackend;
pub use device::{AudioCaptureDevice, CaptureHandle};
pub use encoding::{AudioEncoding, negotiate_encoding};
pub use profile::{CaptureProfile, DeviceClass};
pub use virtual_backend::VirtualBackend;
