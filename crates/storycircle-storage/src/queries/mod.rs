// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for operations on storage entities.

pub mod blobs;
pub mod circle;
pub mod conversations;
pub mod embers;
pub mod messages;
pub mod training;
