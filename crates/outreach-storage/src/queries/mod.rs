// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table group.

pub mod campaigns;
pub mod conversations;
pub mod queue;
pub mod senders;
pub mod settings;
