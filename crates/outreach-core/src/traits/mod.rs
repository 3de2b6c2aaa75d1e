// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter and repository trait definitions.
//!
//! Adapters extend the [`PluginAdapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility. The store traits are the persistence
//! seams the dispatch runner is written against.

pub mod adapter;
pub mod campaign;
pub mod conversation;
pub mod queue;
pub mod senders;
pub mod settings;
pub mod storage;
pub mod transport;

pub use adapter::PluginAdapter;
pub use campaign::CampaignStore;
pub use conversation::ConversationStore;
pub use queue::QueueStore;
pub use senders::SenderStore;
pub use settings::SettingsStore;
pub use storage::StorageAdapter;
pub use transport::TransportAdapter;

/// Every repository the dispatch runner touches, behind one object.
pub trait DispatchStore:
    QueueStore + SenderStore + ConversationStore + CampaignStore + SettingsStore
{
}

impl<T> DispatchStore for T where
    T: QueueStore + SenderStore + ConversationStore + CampaignStore + SettingsStore
{
}
