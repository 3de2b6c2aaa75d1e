// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Round-robin sender selection within one batch.

use outreach_core::SenderIdentity;

/// Round-robin cursor over the senders eligible at batch start.
///
/// Each sender may be picked at most `remaining_quota()` times per batch;
/// exhausted senders are passed over.
#[derive(Debug, Clone)]
pub struct SenderRotation {
    senders: Vec<SenderIdentity>,
    picks: Vec<u32>,
    cursor: usize,
}

impl SenderRotation {
    pub fn new(senders: Vec<SenderIdentity>) -> Self {
        let picks = vec![0; senders.len()];
        Self {
            senders,
            picks,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Next sender with quota left, or `None` once every sender is exhausted.
    pub fn next_sender(&mut self) -> Option<&SenderIdentity> {
        let n = self.senders.len();
        for offset in 0..n {
            let idx = (self.cursor + offset) % n;
            if self.picks[idx] < self.senders[idx].remaining_quota() {
                self.picks[idx] += 1;
                self.cursor = (idx + 1) % n;
                return Some(&self.senders[idx]);
            }
        }
        None
    }

    /// How many times each sender (by id) has been picked this batch.
    pub fn picks(&self) -> impl Iterator<Item = (&str, u32)> {
        self.senders
            .iter()
            .zip(self.picks.iter())
            .map(|(s, n)| (s.id.as_str(), *n))
    }
}
