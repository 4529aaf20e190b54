//! Data model for scanned messages.

use std::collections::HashMap;

/// One message classified as promotional.
#[derive(Debug, Clone)]
pub struct Message {
    /// Mailbox-assigned UID, valid for delete operations on the
    /// connection that produced it.
    pub uid: u32,
    /// Decoded subject, truncated for display, never empty.
    pub subject: String,
    /// Decoded display name of the sender.
    pub sender_name: String,
    /// Lower-cased sender address.
    pub sender_address: String,
    /// Date header exactly as the server supplied it.
    pub date: String,
    /// HTTP(S) unsubscribe target, when the message carried one.
    pub unsubscribe_link: Option<String>,
    /// Classification verdict; the scanner only stores promotional mail,
    /// so this is always true for stored messages.
    pub is_promotional: bool,
    /// Folder the message was read from.
    pub source_mailbox: String,
}

/// Everything one scan produced: messages in mailbox order plus
/// per-sender occurrence counts.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub messages: Vec<Message>,
    pub sender_counts: HashMap<String, usize>,
}

impl ScanResult {
    /// Append a message and bump its sender's count.
    pub fn push(&mut self, message: Message) {
        *self
            .sender_counts
            .entry(message.sender_address.clone())
            .or_insert(0) += 1;
        self.messages.push(message);
    }

    /// Senders ranked by promotional count, highest first. Ties break on
    /// the address so the ranking is deterministic.
    pub fn ranked_senders(&self) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self
            .sender_counts
            .iter()
            .map(|(address, count)| (address.clone(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Number of distinct sender addresses.
    pub fn unique_senders(&self) -> usize {
        self.sender_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
