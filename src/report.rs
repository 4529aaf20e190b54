//! JSON report of one sweep.
//!
//! Dedicated serde types so the on-disk shape stays stable regardless
//! of how the in-memory types evolve.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::ScanResult;
use crate::unsubscribe::UnsubscribeSummary;

/// One sender and how many promotional messages it sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSummary {
    pub address: String,
    pub count: usize,
}

/// One harvested unsubscribe link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkExport {
    /// Sender display name; may be empty.
    pub sender: String,
    /// Sender address.
    pub email: String,
    /// The `List-Unsubscribe` target.
    pub link: String,
}

/// Everything one sweep produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// When the scan finished.
    pub scan_date: DateTime<Utc>,
    pub total_promotional: usize,
    pub unique_senders: usize,
    /// Senders ranked by message count, heaviest first.
    pub senders_summary: Vec<SenderSummary>,
    /// Rendered unsubscribe outcome per sender address.
    pub unsubscribe_results: BTreeMap<String, String>,
    /// One entry per collected message that carried a link.
    pub links: Vec<LinkExport>,
}

impl SweepReport {
    /// Shape scan and unsubscribe state into the export form.
    pub fn assemble(
        scan_date: DateTime<Utc>,
        result: &ScanResult,
        unsubscribe: &UnsubscribeSummary,
    ) -> Self {
        let senders_summary = result
            .ranked_senders()
            .into_iter()
            .map(|(address, count)| SenderSummary { address, count })
            .collect();
        let links = result
            .messages
            .iter()
            .filter_map(|message| {
                message.unsubscribe_link.as_ref().map(|link| LinkExport {
                    sender: message.sender_name.clone(),
                    email: message.sender_address.clone(),
                    link: link.clone(),
                })
            })
            .collect();
        let unsubscribe_results = unsubscribe
            .outcomes
            .iter()
            .map(|(sender, outcome)| (sender.clone(), outcome.to_string()))
            .collect();

        Self {
            scan_date,
            total_promotional: result.messages.len(),
            unique_senders: result.unique_senders(),
            senders_summary,
            unsubscribe_results,
            links,
        }
    }
}
