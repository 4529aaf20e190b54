//! The engine facade: one connection, one scan, the follow-up actions.
//!
//! [`Sweeper`] owns the session and the latest scan state so front ends
//! only juggle one value. Every scan replaces the previous results;
//! unsubscribe runs and deletion always act on the stored scan, never
//! on a fresh mailbox pass.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::delete::delete_all;
use crate::error::SweepResult;
use crate::message::ScanResult;
use crate::progress::ProgressSink;
use crate::report::SweepReport;
use crate::scan::{ScanOptions, scan_mailbox};
use crate::session::{ImapSession, MailSession};
use crate::unsubscribe::{self, LinkVisitor, UnsubscribeSummary};

pub struct Sweeper {
    session: Option<Box<dyn MailSession>>,
    result: ScanResult,
    unsubscribe: UnsubscribeSummary,
    scanned_at: Option<DateTime<Utc>>,
}

impl Sweeper {
    pub fn new() -> Self {
        Self {
            session: None,
            result: ScanResult::default(),
            unsubscribe: UnsubscribeSummary::default(),
            scanned_at: None,
        }
    }

    /// Engine over an already-open session. Front ends and tests use
    /// this to skip the network.
    pub fn with_session(session: Box<dyn MailSession>) -> Self {
        let mut sweeper = Self::new();
        sweeper.session = Some(session);
        sweeper
    }

    /// Connect to the account's provider and log in.
    pub fn connect(&mut self, address: &str, password: &str) -> SweepResult<()> {
        let session = ImapSession::connect(address, password)?;
        info!("connected as {address}");
        self.session = Some(Box::new(session));
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Log out and drop the session. Safe to call when not connected.
    pub fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.disconnect();
        }
    }

    /// Scan the inbox and store the collected promotional messages.
    ///
    /// Replaces any previous scan state. Without a connection this is a
    /// no-op returning an empty result, and the stored state keeps its
    /// last value.
    pub fn scan(
        &mut self,
        options: &ScanOptions,
        sink: &mut dyn ProgressSink,
    ) -> SweepResult<ScanResult> {
        let Some(session) = self.session.as_mut() else {
            return Ok(ScanResult::default());
        };
        self.result = ScanResult::default();
        self.unsubscribe = UnsubscribeSummary::default();
        self.scanned_at = None;

        let scanned = scan_mailbox(session.as_mut(), options, sink)?;
        self.scanned_at = Some(Utc::now());
        self.result = scanned.clone();
        Ok(scanned)
    }

    /// The stored scan, as of the last [`Sweeper::scan`].
    pub fn result(&self) -> &ScanResult {
        &self.result
    }

    /// First unsubscribe link per sender from the stored scan.
    pub fn links(&self) -> BTreeMap<String, String> {
        unsubscribe::unique_links(&self.result)
    }

    /// Visit every harvested link with the default visitor and pacing.
    ///
    /// Works from the stored scan, so no connection is needed.
    pub fn run_unsubscribe(
        &mut self,
        sink: &mut dyn ProgressSink,
    ) -> SweepResult<UnsubscribeSummary> {
        let links = unsubscribe::unique_links(&self.result);
        let summary = unsubscribe::run_all(&links, sink)?;
        self.unsubscribe = summary.clone();
        Ok(summary)
    }

    /// Visit every harvested link through a caller-supplied visitor.
    pub fn run_unsubscribe_with(
        &mut self,
        visitor: &dyn LinkVisitor,
        pacing: Duration,
        sink: &mut dyn ProgressSink,
    ) -> SweepResult<UnsubscribeSummary> {
        let links = unsubscribe::unique_links(&self.result);
        let summary = unsubscribe::run_with(&links, visitor, pacing, sink)?;
        self.unsubscribe = summary.clone();
        Ok(summary)
    }

    /// Delete every message from the stored scan.
    pub fn delete_scanned(&mut self) -> SweepResult<(usize, String)> {
        let Some(session) = self.session.as_mut() else {
            return Ok((0, "not connected".to_string()));
        };
        delete_all(session.as_mut(), &self.result.messages)
    }

    /// Export everything the stored scan and unsubscribe run produced.
    pub fn report(&self) -> SweepReport {
        SweepReport::assemble(
            self.scanned_at.unwrap_or_else(Utc::now),
            &self.result,
            &self.unsubscribe,
        )
    }
}

impl Default for Sweeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::session::MockSession;
    use crate::unsubscribe::{FetchStatus, MockVisitor};

    fn promo(uid: u32, from: &str, link: &str) -> (u32, Vec<u8>) {
        let raw = format!(
            "From: {from}\r\nTo: me@example.com\r\nSubject: flash sale\r\n\
             Date: Mon, 3 Aug 2026 10:00:00 +0000\r\n\
             List-Unsubscribe: <{link}>\r\n\r\nbody\r\n"
        );
        (uid, raw.into_bytes())
    }

    #[test]
    fn scan_without_connection_is_an_empty_no_op() {
        let mut sweeper = Sweeper::new();
        assert!(!sweeper.is_connected());

        let result = sweeper
            .scan(&ScanOptions::default(), &mut NoProgress)
            .unwrap();
        assert!(result.is_empty());
        assert!(sweeper.result().is_empty());
    }

    #[test]
    fn delete_without_connection_reports_it() {
        let mut sweeper = Sweeper::new();
        let (count, summary) = sweeper.delete_scanned().unwrap();
        assert_eq!(count, 0);
        assert_eq!(summary, "not connected");
    }

    #[test]
    fn scan_stores_results_and_links() {
        let mock = MockSession::with_messages(vec![
            promo(1, "news@shop.example", "https://shop.example/u"),
            promo(2, "deals@mart.example", "https://mart.example/u"),
        ]);
        let mut sweeper = Sweeper::with_session(Box::new(mock));

        let result = sweeper
            .scan(&ScanOptions::default(), &mut NoProgress)
            .unwrap();

        assert_eq!(result.messages.len(), 2);
        assert_eq!(sweeper.result().messages.len(), 2);
        assert_eq!(sweeper.links().len(), 2);
        assert_eq!(sweeper.report().total_promotional, 2);
    }

    #[test]
    fn scan_after_disconnect_keeps_the_stored_result() {
        let mock =
            MockSession::with_messages(vec![promo(1, "news@shop.example", "https://shop.example/u")]);
        let mut sweeper = Sweeper::with_session(Box::new(mock));
        sweeper.scan(&ScanOptions::default(), &mut NoProgress).unwrap();
        sweeper.disconnect();

        let rescan = sweeper
            .scan(&ScanOptions::default(), &mut NoProgress)
            .unwrap();

        assert!(rescan.is_empty());
        assert_eq!(sweeper.result().messages.len(), 1);
    }

    #[test]
    fn unsubscribe_run_lands_in_the_report() {
        let mock =
            MockSession::with_messages(vec![promo(1, "news@shop.example", "https://shop.example/u")]);
        let mut sweeper = Sweeper::with_session(Box::new(mock));
        sweeper.scan(&ScanOptions::default(), &mut NoProgress).unwrap();

        let visitor =
            MockVisitor::default().respond("https://shop.example/u", FetchStatus::Status(200));
        let summary = sweeper
            .run_unsubscribe_with(&visitor, Duration::ZERO, &mut NoProgress)
            .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(
            sweeper.report().unsubscribe_results["news@shop.example"],
            "unsubscribed"
        );
    }
}
