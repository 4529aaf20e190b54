//! Unsubscribe link harvesting and visiting.
//!
//! Links come out of `List-Unsubscribe` headers, deduplicated to the
//! first link seen per sender. Visiting is a plain HTTP GET per link
//! behind the [`LinkVisitor`] trait; the live visitor uses `ureq` and is
//! gated behind the `http` cargo feature, [`MockVisitor`] scripts
//! responses for tests. One bad link never stops the run: every link
//! gets its own [`UnsubscribeOutcome`].

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::SweepResult;
use crate::message::ScanResult;
use crate::progress::ProgressSink;

/// How long one GET may take before it counts as timed out.
#[cfg(feature = "http")]
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between consecutive requests, so list hosts never see a
/// burst.
#[cfg(feature = "http")]
pub const PACING_DELAY: Duration = Duration::from_millis(500);

/// Redirect chains longer than this abort the request.
#[cfg(feature = "http")]
const MAX_REDIRECTS: u32 = 10;

/// Some unsubscribe endpoints refuse non-browser clients.
#[cfg(feature = "http")]
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Transport failure reasons are cut to this many characters.
const FAILURE_REASON_LEN: usize = 30;

static RE_HTTP_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(https?://[^>]+)>").unwrap());

/// Pull the first `<http(s)://...>` target out of a raw
/// `List-Unsubscribe` value.
///
/// `mailto:` entries and bare URLs without angle brackets are ignored.
pub fn extract_http_link(raw: &str) -> Option<String> {
    RE_HTTP_TARGET.captures(raw).map(|caps| caps[1].to_string())
}

/// One unsubscribe link per sender, keeping the first link seen in
/// scan order.
pub fn unique_links(result: &ScanResult) -> BTreeMap<String, String> {
    let mut links = BTreeMap::new();
    for message in &result.messages {
        if let Some(link) = &message.unsubscribe_link {
            links
                .entry(message.sender_address.clone())
                .or_insert_with(|| link.clone());
        }
    }
    links
}

// ── Outcomes ────────────────────────────────────────────────────────────

/// What happened when one unsubscribe link was visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    /// The endpoint answered 200.
    Succeeded,
    /// The endpoint answered with a redirect status; list managers
    /// commonly bounce through a confirmation page, so this counts as
    /// success.
    Redirected,
    /// Any other HTTP status.
    Rejected(u16),
    /// No answer within the request timeout.
    TimedOut,
    /// The request never completed; carries a short reason.
    Failed(String),
}

impl UnsubscribeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Redirected)
    }
}

impl fmt::Display for UnsubscribeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "unsubscribed"),
            Self::Redirected => write!(f, "unsubscribed (redirected)"),
            Self::Rejected(status) => write!(f, "rejected (status {status})"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Per-sender outcomes plus tallies for one unsubscribe run.
#[derive(Debug, Clone, Default)]
pub struct UnsubscribeSummary {
    /// Outcome per sender address.
    pub outcomes: BTreeMap<String, UnsubscribeOutcome>,
    pub succeeded: usize,
    pub failed: usize,
}

// ── Visitors ────────────────────────────────────────────────────────────

/// Raw result of one GET, before outcome mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// The server answered with this status.
    Status(u16),
    /// The request timed out.
    TimedOut,
    /// The request failed below HTTP (DNS, TCP, TLS).
    Error(String),
}

/// Issues one GET per unsubscribe link.
pub trait LinkVisitor {
    fn visit(&self, url: &str) -> FetchStatus;
}

/// Live visitor over a shared `ureq` agent with browser-like headers.
#[cfg(feature = "http")]
pub struct UreqVisitor {
    agent: ureq::Agent,
}

#[cfg(feature = "http")]
impl UreqVisitor {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .redirects(MAX_REDIRECTS)
            .user_agent(USER_AGENT)
            .build();
        Self { agent }
    }
}

#[cfg(feature = "http")]
impl Default for UreqVisitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
impl LinkVisitor for UreqVisitor {
    fn visit(&self, url: &str) -> FetchStatus {
        match self.agent.get(url).call() {
            Ok(response) => FetchStatus::Status(response.status()),
            Err(ureq::Error::Status(code, _)) => FetchStatus::Status(code),
            Err(ureq::Error::Transport(transport)) => {
                if is_timeout(&transport) {
                    FetchStatus::TimedOut
                } else {
                    FetchStatus::Error(transport.to_string())
                }
            }
        }
    }
}

/// Whether a transport error is a timeout rather than some other
/// network failure. ureq wraps the io error, so walk the source chain.
#[cfg(feature = "http")]
fn is_timeout(transport: &ureq::Transport) -> bool {
    if transport.kind() != ureq::ErrorKind::Io {
        return false;
    }
    let mut source = std::error::Error::source(transport);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            );
        }
        source = cause.source();
    }
    false
}

/// Scripted visitor for tests; unscripted URLs fail.
#[derive(Debug, Default)]
pub struct MockVisitor {
    pub responses: HashMap<String, FetchStatus>,
}

impl MockVisitor {
    pub fn respond(mut self, url: &str, status: FetchStatus) -> Self {
        self.responses.insert(url.to_string(), status);
        self
    }
}

impl LinkVisitor for MockVisitor {
    fn visit(&self, url: &str) -> FetchStatus {
        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchStatus::Error("unscripted url".to_string()))
    }
}

// ── The run ─────────────────────────────────────────────────────────────

/// Visit every link with the default visitor and pacing.
///
/// Without the `http` feature this build has no way to issue requests
/// and reports [`crate::SweepError::CapabilityMissing`] instead.
pub fn run_all(
    links: &BTreeMap<String, String>,
    sink: &mut dyn ProgressSink,
) -> SweepResult<UnsubscribeSummary> {
    #[cfg(feature = "http")]
    {
        run_with(links, &UreqVisitor::new(), PACING_DELAY, sink)
    }
    #[cfg(not(feature = "http"))]
    {
        let _ = (links, sink);
        Err(crate::error::SweepError::CapabilityMissing {
            message: "this build cannot issue unsubscribe requests".into(),
        })
    }
}

/// Visit every link through `visitor`, pausing `pacing` between
/// consecutive requests.
///
/// Each link gets exactly one outcome; failures are recorded and the
/// run keeps going. An empty link set returns an empty summary without
/// touching the network.
pub fn run_with(
    links: &BTreeMap<String, String>,
    visitor: &dyn LinkVisitor,
    pacing: Duration,
    sink: &mut dyn ProgressSink,
) -> SweepResult<UnsubscribeSummary> {
    let total = links.len();
    if total == 0 {
        info!("no unsubscribe links to visit");
        sink.update("no unsubscribe links found", 100);
        return Ok(UnsubscribeSummary::default());
    }

    let mut summary = UnsubscribeSummary::default();
    for (done, (sender, link)) in links.iter().enumerate() {
        let outcome = match visitor.visit(link) {
            FetchStatus::Status(200) => UnsubscribeOutcome::Succeeded,
            FetchStatus::Status(status @ (301 | 302 | 303 | 307 | 308)) => {
                debug!("unsubscribe for {sender} redirected with {status}");
                UnsubscribeOutcome::Redirected
            }
            FetchStatus::Status(status) => UnsubscribeOutcome::Rejected(status),
            FetchStatus::TimedOut => UnsubscribeOutcome::TimedOut,
            FetchStatus::Error(reason) => {
                UnsubscribeOutcome::Failed(reason.chars().take(FAILURE_REASON_LEN).collect())
            }
        };

        if outcome.is_success() {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
            warn!("unsubscribe for {sender} did not succeed: {outcome}");
        }
        summary.outcomes.insert(sender.clone(), outcome);

        let done = done + 1;
        sink.update(
            &format!("visited {done}/{total} unsubscribe links"),
            (done * 100 / total) as u8,
        );
        if done < total {
            thread::sleep(pacing);
        }
    }

    info!("unsubscribe run: {} of {total} succeeded", summary.succeeded);
    sink.update(
        &format!(
            "unsubscribe run complete: {}/{total} succeeded",
            summary.succeeded
        ),
        100,
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::progress::NoProgress;

    fn message(uid: u32, sender: &str, link: Option<&str>) -> Message {
        Message {
            uid,
            subject: "sale".into(),
            sender_name: String::new(),
            sender_address: sender.into(),
            date: String::new(),
            unsubscribe_link: link.map(str::to_string),
            is_promotional: true,
            source_mailbox: "INBOX".into(),
        }
    }

    #[test]
    fn extract_link_takes_the_first_http_target() {
        let raw = "<mailto:unsub@shop.example>, <https://shop.example/u?id=1>";
        assert_eq!(
            extract_http_link(raw).as_deref(),
            Some("https://shop.example/u?id=1")
        );
    }

    #[test]
    fn extract_link_ignores_mailto_only_values() {
        assert_eq!(extract_http_link("<mailto:unsub@shop.example>"), None);
    }

    #[test]
    fn extract_link_requires_angle_brackets() {
        assert_eq!(extract_http_link("https://bare.example/u"), None);
    }

    #[test]
    fn unique_links_keep_the_first_per_sender() {
        let mut result = ScanResult::default();
        result.push(message(1, "news@shop.example", Some("https://shop.example/a")));
        result.push(message(2, "news@shop.example", Some("https://shop.example/b")));
        result.push(message(3, "deals@mart.example", None));
        result.push(message(4, "deals@mart.example", Some("https://mart.example/u")));

        let links = unique_links(&result);
        assert_eq!(links.len(), 2);
        assert_eq!(links["news@shop.example"], "https://shop.example/a");
        assert_eq!(links["deals@mart.example"], "https://mart.example/u");
    }

    #[test]
    fn every_link_gets_its_own_outcome() {
        let links: BTreeMap<String, String> = [
            ("a@x.example", "https://x.example/u"),
            ("b@y.example", "https://y.example/u"),
            ("c@z.example", "https://z.example/u"),
        ]
        .into_iter()
        .map(|(s, l)| (s.to_string(), l.to_string()))
        .collect();
        let visitor = MockVisitor::default()
            .respond("https://x.example/u", FetchStatus::TimedOut)
            .respond("https://y.example/u", FetchStatus::Status(200))
            .respond("https://z.example/u", FetchStatus::Status(404));

        let mut updates: Vec<String> = Vec::new();
        let mut sink = |text: &str, _: u8| updates.push(text.to_string());
        let summary = run_with(&links, &visitor, Duration::ZERO, &mut sink).unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.outcomes["a@x.example"], UnsubscribeOutcome::TimedOut);
        assert_eq!(summary.outcomes["b@y.example"], UnsubscribeOutcome::Succeeded);
        assert_eq!(
            summary.outcomes["c@z.example"],
            UnsubscribeOutcome::Rejected(404)
        );
        assert!(updates.last().unwrap().contains("1/3"));
    }

    #[test]
    fn redirect_statuses_count_as_success() {
        for status in [301, 302, 303, 307, 308] {
            let links: BTreeMap<String, String> =
                [("a@x.example".to_string(), "https://x.example/u".to_string())]
                    .into_iter()
                    .collect();
            let visitor =
                MockVisitor::default().respond("https://x.example/u", FetchStatus::Status(status));

            let summary =
                run_with(&links, &visitor, Duration::ZERO, &mut NoProgress).unwrap();
            assert_eq!(summary.succeeded, 1, "status {status}");
            assert_eq!(
                summary.outcomes["a@x.example"],
                UnsubscribeOutcome::Redirected
            );
            assert!(summary.outcomes["a@x.example"].is_success());
        }
    }

    #[test]
    fn failure_reasons_are_truncated() {
        let links: BTreeMap<String, String> =
            [("a@x.example".to_string(), "https://x.example/u".to_string())]
                .into_iter()
                .collect();
        let visitor = MockVisitor::default().respond(
            "https://x.example/u",
            FetchStatus::Error("x".repeat(60)),
        );

        let summary = run_with(&links, &visitor, Duration::ZERO, &mut NoProgress).unwrap();
        match &summary.outcomes["a@x.example"] {
            UnsubscribeOutcome::Failed(reason) => assert_eq!(reason.chars().count(), 30),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn empty_link_set_is_a_no_op() {
        let mut updates: Vec<String> = Vec::new();
        let mut sink = |text: &str, _: u8| updates.push(text.to_string());

        let summary =
            run_with(&BTreeMap::new(), &MockVisitor::default(), Duration::ZERO, &mut sink)
                .unwrap();

        assert!(summary.outcomes.is_empty());
        assert_eq!(summary.succeeded, 0);
        assert_eq!(updates, vec!["no unsubscribe links found"]);
    }

    #[test]
    fn progress_percent_climbs_to_one_hundred() {
        let links: BTreeMap<String, String> = [
            ("a@x.example", "https://x.example/u"),
            ("b@y.example", "https://y.example/u"),
        ]
        .into_iter()
        .map(|(s, l)| (s.to_string(), l.to_string()))
        .collect();
        let visitor = MockVisitor::default()
            .respond("https://x.example/u", FetchStatus::Status(200))
            .respond("https://y.example/u", FetchStatus::Status(200));

        let mut percents: Vec<u8> = Vec::new();
        let mut sink = |_: &str, percent: u8| percents.push(percent);
        run_with(&links, &visitor, Duration::ZERO, &mut sink).unwrap();

        assert_eq!(percents, vec![50, 100, 100]);
    }

    #[cfg(not(feature = "http"))]
    #[test]
    fn run_all_without_http_reports_the_missing_capability() {
        let result = run_all(&BTreeMap::new(), &mut NoProgress);
        assert!(matches!(
            result,
            Err(crate::error::SweepError::CapabilityMissing { .. })
        ));
    }
}
