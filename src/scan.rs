//! Mailbox scan: search a recency window, classify, collect.
//!
//! One pass over the most recent messages in the inbox. Every candidate
//! is fetched in full, classified, and either collected (promotional) or
//! dropped (everything else). A message that cannot be fetched or parsed
//! never aborts the pass; it is logged and skipped.

use chrono::{Duration, Utc};
use mail_parser::MessageParser;
use tracing::{debug, info, warn};

use crate::address::parse_sender;
use crate::classify::is_promotional;
use crate::decode::decode_header;
use crate::error::SweepResult;
use crate::message::{Message, ScanResult};
use crate::progress::ProgressSink;
use crate::session::MailSession;
use crate::unsubscribe::extract_http_link;

/// Folder every scan and delete operates on.
pub const INBOX: &str = "INBOX";

/// Stored subjects are cut to this many characters for display.
const SUBJECT_DISPLAY_LEN: usize = 80;

/// Stand-in for messages with an empty or missing subject.
const NO_SUBJECT: &str = "(no subject)";

/// A progress update is emitted after every this many candidates.
const PROGRESS_EVERY: usize = 20;

/// Bounds on how much of the mailbox one scan covers.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Only messages from the last this many days are searched.
    pub window_days: u32,
    /// At most this many of the most recent matches are examined.
    pub max_messages: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            window_days: 30,
            max_messages: 500,
        }
    }
}

/// Scan the inbox and collect every promotional message in the window.
///
/// Selects [`INBOX`], searches `(SINCE "<cutoff>")` with the cutoff
/// `window_days` before now, keeps the `max_messages` highest UIDs, and
/// examines them in ascending UID order. Per-message fetch and parse
/// failures are logged and skipped; only select and search failures
/// abort the scan.
pub fn scan_mailbox(
    session: &mut dyn MailSession,
    options: &ScanOptions,
    sink: &mut dyn ProgressSink,
) -> SweepResult<ScanResult> {
    session.select(INBOX)?;

    let cutoff = Utc::now() - Duration::days(i64::from(options.window_days));
    let query = format!("(SINCE \"{}\")", cutoff.format("%d-%b-%Y"));
    let uids = session.search(&query)?;

    // Highest UIDs are the newest messages; drop everything older than
    // the cap.
    let skip = uids.len().saturating_sub(options.max_messages);
    let recent = &uids[skip..];
    let total = recent.len();
    info!("scanning {total} of {} matching messages", uids.len());
    sink.update(&format!("examining {total} messages..."), 0);

    let mut result = ScanResult::default();
    for (index, &uid) in recent.iter().enumerate() {
        match examine_one(session, uid) {
            Ok(Some(message)) => result.push(message),
            Ok(None) => {}
            Err(e) => warn!("skipping message {uid}: {e}"),
        }

        let processed = index + 1;
        if processed % PROGRESS_EVERY == 0 {
            let percent = (processed * 100 / total) as u8;
            sink.update(
                &format!(
                    "scanned {processed}/{total} ({} promotional)",
                    result.messages.len()
                ),
                percent,
            );
        }
    }

    info!("scan found {} promotional messages", result.messages.len());
    sink.update(
        &format!("scan complete: {} promotional messages", result.messages.len()),
        100,
    );
    Ok(result)
}

/// Fetch, parse, and classify one message.
///
/// `Ok(None)` means the message is gone, unparseable, or simply not
/// promotional.
fn examine_one(session: &mut dyn MailSession, uid: u32) -> SweepResult<Option<Message>> {
    let Some(raw) = session.fetch(uid)? else {
        debug!("message {uid} vanished between search and fetch");
        return Ok(None);
    };
    let Some(parsed) = MessageParser::default().parse(&raw) else {
        debug!("message {uid} did not parse as MIME");
        return Ok(None);
    };

    let subject_raw = parsed.header_raw("Subject").map(str::trim).unwrap_or_default();
    let from_raw = parsed.header_raw("From").map(str::trim).unwrap_or_default();
    let precedence = parsed.header_raw("Precedence");
    let list_unsubscribe = parsed.header_raw("List-Unsubscribe");
    let has_unsubscribe = list_unsubscribe.is_some_and(|v| !v.trim().is_empty());

    let subject = decode_header(subject_raw);
    let (sender_name, sender_address) = parse_sender(from_raw);

    if !is_promotional(&subject, &sender_address, precedence, has_unsubscribe) {
        return Ok(None);
    }

    let subject = if subject.is_empty() {
        NO_SUBJECT.to_string()
    } else {
        subject.chars().take(SUBJECT_DISPLAY_LEN).collect()
    };

    Ok(Some(Message {
        uid,
        subject,
        sender_name,
        sender_address,
        date: parsed
            .header_raw("Date")
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        unsubscribe_link: list_unsubscribe.and_then(extract_http_link),
        is_promotional: true,
        source_mailbox: INBOX.to_string(),
    }))
}
