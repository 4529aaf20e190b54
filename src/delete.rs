//! Bulk deletion of scanned messages.
//!
//! Two-phase: flag every message, then purge the folder once. Flagging
//! failures are per-message and never stop the pass; a failed purge is
//! fatal because nothing has actually been removed at that point.

use tracing::{info, warn};

use crate::error::SweepResult;
use crate::message::Message;
use crate::scan::INBOX;
use crate::session::MailSession;

/// Delete `messages` from the inbox.
///
/// Returns how many messages were flagged plus a short display summary.
/// An empty slice is a no-op that never touches the session.
pub fn delete_all(
    session: &mut dyn MailSession,
    messages: &[Message],
) -> SweepResult<(usize, String)> {
    if messages.is_empty() {
        return Ok((0, "no messages to delete".to_string()));
    }

    session.select(INBOX)?;

    let mut flagged = 0usize;
    for message in messages {
        match session.mark_deleted(message.uid) {
            Ok(()) => flagged += 1,
            Err(e) => warn!("could not flag message {} for deletion: {e}", message.uid),
        }
    }

    session.purge()?;
    info!("purged {flagged} of {} flagged messages", messages.len());
    Ok((
        flagged,
        format!("deleted {flagged} of {} messages", messages.len()),
    ))
}
