//! Mailbox session lifecycle and protocol operations.
//!
//! The engine talks to a mailbox through the [`MailSession`] trait: a thin
//! set of pass-throughs over one authenticated connection. The live
//! implementation speaks IMAP over TLS; [`MockSession`] scripts the same
//! surface for tests. No two operations ever run concurrently against one
//! session; callers hold it exclusively.

use std::collections::{HashMap, HashSet};
use std::net::TcpStream;

use native_tls::TlsStream;
use tracing::{debug, warn};

use crate::error::{SweepError, SweepResult};
use crate::provider::ImapEndpoint;

/// Protocol operations the engine needs from a mailbox connection.
pub trait MailSession {
    /// Open a folder for subsequent operations.
    fn select(&mut self, mailbox: &str) -> SweepResult<()>;

    /// Run a search query, returning matching UIDs in ascending order.
    fn search(&mut self, query: &str) -> SweepResult<Vec<u32>>;

    /// Fetch one full raw message; `None` when the server has nothing
    /// for that UID.
    fn fetch(&mut self, uid: u32) -> SweepResult<Option<Vec<u8>>>;

    /// Flag one message for deletion.
    fn mark_deleted(&mut self, uid: u32) -> SweepResult<()>;

    /// Expunge flagged messages from the selected folder.
    fn purge(&mut self) -> SweepResult<()>;

    /// Best-effort logout; failures are swallowed, never raised.
    fn disconnect(&mut self);
}

// ── Live IMAP implementation ────────────────────────────────────────────

/// Authenticated IMAP connection over TLS.
pub struct ImapSession {
    session: imap::Session<TlsStream<TcpStream>>,
}

impl ImapSession {
    /// Connect to the account's provider and log in.
    ///
    /// The endpoint comes from the address domain (see
    /// [`ImapEndpoint::resolve`]). Rejected credentials come back as
    /// [`SweepError::Auth`] with the server's error text; DNS, TCP, and
    /// TLS failures as [`SweepError::Connection`].
    pub fn connect(address: &str, password: &str) -> SweepResult<Self> {
        let endpoint = ImapEndpoint::resolve(address);
        debug!("connecting to {}:{}", endpoint.host, endpoint.port);

        let tls = native_tls::TlsConnector::builder()
            .build()
            .map_err(|e| SweepError::Connection {
                message: format!("TLS connector build failed: {e}"),
            })?;

        let addr = (&*endpoint.host, endpoint.port);
        let client = imap::connect(addr, &endpoint.host, &tls).map_err(|e| {
            SweepError::Connection {
                message: format!("IMAP connection failed: {e}"),
            }
        })?;

        let session = client
            .login(address, password)
            .map_err(|e| SweepError::Auth {
                message: e.0.to_string(),
            })?;

        debug!("logged in as {address}");
        Ok(Self { session })
    }
}

impl MailSession for ImapSession {
    fn select(&mut self, mailbox: &str) -> SweepResult<()> {
        self.session
            .select(mailbox)
            .map_err(|e| SweepError::protocol("select", e))?;
        Ok(())
    }

    fn search(&mut self, query: &str) -> SweepResult<Vec<u32>> {
        let found = self
            .session
            .uid_search(query)
            .map_err(|e| SweepError::protocol("search", e))?;
        // IMAP hands back an unordered set; ascending UID order is
        // mailbox order.
        let mut uids: Vec<u32> = found.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    fn fetch(&mut self, uid: u32) -> SweepResult<Option<Vec<u8>>> {
        let fetches = self
            .session
            .uid_fetch(uid.to_string(), "RFC822")
            .map_err(|e| SweepError::protocol("fetch", e))?;
        Ok(fetches
            .iter()
            .next()
            .and_then(|fetch| fetch.body())
            .map(|body| body.to_vec()))
    }

    fn mark_deleted(&mut self, uid: u32) -> SweepResult<()> {
        self.session
            .uid_store(uid.to_string(), "+FLAGS (\\Deleted)")
            .map_err(|e| SweepError::protocol("store", e))?;
        Ok(())
    }

    fn purge(&mut self) -> SweepResult<()> {
        self.session
            .expunge()
            .map_err(|e| SweepError::protocol("expunge", e))?;
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Err(e) = self.session.logout() {
            warn!("logout failed, dropping the connection anyway: {e}");
        }
    }
}

// ── Scripted mock ───────────────────────────────────────────────────────

/// In-memory session double.
///
/// Serves messages from a map, records every call, and injects failures
/// on demand. Public so integration tests and downstream front ends can
/// exercise full flows without a server.
#[derive(Debug, Default)]
pub struct MockSession {
    /// Raw messages by UID, served by `fetch`.
    pub messages: HashMap<u32, Vec<u8>>,
    /// UIDs returned by `search`, in mailbox order.
    pub uids: Vec<u32>,
    /// UIDs whose fetch fails.
    pub fail_fetch: HashSet<u32>,
    /// UIDs whose deletion flag fails.
    pub fail_store: HashSet<u32>,
    /// Whether `purge` fails.
    pub fail_purge: bool,
    /// Folders selected so far.
    pub selected: Vec<String>,
    /// Queries passed to `search`.
    pub searches: Vec<String>,
    /// UIDs passed to `fetch`, in call order.
    pub fetched: Vec<u32>,
    /// UIDs flagged for deletion.
    pub flagged: Vec<u32>,
    /// Purges that went through.
    pub purges: usize,
    /// Whether `disconnect` was called.
    pub disconnected: bool,
}

impl MockSession {
    /// Session pre-loaded with `(uid, raw)` messages in mailbox order.
    pub fn with_messages(messages: Vec<(u32, Vec<u8>)>) -> Self {
        let mut mock = Self::default();
        for (uid, raw) in messages {
            mock.uids.push(uid);
            mock.messages.insert(uid, raw);
        }
        mock
    }
}

impl MailSession for MockSession {
    fn select(&mut self, mailbox: &str) -> SweepResult<()> {
        self.selected.push(mailbox.to_string());
        Ok(())
    }

    fn search(&mut self, query: &str) -> SweepResult<Vec<u32>> {
        self.searches.push(query.to_string());
        Ok(self.uids.clone())
    }

    fn fetch(&mut self, uid: u32) -> SweepResult<Option<Vec<u8>>> {
        self.fetched.push(uid);
        if self.fail_fetch.contains(&uid) {
            return Err(SweepError::protocol("fetch", format!("scripted failure for {uid}")));
        }
        Ok(self.messages.get(&uid).cloned())
    }

    fn mark_deleted(&mut self, uid: u32) -> SweepResult<()> {
        if self.fail_store.contains(&uid) {
            return Err(SweepError::protocol("store", format!("scripted failure for {uid}")));
        }
        self.flagged.push(uid);
        Ok(())
    }

    fn purge(&mut self) -> SweepResult<()> {
        if self.fail_purge {
            return Err(SweepError::protocol("expunge", "scripted failure"));
        }
        self.purges += 1;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnected = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_serves_and_records() {
        let mut mock = MockSession::with_messages(vec![
            (3, b"Subject: a\r\n\r\n".to_vec()),
            (7, b"Subject: b\r\n\r\n".to_vec()),
        ]);

        mock.select("INBOX").unwrap();
        assert_eq!(mock.search("ALL").unwrap(), vec![3, 7]);
        assert!(mock.fetch(3).unwrap().is_some());
        assert!(mock.fetch(99).unwrap().is_none());
        mock.mark_deleted(7).unwrap();
        mock.purge().unwrap();

        assert_eq!(mock.selected, vec!["INBOX"]);
        assert_eq!(mock.searches, vec!["ALL"]);
        assert_eq!(mock.flagged, vec![7]);
        assert_eq!(mock.purges, 1);
    }

    #[test]
    fn mock_injects_failures() {
        let mut mock = MockSession::default();
        mock.fail_fetch.insert(5);
        mock.fail_purge = true;

        assert!(matches!(
            mock.fetch(5),
            Err(SweepError::Protocol { operation: "fetch", .. })
        ));
        assert!(matches!(
            mock.purge(),
            Err(SweepError::Protocol { operation: "expunge", .. })
        ));
        assert_eq!(mock.purges, 0);
    }
}
