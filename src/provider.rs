//! Resolution of account domains to IMAP endpoints.
//!
//! A small fixed table covers the big consumer providers, whose IMAP hosts
//! do not match their mail domains. Everything else gets a constructed
//! `mail.<domain>` guess on the standard secure port.

/// Secure IMAP port used for every endpoint.
const IMAPS_PORT: u16 = 993;

/// Known consumer mail domains and their IMAP hosts.
const PROVIDERS: &[(&str, &str)] = &[
    ("gmail.com", "imap.gmail.com"),
    ("outlook.com", "outlook.office365.com"),
    ("hotmail.com", "outlook.office365.com"),
    ("live.com", "outlook.office365.com"),
    ("yahoo.com", "imap.mail.yahoo.com"),
    ("icloud.com", "imap.mail.me.com"),
    ("me.com", "imap.mail.me.com"),
];

/// IMAP server endpoint for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapEndpoint {
    pub host: String,
    pub port: u16,
}

impl ImapEndpoint {
    /// Resolve the endpoint from the domain part of `address`.
    ///
    /// The domain is everything after the last `@`, compared
    /// case-insensitively; an input without `@` is treated as a bare
    /// domain. Unknown domains fall back to `mail.<domain>`.
    pub fn resolve(address: &str) -> Self {
        let domain = address
            .rsplit('@')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        for (known, host) in PROVIDERS {
            if domain == *known {
                return Self {
                    host: (*host).to_string(),
                    port: IMAPS_PORT,
                };
            }
        }
        Self {
            host: format!("mail.{domain}"),
            port: IMAPS_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_domains_resolve_to_provider_hosts() {
        assert_eq!(
            ImapEndpoint::resolve("user@gmail.com").host,
            "imap.gmail.com"
        );
        assert_eq!(
            ImapEndpoint::resolve("user@yahoo.com").host,
            "imap.mail.yahoo.com"
        );
        assert_eq!(
            ImapEndpoint::resolve("user@me.com").host,
            "imap.mail.me.com"
        );
    }

    #[test]
    fn microsoft_domains_share_one_host() {
        for domain in ["outlook.com", "hotmail.com", "live.com"] {
            let endpoint = ImapEndpoint::resolve(&format!("user@{domain}"));
            assert_eq!(endpoint.host, "outlook.office365.com");
            assert_eq!(endpoint.port, 993);
        }
    }

    #[test]
    fn unknown_domains_get_the_mail_prefix_fallback() {
        let endpoint = ImapEndpoint::resolve("user@example.org");
        assert_eq!(endpoint.host, "mail.example.org");
        assert_eq!(endpoint.port, 993);
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(
            ImapEndpoint::resolve("User@GMAIL.COM").host,
            "imap.gmail.com"
        );
    }

    #[test]
    fn bare_domain_without_at_sign_still_resolves() {
        assert_eq!(
            ImapEndpoint::resolve("example.net").host,
            "mail.example.net"
        );
    }
}
