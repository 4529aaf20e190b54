//! Promotional-message heuristic.
//!
//! Layered rules in strict order: a trusted-sender exemption beats
//! everything, then bulk-delivery precedence, then the presence of a
//! `List-Unsubscribe` header, then a multilingual keyword sweep over the
//! subject and sender. Best-effort by construction; false negatives are
//! preferred over deleting someone's invoice.

/// Sender-address substrings that exempt a message from promotional
/// classification no matter what other signals say. Transactional,
/// security, and billing senders match these.
pub const TRUSTED_PATTERNS: &[&str] = &[
    "noreply@google.com",
    "security@",
    "account@",
    "support@",
    "billing@",
    "invoice@",
    "receipt@",
    "order@",
    "shipping@",
];

/// Marketing vocabulary matched as case-insensitive substrings over
/// `"{subject} {sender}"`. English and Arabic.
pub const PROMOTIONAL_KEYWORDS: &[&str] = &[
    "unsubscribe",
    "newsletter",
    "promotional",
    "marketing",
    "sale",
    "discount",
    "offer",
    "deal",
    "promo",
    "subscribe",
    "opt-out",
    "opt out",
    "weekly digest",
    "daily digest",
    "notification settings",
    "email preferences",
    "manage subscriptions",
    "limited time",
    "exclusive",
    "free shipping",
    "buy now",
    "إلغاء الاشتراك",
    "نشرة إخبارية",
    "عرض خاص",
    "تخفيضات",
    "خصم",
    "عروض",
    "اشترك",
    "تسوق الآن",
    "لفترة محدودة",
];

/// `Precedence` values that mark bulk delivery.
const BULK_PRECEDENCE: &[&str] = &["bulk", "list", "junk"];

/// Decide whether a message is promotional.
///
/// `precedence` is the raw `Precedence` header value if present, and
/// `has_unsubscribe_header` whether a non-empty `List-Unsubscribe` header
/// was seen. The trusted-sender exemption always wins, even when bulk
/// headers or keyword hits are present, so transactional mail survives a
/// sweep.
pub fn is_promotional(
    subject: &str,
    sender_address: &str,
    precedence: Option<&str>,
    has_unsubscribe_header: bool,
) -> bool {
    let sender = sender_address.to_lowercase();
    if TRUSTED_PATTERNS.iter().any(|p| sender.contains(p)) {
        return false;
    }

    if let Some(value) = precedence {
        let value = value.trim().to_lowercase();
        if BULK_PRECEDENCE.contains(&value.as_str()) {
            return true;
        }
    }

    if has_unsubscribe_header {
        return true;
    }

    let haystack = format!("{subject} {sender}").to_lowercase();
    PROMOTIONAL_KEYWORDS.iter().any(|k| haystack.contains(k))
}
