//! Search-as-you-type ranking over cached mailboxes.

use std::cmp::Ordering;

use crate::api::Mailbox;

/// How well a mailbox matched. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    Exact,
    Prefix,
    Substring,
}

/// Case-insensitive match of `query` against a mailbox's number, display
/// name and tenant names. Returns the best rank over all fields.
#[must_use]
pub fn match_rank(mailbox: &Mailbox, query: &str) -> Option<MatchRank> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Some(MatchRank::Substring);
    }

    std::iter::once(mailbox.mailbox_number.as_str())
        .chain(mailbox.display_name.as_deref())
        .chain(mailbox.tenants.iter().map(|t| t.name.as_str()))
        .filter_map(|field| rank_field(field, &needle))
        .min()
}

fn rank_field(field: &str, needle: &str) -> Option<MatchRank> {
    let haystack = field.to_lowercase();
    if haystack == needle {
        Some(MatchRank::Exact)
    } else if haystack.starts_with(needle) {
        Some(MatchRank::Prefix)
    } else if haystack.contains(needle) {
        Some(MatchRank::Substring)
    } else {
        None
    }
}

/// Order mailbox numbers numerically when both are numbers, otherwise
/// lexically. Numbered boxes sort before named ones.
#[must_use]
pub fn compare_numbers(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

/// Filter and rank `mailboxes` for `query`, keeping at most `limit`.
///
/// An empty query lists mailboxes in number order.
#[must_use]
pub fn search(mailboxes: &[Mailbox], query: &str, limit: usize) -> Vec<Mailbox> {
    let mut hits: Vec<(MatchRank, &Mailbox)> = mailboxes
        .iter()
        .filter_map(|m| match_rank(m, query).map(|rank| (rank, m)))
        .collect();

    hits.sort_by(|(ra, a), (rb, b)| {
        ra.cmp(rb)
            .then_with(|| compare_numbers(&a.mailbox_number, &b.mailbox_number))
            .then_with(|| a.id.cmp(&b.id))
    });

    hits.into_iter()
        .take(limit)
        .map(|(_, m)| m.clone())
        .collect()
}
