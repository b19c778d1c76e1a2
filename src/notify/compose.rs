//! Rendering of change sets into size-bounded chat messages.
//!
//! Every message is built as a list of parts (header, section titles,
//! bullets). Free text is escaped per field before it is joined with the
//! composer's own markup, and messages are only split between parts.

use crate::models::{AvailabilityById, AvailabilityUpdates, PriceUpdate, TrackedItems};
use crate::notify::markdown::{escape, inline_link};
use crate::utils::plural_items;

const MISSING_URL: &str = "#";

/// Messages announcing price updates. Without updates this is a single
/// header-only message.
///
/// Bullets are grouped as drops, then new prices, then rises.
pub fn price_messages(items: &TrackedItems, updates: &[PriceUpdate], limit: usize) -> Vec<String> {
    let link = |id: &str| {
        let (name, url) = items
            .get(id)
            .map(|item| (non_empty(&item.name, id), non_empty(&item.url, MISSING_URL)))
            .unwrap_or((id, MISSING_URL));
        inline_link(name, url)
    };

    let mut drops = Vec::new();
    let mut added = Vec::new();
    let mut rises = Vec::new();

    for update in updates {
        match update {
            PriceUpdate::New { id, price } => added.push(format!(
                "{}{}\n\n",
                escape(&format!(" • ⭐ added price ({price}) for ")),
                link(id)
            )),
            PriceUpdate::Changed {
                id,
                previous_price,
                price,
            } if update.is_drop() => drops.push(format!(
                "{}{}\n\n",
                escape(&format!(" • 💚 {previous_price} -> {price} for ")),
                link(id)
            )),
            PriceUpdate::Changed {
                id,
                previous_price,
                price,
            } => rises.push(format!(
                "{}{}\n\n",
                escape(&format!(" • 💔 {price} <- {previous_price} for ")),
                link(id)
            )),
        }
    }

    let count = updates.len();
    let mut parts = vec![escape(&format!(
        "Price changed for {count} {}:\n\n",
        plural_items(count)
    ))];
    parts.extend(drops);
    parts.extend(added);
    parts.extend(rises);

    split_message(&parts, limit)
}

/// Messages announcing availability transitions of one site.
///
/// `info` supplies names and URLs; it should hold the previous records
/// overlaid with the current ones so vanished items can still be named.
pub fn availability_messages(
    site_name: &str,
    info: &AvailabilityById,
    updates: &AvailabilityUpdates,
    limit: usize,
) -> Vec<String> {
    let bullet = |marker: &str, id: &String| {
        let (name, url) = info
            .get(id)
            .map(|r| (non_empty(&r.name, id), non_empty(&r.url, MISSING_URL)))
            .unwrap_or((id.as_str(), MISSING_URL));
        format!(" • {marker} {}\n", inline_link(name, url))
    };

    let count = updates.len();
    let mut parts = vec![escape(&format!(
        "{site_name} - Availability changed for {count} {}:\n\n",
        plural_items(count)
    ))];

    if !updates.became_available.is_empty() {
        parts.push("*Now available:*\n".to_string());
        parts.extend(updates.became_available.iter().map(|id| bullet("💚", id)));
    }
    if !updates.became_unavailable.is_empty() {
        parts.push("*Not available anymore:*\n".to_string());
        parts.extend(updates.became_unavailable.iter().map(|id| bullet("💔", id)));
    }

    split_message(&parts, limit)
}

/// Pack parts into chunks of at most `limit` UTF-16 code units.
///
/// Chunks break only between parts. A single part longer than the limit is
/// split on its own, never between a backslash and the character it escapes.
/// Always returns at least one chunk, and the chunks concatenate back to
/// the joined parts.
pub fn split_message<S: AsRef<str>>(parts: &[S], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for part in parts {
        let part = part.as_ref();
        let len = utf16_len(part);

        if current_len + len <= limit {
            current.push_str(part);
            current_len += len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if len <= limit {
            current.push_str(part);
            current_len = len;
        } else {
            log::warn!("Message part of {len} units exceeds the {limit} limit, splitting it");
            let mut pieces = hard_split(part, limit);
            if let Some(last) = pieces.pop() {
                chunks.extend(pieces);
                current_len = utf16_len(&last);
                current = last;
            }
        }
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn hard_split(text: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_len = 0;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        let mut unit = String::from(c);
        if c == '\\' {
            if let Some(next) = chars.next() {
                unit.push(next);
            }
        }
        let unit_len = utf16_len(&unit);

        if piece_len + unit_len > limit && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
            piece_len = 0;
        }
        piece.push_str(&unit);
        piece_len += unit_len;
    }

    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}
