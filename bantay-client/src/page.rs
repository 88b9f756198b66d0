//! Pagination contract
//!
//! Uniform page/limit/total/has-more shape for transaction and audit
//! listings, plus a request tracker that keeps a late-arriving response for
//! an abandoned page from overwriting the currently requested one.

use crate::error::Result;
use crate::wire::codec::{bool_field, decode_list, field, u32_field, u64_field};
use serde_json::Value;

/// One page of a remote listing.
///
/// `has_more` comes from the remote response verbatim; it is never derived
/// from `items.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn from_wire(v: &Value, item: impl Fn(&Value) -> Result<T>) -> Result<Self> {
        Ok(Self {
            items: decode_list(field(v, "items")?, item)?,
            total: u64_field(v, "total")?,
            page: u32_field(v, "page")?,
            limit: u32_field(v, "limit")?,
            has_more: bool_field(v, "has_more")?,
        })
    }
}

/// Ticket for one outstanding page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    seq: u64,
    /// The page number the UI should key its pending/disabled state on.
    pub page: u32,
}

/// Last-request-wins sequencing for one listing view.
///
/// Page-change requests are allowed to race; `complete` only accepts the
/// newest outstanding request, so a slow fetch for an abandoned page is
/// dropped instead of rendering a mismatched page/content pair.
///
/// This is a view-side primitive, deliberately not applied inside the
/// catalogue's paged queries: each view owns one tracker, while the client
/// is shared across views and has no notion of which listing a page belongs
/// to. Pair it with a paged query like so:
///
/// ```rust,ignore
/// let ticket = tracker.request(page);
/// let fetched = client.transactions_page(page, limit).await?;
/// if tracker.complete(&ticket) {
///     view.render(fetched);
/// }
/// ```
#[derive(Debug, Default)]
pub struct PageTracker {
    next_seq: u64,
    outstanding: Option<PageTicket>,
}

impl PageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page request, superseding any outstanding one.
    pub fn request(&mut self, page: u32) -> PageTicket {
        self.next_seq += 1;
        let ticket = PageTicket {
            seq: self.next_seq,
            page,
        };
        self.outstanding = Some(ticket.clone());
        ticket
    }

    /// Report a completed fetch. Returns whether the caller may render it.
    pub fn complete(&mut self, ticket: &PageTicket) -> bool {
        if self.outstanding.as_ref() == Some(ticket) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }

    /// Page number the view is currently waiting on, if any.
    pub fn pending_page(&self) -> Option<u32> {
        self.outstanding.as_ref().map(|t| t.page)
    }
}
