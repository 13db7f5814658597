//! Offset/limit pagination with navigation links.
//!
//! # Invariants
//! - `page >= 1` and `limit >= 1` after coercion.
//! - The returned slice is `[(page-1)*limit, page*limit)` clipped to bounds.
//! - `first`/`prev` exist only when `page > 1`; `next`/`last` only when
//!   `page < total_pages`.

use serde::Serialize;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

/// Coerced page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Non-positive `page` becomes 1; non-positive `limit` becomes 10.
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: positive_or(page, DEFAULT_PAGE),
            limit: positive_or(limit, DEFAULT_LIMIT),
        }
    }

    /// Builds a request from raw query-string values.
    ///
    /// Values are read as leading integers (`"3abc"` is 3, `"2.9"` is 2);
    /// absent or non-numeric values take the defaults.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page.and_then(parse_leading_int).unwrap_or(0);
        let limit = limit.and_then(parse_leading_int).unwrap_or(0);
        Self::new(page, limit)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn start_index(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }

    fn end_index(&self) -> usize {
        self.page.saturating_mul(self.limit)
    }
}

/// Link relation of a navigation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRel {
    First,
    Prev,
    Next,
    Last,
}

impl LinkRel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Prev => "prev",
            Self::Next => "next",
            Self::Last => "last",
        }
    }
}

/// Navigation link carrying the target page and the same limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub rel: LinkRel,
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_students: usize,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    #[serde(rename = "data")]
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
    pub links: Vec<PageLink>,
}

impl<T> Page<T> {
    pub fn link(&self, rel: LinkRel) -> Option<&PageLink> {
        self.links.iter().find(|link| link.rel == rel)
    }

    /// Renders the links as an RFC 8288 `Link` header value.
    ///
    /// Returns an empty string when there are no links.
    pub fn link_header(&self, base_url: &str) -> String {
        self.links
            .iter()
            .map(|link| {
                format!(
                    "<{base_url}?page={}&limit={}>; rel=\"{}\"",
                    link.page,
                    link.limit,
                    link.rel.as_str()
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Slices `items` according to `request` and computes navigation links.
pub fn paginate<T: Clone>(items: &[T], request: PageRequest) -> Page<T> {
    let total = items.len();
    let start = request.start_index().min(total);
    let end = request.end_index().min(total);
    let total_pages = total.div_ceil(request.limit);
    let page = request.page;

    let mut links = Vec::new();
    if page > 1 {
        links.push(PageLink {
            rel: LinkRel::First,
            page: 1,
            limit: request.limit,
        });
        links.push(PageLink {
            rel: LinkRel::Prev,
            page: page - 1,
            limit: request.limit,
        });
    }
    if page < total_pages {
        links.push(PageLink {
            rel: LinkRel::Next,
            page: page + 1,
            limit: request.limit,
        });
        links.push(PageLink {
            rel: LinkRel::Last,
            page: total_pages,
            limit: request.limit,
        });
    }

    Page {
        items: items[start..end].to_vec(),
        pagination: PaginationMeta {
            current_page: page,
            total_pages,
            total_students: total,
        },
        links,
    }
}

fn positive_or(value: i64, fallback: usize) -> usize {
    if value < 1 {
        return fallback;
    }
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Reads an optionally signed integer prefix, ignoring leading whitespace.
/// Saturates instead of overflowing; returns `None` when no digit leads.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for byte in digits.bytes() {
        if !byte.is_ascii_digit() {
            break;
        }
        seen_digit = true;
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(byte - b'0'));
    }

    if !seen_digit {
        return None;
    }
    Some(if negative { -value } else { value })
}
