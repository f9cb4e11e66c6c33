//! Fixed-size pages over an ordered query.
//!
//! Page numbers arrive as raw query-string values and are resolved the
//! forgiving way: anything that is not an integer means the first page,
//! and an integer outside `1..=num_pages` means the last page. An empty
//! collection still has a single, empty page.
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based number of this page.
    pub number: u64,
    pub num_pages: u64,
    /// Total number of items across all pages.
    pub count: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<u64>,
    pub next_page_number: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: u64, num_pages: u64, count: u64) -> Self {
        let has_previous = number > 1;
        let has_next = number < num_pages;
        Self {
            items,
            number,
            num_pages,
            count,
            has_previous,
            has_next,
            previous_page_number: has_previous.then(|| number - 1),
            next_page_number: has_next.then(|| number + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Swap the items for a converted list, keeping the page position.
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_previous: self.has_previous,
            has_next: self.has_next,
            previous_page_number: self.previous_page_number,
            next_page_number: self.next_page_number,
        }
    }
}

pub fn num_pages(count: u64, per_page: u64) -> u64 {
    count.div_ceil(per_page).max(1)
}

pub fn resolve_page_number(requested: Option<&str>, num_pages: u64) -> u64 {
    let Some(raw) = requested else {
        return 1;
    };
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(n) if n >= 1 && (n as u64) <= num_pages => n as u64,
        Ok(_) => num_pages,
        // too many digits for i64: still an integer, and out of range
        Err(_) if is_integer(raw) => num_pages,
        Err(_) => 1,
    }
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Fetch page `requested` of `select`, `per_page` rows at a time.
///
/// The caller owns the ordering; `select` must already be sorted for the
/// pages to be stable.
pub async fn paginate<C, E>(
    select: Select<E>,
    db: &C,
    per_page: u64,
    requested: Option<&str>,
) -> Result<Page<E::Model>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync + 'static,
{
    let paginator = select.paginate(db, per_page);
    let count = paginator.num_items().await?;
    let num_pages = num_pages(count, per_page);
    let number = resolve_page_number(requested, num_pages);
    let items = paginator.fetch_page(number - 1).await?;
    Ok(Page::new(items, number, num_pages, count))
}
