//! Generic page windowing over ordered sequences
//!
//! Stateless and reusable: the same function slices native transfer lists
//! and token ledgers. Out-of-range page requests clamp silently instead of
//! erroring, and nothing is copied beyond borrowing the requested window.

use serde::Serialize;

/// One page over a borrowed sequence. `first_index`/`last_index` are
/// 1-based positions in the full sequence (both 0 when it is empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_count: usize,
    pub total_pages: usize,
    pub effective_page: usize,
    pub first_index: usize,
    pub last_index: usize,
}

/// Window `seq` to the requested page. `total_pages` is never zero, so an
/// empty sequence still yields one (empty) page. A zero `page_size` is
/// treated as 1.
pub fn paginate<T>(seq: &[T], requested_page: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_count = seq.len();
    let total_pages = usize::max(1, total_count.div_ceil(page_size));
    let effective_page = requested_page.clamp(1, total_pages);

    let start = (effective_page - 1) * page_size;
    let end = usize::min(start + page_size, total_count);
    let items = if start < total_count {
        &seq[start..end]
    } else {
        &seq[0..0]
    };

    let (first_index, last_index) = if items.is_empty() {
        (0, 0)
    } else {
        (start + 1, end)
    };

    Page {
        items,
        total_count,
        total_pages,
        effective_page,
        first_index,
        last_index,
    }
}
