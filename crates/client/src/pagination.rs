//! Page-number window for pagination controls.

/// Most page buttons shown at once
pub const PAGE_WINDOW: u32 = 5;

/// Up to `PAGE_WINDOW` consecutive page numbers centred on `current`,
/// shifted to stay within `1..=total_pages`. Empty when there are no pages.
pub fn page_window(current: u32, total_pages: u32) -> Vec<u32> {
    if total_pages == 0 {
        return Vec::new();
    }

    let width = PAGE_WINDOW.min(total_pages);
    let current = current.clamp(1, total_pages);

    let start = current
        .saturating_sub(width / 2)
        .max(1)
        .min(total_pages - width + 1);

    (start..start + width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_listings_show_every_page() {
        assert_eq!(page_window(1, 0), Vec::<u32>::new());
        assert_eq!(page_window(1, 1), vec![1]);
        assert_eq!(page_window(2, 3), vec![1, 2, 3]);
    }

    #[test]
    fn window_centres_on_current_page() {
        assert_eq!(page_window(6, 20), vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn window_shifts_at_the_edges() {
        assert_eq!(page_window(1, 20), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(2, 20), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(20, 20), vec![16, 17, 18, 19, 20]);
        assert_eq!(page_window(99, 20), vec![16, 17, 18, 19, 20]);
    }
}
