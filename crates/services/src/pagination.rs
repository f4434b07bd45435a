//! Cursor paging helpers shared by the feed queries.
//!
//! Stores are asked for one row more than the page holds. The extra row is
//! never returned; its presence is what makes `has_next` exact.

use domains::{DomainError, Result};

/// Bounds for the `page_size` a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl PageLimits {
    /// Resolves the requested size against the configured bounds.
    pub fn resolve(&self, requested: Option<usize>) -> Result<usize> {
        let size = requested.unwrap_or(self.default_page_size);
        if size == 0 || size > self.max_page_size {
            return Err(DomainError::Validation(format!(
                "page size must be between 1 and {}, got {size}",
                self.max_page_size
            )));
        }
        Ok(size)
    }
}

/// Row count to fetch for a page of `page_size` items.
pub(crate) fn probe_limit(page_size: usize) -> usize {
    page_size.saturating_add(1)
}

/// Drops the probe row, reporting whether it was there.
pub(crate) fn split_probe<T>(mut rows: Vec<T>, page_size: usize) -> (Vec<T>, bool) {
    let has_next = rows.len() > page_size;
    rows.truncate(page_size);
    (rows, has_next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uses_default_when_absent() {
        assert_eq!(PageLimits::default().resolve(None).unwrap(), 10);
    }

    #[test]
    fn resolve_rejects_zero_and_oversized_pages() {
        let limits = PageLimits {
            default_page_size: 5,
            max_page_size: 20,
        };
        assert!(matches!(limits.resolve(Some(0)), Err(DomainError::Validation(_))));
        assert!(matches!(limits.resolve(Some(21)), Err(DomainError::Validation(_))));
        assert_eq!(limits.resolve(Some(20)).unwrap(), 20);
    }

    #[test]
    fn full_page_without_probe_row_has_no_next() {
        let (rows, has_next) = split_probe(vec![3, 2], 2);
        assert_eq!(rows, vec![3, 2]);
        assert!(!has_next);
    }

    #[test]
    fn probe_row_is_trimmed_and_signals_next() {
        let (rows, has_next) = split_probe(vec![5, 4, 3], 2);
        assert_eq!(rows, vec![5, 4]);
        assert!(has_next);
    }

    #[test]
    fn probe_limit_does_not_overflow() {
        assert_eq!(probe_limit(usize::MAX), usize::MAX);
        assert_eq!(probe_limit(10), 11);
    }
}
