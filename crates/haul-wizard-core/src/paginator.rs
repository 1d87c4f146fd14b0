// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Pagination
//
// Pages are cut directly from the catalog. The cursor is a catalog index, and
// hidden fields are skipped in place instead of being compacted away, so page
// numbers and cursors stay in step with each other.

use crate::answers::AnswerStore;
use crate::catalog::FieldCatalog;
use crate::field::FieldDescriptor;
use crate::types::{PageLayout, WizardError};
use crate::visibility::is_visible;

/// One page of visible fields and the catalog span it was cut from
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// Catalog index the page was requested at
    pub start: usize,
    /// Catalog index just past the last field scanned for this page
    pub end: usize,
    pub fields: Vec<&'a FieldDescriptor>,
}

impl<'a> Page<'a> {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn keys(&self) -> Vec<&'a str> {
        self.fields.iter().map(|f| f.key.as_str()).collect()
    }
}

/// Page view over a catalog for one snapshot of the answers
pub struct Pagination<'a> {
    catalog: &'a FieldCatalog,
    answers: &'a AnswerStore,
    layout: PageLayout,
}

/// Group the visible fields of `catalog` into pages.
///
/// Fails with `InvalidLayout` unless `page_size >= 1` and `look_ahead >= page_size`.
pub fn paginate<'a>(
    catalog: &'a FieldCatalog,
    answers: &'a AnswerStore,
    layout: PageLayout,
) -> Result<Pagination<'a>, WizardError> {
    layout.validate()?;
    Ok(Pagination::with_checked_layout(catalog, answers, layout))
}

impl<'a> Pagination<'a> {
    /// `layout` must already have passed `PageLayout::validate`
    pub(crate) fn with_checked_layout(
        catalog: &'a FieldCatalog,
        answers: &'a AnswerStore,
        layout: PageLayout,
    ) -> Self {
        Self {
            catalog,
            answers,
            layout,
        }
    }

    fn visible(&self, index: usize) -> bool {
        is_visible(self.catalog, index, self.answers)
    }

    pub fn visible_count(&self) -> usize {
        (0..self.catalog.len()).filter(|&i| self.visible(i)).count()
    }

    pub fn visible_keys(&self) -> Vec<&'a str> {
        let catalog = self.catalog;
        (0..catalog.len())
            .filter(|&i| self.visible(i))
            .map(|i| catalog.fields()[i].key.as_str())
            .collect()
    }

    /// `ceil(visible fields / page size)`
    pub fn total_pages(&self) -> usize {
        self.visible_count().div_ceil(self.layout.page_size)
    }

    /// Collect up to `page_size` visible fields starting at catalog `cursor`.
    ///
    /// The catalog is scanned one look-ahead window at a time; a window that
    /// does not fill the page is followed by another until the catalog ends,
    /// so the result is the same for any valid `look_ahead`.
    /// A cursor past the end yields an empty page.
    pub fn page_at(&self, cursor: usize) -> Page<'a> {
        let catalog = self.catalog;
        let len = catalog.len();
        let page_size = self.layout.page_size;

        let mut fields = Vec::with_capacity(page_size);
        let mut end = cursor.min(len);
        let mut windows = 0;

        while fields.len() < page_size && end < len {
            let window_end = (end + self.layout.look_ahead).min(len);
            windows += 1;
            for index in end..window_end {
                if fields.len() == page_size {
                    break;
                }
                end = index + 1;
                if self.visible(index) {
                    fields.push(&catalog.fields()[index]);
                }
            }
        }

        if windows > 1 {
            tracing::debug!(
                catalog = catalog.id(),
                cursor,
                windows,
                "Look-ahead window extended to fill page"
            );
        }

        Page {
            start: cursor,
            end,
            fields,
        }
    }

    /// First visible catalog index at or after `from`
    pub fn next_visible(&self, from: usize) -> Option<usize> {
        (from..self.catalog.len()).find(|&i| self.visible(i))
    }

    /// Cursor of the page following `page`, or `None` when the catalog is exhausted
    pub fn next_cursor(&self, page: &Page<'_>) -> Option<usize> {
        self.next_visible(page.end)
    }

    /// Cursors of every page when walking forward from cursor 0
    pub fn page_starts(&self) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut cursor = 0;
        loop {
            starts.push(cursor);
            let page = self.page_at(cursor);
            match self.next_cursor(&page) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        starts
    }

    /// 1-based number of the page a cursor belongs to
    pub fn page_number(&self, cursor: usize) -> usize {
        self.page_starts()
            .iter()
            .filter(|&&start| start <= cursor)
            .count()
            .max(1)
    }
}
