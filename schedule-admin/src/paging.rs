//! Page request/response types shared by the listing operations

use serde::Serialize;

use crate::error::AdminError;

/// 1-based page number and page size, both validated before any SQL is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_num: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page_num: i64, page_size: i64) -> Result<Self, AdminError> {
        if page_num < 1 || page_size < 1 {
            return Err(AdminError::InvalidPage {
                page: page_num,
                size: page_size,
            });
        }
        Ok(Self {
            page_num,
            page_size,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page_num - 1).saturating_mul(self.page_size)
    }

    /// Slice an already-sorted in-memory list
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        if start >= items.len() {
            return Vec::new();
        }
        let end = start.saturating_add(self.page_size as usize).min(items.len());
        items[start..end].to_vec()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: i64,
    pub page_num: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            records,
            total,
            page_num: request.page_num,
            page_size: request.page_size,
        }
    }
}
