use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u64,
    pub page_size: u64,
    pub skip: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page_info: PageInfo) -> Self {
        Self { items, page_info }
    }

    /// Page envelope for the window described by a structured query.
    pub fn for_query(items: Vec<T>, query: &crate::StructuredQuery) -> Self {
        Self::new(
            items,
            PageInfo {
                page: query.page(),
                page_size: query.take,
                skip: query.skip,
            },
        )
    }
}
