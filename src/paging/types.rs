//! Paging types
//!
//! The vocabulary shared by the mediator and its consumer.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadType {
    /// Start over from the first page
    Refresh,
    /// Load before the first loaded item
    Prepend,
    /// Load after the last loaded item
    Append,
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadType::Refresh => "refresh",
            LoadType::Prepend => "prepend",
            LoadType::Append => "append",
        })
    }
}

impl FromStr for LoadType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "refresh" => Ok(LoadType::Refresh),
            "prepend" => Ok(LoadType::Prepend),
            "append" => Ok(LoadType::Append),
            other => Err(Error::invalid_value(
                "load_type",
                format!("expected refresh, prepend or append, got '{other}'"),
            )),
        }
    }
}

/// One page the consumer has loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Position of the first item in the cache
    pub offset: usize,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, offset: usize) -> Self {
        Self { data, offset }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// What the consumer has loaded so far, handed read-only to the mediator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingSnapshot<T> {
    pub pages: Vec<Page<T>>,
    pub anchor_position: Option<usize>,
    pub page_size: usize,
}

impl<T> PagingSnapshot<T> {
    /// Snapshot with nothing loaded yet
    pub fn empty(page_size: usize) -> Self {
        Self {
            pages: Vec::new(),
            anchor_position: None,
            page_size,
        }
    }

    pub fn new(pages: Vec<Page<T>>, anchor_position: Option<usize>, page_size: usize) -> Self {
        Self {
            pages,
            anchor_position,
            page_size,
        }
    }

    /// Last item of the most recent non-empty page
    pub fn last_item(&self) -> Option<&T> {
        self.pages
            .iter()
            .rev()
            .find(|page| !page.is_empty())
            .and_then(|page| page.data.last())
    }

    /// First item of the earliest non-empty page
    pub fn first_item(&self) -> Option<&T> {
        self.pages
            .iter()
            .find(|page| !page.is_empty())
            .and_then(|page| page.data.first())
    }

    /// Total number of loaded items
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(|page| page.data.len()).sum()
    }
}

/// Result of one mediator load
#[derive(Debug)]
pub enum LoadOutcome {
    Success { end_of_pagination_reached: bool },
    Failure { cause: Error },
}

impl LoadOutcome {
    pub fn success(end_of_pagination_reached: bool) -> Self {
        Self::Success {
            end_of_pagination_reached,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// `Some(end)` for a success, `None` for a failure
    pub fn end_of_pagination_reached(&self) -> Option<bool> {
        match self {
            Self::Success {
                end_of_pagination_reached,
            } => Some(*end_of_pagination_reached),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failure { cause } => Some(cause),
            Self::Success { .. } => None,
        }
    }
}

impl From<crate::error::Result<bool>> for LoadOutcome {
    fn from(result: crate::error::Result<bool>) -> Self {
        match result {
            Ok(end_of_pagination_reached) => Self::success(end_of_pagination_reached),
            Err(cause) => Self::Failure { cause },
        }
    }
}

/// Consumer-side load status of one direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadState {
    NotLoading { end_of_pagination_reached: bool },
    Loading,
    Error { message: String, retryable: bool },
}

impl Default for LoadState {
    fn default() -> Self {
        Self::NotLoading {
            end_of_pagination_reached: false,
        }
    }
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn end_of_pagination_reached(&self) -> bool {
        matches!(
            self,
            Self::NotLoading {
                end_of_pagination_reached: true
            }
        )
    }
}

/// Everything a UI needs to render paging status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PagerState {
    pub refresh: LoadState,
    pub prepend: LoadState,
    pub append: LoadState,
    /// Number of items currently loaded by the pager
    pub item_count: usize,
}

impl PagerState {
    /// Load state for one direction
    pub fn get(&self, load_type: LoadType) -> &LoadState {
        match load_type {
            LoadType::Refresh => &self.refresh,
            LoadType::Prepend => &self.prepend,
            LoadType::Append => &self.append,
        }
    }

    pub(crate) fn get_mut(&mut self, load_type: LoadType) -> &mut LoadState {
        match load_type {
            LoadType::Refresh => &mut self.refresh,
            LoadType::Prepend => &mut self.prepend,
            LoadType::Append => &mut self.append,
        }
    }
}
