use crate::domain::UserId;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Clamps the requested page to `1..` and the size to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<usize>, page_size: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip. Saturates for pages far past the end.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> usize {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, count: usize, results: Vec<T>) -> Self {
        Self {
            count,
            page: request.page,
            page_size: request.page_size,
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryOrdering {
    ModifiedAtAsc,
    #[default]
    ModifiedAtDesc,
    TitleAsc,
    TitleDesc,
}

impl SummaryOrdering {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "modified_at" => Some(Self::ModifiedAtAsc),
            "-modified_at" => Some(Self::ModifiedAtDesc),
            "title" => Some(Self::TitleAsc),
            "-title" => Some(Self::TitleDesc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SummaryQuery {
    pub owner_id: Option<UserId>,
    /// Exact title match.
    pub title: Option<String>,
    pub search: Option<String>,
    pub ordering: SummaryOrdering,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileOrdering {
    UploadedAtAsc,
    #[default]
    UploadedAtDesc,
    NameAsc,
    NameDesc,
    SizeAsc,
    SizeDesc,
}

impl FileOrdering {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "uploaded_at" => Some(Self::UploadedAtAsc),
            "-uploaded_at" => Some(Self::UploadedAtDesc),
            "name" => Some(Self::NameAsc),
            "-name" => Some(Self::NameDesc),
            "size" => Some(Self::SizeAsc),
            "-size" => Some(Self::SizeDesc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    /// Exact filename match.
    pub name: Option<String>,
    /// Exact content hash, lowercase hex.
    pub hash: Option<String>,
    pub search: Option<String>,
    pub ordering: FileOrdering,
    pub page: PageRequest,
}
