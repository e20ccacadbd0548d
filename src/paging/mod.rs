pub mod page;
pub mod registry;

pub use page::{slice, PageParams, Paging, SortOrder};
pub use registry::{EntityKind, SortRegistry};
