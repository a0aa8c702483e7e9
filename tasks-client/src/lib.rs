#![deny(clippy::unwrap_used, clippy::expect_used)]

mod api;
mod http;
mod query;
mod wire;

#[cfg(feature = "mock")]
mod mock;

pub use api::NewTask;
pub use api::Result;
pub use api::Task;
pub use api::TaskBackend;
pub use api::TaskError;
pub use api::TaskId;
pub use api::TaskPriority;
pub use api::TaskStatus;
pub use api::TaskUpdate;
pub use http::HttpTaskClient;
pub use http::TASKS_ENDPOINT;
pub use query::SortKey;
pub use query::TaskQuery;
pub use wire::WireFormat;
pub use wire::parse_datetime;

#[cfg(feature = "mock")]
pub use mock::MockTaskClient;
