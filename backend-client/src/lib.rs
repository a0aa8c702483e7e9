mod client;
mod error;
mod notify;
mod request;
mod session;

pub use client::Client;
pub use client::REFRESH_ENDPOINT;
pub use client::RefreshStrategy;
pub use error::ApiError;
pub use error::Result;
pub use notify::Notification;
pub use notify::Notifier;
pub use notify::TracingNotifier;
pub use request::Method;
pub use request::RequestOptions;
pub use session::LOGIN_ENDPOINT;
pub use session::LOGOUT_ENDPOINT;
