//! Transport/session layer: one reusable HTTP client and one reusable
//! browser session per pipeline invocation. Both engines depend on this
//! module and nothing here knows about listings or emails.

mod browser;
mod http;

pub use browser::BrowserSession;
pub use http::RetryingClient;
