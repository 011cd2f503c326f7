//! Defines the application's error types using `thiserror`.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors that can occur anywhere in the leadscout pipeline.
///
/// Most of these never escape the engines: the listing engine degrades to
/// partial output and the contact engine degrades to the "N/A" sentinel.
/// The ones that do escape (`Config`, `Input`, `Initialization`) are fatal
/// and become a structured error result in the binary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or inconsistent configuration values.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or invalid invocation arguments.
    #[error("Input error: {0}")]
    Input(String),

    /// Failure while setting up shared resources (HTTP client, resolver, browser).
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Failed to parse a string as a URL.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Could not extract a usable host from a website value.
    #[error("Could not extract domain: {0}")]
    DomainExtraction(String),

    /// HTTP transport error from the fetch strategy.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// A fetch came back with a non-success status that is not retryable.
    #[error("HTTP status {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    /// Could not establish a WebDriver session.
    #[error("WebDriver session error: {0}")]
    WebDriverSession(#[from] fantoccini::error::NewSessionError),

    /// A WebDriver command failed mid-session.
    #[error("WebDriver command error: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    /// A bounded wait for page content expired.
    #[error("Render timeout: {0}")]
    RenderTimeout(String),

    /// The domain does not exist in DNS.
    #[error("DNS NXDOMAIN for {0}")]
    NxDomain(String),

    /// The domain resolved but exposes no mail-exchange records.
    #[error("No MX records found for {0}")]
    NoMxRecords(String),

    /// Any other DNS resolution failure.
    #[error("DNS resolution error: {0}")]
    Dns(#[from] trust_dns_resolver::error::ResolveError),

    /// SMTP transport error during the mailbox probe.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
