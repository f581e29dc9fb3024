use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("navigation timed out")]
    NavigationTimeout,
    #[error("no element matched this candidate")]
    NoMatch,
    #[error("a matched element handle went stale")]
    StaleElement,
    #[error("transport/cdp i/o failure: {0}")]
    Transport(String),
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("unsupported in this driver: {0}")]
    Unsupported(String),
}
