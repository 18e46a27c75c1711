pub type PagemarkResult<T> = Result<T, PagemarkError>;

#[derive(thiserror::Error, Debug)]
pub enum PagemarkError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("geometry unavailable: {0}")]
    GeometryUnavailable(String),

    #[error("wake lock error: {0}")]
    WakeLock(String),
}

impl PagemarkError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn geometry_unavailable(msg: impl Into<String>) -> Self {
        Self::GeometryUnavailable(msg.into())
    }

    pub fn wake_lock(msg: impl Into<String>) -> Self {
        Self::WakeLock(msg.into())
    }
}
