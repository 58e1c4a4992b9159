/// Why a lookup produced no lyrics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LyricsError {
    /// Every direct and search candidate was tried without usable text.
    /// `cause` carries the last network failure when retries ran out.
    #[error("no lyrics found{}", .cause.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    NotFound { cause: Option<String> },
    /// The search provider answered with an anti-bot page.
    #[error("search provider blocked the request ({url})")]
    Blocked { url: String },
    #[error("lyrics lookup cancelled")]
    Cancelled,
}

impl LyricsError {
    pub(crate) fn not_found() -> Self {
        Self::NotFound { cause: None }
    }
}
