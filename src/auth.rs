use reqwest::RequestBuilder;

/// Bearer credential for an HTTP event feed. Its value never reaches logs or
/// `Debug` output.
#[derive(Clone)]
pub struct FeedToken(String);

impl FeedToken {
    /// Reads a token as given on the command line or in `TESTBOARD_TOKEN`.
    /// Surrounding whitespace is dropped, and a blank value means no credential.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }

    /// Attaches the credential to a feed request.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.0)
    }
}

impl std::fmt::Debug for FeedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FeedToken(<redacted>)")
    }
}
