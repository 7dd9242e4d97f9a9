use reqwest::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteUrl(String);

impl WebsiteUrl {
    /// Accepts absolute `http`/`https` URLs. The original text is kept, not
    /// the normalized serialization.
    pub fn parse(s: String) -> Result<WebsiteUrl, String> {
        match Url::parse(&s) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(Self(s)),
            Ok(url) => Err(format!("{} is not an allowed URL scheme", url.scheme())),
            Err(e) => Err(format!("{} is not a valid URL: {}", s, e)),
        }
    }
}

impl AsRef<str> for WebsiteUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
