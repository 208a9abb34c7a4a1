//! Widget configuration string and fallback URL construction
//!
//! The widget reads a single `data-docsie` attribute made of comma-separated
//! `key:value` pairs. Values are inserted verbatim: the widget splits on the
//! first `:` of each pair, so the fallback URL keeps its own colons and only
//! its `redirect` parameter is percent-encoded.

use docsie_auth::{
    DEFAULT_REDIRECT_URL, KEY_DEPLOYMENT, KEY_FALLBACK_URL, KEY_TOKEN, REDIRECT_QUERY_PARAM,
    TOKEN_QUERY_PARAM,
};
use url::Url;

use crate::error::{BootstrapError, Result};

/// Authentication strategy negotiated with the widget for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handshake {
    /// Token passed inline as `authorizationToken`
    #[default]
    Inline,
    /// Token placed in the page URL; widget falls back to a login redirect
    Redirect,
}

/// Inputs for one widget session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub deployment_id: String,
    pub token: Option<String>,
    pub fallback_url: Option<String>,
}

impl BootstrapConfig {
    pub fn new(deployment_id: impl Into<String>) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_fallback_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = Some(url.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.deployment_id.trim().is_empty() {
            return Err(BootstrapError::MissingDeploymentId);
        }
        Ok(())
    }

    /// Token, treating an empty string as absent.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Fallback URL, treating an empty string as absent.
    pub fn fallback_url(&self) -> Option<&str> {
        self.fallback_url.as_deref().filter(|u| !u.is_empty())
    }

    /// Whether this session negotiates any authentication at all.
    ///
    /// With neither a token nor a fallback URL the widget runs unauthenticated.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some() || self.fallback_url().is_some()
    }
}

/// Build the `data-docsie` attribute value.
///
/// Order is fixed: deployment key first, then the handshake-specific entry.
/// `current_url` is the page URL used for the fallback's return path.
pub fn build_config_attribute(
    config: &BootstrapConfig,
    handshake: Handshake,
    current_url: &Url,
) -> String {
    let mut attribute = format!("{KEY_DEPLOYMENT}:{}", config.deployment_id);

    match handshake {
        Handshake::Inline => {
            if let Some(token) = config.token() {
                attribute.push_str(&format!(",{KEY_TOKEN}:{token}"));
            }
        }
        Handshake::Redirect => {
            if config.is_authenticated() {
                let fallback = build_fallback_url(config.fallback_url(), current_url);
                attribute.push_str(&format!(",{KEY_FALLBACK_URL}:{fallback}"));
            }
        }
    }

    attribute
}

/// Build the fallback URL the widget redirects to when authentication fails.
///
/// `base` defaults to [`DEFAULT_REDIRECT_URL`]. The return path is the
/// current page without its query string or fragment, percent-encoded with
/// every character outside `A-Z a-z 0-9 - _ . ~` escaped. That is stricter
/// than `encodeURIComponent`, which leaves `!'()*` alone; both decode the same.
pub fn build_fallback_url(base: Option<&str>, current_url: &Url) -> String {
    let base = base.filter(|b| !b.is_empty()).unwrap_or(DEFAULT_REDIRECT_URL);
    let separator = if base.contains('?') { '&' } else { '?' };

    let mut return_to = current_url.clone();
    return_to.set_query(None);
    return_to.set_fragment(None);

    format!(
        "{base}{separator}{REDIRECT_QUERY_PARAM}={}",
        urlencoding::encode(return_to.as_str())
    )
}

/// Return `current` with a `token` query parameter added, or `None` if the
/// URL already carries one.
pub fn url_with_token(current: &Url, token: &str) -> Option<Url> {
    if current.query_pairs().any(|(k, _)| k == TOKEN_QUERY_PARAM) {
        return None;
    }
    let mut next = current.clone();
    next.query_pairs_mut().append_pair(TOKEN_QUERY_PARAM, token);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn fallback_strips_query_before_encoding() {
        let url = build_fallback_url(Some("http://x/login"), &page("http://y/doc?q=1"));
        assert_eq!(url, "http://x/login?redirect=http%3A%2F%2Fy%2Fdoc");
    }

    #[test]
    fn fallback_uses_ampersand_when_base_has_query() {
        let url = build_fallback_url(Some("http://x/login?app=docs"), &page("http://y/doc"));
        assert_eq!(url, "http://x/login?app=docs&redirect=http%3A%2F%2Fy%2Fdoc");
    }

    #[test]
    fn fallback_defaults_when_base_missing() {
        let url = build_fallback_url(None, &page("http://y/doc"));
        assert!(url.starts_with("http://localhost:5145/api/auth/login?redirect="));

        let empty = build_fallback_url(Some(""), &page("http://y/doc"));
        assert_eq!(url, empty);
    }

    #[test]
    fn fallback_drops_fragment() {
        let url = build_fallback_url(Some("http://x/login"), &page("http://y/doc/intro#setup"));
        assert_eq!(url, "http://x/login?redirect=http%3A%2F%2Fy%2Fdoc%2Fintro");
    }

    #[test]
    fn inline_attribute_carries_token() {
        let config = BootstrapConfig::new("deploy_123").with_token("tok.en.sig");
        let attribute = build_config_attribute(&config, Handshake::Inline, &page("http://y/"));
        assert_eq!(
            attribute,
            "docsie_pk_key:deploy_123,authorizationToken:tok.en.sig"
        );
    }

    #[test]
    fn inline_ignores_fallback_url() {
        let config = BootstrapConfig::new("deploy_123").with_fallback_url("http://x/login");
        let attribute = build_config_attribute(&config, Handshake::Inline, &page("http://y/"));
        assert_eq!(attribute, "docsie_pk_key:deploy_123");
    }

    #[test]
    fn redirect_attribute_leaves_fallback_unencoded() {
        let config = BootstrapConfig::new("deploy_123")
            .with_token("tok")
            .with_fallback_url("http://x/login");
        let attribute =
            build_config_attribute(&config, Handshake::Redirect, &page("http://y/doc?token=tok"));
        assert_eq!(
            attribute,
            "docsie_pk_key:deploy_123,authorizationFallbackURL:http://x/login?redirect=http%3A%2F%2Fy%2Fdoc"
        );
        assert!(!attribute.contains("authorizationToken"));
    }

    #[test]
    fn unauthenticated_session_has_only_deployment_key() {
        let config = BootstrapConfig::new("deploy_123");
        for handshake in [Handshake::Inline, Handshake::Redirect] {
            assert_eq!(
                build_config_attribute(&config, handshake, &page("http://y/")),
                "docsie_pk_key:deploy_123"
            );
        }
    }

    #[test]
    fn empty_token_is_absent() {
        let config = BootstrapConfig::new("d").with_token("");
        assert!(config.token().is_none());
        assert!(!config.is_authenticated());
    }

    #[test]
    fn blank_deployment_id_is_rejected() {
        assert_eq!(
            BootstrapConfig::new("  ").validate(),
            Err(BootstrapError::MissingDeploymentId)
        );
        assert!(BootstrapConfig::new("d").validate().is_ok());
    }

    #[test]
    fn token_added_to_url_only_when_absent() {
        let with = url_with_token(&page("http://y/doc?q=1"), "abc").unwrap();
        assert_eq!(with.as_str(), "http://y/doc?q=1&token=abc");

        assert!(url_with_token(&page("http://y/doc?token=old"), "abc").is_none());
    }

    #[test]
    fn fallback_escapes_reserved_punctuation() {
        let url = build_fallback_url(Some("http://x/login"), &page("http://y/docs/(draft)"));
        assert_eq!(
            url,
            "http://x/login?redirect=http%3A%2F%2Fy%2Fdocs%2F%28draft%29"
        );
    }
}
