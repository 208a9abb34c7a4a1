//! Docsie platform constants
//!
//! Resource locations and protocol keys used by the hosted widget. These are
//! public values; the only secret in the exchange is the master key.

/// Stylesheet injected alongside the widget script
pub const DOCSIE_STYLESHEET_URL: &str = "https://lib.docsie.io/current/styles/docsie.css";

/// Widget bootstrap script
pub const DOCSIE_SCRIPT_URL: &str = "https://lib.docsie.io/current/service.js";

/// Attribute on the script element that carries the widget configuration
pub const CONFIG_ATTRIBUTE: &str = "data-docsie";

/// Attribute marking the container the widget renders into
pub const ROOT_ATTRIBUTE: &str = "data-ddsroot";

/// Configuration-string keys, in the order the widget parses them
pub const KEY_DEPLOYMENT: &str = "docsie_pk_key";
pub const KEY_TOKEN: &str = "authorizationToken";
pub const KEY_FALLBACK_URL: &str = "authorizationFallbackURL";

/// Query parameter the widget script reads the token from in redirect mode
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Query parameter on the fallback URL that carries the return path
pub const REDIRECT_QUERY_PARAM: &str = "redirect";

/// Fallback/login URL used when none is configured
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:5145/api/auth/login";

/// Token lifetime when `JWT_EXPIRY_MINUTES` is unset
pub const DEFAULT_EXPIRY_MINUTES: u64 = 60;

/// Subject hint logged for the credential-less token endpoint
pub const DEMO_SUBJECT: &str = "demo-user";

/// Environment variable names
pub const ENV_MASTER_KEY: &str = "DOCSIE_MASTER_KEY";
pub const ENV_EXPIRY_MINUTES: &str = "JWT_EXPIRY_MINUTES";
pub const ENV_DEPLOYMENT_KEY: &str = "DOCSIE_DEPLOYMENT_KEY";
pub const ENV_REDIRECT_URL: &str = "DOCSIE_REDIRECT_URL";
