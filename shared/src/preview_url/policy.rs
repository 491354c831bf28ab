use url::Url;

use crate::preview_url::error::PolicyError;

/// Why a URL is kept out of the preview
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unpreviewable {
    /// Not http(s) and not a script URL
    Scheme,
    /// Host (or base path) outside the allow-list
    ForeignHost,
    /// Login or signup script
    LoginScript,
    /// Admin area other than the AJAX endpoint
    Admin,
    /// Could not be parsed at all
    Malformed,
}

impl Unpreviewable {
    /// Human-readable explanation shown on marked links
    pub fn describe(&self) -> &'static str {
        match self {
            Unpreviewable::Scheme => "This link uses a scheme that cannot be previewed.",
            Unpreviewable::ForeignHost => "External links are disabled in the preview.",
            Unpreviewable::LoginScript => "Login links are disabled in the preview.",
            Unpreviewable::Admin => "Admin links are disabled in the preview.",
            Unpreviewable::Malformed => "This link could not be understood.",
        }
    }
}

/// Outcome of checking a URL against the policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Previewability {
    /// `javascript:` URLs: harmless, nothing to rewrite
    Script,
    Previewable,
    NotPreviewable(Unpreviewable),
}

impl Previewability {
    pub fn is_previewable(&self) -> bool {
        !matches!(self, Previewability::NotPreviewable(_))
    }
}

/// Path patterns that decide previewability within an allowed host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathRules {
    /// Paths ending in one of these are login/signup scripts
    pub login_scripts: Vec<String>,
    /// Path ending of the AJAX endpoint, used as a pseudo-frontend URL
    pub ajax_endpoint: String,
    /// Directory holding the admin area
    pub admin_dir: String,
}

impl Default for PathRules {
    fn default() -> Self {
        Self {
            login_scripts: vec!["/wp-login.php".to_string(), "/wp-signup.php".to_string()],
            ajax_endpoint: "/wp-admin/admin-ajax.php".to_string(),
            admin_dir: "/wp-admin".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AllowedBase {
    host: String,
    port: Option<u16>,
    path: String,
}

impl AllowedBase {
    fn matches(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(&self.host))
            && url.port() == self.port
            && url.path().starts_with(&self.path)
    }
}

/// Decides which URLs may be followed inside the preview.
///
/// Rules are applied in order and the first match wins: script URLs are
/// previewable, other non-http(s) schemes are not, hosts outside the
/// allow-list are not, login/signup scripts are not, the AJAX endpoint is,
/// the rest of the admin area is not, and everything else is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewUrlPolicy {
    allowed: Vec<AllowedBase>,
    rules: PathRules,
}

impl PreviewUrlPolicy {
    pub fn new<S: AsRef<str>>(allowed_urls: &[S]) -> Result<Self, PolicyError> {
        Self::with_rules(allowed_urls, PathRules::default())
    }

    pub fn with_rules<S: AsRef<str>>(allowed_urls: &[S], rules: PathRules) -> Result<Self, PolicyError> {
        let mut allowed = Vec::new();
        for raw in allowed_urls {
            let raw = raw.as_ref();
            let url = Url::parse(raw).map_err(|err| PolicyError::InvalidAllowedUrl {
                url: raw.to_string(),
                reason: err.to_string(),
            })?;
            let host = url
                .host_str()
                .ok_or_else(|| PolicyError::MissingHost { url: raw.to_string() })?
                .to_string();
            let base = AllowedBase {
                host,
                port: url.port(),
                path: url.path().to_string(),
            };
            if !allowed.contains(&base) {
                allowed.push(base);
            }
        }
        Ok(Self { allowed, rules })
    }

    /// Check an absolute URL
    pub fn check(&self, raw: &str) -> Previewability {
        if is_script_url(raw) {
            return Previewability::Script;
        }
        match Url::parse(raw.trim()) {
            Ok(url) => self.check_url(&url),
            Err(_) => Previewability::NotPreviewable(Unpreviewable::Malformed),
        }
    }

    /// Check a possibly relative URL, resolved against `base`
    pub fn check_relative(&self, raw: &str, base: &Url) -> Previewability {
        if is_script_url(raw) {
            return Previewability::Script;
        }
        match base.join(raw.trim()) {
            Ok(url) => self.check_url(&url),
            Err(_) => Previewability::NotPreviewable(Unpreviewable::Malformed),
        }
    }

    pub fn check_url(&self, url: &Url) -> Previewability {
        match url.scheme() {
            "javascript" => return Previewability::Script,
            "http" | "https" => {}
            _ => return Previewability::NotPreviewable(Unpreviewable::Scheme),
        }

        if !self.allowed.iter().any(|base| base.matches(url)) {
            return Previewability::NotPreviewable(Unpreviewable::ForeignHost);
        }

        let path = url.path();
        if self
            .rules
            .login_scripts
            .iter()
            .any(|script| path.ends_with(script.as_str()))
        {
            return Previewability::NotPreviewable(Unpreviewable::LoginScript);
        }

        if path.ends_with(self.rules.ajax_endpoint.as_str()) {
            return Previewability::Previewable;
        }

        if is_under_dir(path, &self.rules.admin_dir) {
            return Previewability::NotPreviewable(Unpreviewable::Admin);
        }

        Previewability::Previewable
    }

    pub fn is_previewable(&self, raw: &str) -> bool {
        self.check(raw).is_previewable()
    }
}

fn is_script_url(raw: &str) -> bool {
    let raw = raw.trim_start();
    raw.len() >= "javascript:".len()
        && raw
            .get(.."javascript:".len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("javascript:"))
}

/// `/wp-admin`, `/wp-admin/` and `/wp-admin/x` are under `/wp-admin`;
/// `/wp-administrator` is not.
fn is_under_dir(path: &str, dir: &str) -> bool {
    path.match_indices(dir).any(|(index, _)| {
        let rest = &path[index + dir.len()..];
        rest.is_empty() || rest.starts_with('/')
    })
}
