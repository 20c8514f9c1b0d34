use bstr::BString;
use pygit_utils::date::{GitDate, Signature};

/// `PYGIT_AUTHOR_NAME` / `PYGIT_AUTHOR_EMAIL` overrides.
///
/// Both apply to the author *and* the committer identity used by `commit`.
/// They only take effect when both are set — a lone `PYGIT_AUTHOR_NAME`
/// without an email is ignored, since a signature needs both.
#[derive(Debug, Default)]
pub struct AuthorOverride {
    name: Option<String>,
    email: Option<String>,
}

impl AuthorOverride {
    pub fn from_env() -> Self {
        Self {
            name: std::env::var("PYGIT_AUTHOR_NAME").ok(),
            email: std::env::var("PYGIT_AUTHOR_EMAIL").ok(),
        }
    }

    fn pair(&self) -> Option<(&str, &str)> {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => Some((name.as_str(), email.as_str())),
            _ => None,
        }
    }

    /// Build a signature for `commit`/`tag`, preferring the environment
    /// override over `user.name`/`user.email` from config when both
    /// environment variables are set.
    pub fn resolve(&self, config_name: Option<String>, config_email: Option<String>) -> Option<Signature> {
        let (name, email) = match self.pair() {
            Some((name, email)) => (name.to_string(), email.to_string()),
            None => (config_name?, config_email?),
        };
        Some(Signature {
            name: BString::from(name),
            email: BString::from(email),
            date: GitDate::now(),
        })
    }
}
