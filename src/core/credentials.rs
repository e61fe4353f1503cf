use keyring::Entry;
use std::error::Error;
use std::fmt;
use tracing::{debug, warn};

/// Environment variable checked before the keyring.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

const KEYRING_SERVICE: &str = "chatbot-playground";
const KEYRING_USER: &str = "groq";

/// Describes failures when attempting to access the system keyring.
///
/// Recoverable errors indicate that the credential backend was
/// temporarily unavailable (for example when the keychain service is
/// locked or inaccessible). Permanent errors surface the underlying
/// cause directly so callers can report them to the user.
#[derive(Debug)]
pub enum CredentialError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl CredentialError {
    fn inner(&self) -> &keyring::Error {
        match self {
            CredentialError::Recoverable(err) | CredentialError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, CredentialError::Recoverable(_))
    }
}

impl From<keyring::Error> for CredentialError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                CredentialError::Recoverable(err)
            }
            other => CredentialError::Permanent(other),
        }
    }
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keyring unavailable: {}", self.inner())
    }
}

impl Error for CredentialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// Where the API key lives: the environment first, then the platform keyring.
#[derive(Debug, Clone, Copy)]
pub struct CredentialStore {
    use_keyring: bool,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self { use_keyring: true }
    }

    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self { use_keyring }
    }

    /// Resolve the key from the process environment, falling back to the
    /// keyring. A missing key is `Ok(None)`; requests fail later.
    pub fn resolve(&self) -> Result<Option<String>, CredentialError> {
        self.resolve_with(std::env::var(API_KEY_ENV).ok())
    }

    pub fn resolve_with(&self, env_value: Option<String>) -> Result<Option<String>, CredentialError> {
        if let Some(key) = non_blank(env_value) {
            debug!(source = API_KEY_ENV, "api key resolved");
            return Ok(Some(key));
        }
        let stored = non_blank(self.get()?);
        if stored.is_some() {
            debug!(source = "keyring", "api key resolved");
        }
        Ok(stored)
    }

    pub fn get(&self) -> Result<Option<String>, CredentialError> {
        if !self.use_keyring {
            return Ok(None);
        }

        let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn store(&self, token: &str) -> Result<(), CredentialError> {
        if !self.use_keyring {
            return Ok(());
        }

        let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
        entry.set_password(token)?;
        Ok(())
    }

    /// Returns whether a stored key was actually removed.
    pub fn remove(&self) -> Result<bool, CredentialError> {
        if !self.use_keyring {
            return Ok(false);
        }

        let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Startup policy for a resolved key: a locked or unreachable keyring is
/// logged and treated as "no key"; any other keyring failure is returned.
pub fn tolerate_outage(
    resolved: Result<Option<String>, CredentialError>,
) -> Result<Option<String>, CredentialError> {
    match resolved {
        Err(err) if err.is_recoverable() => {
            warn!("could not read the keyring: {err}");
            Ok(None)
        }
        other => other,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
