use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::api::NewAccount;
use crate::app_dirs::AppDirs;

/// Where the session token lives between runs.
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::token_path().unwrap_or_else(|| PathBuf::from("wordrush_token"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let token = fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Token kept only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(token.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        if let Ok(mut slot) = self.token.lock() {
            *slot = None;
        }
        Ok(())
    }
}

impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, token: &str) -> io::Result<()> {
        (**self).save(token)
    }

    fn clear(&self) -> io::Result<()> {
        (**self).clear()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub label: &'static str,
    pub value: String,
    pub secret: bool,
}

impl TextField {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            secret: false,
        }
    }

    fn secret(label: &'static str) -> Self {
        Self {
            secret: true,
            ..Self::new(label)
        }
    }
}

/// Login and sign-up form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    pub fields: Vec<TextField>,
    pub focus: usize,
    pub error: Option<String>,
    pub submitting: bool,
}

impl Form {
    pub const EMAIL: usize = 0;
    pub const LOGIN_PASSWORD: usize = 1;
    pub const USERNAME: usize = 1;
    pub const SIGN_UP_PASSWORD: usize = 2;

    pub fn login() -> Self {
        Self::with_fields(vec![TextField::new("Email"), TextField::secret("Password")])
    }

    pub fn sign_up() -> Self {
        Self::with_fields(vec![
            TextField::new("Email"),
            TextField::new("Username"),
            TextField::secret("Password"),
        ])
    }

    fn with_fields(fields: Vec<TextField>) -> Self {
        Self {
            fields,
            focus: 0,
            error: None,
            submitting: false,
        }
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map(|f| f.value.as_str()).unwrap_or_default()
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn push(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(c);
        }
    }

    pub fn pop(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    pub fn is_complete(&self) -> bool {
        self.fields.iter().all(|f| !f.value.trim().is_empty())
    }

    /// Checks the form before submitting. Sets the error on failure.
    pub fn validate(&mut self) -> bool {
        if !self.is_complete() {
            self.error = Some("Please fill in all fields.".to_string());
            return false;
        }
        self.error = None;
        true
    }

    pub fn credentials(&self) -> (String, String) {
        (
            self.value(Self::EMAIL).trim().to_string(),
            self.value(Self::LOGIN_PASSWORD).to_string(),
        )
    }

    pub fn account(&self) -> NewAccount {
        NewAccount {
            email: self.value(Self::EMAIL).trim().to_string(),
            username: self.value(Self::USERNAME).trim().to_string(),
            password: self.value(Self::SIGN_UP_PASSWORD).to_string(),
        }
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.focus = 0;
        self.error = None;
        self.submitting = false;
    }
}

/// Clears the stored token, logging rather than failing when the store
/// cannot be written.
pub fn forget_token(store: &dyn TokenStore) {
    if let Err(e) = store.clear() {
        warn!(error = %e, "could not clear stored token");
    }
}
