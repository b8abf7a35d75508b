use parking_lot::RwLock;
use relay_core::CredentialStore;
use relay_domain::{Result, TokenPair};

#[derive(Debug, Default)]
struct Slots {
    tokens: Option<TokenPair>,
    csrf_token: Option<String>,
}

/// Tokens held in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    slots: RwLock<Slots>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing session
    pub fn with_tokens(pair: TokenPair) -> Self {
        Self { slots: RwLock::new(Slots { tokens: Some(pair), csrf_token: None }) }
    }

    /// Snapshot of the current token pair
    pub fn tokens(&self) -> Option<TokenPair> {
        self.slots.read().tokens.clone()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get_access_token(&self) -> Option<String> {
        self.slots.read().tokens.as_ref().map(|pair| pair.access_token.clone())
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.slots
            .read()
            .tokens
            .as_ref()
            .filter(|pair| pair.has_refresh_token())
            .map(|pair| pair.refresh_token.clone())
    }

    fn get_csrf_token(&self) -> Option<String> {
        self.slots.read().csrf_token.clone()
    }

    fn store_tokens(&self, pair: &TokenPair) -> Result<()> {
        self.slots.write().tokens = Some(pair.clone());
        Ok(())
    }

    fn store_csrf_token(&self, token: &str) -> Result<()> {
        self.slots.write().csrf_token = Some(token.to_string());
        Ok(())
    }

    fn clear_tokens(&self) -> Result<()> {
        *self.slots.write() = Slots::default();
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        self.slots.write().tokens = None;
        Ok(())
    }
}
