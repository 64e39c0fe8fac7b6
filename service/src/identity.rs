use hashbrown::HashMap;

use crate::config::UserConfig;

/// Source of user identities.
pub trait IdentityProvider: Send + Sync {
    /// User id owning `token`, if any.
    fn validate(&self, token: &str) -> Option<String>;
    fn contains(&self, user_id: &str) -> bool;
    /// Human-readable name, when the provider knows one.
    fn display_name(&self, user_id: &str) -> Option<String>;
}

/// Fixed user table, usually built from the `[[users]]` section of the configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, Option<String>>,
    tokens: HashMap<String, String>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_users(users: &[UserConfig]) -> Self {
        users.iter().cloned().fold(Self::new(), Self::with_user)
    }

    pub fn with_user(mut self, user: UserConfig) -> Self {
        if let Some(token) = user.token {
            self.tokens.insert(token, user.id.clone());
        }
        self.users.insert(user.id, user.name);
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn validate(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }

    fn contains(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    fn display_name(&self, user_id: &str) -> Option<String> {
        self.users.get(user_id)?.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_resolve_to_users() {
        let identity = StaticIdentityProvider::from_users(&[
            UserConfig::new("alice").with_token("t-a"),
            UserConfig::new("bob"),
        ]);

        assert_eq!(identity.validate("t-a").as_deref(), Some("alice"));
        assert_eq!(identity.validate("t-b"), None);
        assert!(identity.contains("bob"));
        assert!(!identity.contains("carol"));
        assert_eq!(identity.len(), 2);
    }

    #[test]
    fn display_name_is_optional() {
        let mut alice = UserConfig::new("alice");
        alice.name = Some("Alice".into());
        let identity = StaticIdentityProvider::new()
            .with_user(alice)
            .with_user(UserConfig::new("bob"));

        assert_eq!(identity.display_name("alice").as_deref(), Some("Alice"));
        assert_eq!(identity.display_name("bob"), None);
    }
}
