//! Credential verification against an identity table.

use std::collections::HashMap;

use subtle::ConstantTimeEq;

/// Checks a claimed username/password pair.
///
/// Implementations must not distinguish an unknown user from a wrong
/// password: both are `false`.
pub trait CredentialVerifier: Send + Sync {
    /// Return `true` if the pair matches the identity store.
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Verifier over a fixed, constructor-supplied identity table.
#[derive(Debug, Clone, Default)]
pub struct StaticVerifier {
    users: HashMap<String, String>,
}

impl StaticVerifier {
    /// Create a verifier over the given `username -> password` table.
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    /// The demo identity table.
    pub fn demo() -> Self {
        Self::new(demo_users())
    }

    /// Number of known principals.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialVerifier for StaticVerifier {
    fn verify(&self, username: &str, password: &str) -> bool {
        if username.is_empty() || password.is_empty() {
            return false;
        }

        match self.users.get(username) {
            Some(expected) => constant_time_eq(password, expected),
            None => {
                // Same work as a known user with a wrong password.
                let _ = constant_time_eq(password, password);
                false
            }
        }
    }
}

/// The three demo principals.
pub fn demo_users() -> HashMap<String, String> {
    [("Hugo", "Hugo123"), ("Paco", "Paco123"), ("Luis", "Luis123")]
        .into_iter()
        .map(|(u, p)| (u.to_string(), p.to_string()))
        .collect()
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        let _ = a.ct_eq(a);
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_accepts_known_pairs() {
        let verifier = StaticVerifier::demo();
        assert!(verifier.verify("Hugo", "Hugo123"));
        assert!(verifier.verify("Paco", "Paco123"));
        assert!(verifier.verify("Luis", "Luis123"));
    }

    #[test]
    fn test_wrong_password_and_unknown_user_both_false() {
        let verifier = StaticVerifier::demo();
        assert!(!verifier.verify("Hugo", "wrong"));
        assert!(!verifier.verify("Nobody", "Hugo123"));
        assert!(!verifier.verify("hugo", "Hugo123"));
    }

    #[test]
    fn test_empty_fields_fail() {
        let mut users = HashMap::new();
        users.insert(String::new(), String::new());
        let verifier = StaticVerifier::new(users);

        assert!(!verifier.verify("", ""));
        assert!(!verifier.verify("Hugo", ""));
        assert!(!verifier.verify("", "Hugo123"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
    }
}
