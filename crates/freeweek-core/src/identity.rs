use sha2::{Digest, Sha256};

/// Derives a stable user id from a display name: the same name always
/// maps to the same id, so a returning member picks up their own
/// blocks without an account system.
///
/// This is deliberately not an authentication scheme. Two people using
/// the same name share an identity, and that is accepted; a
/// UUID-per-session scheme can replace this without touching any store
/// contract.
pub fn user_id_for_name(name: &str) -> String {
    let digest = Sha256::digest(name.trim().as_bytes());
    format!("user-{}", &hex::encode(digest)[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_id() {
        assert_eq!(user_id_for_name("Alice"), user_id_for_name("Alice"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(user_id_for_name("  Alice "), user_id_for_name("Alice"));
    }

    #[test]
    fn different_names_diverge() {
        assert_ne!(user_id_for_name("Alice"), user_id_for_name("Bob"));
    }

    #[test]
    fn id_shape() {
        let id = user_id_for_name("Alice");
        let hex_part = id.strip_prefix("user-").unwrap();
        assert_eq!(hex_part.len(), 12);
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
