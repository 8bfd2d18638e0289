use super::credentials::CredentialRecord;

/// Whether a login request targets the same account as the saved credentials.
///
/// Compares auth URL, user domain and username. Password and project id are
/// ignored: a changed password or project still belongs to the same account.
pub fn is_same_identity(
    cached: &CredentialRecord,
    auth_url: &str,
    user_domain_name: &str,
    username: &str,
) -> bool {
    cached.auth_url == auth_url
        && cached.user_domain_name == user_domain_name
        && cached.username == username
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached() -> CredentialRecord {
        CredentialRecord {
            username: "alice".to_string(),
            password: "pw".to_string(),
            auth_url: "https://id.example/v3".to_string(),
            user_domain_name: "example.id".to_string(),
            project_id: "p-1".to_string(),
        }
    }

    #[test]
    fn test_same_identity() {
        assert!(is_same_identity(&cached(), "https://id.example/v3", "example.id", "alice"));
    }

    #[test]
    fn test_any_field_differs() {
        let c = cached();
        assert!(!is_same_identity(&c, "https://other.example/v3", "example.id", "alice"));
        assert!(!is_same_identity(&c, "https://id.example/v3", "other.id", "alice"));
        assert!(!is_same_identity(&c, "https://id.example/v3", "example.id", "bob"));
    }

    #[test]
    fn test_password_and_project_ignored() {
        let mut c = cached();
        c.password = "changed".to_string();
        c.project_id = "p-2".to_string();
        assert!(is_same_identity(&c, "https://id.example/v3", "example.id", "alice"));
    }
}
