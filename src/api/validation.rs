/// Accept a post-login redirect target only if it stays on this site.
pub fn safe_next(next: &str) -> Option<&str> {
    let next = next.trim();
    let is_local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.contains("://");

    is_local.then_some(next)
}

/// Login URL that sends the user back to `original` afterwards.
#[must_use]
pub fn login_url_with_next(original: &str) -> String {
    format!(
        "{}?next={}",
        crate::constants::routes::LOGIN,
        urlencoding::encode(original)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next("/add_gift"), Some("/add_gift"));
        assert_eq!(safe_next(" /my_gifts?x=1 "), Some("/my_gifts?x=1"));
    }

    #[test]
    fn test_safe_next_rejects_foreign_targets() {
        assert_eq!(safe_next(""), None);
        assert_eq!(safe_next("add_gift"), None);
        assert_eq!(safe_next("//evil.example"), None);
        assert_eq!(safe_next("/\\evil.example"), None);
        assert_eq!(safe_next("https://evil.example"), None);
        assert_eq!(safe_next("/redirect?to=https://evil.example"), None);
    }

    #[test]
    fn test_login_url_encodes_target() {
        assert_eq!(login_url_with_next("/add_gift"), "/login?next=%2Fadd_gift");
    }
}
