//! Small helpers shared across the engine.

/// Mask an email address for logging: keep the first character of the local part and the domain.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().unwrap_or('*');
            format!("{first}***@{domain}")
        },
        _ => "***".to_string(),
    }
}
