//! File-based resource name validation.

/// Checks a file name against the rules for file-based resource names.
///
/// The resource name is the part before the first `.` (so `icon.9.png`
/// names `icon`). It must be non-empty, start with a letter, and contain
/// only lowercase `a-z`, `0-9` and `_`.
pub fn validate_file_resource_name(file_name: &str) -> Result<(), String> {
    let name = file_name.split('.').next().unwrap_or("");
    if name.is_empty() {
        return Err("the resource name is empty".to_string());
    }

    let mut chars = name.chars();
    let first = chars.next().unwrap_or_default();
    if !first.is_ascii_lowercase() {
        return Err("the resource name must start with a lowercase letter".to_string());
    }
    for c in chars {
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
            return Err(format!(
                "'{c}' is not a valid resource name character; only lowercase a-z, 0-9 and _ \
                 are allowed"
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_names() {
        assert!(validate_file_resource_name("icon.png").is_ok());
        assert!(validate_file_resource_name("ic_launcher_2.9.png").is_ok());
        assert!(validate_file_resource_name("main_layout.xml").is_ok());
    }

    #[test]
    fn test_rejects_uppercase() {
        assert!(validate_file_resource_name("Icon.png").is_err());
        assert!(validate_file_resource_name("my-icon.png").is_err());
    }

    #[test]
    fn test_rejects_leading_digit_and_empty() {
        assert!(validate_file_resource_name("9patch.png").is_err());
        assert!(validate_file_resource_name(".png").is_err());
        assert!(validate_file_resource_name("").is_err());
    }
}
