//! Keyboard key definitions for Input.dispatchKeyEvent
//!
//! Maps DOM key values to the CDP key event parameters Chrome expects.

use phf::phf_map;

/// CDP parameters for one named key
#[derive(Debug, Clone, Copy)]
pub struct KeyDefinition {
    /// DOM key value (e.g., "Enter")
    pub key: &'static str,
    /// Physical key code (e.g., "Enter", "KeyA")
    pub code: &'static str,
    /// Windows virtual key code
    pub windows_virtual_key_code: u32,
    /// Text produced by the key, when it produces text
    pub text: Option<&'static str>,
}

/// Static key table for the named keys scenarios use
/// Uses compile-time hash map for O(1) lookup without runtime allocation
static KEY_MAP: phf::Map<&'static str, KeyDefinition> = phf_map! {
    "Enter" => KeyDefinition { key: "Enter", code: "Enter", windows_virtual_key_code: 13, text: Some("\r") },
    "Escape" => KeyDefinition { key: "Escape", code: "Escape", windows_virtual_key_code: 27, text: None },
    "Tab" => KeyDefinition { key: "Tab", code: "Tab", windows_virtual_key_code: 9, text: Some("\t") },
    "Backspace" => KeyDefinition { key: "Backspace", code: "Backspace", windows_virtual_key_code: 8, text: None },
    "Delete" => KeyDefinition { key: "Delete", code: "Delete", windows_virtual_key_code: 46, text: None },
    "ArrowUp" => KeyDefinition { key: "ArrowUp", code: "ArrowUp", windows_virtual_key_code: 38, text: None },
    "ArrowDown" => KeyDefinition { key: "ArrowDown", code: "ArrowDown", windows_virtual_key_code: 40, text: None },
    "ArrowLeft" => KeyDefinition { key: "ArrowLeft", code: "ArrowLeft", windows_virtual_key_code: 37, text: None },
    "ArrowRight" => KeyDefinition { key: "ArrowRight", code: "ArrowRight", windows_virtual_key_code: 39, text: None },
    "Home" => KeyDefinition { key: "Home", code: "Home", windows_virtual_key_code: 36, text: None },
    "End" => KeyDefinition { key: "End", code: "End", windows_virtual_key_code: 35, text: None },
    "PageUp" => KeyDefinition { key: "PageUp", code: "PageUp", windows_virtual_key_code: 33, text: None },
    "PageDown" => KeyDefinition { key: "PageDown", code: "PageDown", windows_virtual_key_code: 34, text: None },
    "Space" => KeyDefinition { key: " ", code: "Space", windows_virtual_key_code: 32, text: Some(" ") },
};

/// Resolved key event parameters, owned so single characters work too
#[derive(Debug, Clone)]
pub struct ResolvedKey {
    pub key: String,
    pub code: String,
    pub windows_virtual_key_code: u32,
    pub text: Option<String>,
}

/// Resolve a key name to its CDP event parameters
///
/// Named keys come from the static table; a single printable character is
/// treated as itself. Anything else is unknown.
pub fn resolve(key: &str) -> Option<ResolvedKey> {
    if let Some(def) = KEY_MAP.get(key) {
        return Some(ResolvedKey {
            key: def.key.to_string(),
            code: def.code.to_string(),
            windows_virtual_key_code: def.windows_virtual_key_code,
            text: def.text.map(|t| t.to_string()),
        });
    }

    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => {
            let code = if c.is_ascii_alphabetic() {
                format!("Key{}", c.to_ascii_uppercase())
            } else if c.is_ascii_digit() {
                format!("Digit{}", c)
            } else {
                String::new()
            };
            let vk = if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase() as u32
            } else {
                0
            };
            Some(ResolvedKey {
                key: c.to_string(),
                code,
                windows_virtual_key_code: vk,
                text: Some(c.to_string()),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys() {
        let enter = resolve("Enter").unwrap();
        assert_eq!(enter.windows_virtual_key_code, 13);
        assert_eq!(enter.text.as_deref(), Some("\r"));

        let escape = resolve("Escape").unwrap();
        assert_eq!(escape.windows_virtual_key_code, 27);
        assert!(escape.text.is_none());
    }

    #[test]
    fn test_single_characters() {
        let a = resolve("a").unwrap();
        assert_eq!(a.key, "a");
        assert_eq!(a.code, "KeyA");
        assert_eq!(a.windows_virtual_key_code, 'A' as u32);
        assert_eq!(a.text.as_deref(), Some("a"));

        let five = resolve("5").unwrap();
        assert_eq!(five.code, "Digit5");
    }

    #[test]
    fn test_unknown_key() {
        assert!(resolve("NoSuchKey").is_none());
        assert!(resolve("").is_none());
    }
}
