use thiserror::Error;

/// Why an asset key (sprite, mesh or material reference) was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetKeyError {
    #[error("asset key must not be empty")]
    Empty,
    #[error("asset key must not start with '/'")]
    LeadingSlash,
    #[error("asset key must not contain '\\\\'")]
    Backslash,
    #[error("asset key must not contain '..'")]
    ParentTraversal,
    #[error("asset key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys are relative, lowercase paths such as `items/watering_can`; they are
/// joined onto an asset directory, so anything that could escape it is refused.
pub fn validate_asset_key(key: &str) -> Result<(), AssetKeyError> {
    if key.is_empty() {
        return Err(AssetKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(AssetKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(AssetKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(AssetKeyError::ParentTraversal);
    }
    match key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        Some(character) => Err(AssetKeyError::InvalidCharacter { character }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_item_and_stage_keys() {
        for key in ["player", "items/watering_can", "meshes/pietree_2", "a-b/c_d"] {
            assert!(validate_asset_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_keys_that_escape_or_use_odd_characters() {
        assert_eq!(validate_asset_key(""), Err(AssetKeyError::Empty));
        assert_eq!(validate_asset_key("/a"), Err(AssetKeyError::LeadingSlash));
        assert_eq!(validate_asset_key(r"a\b"), Err(AssetKeyError::Backslash));
        assert_eq!(
            validate_asset_key("a/../b"),
            Err(AssetKeyError::ParentTraversal)
        );
        assert_eq!(
            validate_asset_key("Items/can"),
            Err(AssetKeyError::InvalidCharacter { character: 'I' })
        );
        assert!(validate_asset_key("a.b").is_err());
    }
}
