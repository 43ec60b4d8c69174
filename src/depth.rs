use crate::error::{FormError, Result};

/// Fail once `depth` goes past `max_depth`. Top-level fields are depth 0.
pub fn check_depth(depth: usize, max_depth: usize, key: &str) -> Result<()> {
    if depth > max_depth {
        return Err(FormError::MaxDepthExceeded {
            max_depth,
            key: key.to_string(),
        });
    }
    Ok(())
}
