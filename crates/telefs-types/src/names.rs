//! Object name rules.
//!
//! Valid object names:
//! - Must be non-empty and at most [`MAX_NAME_LEN`] bytes
//! - Must not contain NUL or other control characters
//! - Must not start with `/`
//! - Path components between slashes must be non-empty and must not be `.` or `..`
//! - Must not equal [`CATALOG_NAME`]

use crate::error::TypeError;

/// The name catalog snapshots are sent under.
pub const CATALOG_NAME: &str = "filelist.json";

/// Longest accepted object name, in bytes.
pub const MAX_NAME_LEN: usize = 1024;

/// Returns `true` if `name` is the reserved catalog name.
pub fn is_reserved_name(name: &str) -> bool {
    name == CATALOG_NAME
}

/// Validate an object name, returning `Ok(())` if it may be stored.
///
/// # Examples
///
/// ```
/// use telefs_types::names::validate_object_name;
///
/// assert!(validate_object_name("notes.txt").is_ok());
/// assert!(validate_object_name("photos/2024/cat.jpg").is_ok());
/// assert!(validate_object_name("").is_err());
/// assert!(validate_object_name("filelist.json").is_err());
/// ```
pub fn validate_object_name(name: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }

    if is_reserved_name(name) {
        return Err(TypeError::ReservedName(name.to_string()));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: format!("name is {} bytes, limit is {MAX_NAME_LEN}", name.len()),
        });
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: format!("contains control character {ch:?}"),
        });
    }

    if name.starts_with('/') {
        return Err(invalid("must not start with '/'"));
    }

    for component in name.split('/') {
        match component {
            "" => return Err(invalid("path components must not be empty")),
            "." | ".." => {
                return Err(TypeError::InvalidName {
                    name: name.to_string(),
                    reason: format!("path component {component:?} is not allowed"),
                })
            }
            _ => {}
        }
    }

    Ok(())
}
