use crate::errors::{ErrorDetails, ErrorLayer, Result, ViewerError};

pub fn write_file_ensuring_parent_dir(file_path: &str, contents: &str) -> Result<()> {
    let as_path = std::path::Path::new(file_path);
    let parent_path = match as_path.parent() {
        Some(p) => p,
        None => {
            return Err(ViewerError::StickyProblem(ErrorDetails {
                layer: ErrorLayer::RenderLayer,
                message: format!("Problem getting parent of '{}'", file_path),
            }));
        }
    };
    if let Err(e) = std::fs::create_dir_all(parent_path) {
        return Err(ViewerError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::RenderLayer,
            message: format!("Problem creating parent of '{}': {}", file_path, e),
        }));
    }
    std::fs::write(as_path, contents)?;
    Ok(())
}

/// File name for a scenario or symbol name.  Names come from the database and
/// may contain slashes or spaces.
pub fn encode_file_name(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

#[test]
fn test_encode_file_name() {
    assert_eq!(encode_file_name("Akut/Notfall 1"), "Akut%2FNotfall%201");
    assert_eq!(encode_file_name("plain"), "plain");
}
