//! Plain-text rendering of the artifact dependency graph.

use crate::trail::Trail;

/// Render every non-empty ADG node of `trail`.
///
/// Each node is its identity on one line, then its manifest, then `--`.
/// Algorithm sections come in enabled order, separated by `----`.
pub fn format_adg(trail: &Trail) -> String {
    let mut sections = Vec::with_capacity(trail.algorithms().len());
    for &algorithm in trail.algorithms() {
        let mut section = String::new();
        for (identity, manifest) in trail.adgs(algorithm) {
            if manifest.is_empty() {
                continue;
            }
            section.push_str(&identity);
            section.push('\n');
            section.push_str(&manifest);
            if !manifest.ends_with('\n') {
                section.push('\n');
            }
            section.push_str("--\n");
        }
        sections.push(section);
    }
    sections.join("----\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitoid;
    use crate::hash::Algorithm;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_empty_trail() {
        let trail = Trail::new().unwrap();
        assert_eq!(format_adg(&trail), "----\n");

        let sha1_only = Trail::builder().algorithm(Algorithm::Sha1).build().unwrap();
        assert_eq!(format_adg(&sha1_only), "");
    }

    #[test]
    fn test_format_single_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("f"), b"f").unwrap();

        let mut trail = Trail::builder()
            .algorithm(Algorithm::Sha1)
            .allow(temp_dir.path())
            .build()
            .unwrap();
        trail.add(temp_dir.path()).unwrap();

        let file_id = gitoid::from_bytes(Algorithm::Sha1, b"f");
        let manifest = format!("gitoid:blob:sha1\nblob {}\n", file_id);
        let dir_id = gitoid::from_bytes(Algorithm::Sha1, manifest.as_bytes());

        // file nodes have no manifest and are left out
        assert_eq!(format_adg(&trail), format!("{}\n{}--\n", dir_id, manifest));
    }

    #[test]
    fn test_format_sections_in_algorithm_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("d")).unwrap();

        let mut trail = Trail::builder().allow(temp_dir.path()).build().unwrap();
        trail.add(temp_dir.path().join("d")).unwrap();

        let output = format_adg(&trail);
        let (sha1, sha256) = output.split_once("----\n").unwrap();
        assert!(sha1.contains("gitoid:blob:sha1\n--\n"));
        assert!(sha256.contains("gitoid:blob:sha256\n--\n"));
        assert!(!sha1.contains("sha256"));
    }
}
