//! Directory listing embedded in the system instructions.

use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Deepest level listed below the root.
const MAX_DEPTH: usize = 4;

/// Render `root` as an indented tree, sorted by file name.
///
/// Directories end in `/`. At most `max_entries` entries are listed; the rest
/// are summarized in a trailing line.
pub fn render_tree(root: &Path, max_entries: usize) -> Result<String> {
    let mut buf = format!("{}/\n", root.display());
    let mut listed = 0usize;
    let mut omitted = 0usize;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if listed >= max_entries {
            omitted += 1;
            continue;
        }
        let indent = "  ".repeat(entry.depth());
        let name = entry.file_name().to_string_lossy();
        let suffix = if entry.file_type().is_dir() { "/" } else { "" };
        buf.push_str(&format!("{indent}{name}{suffix}\n"));
        listed += 1;
    }

    if omitted > 0 {
        buf.push_str(&format!("  ... {omitted} more entries omitted\n"));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn renders_sorted_nested_tree() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("scripts")).expect("mkdir");
        fs::write(root.join("hyprland.conf"), "").expect("write");
        fs::write(root.join("scripts/wallpaper.sh"), "").expect("write");
        fs::write(root.join("hyprpaper.conf"), "").expect("write");

        let tree = render_tree(root, 100).expect("tree");
        let lines: Vec<&str> = tree.lines().skip(1).collect();
        assert_eq!(
            lines,
            vec![
                "  hyprland.conf",
                "  hyprpaper.conf",
                "  scripts/",
                "    wallpaper.sh",
            ]
        );
    }

    #[test]
    fn caps_entry_count() {
        let temp = tempfile::tempdir().expect("tempdir");
        for i in 0..5 {
            fs::write(temp.path().join(format!("{i}.conf")), "").expect("write");
        }
        let tree = render_tree(temp.path(), 2).expect("tree");
        assert!(tree.contains("0.conf"));
        assert!(!tree.contains("2.conf"));
        assert!(tree.contains("3 more entries omitted"));
    }
}
