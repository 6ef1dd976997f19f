//! Ptimports command implementation.

use anyhow::{Context, Result};
use gochecks_rules::ptimports::{group_imports, ImportGrouper, NAME};
use std::path::{Path, PathBuf};

/// Runs the ptimports command.
///
/// Prints the grouped source of each file, lists the files that would
/// change (`list`), or rewrites them in place (`write`).
pub fn run(
    inputs: &[PathBuf],
    write: bool,
    list: bool,
    local: Option<String>,
    config: Option<&Path>,
) -> Result<()> {
    let config = super::load_config(Path::new("."), config)?;
    let local = local.or_else(|| {
        config
            .check_config(NAME)
            .and_then(|c| c.get_str("local_prefix"))
            .map(String::from)
    });
    let grouper = ImportGrouper::new(local.as_deref());

    let inputs = if inputs.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        inputs.to_vec()
    };

    for file in go_files(&inputs)? {
        let source = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let grouped = group_imports(&file, &source, &grouper)?;

        if list {
            if grouped != source {
                println!("{}", file.display());
            }
        } else if write {
            if grouped != source {
                std::fs::write(&file, grouped)
                    .with_context(|| format!("Failed to write {}", file.display()))?;
                tracing::info!("Grouped imports of {}", file.display());
            }
        } else {
            print!("{grouped}");
        }
    }
    Ok(())
}

/// Expands the inputs into `.go` files; directories are walked, skipping
/// `vendor` directories and ignored paths.
fn go_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }

        let mut builder = ignore::WalkBuilder::new(input);
        builder
            .hidden(true)
            .git_ignore(true)
            .filter_entry(|e| e.file_name() != "vendor");
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "go") {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn walks_directories_and_skips_vendor() {
        let tmp = TempDir::new().unwrap();
        for rel in ["a.go", "sub/b.go", "vendor/c/c.go", "notes.txt"] {
            let path = tmp.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "package x\n").unwrap();
        }

        let files = go_files(&[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(
            files,
            vec![tmp.path().join("a.go"), tmp.path().join("sub/b.go")]
        );
    }

    #[test]
    fn write_rewrites_ungrouped_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("x.go");
        std::fs::write(&file, "package x\n\nimport \"os\"\nimport \"fmt\"\n").unwrap();

        run(&[file.clone()], true, false, None, None).unwrap();
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "package x\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n"
        );
    }
}
