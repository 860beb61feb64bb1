use std::path::{Path, PathBuf};

use clap::ValueEnum;
use reak_common::{Error, Result};
use tracing::info;

/// Which boilerplate files to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Models,
    Controllers,
    Both,
}

impl Target {
    fn packages(self) -> &'static [Package] {
        match self {
            Target::Models => &[Package::Models],
            Target::Controllers => &[Package::Controllers],
            Target::Both => &[Package::Models, Package::Controllers],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Package {
    Models,
    Controllers,
}

impl Package {
    fn dir(self) -> &'static str {
        match self {
            Package::Models => "models",
            Package::Controllers => "controllers",
        }
    }

    fn source(self) -> String {
        match self {
            Package::Models => format!(
                "package {}\n\ntype DefaultStructure struct {{\n    // rename the struct and define your fields here\n}}\n\nfunc DefaultFunction() {{\n    // rename the function and start writing code\n}}\n",
                self.dir()
            ),
            Package::Controllers => format!(
                "package {}\n\nimport \"net/http\"\n\nfunc DefaultFunction(w http.ResponseWriter, r *http.Request) {{\n    // rename the function and start writing code\n}}\n",
                self.dir()
            ),
        }
    }
}

/// Write `<package>/<name>.go` for each package in `target` under `root`.
/// Existing files are never overwritten.
pub fn generate(root: &Path, target: Target, name: &str) -> Result<Vec<PathBuf>> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(Error::Generate(format!("invalid file name: {name:?}")));
    }

    let mut written = Vec::new();
    for package in target.packages() {
        let dir = root.join(package.dir());
        let path = dir.join(format!("{name}.go"));
        if path.exists() {
            return Err(Error::Generate(format!(
                "file already exists: {}",
                path.display()
            )));
        }
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&path, package.source())?;
        info!("created {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn both_writes_model_and_controller() {
        let root = TempDir::new().unwrap();
        let written = generate(root.path(), Target::Both, "user").unwrap();

        assert_eq!(
            written,
            vec![
                root.path().join("models/user.go"),
                root.path().join("controllers/user.go")
            ]
        );
        let model = std::fs::read_to_string(root.path().join("models/user.go")).unwrap();
        assert!(model.starts_with("package models\n"));
        let controller = std::fs::read_to_string(root.path().join("controllers/user.go")).unwrap();
        assert!(controller.contains("import \"net/http\""));
    }

    #[test]
    fn refuses_to_overwrite() {
        let root = TempDir::new().unwrap();
        generate(root.path(), Target::Models, "order").unwrap();

        let err = generate(root.path(), Target::Models, "order").unwrap_err();
        assert!(err.to_string().contains("file already exists"));
    }

    #[test]
    fn rejects_path_like_names() {
        let root = TempDir::new().unwrap();
        assert!(generate(root.path(), Target::Models, "../escape").is_err());
        assert!(generate(root.path(), Target::Models, "").is_err());
        assert!(!root.path().join("models").exists());
    }
}
