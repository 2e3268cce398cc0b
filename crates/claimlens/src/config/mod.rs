use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};

pub const WAREHOUSE_PATH_ENV: &str = "CLAIMLENS_WAREHOUSE";
pub const WAREHOUSE_DIR_NAME: &str = ".claimlens";
pub const WAREHOUSE_FILE_NAME: &str = "warehouse.sqlite";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub home_dir: PathBuf,
    pub cwd: PathBuf,
    pub warehouse_path: PathBuf,
}

#[must_use]
pub fn default_warehouse_path(home_dir: &Path) -> PathBuf {
    home_dir.join(WAREHOUSE_DIR_NAME).join(WAREHOUSE_FILE_NAME)
}

pub fn resolve_runtime_paths(
    home_dir: &Path,
    cwd: &Path,
    warehouse_override: Option<&Path>,
) -> Result<RuntimePaths> {
    if !home_dir.is_absolute() {
        bail!("home_dir must be absolute: {}", home_dir.display());
    }
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }

    let home_dir = normalize_lexical(home_dir);
    let cwd = normalize_lexical(cwd);
    let warehouse_path = match warehouse_override {
        Some(path) => resolve_warehouse_override(path, &home_dir, &cwd)?,
        None => default_warehouse_path(&home_dir),
    };

    Ok(RuntimePaths {
        home_dir,
        cwd,
        warehouse_path,
    })
}

// The warehouse path must name a database file, never a bare directory.
fn resolve_warehouse_override(path: &Path, home_dir: &Path, cwd: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        bail!("warehouse path must not be empty");
    }

    let expanded = expand_tilde(path, home_dir)?;
    let anchored = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };
    let resolved = normalize_lexical(&anchored);
    if resolved.file_name().is_none() {
        bail!(
            "warehouse path must name a database file: {}",
            path.display()
        );
    }

    Ok(resolved)
}

fn expand_tilde(path: &Path, home_dir: &Path) -> Result<PathBuf> {
    let Some(Component::Normal(first)) = path.components().next() else {
        return Ok(path.to_path_buf());
    };

    if first == "~" {
        return match path.strip_prefix("~") {
            Ok(rest) => Ok(home_dir.join(rest)),
            Err(_) => Ok(home_dir.to_path_buf()),
        };
    }
    if first.to_string_lossy().starts_with('~') {
        bail!(
            "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
            path.display()
        );
    }

    Ok(path.to_path_buf())
}

fn normalize_lexical(path: &Path) -> PathBuf {
    path.components().fold(PathBuf::new(), |mut acc, component| {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !acc.pop() {
                    acc.push(component.as_os_str());
                }
            }
            other => acc.push(other.as_os_str()),
        }
        acc
    })
}
