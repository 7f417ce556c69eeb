use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;
use tracing::{error, warn};

/// Reads the persisted document tree. A missing or unreadable file starts an
/// empty tree rather than failing startup.
pub async fn load_tree(path: &Path) -> Value {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
            Ok(tree) if tree.is_object() => tree,
            Ok(_) => {
                warn!("data file {} is not a JSON object, starting empty", path.display());
                empty_tree()
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                empty_tree()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => empty_tree(),
        Err(err) => {
            error!("failed to read data file: {err}");
            empty_tree()
        }
    }
}

/// Writes the tree next to its destination first so a crash mid-write never
/// leaves a truncated file behind.
pub async fn persist_tree(path: &Path, tree: &Value) -> Result<(), std::io::Error> {
    let payload = serde_json::to_vec_pretty(tree)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

pub fn empty_tree() -> Value {
    Value::Object(Map::new())
}
