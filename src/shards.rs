use std::fs;
use std::io;
use std::path::Path;

/// Number of shards to open `root` with.
///
/// An existing store keeps the shard count it was created with: every directory
/// directly under `root` whose name is all decimal digits counts as a shard. Only
/// when none are found (missing or empty root) is `requested` used.
pub fn detect(root: &Path, requested: u32) -> io::Result<u32> {
    let discovered = count_shard_dirs(root)?;
    if discovered > 0 {
        if discovered != requested {
            tracing::debug!(
                path = %root.display(),
                discovered,
                requested,
                "existing store keeps its shard count"
            );
        }
        Ok(discovered)
    } else {
        Ok(requested)
    }
}

pub fn count_shard_dirs(root: &Path) -> io::Result<u32> {
    Ok(discover(root)?.len() as u32)
}

/// Names of the shard directories under `root`, in numeric order (`2` before `10`).
/// A missing root has no shards.
pub fn discover(root: &Path) -> io::Result<Vec<String>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_shard_name(&name) && entry.path().is_dir() {
            names.push(name);
        }
    }
    names.sort_by(|a, b| numeric_order(a).cmp(&numeric_order(b)));
    Ok(names)
}

// Digit strings compare numerically by (significant length, digits); the full name
// breaks ties between `1` and `01`.
fn numeric_order(name: &str) -> (usize, &str, &str) {
    let digits = name.trim_start_matches('0');
    (digits.len(), digits, name)
}

/// Shard directories are named with a zero-padded index: `000`, `001`, ...
pub fn shard_dir_name(index: u32) -> String {
    format!("{:03}", index)
}

pub fn is_shard_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}
