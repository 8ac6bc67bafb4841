use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

const LABEL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff", "heic"];

/// Whether a newly created file looks like a label photo. Editor swap files,
/// partial downloads and hidden files are ignored.
pub fn is_label_photo(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(true, |n| n.starts_with('.'));
    if hidden {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| LABEL_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Watch `dir` (non-recursively) and forward each newly created label photo.
/// Keep the returned watcher alive for as long as events are wanted.
pub fn spawn_folder_watcher(dir: &Path, tx: mpsc::Sender<PathBuf>) -> notify::Result<impl notify::Watcher> {
    use notify::{EventKind, RecursiveMode, Watcher};

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        if let Ok(ev) = event {
            if matches!(ev.kind, EventKind::Create(_)) {
                for path in ev.paths.into_iter().filter(|p| is_label_photo(p)) {
                    let _ = tx.blocking_send(path);
                }
            }
        }
    })?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
