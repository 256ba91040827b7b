use std::path::PathBuf;

use rfd::AsyncFileDialog;

pub const JSON_FILTER: (&str, &[&str]) = ("JSON Files", &["json"]);

pub async fn pick_file(filters: &[(&str, &[&str])]) -> Option<PathBuf> {
    let mut dialog = AsyncFileDialog::new();
    for &(name, extensions) in filters {
        dialog = dialog.add_filter(name, extensions);
    }
    dialog
        .pick_file()
        .await
        .map(|file| file.path().to_path_buf())
}

/// Asks for a destination file, appending `default_extension` when the user
/// typed a bare name.
pub async fn pick_save_file(
    filters: &[(&str, &[&str])],
    default_extension: &str,
) -> Option<PathBuf> {
    let mut dialog = AsyncFileDialog::new();
    for &(name, extensions) in filters {
        dialog = dialog.add_filter(name, extensions);
    }
    let path = dialog
        .save_file()
        .await
        .map(|file| with_default_extension(file.path().to_path_buf(), default_extension));
    log::debug!("Picked file for saving: {:?}", path);
    path
}

pub fn with_default_extension(path: PathBuf, extension: &str) -> PathBuf {
    if path.extension().is_none() {
        path.with_extension(extension)
    } else {
        path
    }
}
