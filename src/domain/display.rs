use crate::domain::ImageRecord;
use humansize::{DECIMAL, format_size};

/// Collection title shown for the current session: the lone archive name when
/// exactly one distinct name is present, a count otherwise.
pub fn collection_title(images: &[ImageRecord]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for image in images {
        if let Some(name) = image.archive_name.as_deref() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    match names.len() {
        0 => "Archive".to_string(),
        1 => names[0].to_string(),
        count => format!("{count} Archives"),
    }
}

pub fn library_usage_summary(total_bytes: u64, capacity_gb: f64, starred_count: usize) -> String {
    let used = format_size(total_bytes, DECIMAL);
    format!("{used} of {capacity_gb} GB used, {starred_count} starred")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn stamped_image(archive_name: &str) -> ImageRecord {
        let mut image = ImageRecord::new("p.png", "p.png", Arc::from(vec![0u8]), 10, 10);
        image.stamp_provenance(archive_name, "id");
        image
    }

    #[test]
    fn empty_collection_uses_fallback_title() {
        assert_eq!(collection_title(&[]), "Archive");
    }

    #[test]
    fn unstamped_images_use_fallback_title() {
        let image = ImageRecord::new("p.png", "p.png", Arc::from(vec![0u8]), 10, 10);
        assert_eq!(collection_title(&[image]), "Archive");
    }

    #[test]
    fn single_archive_uses_its_name() {
        let images = vec![stamped_image("Book One.zip"), stamped_image("Book One.zip")];
        assert_eq!(collection_title(&images), "Book One.zip");
    }

    #[test]
    fn multiple_archives_use_a_count() {
        let images = vec![
            stamped_image("Book One.zip"),
            stamped_image("Book Two.zip"),
            stamped_image("Book One.zip"),
            stamped_image("Book Three.zip"),
        ];
        assert_eq!(collection_title(&images), "3 Archives");
    }

    #[test]
    fn usage_summary_formats_bytes_and_count() {
        let summary = library_usage_summary(1_500_000, 10.0, 2);
        assert!(summary.starts_with("1.5"));
        assert!(summary.contains("MB"));
        assert!(summary.ends_with("of 10 GB used, 2 starred"));
    }
}
