//! Groups uploaded page images into logical CVs.
//!
//! Every image carries a group key. Uploads may set it explicitly; otherwise
//! staging derives it from the first [`FILENAME_KEY_LEN`] characters of the
//! uploaded file name, which the upload naming scheme shares across the pages
//! of one document.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const FILENAME_KEY_LEN: usize = 20;

/// One staged image and the logical CV it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePage {
    pub path: PathBuf,
    pub group_key: String,
}

/// Fallback key for uploads without an explicit group.
pub fn filename_group_key(file_name: &str) -> String {
    file_name.chars().take(FILENAME_KEY_LEN).collect()
}

/// Groups in first-seen order, pages in input order within each group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CvGroups {
    groups: Vec<(String, Vec<PathBuf>)>,
}

impl CvGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.groups
            .iter()
            .map(|(key, pages)| (key.as_str(), pages.as_slice()))
    }
}

pub fn group_images(pages: &[ImagePage]) -> CvGroups {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<PathBuf>)> = Vec::new();

    for page in pages {
        match index.get(page.group_key.as_str()) {
            Some(&slot) => groups[slot].1.push(page.path.clone()),
            None => {
                index.insert(page.group_key.as_str(), groups.len());
                groups.push((page.group_key.clone(), vec![page.path.clone()]));
            }
        }
    }

    CvGroups { groups }
}
