//! Host dataset -> data.world document mapping.
//!
//! Pure functions only; nothing here touches the network or the store.

pub mod files;
pub mod slug;
pub mod tags;
pub mod text;

pub use files::remote_file;
pub use slug::dataworld_name;
pub use tags::normalize_tags;
pub use text::{short_description, strip_markup, truncate};

use crate::types::{Dataset, RemoteDataset, Visibility};

/// Label used for any license code missing from [`LICENSES`].
pub const OTHER_LICENSE: &str = "Other";

/// Host license code -> data.world license label.
pub const LICENSES: &[(&str, &str)] = &[
    ("cc-by", "CC-BY"),
    ("other-pd", "Public Domain"),
    ("odc-pddl", "PDDL"),
    ("cc-zero", "CC-0"),
    ("odc-by", "ODC-BY"),
    ("cc-by-sa", "CC-BY-SA"),
    ("odc-odbl", "ODC-ODbL"),
    ("cc-nc", "CC BY-NC"),
];

pub fn license_label(code: Option<&str>) -> &'static str {
    code.and_then(|code| LICENSES.iter().find(|(k, _)| *k == code))
        .map(|(_, label)| *label)
        .unwrap_or(OTHER_LICENSE)
}

/// Build the document PUT to data.world for `dataset`.
pub fn format_dataset(dataset: &Dataset) -> RemoteDataset {
    let notes = dataset.notes.as_deref().unwrap_or_default();
    RemoteDataset {
        title: dataset.display_title().to_string(),
        description: short_description(&strip_markup(notes)),
        summary: notes.to_string(),
        tags: normalize_tags(&dataset.tags),
        license: license_label(dataset.license_id.as_deref()).to_string(),
        visibility: if dataset.private {
            Visibility::Private
        } else {
            Visibility::Open
        },
        files: dataset.resources.iter().map(remote_file).collect(),
    }
}
