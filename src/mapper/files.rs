use super::text::short_description;
use crate::types::{FileSource, RemoteFile, Resource};
use tracing::info;

/// Map a host resource to a data.world file entry.
///
/// The name comes from the declared resource name, else the URL's basename.
/// Extension precedence: declared format, then the extension already on the
/// declared name, then the URL's extension (query and fragment ignored).
pub fn remote_file(res: &Resource) -> RemoteFile {
    let link = res.url.as_deref().unwrap_or_default();
    let name = res.name.as_deref().unwrap_or_default();
    if link.is_empty() || name.is_empty() {
        info!(resource = %res.id, url = link, name, "resource has no url or name");
    }

    let (link_stem, link_ext) = split_ext(basename(strip_query(link)));
    let (file_stem, file_ext) = split_ext(basename(name));

    let ext = match res.format.as_deref().map(str::trim) {
        Some(format) if !format.is_empty() => format!(".{}", format.to_lowercase()),
        _ if !file_ext.is_empty() => file_ext.to_string(),
        _ => link_ext.to_string(),
    };
    let stem = if file_stem.is_empty() { link_stem } else { file_stem };

    RemoteFile {
        name: format!("{stem}{ext}"),
        description: res
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(short_description),
        source: FileSource {
            url: link.to_string(),
        },
    }
}

fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Split `name.ext` into `("name", ".ext")`. Leading dots belong to the stem,
/// so `.hidden` has no extension.
fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if name[..dot].chars().any(|c| c != '.') => name.split_at(dot),
        _ => (name, ""),
    }
}
