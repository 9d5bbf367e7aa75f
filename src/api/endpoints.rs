use crate::error::SyncError;
use url::Url;

/// data.world REST endpoints used by the sync, relative to the API root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `/datasets/{owner}/{id}`: GET, PUT, DELETE
    Dataset { owner: &'a str, id: &'a str },
    /// `/datasets/{owner}/{name}/files`: POST
    Files { owner: &'a str, name: &'a str },
    /// `/datasets/{owner}/{name}/files/{file}`: DELETE
    File {
        owner: &'a str,
        name: &'a str,
        file: &'a str,
    },
    /// `/datasets/{owner}/{name}/sync`: GET
    Sync { owner: &'a str, name: &'a str },
}

impl Endpoint<'_> {
    fn segments(&self) -> Vec<&str> {
        match *self {
            Endpoint::Dataset { owner, id } => vec!["datasets", owner, id],
            Endpoint::Files { owner, name } => vec!["datasets", owner, name, "files"],
            Endpoint::File { owner, name, file } => {
                vec!["datasets", owner, name, "files", file]
            }
            Endpoint::Sync { owner, name } => vec!["datasets", owner, name, "sync"],
        }
    }

    /// Absolute URL under `root`; each segment is percent-encoded.
    pub fn url(&self, root: &Url) -> Result<Url, SyncError> {
        let mut url = root.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::UrlParse(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(self.segments());
        Ok(url)
    }
}

/// Browsable data.world page for an owner, or one of its datasets.
pub fn generate_link(web_root: &Url, owner: &str, dataset: Option<&str>) -> String {
    let mut parts = vec![web_root.as_str().trim_end_matches('/'), owner];
    if let Some(dataset) = dataset.filter(|d| !d.is_empty()) {
        parts.push(dataset);
    }
    parts.join("/")
}
