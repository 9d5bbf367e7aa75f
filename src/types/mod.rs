//! Shared data shapes.
//!
//! - `dataset.rs`: the host catalog's dataset document, as returned by `package_show`
//! - `remote.rs`: the data.world dataset/file documents this crate writes

pub mod dataset;
pub mod remote;

pub use dataset::{Dataset, DatasetState, Resource, Tag};
pub use remote::{FileSource, RemoteDataset, RemoteFile, Visibility};
