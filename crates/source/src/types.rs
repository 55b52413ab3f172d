use serde::Deserialize;

/// One transferable package from the source catalog.
///
/// `name` is unique within a catalog snapshot and doubles as the
/// destination object key. `id` is the source-side identifier and stays
/// opaque to the pipeline (the wire carries it as a JSON integer).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Package {
    pub id: i64,
    pub name: String,
}

/// Bearer token returned by the authentication endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub expires: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PackageList {
    #[serde(default)]
    pub packages: Vec<Package>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DownloadLocation {
    pub uri: String,
}
