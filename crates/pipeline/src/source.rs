//! Capability interface to the source catalog service.

use std::path::Path;

use pkgmirror_source::{Client, Package};

/// Read surface of the source catalog, as the pipeline consumes it.
///
/// Implemented by [`pkgmirror_source::Client`] for the real service; tests
/// substitute scripted mocks.
#[async_trait::async_trait]
pub trait PackageSource: Send + Sync {
    /// Obtains and caches credentials for the run. Failure is run-fatal.
    async fn authenticate(&self) -> Result<(), pkgmirror_source::Error>;

    /// Returns the catalog snapshot, in service order. Failure is run-fatal.
    async fn list_packages(&self) -> Result<Vec<Package>, pkgmirror_source::Error>;

    /// Resolves a time-limited download location for `package`. Failure is
    /// local to the package.
    async fn resolve_download(&self, package: &Package)
    -> Result<String, pkgmirror_source::Error>;

    /// Streams `location` into `dest`, returning bytes written. Failure is
    /// local to the package.
    async fn download(&self, location: &str, dest: &Path)
    -> Result<u64, pkgmirror_source::Error>;
}

#[async_trait::async_trait]
impl PackageSource for Client {
    async fn authenticate(&self) -> Result<(), pkgmirror_source::Error> {
        Client::authenticate(self).await.map(|_| ())
    }

    async fn list_packages(&self) -> Result<Vec<Package>, pkgmirror_source::Error> {
        Client::list_packages(self).await
    }

    async fn resolve_download(
        &self,
        package: &Package,
    ) -> Result<String, pkgmirror_source::Error> {
        // The service resolves downloads by package name; `id` stays opaque.
        Client::resolve_download(self, &package.name).await
    }

    async fn download(
        &self,
        location: &str,
        dest: &Path,
    ) -> Result<u64, pkgmirror_source::Error> {
        Client::download(self, location, dest).await
    }
}
