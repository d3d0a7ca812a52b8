//! Container field downloads

use url::Url;

use crate::FileMakerClient;
use crate::error::Error;
use crate::error::RequestError;
use crate::error::ValidationError;

/// Path prefix of container downloads.
pub const CONTAINER_PATH: &str = "/fmi/xml/cnt/";

/// A downloaded container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// File name without extension (still percent-encoded, as in the URL).
    pub name: String,
    /// File extension.
    pub extension: String,
    /// File content.
    pub data: Vec<u8>,
}

impl FileMakerClient {
    /// Downloads the content of a container field.
    ///
    /// `path` is the value a container field decodes to, e.g.
    /// `/fmi/xml/cnt/photo.jpg?-db=shop&-lay=web&-recid=1&-field=photo(1)`.
    /// Paths that don't follow that layout are rejected.
    pub async fn fetch_container(&self, path: &str) -> Result<Container, Error> {
        let (name, extension) = parse_container_path(path)
            .ok_or_else(|| ValidationError::ContainerUrl(path.to_string()))?;
        let data = self.fetch_container_bytes(path).await?;
        Ok(Container {
            name: name.to_string(),
            extension: extension.to_string(),
            data,
        })
    }

    /// Downloads any server path relative to the endpoint host.
    pub async fn fetch_container_bytes(&self, path: &str) -> Result<Vec<u8>, Error> {
        let url = container_url(self.endpoint(), path)?;
        Ok(self.requester().get(&url).await?)
    }
}

fn container_url(endpoint: &Url, path: &str) -> Result<Url, RequestError> {
    Ok(endpoint.join(path)?)
}

/// Splits `/fmi/xml/cnt/<name>.<ext>?-...` into name and extension.
pub(crate) fn parse_container_path(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix(CONTAINER_PATH)?;
    let (file, query) = rest.split_once('?')?;
    if !query.starts_with('-') {
        return None;
    }
    let (name, extension) = file.rsplit_once('.')?;

    let name_ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | ',' | '%' | '.' | '-'));
    let extension_ok =
        !extension.is_empty() && extension.chars().all(|c| c.is_alphanumeric() || c == '_');
    (name_ok && extension_ok).then_some((name, extension))
}
