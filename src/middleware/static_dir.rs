//! Directory-backed static file serving.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_std::fs;
use http_types::{Body, StatusCode};

use crate::context::{BoxFut, Context, Handle};

/// Serves the files under a directory root.
///
/// Meant to be registered on a `*filepath` route, which is what
/// [`static_dir`] does: the bound remainder of the path is resolved against
/// the root and streamed back with a content type inferred from the file
/// extension.
///
/// [`static_dir`]: crate::Group::static_dir
pub struct StaticDir {
    root: PathBuf,
}

impl StaticDir {
    /// A handler serving the contents of `root`.
    pub fn new(root: impl Into<PathBuf>) -> StaticDir {
        StaticDir { root: root.into() }
    }

    /// Resolve the requested path against the root, refusing anything that
    /// would step outside it.
    fn resolve(&self, rel: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for component in Path::new(rel).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                // `..`, a fresh root or a drive prefix: escape attempts.
                _ => return None,
            }
        }
        Some(path)
    }
}

impl Handle for StaticDir {
    fn call<'a>(&'a self, c: &'a mut Context) -> BoxFut<'a> {
        Box::pin(async move {
            let rel = c.param("filepath").unwrap_or("").to_string();
            let not_found = format!("404 NOT FOUND: {}\n", c.path());

            let path = match self.resolve(&rel) {
                Some(path) => path,
                None => return c.string(StatusCode::NotFound, not_found),
            };

            // A directory is as much a miss as an absent file.
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => return c.string(StatusCode::NotFound, not_found),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    return c.string(StatusCode::NotFound, not_found)
                }
                Err(err) => return Err(err.into()),
            }

            match Body::from_file(&path).await {
                Ok(body) => c.body(StatusCode::Ok, body),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    c.string(StatusCode::NotFound, not_found)
                }
                Err(err) => Err(err.into()),
            }
        })
    }
}
