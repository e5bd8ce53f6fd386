//! Subresource integrity tags
//!
//! Every stylesheet and script served by a page carries a precomputed SHA-512
//! digest stored next to it in a sidecar file (`site.css` → `site.css.sha512`).
//! The markup generated here embeds that digest verbatim as an `integrity`
//! attribute. A missing asset or sidecar aborts generation so that nothing is
//! ever emitted without its hash.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use indexmap::IndexMap;
use sha2::{Digest, Sha512};
use tracing::{debug, warn};

use crate::error::{AuroraError, AuroraResult};

/// Extension appended to an asset path to locate its digest
pub const SIDECAR_EXTENSION: &str = "sha512";

/// Local asset path → public URL, in registration order
pub type AssetList = IndexMap<PathBuf, String>;

/// URL fragment → resource type (`script`, `style`, `font`, ...)
pub type PreloadList = IndexMap<String, String>;

/// Path of the sidecar digest file for `asset`
pub fn sidecar_path(asset: &Path) -> PathBuf {
    let mut name = asset.as_os_str().to_owned();
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    PathBuf::from(name)
}

/// Read the trimmed digest stored next to `asset`
pub fn read_sidecar(asset: &Path) -> AuroraResult<String> {
    if !asset.exists() {
        return Err(AuroraError::AssetMissing {
            path: asset.to_path_buf(),
        });
    }
    let sidecar = sidecar_path(asset);
    if !sidecar.exists() {
        return Err(AuroraError::SidecarMissing { path: sidecar });
    }
    let digest = fs::read_to_string(&sidecar)?;
    Ok(digest.trim().to_string())
}

/// Base64 SHA-512 digest of `data`, the encoding browsers check against
pub fn compute_digest(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    STANDARD.encode(hasher.finalize())
}

/// Hash `asset` and write its sidecar, returning the digest
pub fn write_sidecar(asset: &Path) -> AuroraResult<String> {
    if !asset.exists() {
        return Err(AuroraError::AssetMissing {
            path: asset.to_path_buf(),
        });
    }
    let digest = compute_digest(&fs::read(asset)?);
    let sidecar = sidecar_path(asset);
    fs::write(&sidecar, format!("{}\n", digest))?;
    debug!(asset = %asset.display(), sidecar = %sidecar.display(), "wrote integrity sidecar");
    Ok(digest)
}

/// Check that the stored digest still matches the asset content
pub fn verify_sidecar(asset: &Path) -> AuroraResult<()> {
    let expected = read_sidecar(asset)?;
    let actual = compute_digest(&fs::read(asset)?);
    if expected != actual {
        return Err(AuroraError::IntegrityMismatch {
            path: asset.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// The asset registry of a page
#[derive(Debug, Clone, Default)]
pub struct Assets {
    /// Directory relative asset paths are resolved against
    pub root: PathBuf,
    /// API hosts; the first one prefixes every preload href
    pub api: Vec<String>,
    pub css: AssetList,
    pub js: AssetList,
    pub preload: PreloadList,
}

impl Assets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    fn locate(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Digest for a registered asset, `None` if its sidecar is empty
    fn digest(&self, path: &Path) -> AuroraResult<Option<String>> {
        let digest = read_sidecar(&self.locate(path))?;
        if digest.is_empty() {
            warn!(path = %path.display(), "empty integrity file, leaving asset out");
            return Ok(None);
        }
        Ok(Some(digest))
    }

    /// `<link rel="stylesheet">` tags for every stylesheet
    pub fn styles_markup(&self) -> AuroraResult<String> {
        let mut out = String::new();
        if self.css.is_empty() {
            return Ok(out);
        }
        out.push('\n');
        for (path, url) in &self.css {
            if let Some(digest) = self.digest(path)? {
                let _ = writeln!(out, "\t<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"", url);
                let _ = writeln!(
                    out,
                    "\t\tintegrity=\"sha512-{}\"\n\t\tcrossorigin=\"anonymous\" />",
                    digest
                );
            }
        }
        debug!(count = self.css.len(), "generated stylesheet markup");
        Ok(out)
    }

    /// Deferred `<script>` tags for every script
    pub fn scripts_markup(&self) -> AuroraResult<String> {
        let mut out = String::new();
        if self.js.is_empty() {
            return Ok(out);
        }
        out.push('\n');
        for (path, url) in &self.js {
            if let Some(digest) = self.digest(path)? {
                let _ = writeln!(out, "\t<script src=\"{}\" defer=\"defer\"", url);
                let _ = writeln!(
                    out,
                    "\t\tintegrity=\"sha512-{}\"\n\t\tcrossorigin=\"anonymous\"></script>",
                    digest
                );
            }
        }
        debug!(count = self.js.len(), "generated script markup");
        Ok(out)
    }

    /// Find the local path of the asset whose URL contains `fragment`.
    ///
    /// Matching is a case-insensitive substring test over stylesheets and
    /// then scripts; the last hit wins.
    pub fn resolve_preload(&self, fragment: &str) -> Option<&Path> {
        let needle = fragment.to_lowercase();
        self.css
            .iter()
            .chain(self.js.iter())
            .filter(|(_, url)| url.to_lowercase().contains(&needle))
            .map(|(path, _)| path.as_path())
            .last()
    }

    fn preload_href(&self, fragment: &str) -> String {
        match self.api.first() {
            Some(host) => format!("//{}{}", host, fragment.trim()),
            None => fragment.trim().to_string(),
        }
    }

    /// DNS prefetch, preconnect and preload `<link>` tags
    pub fn preload_markup(&self) -> AuroraResult<String> {
        let mut out = String::new();
        if self.preload.is_empty() {
            return Ok(out);
        }
        out.push('\n');
        if !self.api.is_empty() {
            for host in &self.api {
                let _ = writeln!(out, "\t<link rel=\"dns-prefetch\" href=\"//{}\" />", host);
                let _ = writeln!(out, "\t<link rel=\"preconnect\" href=\"//{}\" crossorigin />", host);
            }
            out.push('\n');
        }
        for (fragment, kind) in &self.preload {
            let kind = kind.trim().to_lowercase();
            let href = self.preload_href(fragment);
            if kind == "script" || kind == "style" {
                let path = self
                    .resolve_preload(fragment)
                    .ok_or_else(|| AuroraError::UnresolvedPreload {
                        fragment: fragment.clone(),
                    })?;
                if let Some(digest) = self.digest(path)? {
                    let _ = writeln!(
                        out,
                        "\t<link rel=\"preload\" href=\"{}\" as=\"{}\"\n\t\tintegrity=\"sha512-{}\"\n\t\tcrossorigin=\"anonymous\" />",
                        href, kind, digest
                    );
                }
            } else {
                let _ = writeln!(out, "\t<link rel=\"preload\" href=\"{}\" as=\"{}\" crossorigin />", href, kind);
            }
        }
        debug!(hosts = self.api.len(), count = self.preload.len(), "generated preload markup");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn asset(dir: &TempDir, name: &str, digest: Option<&str>) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, "body { margin: 0 }").unwrap();
        if let Some(digest) = digest {
            fs::write(sidecar_path(&path), digest).unwrap();
        }
        path
    }

    #[test]
    fn test_sidecar_path_appends_extension() {
        assert_eq!(
            sidecar_path(Path::new("/srv/www/css/site.min.css")),
            PathBuf::from("/srv/www/css/site.min.css.sha512")
        );
    }

    #[test]
    fn test_read_sidecar_trims_digest() {
        let temp = TempDir::new().unwrap();
        let path = asset(&temp, "site.css", Some("  abc123==\n\n"));

        assert_eq!(read_sidecar(&path).unwrap(), "abc123==");
    }

    #[test]
    fn test_read_sidecar_missing_asset() {
        let temp = TempDir::new().unwrap();
        let err = read_sidecar(&temp.path().join("nope.css")).unwrap_err();
        assert!(matches!(err, AuroraError::AssetMissing { .. }));
    }

    #[test]
    fn test_read_sidecar_missing_sidecar() {
        let temp = TempDir::new().unwrap();
        let path = asset(&temp, "site.css", None);
        let err = read_sidecar(&path).unwrap_err();
        assert!(matches!(err, AuroraError::SidecarMissing { .. }));
    }

    #[test]
    fn test_write_then_verify_sidecar() {
        let temp = TempDir::new().unwrap();
        let path = asset(&temp, "site.css", None);

        let digest = write_sidecar(&path).unwrap();
        assert_eq!(digest.len(), 88);
        assert_eq!(read_sidecar(&path).unwrap(), digest);
        verify_sidecar(&path).unwrap();

        fs::write(&path, "body { margin: 1px }").unwrap();
        let err = verify_sidecar(&path).unwrap_err();
        assert!(matches!(err, AuroraError::IntegrityMismatch { .. }));
    }

    #[test]
    fn test_compute_digest_known_value() {
        // sha512("") in base64
        assert_eq!(
            compute_digest(b""),
            "z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8XYXysP+DGNKHfuwvY7kxvUdBeoGlODJ6+SfaPg=="
        );
    }

    #[test]
    fn test_styles_markup() {
        let temp = TempDir::new().unwrap();
        asset(&temp, "site.css", Some("AAAA\n"));
        let mut assets = Assets::new(temp.path());
        assets
            .css
            .insert(PathBuf::from("site.css"), "https://cdn.example.com/css/site.css".to_string());

        let markup = assets.styles_markup().unwrap();
        assert_eq!(
            markup,
            "\n\t<link rel=\"stylesheet\" type=\"text/css\" href=\"https://cdn.example.com/css/site.css\"\n\
             \t\tintegrity=\"sha512-AAAA\"\n\t\tcrossorigin=\"anonymous\" />\n"
        );
    }

    #[test]
    fn test_styles_markup_empty_list() {
        let assets = Assets::new("/nonexistent");
        assert_eq!(assets.styles_markup().unwrap(), "");
        assert_eq!(assets.scripts_markup().unwrap(), "");
        assert_eq!(assets.preload_markup().unwrap(), "");
    }

    #[test]
    fn test_scripts_markup_fails_without_sidecar() {
        let temp = TempDir::new().unwrap();
        asset(&temp, "app.js", None);
        let mut assets = Assets::new(temp.path());
        assets.js.insert(PathBuf::from("app.js"), "/js/app.js".to_string());

        let err = assets.scripts_markup().unwrap_err();
        assert!(matches!(err, AuroraError::SidecarMissing { .. }));
    }

    #[test]
    fn test_scripts_markup_skips_empty_digest() {
        let temp = TempDir::new().unwrap();
        asset(&temp, "app.js", Some("   \n"));
        let mut assets = Assets::new(temp.path());
        assets.js.insert(PathBuf::from("app.js"), "/js/app.js".to_string());

        assert_eq!(assets.scripts_markup().unwrap(), "\n");
    }

    #[test]
    fn test_resolve_preload_last_match_wins() {
        let mut assets = Assets::new("/srv");
        assets.css.insert(PathBuf::from("css/app.css"), "/static/APP.css".to_string());
        assets.js.insert(PathBuf::from("js/app.js"), "/static/app.js".to_string());
        assets.js.insert(PathBuf::from("js/vendor.js"), "/static/vendor.js".to_string());

        assert_eq!(assets.resolve_preload("/static/app.css"), Some(Path::new("css/app.css")));
        assert_eq!(assets.resolve_preload("/static/app"), Some(Path::new("js/app.js")));
        assert_eq!(assets.resolve_preload("/static/"), Some(Path::new("js/vendor.js")));
        assert_eq!(assets.resolve_preload("/fonts/"), None);
    }

    #[test]
    fn test_preload_markup() {
        let temp = TempDir::new().unwrap();
        asset(&temp, "app.js", Some("JSHASH"));
        let mut assets = Assets::new(temp.path());
        assets.api.push("api.example.com".to_string());
        assets.js.insert(PathBuf::from("app.js"), "https://api.example.com/js/app.js".to_string());
        assets.preload.insert("/js/app.js".to_string(), " Script ".to_string());
        assets.preload.insert("/fonts/a.woff2".to_string(), "font".to_string());

        let markup = assets.preload_markup().unwrap();
        assert_eq!(
            markup,
            "\n\
             \t<link rel=\"dns-prefetch\" href=\"//api.example.com\" />\n\
             \t<link rel=\"preconnect\" href=\"//api.example.com\" crossorigin />\n\
             \n\
             \t<link rel=\"preload\" href=\"//api.example.com/js/app.js\" as=\"script\"\n\
             \t\tintegrity=\"sha512-JSHASH\"\n\t\tcrossorigin=\"anonymous\" />\n\
             \t<link rel=\"preload\" href=\"//api.example.com/fonts/a.woff2\" as=\"font\" crossorigin />\n"
        );
    }

    #[test]
    fn test_preload_markup_without_api_host() {
        let mut assets = Assets::new("/srv");
        assets.preload.insert("/img/hero.webp".to_string(), "image".to_string());

        assert_eq!(
            assets.preload_markup().unwrap(),
            "\n\t<link rel=\"preload\" href=\"/img/hero.webp\" as=\"image\" crossorigin />\n"
        );
    }

    #[test]
    fn test_preload_markup_unresolved() {
        let mut assets = Assets::new("/srv");
        assets.preload.insert("/js/missing.js".to_string(), "script".to_string());

        let err = assets.preload_markup().unwrap_err();
        assert!(matches!(err, AuroraError::UnresolvedPreload { .. }));
    }
}
