//! Aurora - HTML5 template engine
//!
//! Renders a template line by line, replacing `{{ name }}` placeholders with
//! variables and the `{% css() %}` / `{% preload() %}` directives with
//! generated `<link>` markup. Every stylesheet and script tag carries a
//! subresource integrity hash read from a `.sha512` file next to the asset.
//!
//! # Example
//!
//! ```ignore
//! use aurora::{Page, PageSettings, ResourceUsage};
//!
//! let start = ResourceUsage::now()?;
//! let mut page = Page::new(PageSettings {
//!     template_dir: "html".into(),
//!     template: "index.html".into(),
//!     base: "/srv/www".into(),
//!     url: "https://example.com".into(),
//!     ..Default::default()
//! })?;
//! page.set_var("title", "Home");
//! page.add_css("css/site.css", "https://example.com/css/site.css");
//!
//! let mut out = std::io::stdout();
//! page.html_header(&mut out)?;
//! page.html_footer(&mut out)?;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod footer;
pub mod integrity;
pub mod page;
pub mod substitute;

pub use config::{Config, PageConfig};
pub use error::{AuroraError, AuroraResult};
pub use footer::{DEFAULT_VERSION_MARKER, ResourceUsage, comment, project_version, render_time};
pub use integrity::{AssetList, Assets, PreloadList, read_sidecar, sidecar_path, verify_sidecar, write_sidecar};
pub use page::{LINE_BUFFER_SIZE, Page, PageSettings, Status};
pub use substitute::{Directive, Replacement, Substituter};
