//! Page rendering
//!
//! A [`Page`] ties a template to its variables and asset registry, streams
//! the substituted template as the document head and closes the document
//! with the script tags.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{AuroraError, AuroraResult};
use crate::integrity::{AssetList, Assets, PreloadList};
use crate::substitute::{Replacement, Substituter};

/// Size of the template line buffer; longer lines are split
pub const LINE_BUFFER_SIZE: usize = 4096;

const HTML_CONTENT_TYPE: &str = "Content-Type: text/html; charset=UTF-8\r\n\r\n";

/// Development pages log verbosely, production pages quietly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Development,
    #[default]
    Production,
}

impl Status {
    /// Log level used when none is given explicitly
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Self::Development => "DEBUG",
            Self::Production => "WARN",
        }
    }
}

/// What a page is built from
#[derive(Debug, Clone, Default)]
pub struct PageSettings {
    /// Directory templates are looked up in
    pub template_dir: PathBuf,
    /// Template file name, relative to `template_dir`
    pub template: String,
    /// Project base directory; relative asset paths resolve against it
    pub base: PathBuf,
    /// Project base URL
    pub url: String,
    pub status: Status,
    /// Emit a CGI-style content type header before the document
    pub html: bool,
}

/// A renderable page
#[derive(Debug, Clone)]
pub struct Page {
    settings: PageSettings,
    assets: Assets,
    vars: IndexMap<String, String>,
    replaced: Vec<Replacement>,
}

impl Page {
    /// Validate the settings and create an empty page
    pub fn new(settings: PageSettings) -> AuroraResult<Self> {
        if settings.template.is_empty() {
            return Err(AuroraError::MissingParameter("template"));
        }
        if settings.base.as_os_str().is_empty() {
            return Err(AuroraError::MissingParameter("base"));
        }
        if settings.url.is_empty() {
            return Err(AuroraError::MissingParameter("url"));
        }

        let template_path = settings.template_dir.join(&settings.template);
        if !template_path.is_file() {
            return Err(AuroraError::TemplateNotFound { path: template_path });
        }
        if !settings.base.is_dir() {
            return Err(AuroraError::InvalidDirectory {
                path: settings.base.clone(),
            });
        }

        info!(template = %template_path.display(), status = ?settings.status, "page created");
        Ok(Self {
            assets: Assets::new(&settings.base),
            settings,
            vars: IndexMap::new(),
            replaced: Vec::new(),
        })
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    pub fn base(&self) -> &Path {
        &self.settings.base
    }

    pub fn url(&self) -> &str {
        &self.settings.url
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn template_path(&self) -> PathBuf {
        self.settings.template_dir.join(&self.settings.template)
    }

    /// Set a template variable; an existing name keeps its position
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn vars(&self) -> &IndexMap<String, String> {
        &self.vars
    }

    pub fn set_api(&mut self, hosts: Vec<String>) {
        self.assets.api = hosts;
    }

    pub fn add_api(&mut self, host: impl Into<String>) {
        self.assets.api.push(host.into());
    }

    pub fn set_css(&mut self, css: AssetList) {
        self.assets.css = css;
    }

    pub fn add_css(&mut self, path: impl Into<PathBuf>, url: impl Into<String>) {
        self.assets.css.insert(path.into(), url.into());
    }

    pub fn set_js(&mut self, js: AssetList) {
        self.assets.js = js;
    }

    pub fn add_js(&mut self, path: impl Into<PathBuf>, url: impl Into<String>) {
        self.assets.js.insert(path.into(), url.into());
    }

    pub fn set_preload(&mut self, preload: PreloadList) {
        self.assets.preload = preload;
    }

    pub fn add_preload(&mut self, fragment: impl Into<String>, kind: impl Into<String>) {
        self.assets.preload.insert(fragment.into(), kind.into());
    }

    /// Substitutions made so far, in order
    pub fn replaced(&self) -> &[Replacement] {
        &self.replaced
    }

    /// Stream the substituted template to `out`.
    ///
    /// Rendering stops at the first integrity failure; lines already
    /// written stay written.
    pub fn html_header<W: Write>(&mut self, out: &mut W) -> AuroraResult<()> {
        if self.vars.is_empty() {
            return Err(AuroraError::NothingToRender);
        }
        if self.settings.html {
            out.write_all(HTML_CONTENT_TYPE.as_bytes())?;
        }

        let path = self.template_path();
        let file = fs::File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AuroraError::TemplateNotFound { path: path.clone() },
            _ => AuroraError::Io(e),
        })?;
        let mut reader = BufReader::new(file);
        let substituter = Substituter::new(&self.vars)?;

        let mut line = Vec::with_capacity(LINE_BUFFER_SIZE);
        let mut count = 0usize;
        loop {
            line.clear();
            if read_line_capped(&mut reader, &mut line, LINE_BUFFER_SIZE - 1)? == 0 {
                break;
            }
            count += 1;
            let replaced = substituter.replace_line(&line, &self.assets, &mut self.replaced)?;
            out.write_all(&replaced)?;
        }

        debug!(lines = count, replaced = self.replaced.len(), "html_header: template rendered");
        Ok(())
    }

    /// Write the script tags and close the document
    pub fn html_footer<W: Write>(&self, out: &mut W) -> AuroraResult<()> {
        if !self.assets.js.is_empty() {
            out.write_all(self.assets.scripts_markup()?.as_bytes())?;
        }
        out.write_all(b"\n</body>\n</html>")?;
        Ok(())
    }

    /// HTML listing of every substitution made
    pub fn variables_report(&self) -> String {
        let mut out = String::from("\nVariables Replaced:<br/>\n");
        for entry in &self.replaced {
            match entry {
                Replacement::Directive(directive) => {
                    let _ = writeln!(out, "&#x2714; {}: array(data)<br/>", directive);
                }
                Replacement::Variable(name) => match self.vars.get(name) {
                    Some(value) => {
                        let _ = writeln!(out, "&#x2714; {}: {}<br/>", name, value);
                    }
                    None => {
                        let _ = writeln!(out, "&#x2715; {}: success case but no variable?!<br/>", name);
                    }
                },
            }
        }
        out
    }
}

/// Read one line of at most `max` bytes, keeping the line terminator.
///
/// Returns the number of bytes read, zero at end of input.
fn read_line_capped<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> io::Result<usize> {
    while buf.len() < max {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            break;
        }
        let room = (max - buf.len()).min(available.len());
        match available[..room].iter().position(|&b| b == b'\n') {
            Some(i) => {
                buf.extend_from_slice(&available[..=i]);
                reader.consume(i + 1);
                break;
            }
            None => {
                buf.extend_from_slice(&available[..room]);
                reader.consume(room);
            }
        }
    }
    Ok(buf.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn page(temp: &TempDir, template: &str) -> Page {
        let templates = temp.path().join("html");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("index.html"), template).unwrap();
        Page::new(PageSettings {
            template_dir: templates,
            template: "index.html".to_string(),
            base: temp.path().to_path_buf(),
            url: "https://example.com".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn render(page: &mut Page) -> String {
        let mut out = Vec::new();
        page.html_header(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_read_line_capped_splits_long_lines() {
        let data = format!("{}\nshort\n", "x".repeat(10));
        let mut reader = BufReader::with_capacity(3, data.as_bytes());
        let mut buf = Vec::new();

        assert_eq!(read_line_capped(&mut reader, &mut buf, 4).unwrap(), 4);
        assert_eq!(buf, b"xxxx");
        buf.clear();
        read_line_capped(&mut reader, &mut buf, 4).unwrap();
        assert_eq!(buf, b"xxxx");
        buf.clear();
        read_line_capped(&mut reader, &mut buf, 4).unwrap();
        assert_eq!(buf, b"xx\n");
        buf.clear();
        read_line_capped(&mut reader, &mut buf, 4).unwrap();
        assert_eq!(buf, b"shor");
        buf.clear();
        read_line_capped(&mut reader, &mut buf, 4).unwrap();
        assert_eq!(buf, b"t\n");
        buf.clear();
        assert_eq!(read_line_capped(&mut reader, &mut buf, 4).unwrap(), 0);
    }

    #[test]
    fn test_new_rejects_missing_template() {
        let temp = TempDir::new().unwrap();
        let err = Page::new(PageSettings {
            template_dir: temp.path().to_path_buf(),
            template: "nope.html".to_string(),
            base: temp.path().to_path_buf(),
            url: "https://example.com".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AuroraError::TemplateNotFound { .. }));
    }

    #[test]
    fn test_new_rejects_bad_base() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("index.html"), "").unwrap();
        let err = Page::new(PageSettings {
            template_dir: temp.path().to_path_buf(),
            template: "index.html".to_string(),
            base: temp.path().join("missing"),
            url: "https://example.com".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AuroraError::InvalidDirectory { .. }));
    }

    #[test]
    fn test_new_rejects_empty_parameters() {
        let err = Page::new(PageSettings::default()).unwrap_err();
        assert!(matches!(err, AuroraError::MissingParameter("template")));
    }

    #[test]
    fn test_render_placeholder() {
        let temp = TempDir::new().unwrap();
        let mut page = page(&temp, "<p>{{name}}</p>\n");
        page.set_var("name", "X");

        assert_eq!(render(&mut page), "<p>X</p>\n");
        assert_eq!(page.replaced(), &[Replacement::Variable("name".to_string())]);
    }

    #[test]
    fn test_render_requires_variables() {
        let temp = TempDir::new().unwrap();
        let mut page = page(&temp, "<p></p>\n");
        let err = page.html_header(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, AuroraError::NothingToRender));
    }

    #[test]
    fn test_render_html_mode_header() {
        let temp = TempDir::new().unwrap();
        let templates = temp.path().join("html");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("index.html"), "<html>\n").unwrap();
        let mut page = Page::new(PageSettings {
            template_dir: templates,
            template: "index.html".to_string(),
            base: temp.path().to_path_buf(),
            url: "https://example.com".to_string(),
            html: true,
            ..Default::default()
        })
        .unwrap();
        page.set_var("unused", "");

        assert_eq!(render(&mut page), "Content-Type: text/html; charset=UTF-8\r\n\r\n<html>\n");
    }

    #[test]
    fn test_set_var_keeps_position() {
        let temp = TempDir::new().unwrap();
        let mut page = page(&temp, "");
        page.set_var("a", "1");
        page.set_var("b", "2");
        page.set_var("a", "3");

        let names: Vec<&str> = page.vars().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(page.var("a"), Some("3"));
        assert_eq!(page.var("c"), None);
    }

    #[test]
    fn test_footer_without_scripts() {
        let temp = TempDir::new().unwrap();
        let page = page(&temp, "");
        let mut out = Vec::new();
        page.html_footer(&mut out).unwrap();
        assert_eq!(out, b"\n</body>\n</html>");
    }

    #[test]
    fn test_footer_with_scripts() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("app.js"), "void 0").unwrap();
        fs::write(temp.path().join("app.js.sha512"), "JS==\n").unwrap();
        let mut page = page(&temp, "");
        page.add_js("app.js", "/js/app.js");

        let mut out = Vec::new();
        page.html_footer(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\n\t<script src=\"/js/app.js\" defer=\"defer\"\n\
             \t\tintegrity=\"sha512-JS==\"\n\t\tcrossorigin=\"anonymous\"></script>\n\
             \n</body>\n</html>"
        );
    }

    #[test]
    fn test_variables_report() {
        let temp = TempDir::new().unwrap();
        let mut page = page(&temp, "<title>{{title}}</title>\n{% css() %}\n");
        page.set_var("title", "Home");
        render(&mut page);

        assert_eq!(
            page.variables_report(),
            "\nVariables Replaced:<br/>\n&#x2714; title: Home<br/>\n&#x2714; css: array(data)<br/>\n"
        );
    }

    #[test]
    fn test_variables_report_flags_removed_variable() {
        let mut page = Page {
            settings: PageSettings::default(),
            assets: Assets::default(),
            vars: IndexMap::new(),
            replaced: vec![Replacement::Variable("gone".to_string())],
        };
        page.set_var("other", "1");

        assert!(
            page.variables_report()
                .contains("&#x2715; gone: success case but no variable?!<br/>\n")
        );
    }
}
