//! Registry of font faces available to the renderer

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::face::{FontInfo, LoadedFont};
use crate::error::{Error, Result};

/// Arguments of the unresolved-font notification
///
/// Handlers may set `font_file_data` to supply a face for the requested name.
/// If nobody does, the renderer draws with `actual_font` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryNotFoundFontArgs {
    pub requested_font: String,
    pub actual_font: String,
    pub font_file_data: Option<Vec<u8>>,
}

/// Callback invoked when a requested font is not registered
pub type QueryNotFoundFontHandler = Box<dyn Fn(&mut QueryNotFoundFontArgs) + Send + Sync>;

/// Registered faces plus the names resolved through substitution
#[derive(Default)]
pub struct FontRepository {
    faces: Vec<Arc<LoadedFont>>,
    /// Requested name (lowercase) to face index, filled by substitution
    substitutes: Vec<(String, usize)>,
    handlers: Vec<QueryNotFoundFontHandler>,
}

impl std::fmt::Debug for FontRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRepository")
            .field("fonts", &self.fonts())
            .field("substitutes", &self.substitutes)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl FontRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every face in a font file
    pub fn add_font(&mut self, path: &Path) -> Result<Vec<FontInfo>> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path)?;
        self.add_font_data(data, Some(path))
    }

    /// Register every face in an in-memory font file
    pub fn add_font_data(&mut self, data: Vec<u8>, source: Option<&Path>) -> Result<Vec<FontInfo>> {
        let faces = LoadedFont::load_all(data, source)?;
        let infos: Vec<FontInfo> = faces.iter().map(|f| f.info().clone()).collect();

        for face in faces {
            debug!(
                "Registered face '{}' (bold={}, italic={})",
                face.info().name,
                face.info().bold,
                face.info().italic
            );
            self.faces.push(Arc::new(face));
        }

        Ok(infos)
    }

    /// Registered faces in registration order
    pub fn fonts(&self) -> Vec<FontInfo> {
        self.faces.iter().map(|f| f.info().clone()).collect()
    }

    /// Install a handler for unresolved-font notifications
    pub fn on_query_not_found_font<F>(&mut self, handler: F)
    where
        F: Fn(&mut QueryNotFoundFontArgs) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Find a registered face by name, preferring the requested style
    pub fn find(&self, family: &str, bold: bool, italic: bool) -> Option<Arc<LoadedFont>> {
        let candidates: Vec<&Arc<LoadedFont>> =
            self.faces.iter().filter(|f| f.info().matches(family)).collect();

        let found = candidates
            .iter()
            .find(|f| f.info().bold == bold && f.info().italic == italic)
            .or_else(|| candidates.iter().find(|f| !f.info().bold && !f.info().italic))
            .or_else(|| candidates.first())
            .map(|f| Arc::clone(f));

        found.or_else(|| {
            let key = family.trim().to_lowercase();
            self.substitutes
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, index)| Arc::clone(&self.faces[*index]))
        })
    }

    /// Find a face, raising the unresolved-font notification when none matches
    pub fn resolve(&mut self, family: &str, bold: bool, italic: bool) -> Result<Arc<LoadedFont>> {
        match self.find(family, bold, italic) {
            Some(face) => Ok(face),
            None => self.query_not_found_font(family),
        }
    }

    /// Raise the unresolved-font notification for `requested`
    ///
    /// Data supplied by a handler is registered and remembered as the face for
    /// `requested`; otherwise the first registered face stands in for it.
    pub fn query_not_found_font(&mut self, requested: &str) -> Result<Arc<LoadedFont>> {
        let actual = self.faces.first().map(Arc::clone);
        let mut args = QueryNotFoundFontArgs {
            requested_font: requested.to_string(),
            actual_font: actual
                .as_ref()
                .map(|f| f.info().name.clone())
                .unwrap_or_default(),
            font_file_data: None,
        };

        for handler in &self.handlers {
            handler(&mut args);
        }

        let index = match args.font_file_data {
            Some(data) => self.index_for_data(data, requested)?,
            None => match actual {
                Some(_) => 0,
                None => {
                    return Err(Error::Font(format!(
                        "font '{}' not found and no registered font can stand in for it",
                        requested
                    )))
                }
            },
        };

        self.substitutes.push((requested.trim().to_lowercase(), index));
        Ok(Arc::clone(&self.faces[index]))
    }

    /// Index of the face for supplied bytes, reusing an identical registered face
    fn index_for_data(&mut self, data: Vec<u8>, requested: &str) -> Result<usize> {
        if let Some(index) = self.faces.iter().position(|f| f.same_face(&data, 0)) {
            return Ok(index);
        }

        let faces = LoadedFont::load_all(data, None)
            .map_err(|e| Error::Font(format!("substitute data for '{}' is unusable: {}", requested, e)))?;
        let index = self.faces.len();
        self.faces.extend(faces.into_iter().map(Arc::new));
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_add_font_nonexistent_file() {
        let mut repo = FontRepository::new();
        let result = repo.add_font(Path::new("nonexistent.ttf"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
        assert!(repo.fonts().is_empty());
    }

    #[test]
    fn test_add_font_invalid_data() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").expect("write");

        let mut repo = FontRepository::new();
        assert!(matches!(repo.add_font(&path), Err(Error::Font(_))));
        assert!(repo.fonts().is_empty());
    }

    #[test]
    fn test_not_found_on_empty_repository() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let mut repo = FontRepository::new();
        repo.on_query_not_found_font(move |args| {
            assert_eq!(args.requested_font, "Calibri");
            assert_eq!(args.actual_font, "");
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let result = repo.resolve("Calibri", false, false);
        assert!(matches!(result, Err(Error::Font(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unusable_substitute_data_is_error() {
        let mut repo = FontRepository::new();
        repo.on_query_not_found_font(|args| {
            args.font_file_data.get_or_insert_with(|| b"garbage".to_vec());
        });

        match repo.resolve("Calibri", false, false) {
            Err(Error::Font(message)) => assert!(message.contains("Calibri")),
            other => panic!("expected font error, got {:?}", other.map(|f| f.info().clone())),
        }
    }

    #[test]
    fn test_find_on_empty_repository() {
        let repo = FontRepository::new();
        assert!(repo.find("Inter", false, false).is_none());
    }

    /// Some TrueType file installed on the machine
    fn system_ttf() -> Option<std::path::PathBuf> {
        let dir = Path::new("/usr/share/fonts");
        crate::fonts::list_font_files(dir)
            .ok()?
            .into_iter()
            .find(|p| p.extension().is_some_and(|e| e == "ttf"))
            .map(|p| dir.join(p))
    }

    #[test]
    fn test_real_font_registration_and_substitution() {
        let Some(path) = system_ttf() else {
            eprintln!("Skipping test: no TrueType font installed");
            return;
        };
        let bytes = std::fs::read(&path).expect("read font");

        let mut repo = FontRepository::new();
        let infos = repo.add_font(&path).expect("register font");
        assert_eq!(infos.len(), 1);
        let family = infos[0].name.clone();

        let found = repo.find(&family.to_uppercase(), false, false).expect("find by family");
        assert_eq!(found.info().source.as_deref(), Some(path.as_path()));

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        repo.on_query_not_found_font(move |args| {
            seen.fetch_add(1, Ordering::SeqCst);
            args.font_file_data.get_or_insert_with(|| bytes.clone());
        });

        let substitute = repo.resolve("Calibri", false, false).expect("substitute");
        assert!(Arc::ptr_eq(&substitute, &found), "identical bytes reuse the registered face");
        assert_eq!(repo.fonts().len(), 1);

        // Later lookups of the same name do not ask again
        repo.resolve("calibri", true, false).expect("substitute again");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_actual_font_used_without_data() {
        let Some(path) = system_ttf() else {
            eprintln!("Skipping test: no TrueType font installed");
            return;
        };

        let mut repo = FontRepository::new();
        let infos = repo.add_font(&path).expect("register font");
        let expected = infos[0].name.clone();
        repo.on_query_not_found_font(move |args| {
            assert_eq!(args.actual_font, expected);
        });

        let face = repo.resolve("Cambria", false, false).expect("actual font");
        assert_eq!(face.info(), &infos[0]);
        assert!(face.text_width("Hello", 12.0) > 0.0);
    }
}
