//! Source loader: resolves the import graph to a list of module texts.
//!
//! The loader works textually, before any parsing: it scans each file for
//! `import` declarations, maps dotted paths to files (`a/b/c.paw` preferred
//! over `a/b/c/mod.paw`), recurses depth-first and returns modules in
//! post-order — leaves first, no duplicates. Visibility is not enforced
//! here; that is the linker's job.
//!
//! The prelude module (`std.prelude`) is loaded first and implicitly
//! imported by every module except itself, when it exists under the search
//! root.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::errors::LoadError;

/// Dotted path of the implicitly imported prelude module.
pub const PRELUDE_PATH: &str = "std.prelude";

/// One loaded module: its dotted path, origin file and source text.
#[derive(Debug, Clone)]
pub struct ModuleSource {
    /// Dotted module path (`math.vec`); the root module uses its file stem.
    pub path: String,
    pub file: PathBuf,
    pub text: String,
}

/// Loads the root file and every transitively imported module.
///
/// Returns modules in dependency post-order: every module appears after the
/// modules it imports, and the root module is last.
///
/// # Errors
///
/// `FileNotFound` when an import does not resolve, `CyclicImport` when the
/// import graph has a cycle, `IoError` when a file cannot be read.
pub fn load_modules(root_file: &Path) -> Result<Vec<ModuleSource>, LoadError> {
    let root_dir = root_file.parent().unwrap_or(Path::new(".")).to_path_buf();
    let root_path = root_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string());

    let mut loader = Loader {
        root_dir,
        done: FxHashSet::default(),
        in_progress: Vec::new(),
        modules: Vec::new(),
    };

    // The prelude is a leaf by definition; load it first so every other
    // module can resolve against it.
    if loader.locate(&segments_of(PRELUDE_PATH)).is_some() {
        loader.visit(PRELUDE_PATH, None)?;
    }

    let text = read_source(root_file)?;
    loader.visit_text(&root_path, root_file.to_path_buf(), text)?;
    Ok(loader.modules)
}

struct Loader {
    root_dir: PathBuf,
    done: FxHashSet<String>,
    in_progress: Vec<String>,
    modules: Vec<ModuleSource>,
}

impl Loader {
    fn visit(&mut self, dotted: &str, _origin: Option<&str>) -> Result<(), LoadError> {
        if self.done.contains(dotted) {
            return Ok(());
        }
        if let Some(pos) = self.in_progress.iter().position(|p| p == dotted) {
            let mut chain: Vec<String> = self.in_progress[pos..].to_vec();
            chain.push(dotted.to_string());
            return Err(LoadError::CyclicImport { chain });
        }
        let segments = segments_of(dotted);
        let file = self.locate(&segments).ok_or_else(|| {
            let base: PathBuf = segments.iter().collect::<PathBuf>();
            LoadError::FileNotFound {
                module: dotted.to_string(),
                tried_file: self.root_dir.join(base.with_extension("paw")),
                tried_dir: self.root_dir.join(base.join("mod.paw")),
            }
        })?;
        let text = read_source(&file)?;
        self.visit_text(dotted, file, text)
    }

    fn visit_text(
        &mut self,
        dotted: &str,
        file: PathBuf,
        text: String,
    ) -> Result<(), LoadError> {
        self.in_progress.push(dotted.to_string());
        for import in scan_imports(&text) {
            let target = self.resolve_import_target(&import)?;
            self.visit(&target, Some(dotted))?;
        }
        self.in_progress.pop();
        self.done.insert(dotted.to_string());
        self.modules.push(ModuleSource {
            path: dotted.to_string(),
            file,
            text,
        });
        Ok(())
    }

    /// Maps an import's segment chain to a loadable module path. The whole
    /// chain is preferred; when its file does not exist and the chain has
    /// more than one segment, the final segment is treated as an imported
    /// item and the chain's init is the module.
    fn resolve_import_target(&self, import: &ScannedImport) -> Result<String, LoadError> {
        if import.has_item_list || import.segments.len() == 1 {
            return self.require_exists(&import.segments);
        }
        if self.locate(&import.segments).is_some() {
            return Ok(import.segments.join("."));
        }
        self.require_exists(&import.segments[..import.segments.len() - 1])
    }

    fn require_exists(&self, segments: &[String]) -> Result<String, LoadError> {
        if self.locate(segments).is_some() {
            Ok(segments.join("."))
        } else {
            let base: PathBuf = segments.iter().collect();
            Err(LoadError::FileNotFound {
                module: segments.join("."),
                tried_file: self.root_dir.join(base.with_extension("paw")),
                tried_dir: self.root_dir.join(base.join("mod.paw")),
            })
        }
    }

    fn locate(&self, segments: &[String]) -> Option<PathBuf> {
        if segments.is_empty() {
            return None;
        }
        let base: PathBuf = segments.iter().collect();
        let as_file = self.root_dir.join(base.with_extension("paw"));
        if as_file.is_file() {
            return Some(as_file);
        }
        let as_dir = self.root_dir.join(base.join("mod.paw"));
        if as_dir.is_file() {
            return Some(as_dir);
        }
        None
    }
}

fn read_source(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|e| LoadError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn segments_of(dotted: &str) -> Vec<String> {
    dotted.split('.').map(str::to_string).collect()
}

struct ScannedImport {
    segments: Vec<String>,
    /// True for `import a.b.{x, y}` and `import a.b.*` forms, where the
    /// module path is unambiguous.
    has_item_list: bool,
}

/// Textual pre-pass over a module's source collecting import declarations.
/// Runs before parsing, so it only needs to recognize the statement shape.
fn scan_imports(text: &str) -> Vec<ScannedImport> {
    let mut imports = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix("import ") else {
            continue;
        };
        let body = rest
            .split(|c: char| c == ';' || c == '/')
            .next()
            .unwrap_or("")
            .trim();
        if body.is_empty() {
            continue;
        }
        let mut segments = Vec::new();
        let mut has_item_list = false;
        for piece in body.split('.') {
            let piece = piece.trim();
            if piece == "*" || piece.starts_with('{') {
                has_item_list = true;
                break;
            }
            if piece.is_empty() || !piece.chars().all(|c| c.is_alphanumeric() || c == '_') {
                break;
            }
            segments.push(piece.to_string());
        }
        if !segments.is_empty() {
            imports.push(ScannedImport {
                segments,
                has_item_list,
            });
        }
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tree(files: &[(&str, &str)]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "paw-loader-{}-{:p}",
            std::process::id(),
            &files[0]
        ));
        let _ = std::fs::remove_dir_all(&dir);
        for (name, text) in files {
            let path = dir.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        }
        dir
    }

    #[test]
    fn loads_single_module() {
        let dir = write_tree(&[("main.paw", "fn main() -> i32 { 0 }")]);
        let modules = load_modules(&dir.join("main.paw")).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].path, "main");
    }

    #[test]
    fn loads_leaves_first() {
        let dir = write_tree(&[
            ("main.paw", "import math.add\nfn main() -> i32 { add(1, 2) }"),
            ("math.paw", "pub fn add(a: i32, b: i32) -> i32 { a + b }"),
        ]);
        let modules = load_modules(&dir.join("main.paw")).unwrap();
        let paths: Vec<_> = modules.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["math", "main"]);
    }

    #[test]
    fn prefers_file_over_mod_dir() {
        let dir = write_tree(&[
            ("main.paw", "import util.helper\nfn main() -> i32 { 0 }"),
            ("util.paw", "pub fn helper() -> i32 { 1 }"),
            ("util/mod.paw", "pub fn helper() -> i32 { 2 }"),
        ]);
        let modules = load_modules(&dir.join("main.paw")).unwrap();
        let util = modules.iter().find(|m| m.path == "util").unwrap();
        assert!(util.text.contains("{ 1 }"));
    }

    #[test]
    fn falls_back_to_mod_dir() {
        let dir = write_tree(&[
            ("main.paw", "import util.helper\nfn main() -> i32 { 0 }"),
            ("util/mod.paw", "pub fn helper() -> i32 { 2 }"),
        ]);
        let modules = load_modules(&dir.join("main.paw")).unwrap();
        assert!(modules.iter().any(|m| m.path == "util"));
    }

    #[test]
    fn whole_chain_module_is_preferred() {
        let dir = write_tree(&[
            ("main.paw", "import math.vec\nfn main() -> i32 { 0 }"),
            ("math/vec.paw", "pub fn dot() -> i32 { 0 }"),
        ]);
        let modules = load_modules(&dir.join("main.paw")).unwrap();
        assert!(modules.iter().any(|m| m.path == "math.vec"));
    }

    #[test]
    fn missing_module_reports_both_candidates() {
        let dir = write_tree(&[("main.paw", "import nope.thing\nfn main() -> i32 { 0 }")]);
        let err = load_modules(&dir.join("main.paw")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }));
    }

    #[test]
    fn cycle_is_detected() {
        let dir = write_tree(&[
            ("main.paw", "import a.x\nfn main() -> i32 { 0 }"),
            ("a.paw", "import b.y\npub fn x() -> i32 { 0 }"),
            ("b.paw", "import a.x\npub fn y() -> i32 { 0 }"),
        ]);
        let err = load_modules(&dir.join("main.paw")).unwrap_err();
        let LoadError::CyclicImport { chain } = err else {
            panic!("expected CyclicImport");
        };
        assert!(chain.len() >= 3);
        assert_eq!(chain.first(), chain.last());
    }

    #[test]
    fn shared_dependency_loads_once() {
        let dir = write_tree(&[
            ("main.paw", "import a.x\nimport b.y\nfn main() -> i32 { 0 }"),
            ("a.paw", "import c.z\npub fn x() -> i32 { 0 }"),
            ("b.paw", "import c.z\npub fn y() -> i32 { 0 }"),
            ("c.paw", "pub fn z() -> i32 { 0 }"),
        ]);
        let modules = load_modules(&dir.join("main.paw")).unwrap();
        let count = modules.iter().filter(|m| m.path == "c").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn prelude_is_loaded_when_present() {
        let dir = write_tree(&[
            ("main.paw", "fn main() -> i32 { 0 }"),
            ("std/prelude.paw", "pub fn print(s: string) { }"),
        ]);
        let modules = load_modules(&dir.join("main.paw")).unwrap();
        let paths: Vec<_> = modules.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["std.prelude", "main"]);
    }
}
