//! Loader + linker integration: multi-module programs on a real
//! filesystem tree.

use paw::Backend;

fn write_tree(files: &[(&str, &str)]) -> tempfile_dir::TempTree {
    tempfile_dir::TempTree::new(files)
}

/// Minimal temp-tree helper; the loader only needs plain files on disk.
mod tempfile_dir {
    pub(crate) struct TempTree {
        pub(crate) root: std::path::PathBuf,
    }

    impl TempTree {
        pub(crate) fn new(files: &[(&str, &str)]) -> Self {
            let root = std::env::temp_dir().join(format!(
                "paw-tests-{}-{:p}",
                std::process::id(),
                &files[0].0
            ));
            let _ = std::fs::remove_dir_all(&root);
            for (name, text) in files {
                let path = root.join(name);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, text).unwrap();
            }
            Self { root }
        }

        pub(crate) fn path(&self, name: &str) -> std::path::PathBuf {
            self.root.join(name)
        }
    }

    impl Drop for TempTree {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }
}

#[test]
fn two_module_program_compiles() {
    let tree = write_tree(&[
        (
            "main.paw",
            "import math.add\nfn main() -> i32 { add(40, 2) }",
        ),
        ("math.paw", "pub fn add(a: i32, b: i32) -> i32 { a + b }"),
    ]);
    let artifact = paw::compile(&tree.path("main.paw"), Backend::C).expect("compile succeeds");
    assert!(artifact.contains("int32_t add(int32_t a, int32_t b)"));
    assert!(artifact.contains("int main(void)"));
}

#[test]
fn braced_imports_behave_like_single_imports() {
    let lib = "pub fn f() -> i32 { 40 }\npub fn g() -> i32 { 2 }";
    let single = write_tree(&[
        ("lib.paw", lib),
        (
            "main.paw",
            "import lib.f\nimport lib.g\nfn main() -> i32 { f() + g() }",
        ),
    ]);
    let braced = write_tree(&[
        ("lib.paw", lib),
        (
            "main.paw",
            "import lib.{f, g}\nfn main() -> i32 { f() + g() }",
        ),
    ]);
    let a = paw::compile(&single.path("main.paw"), Backend::C).expect("single-form compiles");
    let b = paw::compile(&braced.path("main.paw"), Backend::C).expect("braced-form compiles");
    // The merged program is identical either way.
    assert_eq!(a, b);
}

#[test]
fn private_import_fails() {
    let tree = write_tree(&[
        ("lib.paw", "fn secret() -> i32 { 1 }"),
        (
            "main.paw",
            "import lib.secret\nfn main() -> i32 { secret() }",
        ),
    ]);
    let err = paw::compile(&tree.path("main.paw"), Backend::C).unwrap_err();
    assert!(err.to_string().contains("does not export"));
}

#[test]
fn cyclic_import_fails_with_chain() {
    let tree = write_tree(&[
        ("main.paw", "import a.f\nfn main() -> i32 { f() }"),
        ("a.paw", "import b.g\npub fn f() -> i32 { g() }"),
        ("b.paw", "import a.f\npub fn g() -> i32 { 2 }"),
    ]);
    let err = paw::compile(&tree.path("main.paw"), Backend::C).unwrap_err();
    assert!(err.to_string().contains("cyclic import"));
}

#[test]
fn prelude_functions_are_visible_everywhere() {
    let tree = write_tree(&[
        ("std/prelude.paw", "pub fn identity(x: i32) -> i32 { x }"),
        ("main.paw", "fn main() -> i32 { identity(42) }"),
    ]);
    let artifact = paw::compile(&tree.path("main.paw"), Backend::C).expect("compile succeeds");
    assert!(artifact.contains("int32_t identity(int32_t x)"));
}
