//! Descriptor resolution tests against projects on disk

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use strata_config::{ConfigError, ConfigLoader, CONFIG_FILE_NAME};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn canonical(temp: &TempDir) -> PathBuf {
    temp.path().canonicalize().unwrap()
}

// ============================================================================
// Root File Expansion
// ============================================================================

#[test]
fn test_default_include_collects_all_sources() {
    let temp = TempDir::new().unwrap();
    let root = canonical(&temp);
    write(&root, CONFIG_FILE_NAME, "");
    write(&root, "src/a.st", "export a\n");
    write(&root, "src/nested/b.st", "export b\n");
    write(&root, "README.md", "# readme\n");
    write(&root, "dist/a.d.st", "export a\n");

    let descriptor = ConfigLoader::new().load(&root).unwrap();

    assert_eq!(
        descriptor.root_files,
        vec![root.join("src/a.st"), root.join("src/nested/b.st")]
    );
}

#[test]
fn test_include_exclude_and_explicit_files() {
    let temp = TempDir::new().unwrap();
    let root = canonical(&temp);
    write(
        &root,
        CONFIG_FILE_NAME,
        r#"
[files]
include = ["src"]
exclude = ["src/**/*.test.st"]
files = ["tools/gen.st"]
"#,
    );
    write(&root, "src/lib.st", "");
    write(&root, "src/lib.test.st", "");
    write(&root, "tools/gen.st", "");
    write(&root, "tools/other.st", "");

    let descriptor = ConfigLoader::new().load(&root).unwrap();

    assert_eq!(
        descriptor.root_files,
        vec![root.join("src/lib.st"), root.join("tools/gen.st")]
    );
    assert_eq!(descriptor.wildcard_directories(), &[root.join("src")]);
}

#[test]
fn test_missing_explicit_file_is_still_a_root_file() {
    let temp = TempDir::new().unwrap();
    let root = canonical(&temp);
    write(
        &root,
        CONFIG_FILE_NAME,
        "[files]\ninclude = []\nfiles = [\"main.st\"]\n",
    );

    let descriptor = ConfigLoader::new().load(&root).unwrap();
    assert_eq!(descriptor.root_files, vec![root.join("main.st")]);
}

#[rstest]
#[case("src/new.st", true)]
#[case("src/deep/new.st", true)]
#[case("dist/new.st", false)]
#[case("src/new.txt", false)]
fn test_new_files_qualify_as_root_files(#[case] relative: &str, #[case] expected: bool) {
    let temp = TempDir::new().unwrap();
    let root = canonical(&temp);
    write(&root, CONFIG_FILE_NAME, "[files]\ninclude = [\"src\", \"dist\"]\n");

    let descriptor = ConfigLoader::new().load(&root).unwrap();
    assert_eq!(descriptor.is_included(&root.join(relative)), expected);
}

// ============================================================================
// Compiler Options and Extends
// ============================================================================

#[test]
fn test_extends_inherits_compiler_options() {
    let temp = TempDir::new().unwrap();
    let root = canonical(&temp);
    write(
        &root,
        "strata.base.toml",
        "[compiler]\ntarget = \"v1\"\nout_dir = \"shared-out\"\ndeclaration = false\n",
    );
    let config_path = write(
        &root,
        "app/strata.toml",
        "extends = \"../strata.base.toml\"\n\n[compiler]\ntarget = \"v2\"\n",
    );

    let descriptor = ConfigLoader::new().load_descriptor(&config_path).unwrap();

    assert_eq!(descriptor.options.target, "v2");
    assert!(!descriptor.options.declaration);
    // Relative paths resolve against the config that declared them
    assert_eq!(descriptor.options.out_dir, root.join("shared-out"));
    assert_eq!(
        descriptor.extended_configs,
        vec![root.join("strata.base.toml")]
    );
}

#[test]
fn test_missing_extends_is_not_found() {
    let temp = TempDir::new().unwrap();
    let root = canonical(&temp);
    write(&root, CONFIG_FILE_NAME, "extends = \"missing.toml\"\n");

    let result = ConfigLoader::new().load(&root);
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

// ============================================================================
// References
// ============================================================================

#[test]
fn test_references_resolve_to_canonical_config_paths() {
    let temp = TempDir::new().unwrap();
    let root = canonical(&temp);
    write(&root, "core/strata.toml", "[package]\nname = \"core\"\n");
    write(&root, "util/custom.toml", "");
    let app = write(
        &root,
        "app/strata.toml",
        r#"
[[references]]
path = "../core"

[[references]]
path = "../util/custom.toml"
"#,
    );

    let descriptor = ConfigLoader::new().load_descriptor(&app).unwrap();

    assert_eq!(
        descriptor.references,
        vec![root.join("core/strata.toml"), root.join("util/custom.toml")]
    );
}

#[test]
fn test_missing_reference_is_not_found() {
    let temp = TempDir::new().unwrap();
    let root = canonical(&temp);
    write(&root, CONFIG_FILE_NAME, "[[references]]\npath = \"../ghost\"\n");

    let result = ConfigLoader::new().load(&root);
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_invalid_toml_reports_file() {
    let temp = TempDir::new().unwrap();
    let root = canonical(&temp);
    write(&root, CONFIG_FILE_NAME, "[package\nname = 1\n");

    match ConfigLoader::new().load(&root) {
        Err(ConfigError::TomlParseError { file, .. }) => {
            assert_eq!(file, root.join(CONFIG_FILE_NAME));
        }
        other => panic!("Expected TomlParseError, got {:?}", other),
    }
}

#[test]
fn test_custom_extensions() {
    let temp = TempDir::new().unwrap();
    let root = canonical(&temp);
    write(&root, CONFIG_FILE_NAME, "");
    write(&root, "src/a.st", "");
    write(&root, "src/b.mod", "");

    let descriptor = ConfigLoader::new()
        .with_extensions(["mod"])
        .load(&root)
        .unwrap();
    assert_eq!(descriptor.root_files, vec![root.join("src/b.mod")]);
}
