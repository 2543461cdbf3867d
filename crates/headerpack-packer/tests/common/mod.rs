//! Shell-script stand-ins for the external tools.
//!
//! All scripts are written once, before any test spawns a process, so no
//! executable is ever open for writing while another thread forks.

use once_cell::sync::Lazy;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Emits line markers, then the input with one-line block comments removed
    pub fn clang(&self) -> PathBuf {
        self.path("clang++")
    }

    /// Expands `#include "..."` lines from the `-iquote` directories only,
    /// failing like a compiler when the header is not found
    pub fn quote_clang(&self) -> PathBuf {
        self.path("quote-clang++")
    }

    /// Exits 1 with a diagnostic on stderr
    pub fn failing_clang(&self) -> PathBuf {
        self.path("failing-clang++")
    }

    /// Copies the packed input to `--output`
    pub fn build_payload(&self) -> PathBuf {
        self.path("build_payload")
    }

    /// Exits 2 with a diagnostic on stderr
    pub fn failing_build_payload(&self) -> PathBuf {
        self.path("failing-build_payload")
    }

    /// Exits 0 without writing anything
    pub fn silent_build_payload(&self) -> PathBuf {
        self.path("silent-build_payload")
    }
}

const CLANG: &str = r#"#!/bin/sh
for arg in "$@"; do input="$arg"; done
printf '# 1 "%s"\n' "$input"
printf '# 1 "<built-in>" 1\n'
printf '# 1 "<command line>" 1\n'
sed -e 's|/\*.*\*/||' "$input"
printf '# 2 "%s" 2\n' "$input"
"#;

const QUOTE_CLANG: &str = r#"#!/bin/sh
dirs=""
while [ $# -gt 1 ]; do
    case "$1" in
        -iquote) dirs="$dirs $2"; shift 2 ;;
        *) shift ;;
    esac
done
input="$1"
while IFS= read -r line; do
    case "$line" in
        '#include "'*'"')
            name=${line#'#include "'}
            name=${name%'"'}
            found=""
            for dir in $dirs; do
                if [ -f "$dir/$name" ]; then
                    found="$dir/$name"
                    break
                fi
            done
            if [ -z "$found" ]; then
                echo "$input:1:10: fatal error: $name: No such file or directory" >&2
                exit 1
            fi
            cat "$found"
            ;;
        *) printf '%s\n' "$line" ;;
    esac
done < "$input"
"#;

const FAILING_CLANG: &str = r#"#!/bin/sh
echo "headers.hpp:1:10: fatal error: 'missing.h' file not found" >&2
exit 1
"#;

const BUILD_PAYLOAD: &str = r#"#!/bin/sh
out=""
in=""
while [ $# -gt 0 ]; do
    case "$1" in
        --output) out="$2"; shift 2 ;;
        --copyright|--description|--indentation|--width|--namespace|--variable|--type|--size-variable|--size-type) shift 2 ;;
        --*) shift ;;
        *) in="$1"; shift ;;
    esac
done
cp "$in" "$out"
"#;

const FAILING_BUILD_PAYLOAD: &str = r#"#!/bin/sh
echo "build_payload: invalid namespace" >&2
exit 2
"#;

const SILENT_BUILD_PAYLOAD: &str = "#!/bin/sh\nexit 0\n";

static TOOLS: Lazy<FakeTools> = Lazy::new(|| {
    let dir = TempDir::new().unwrap();
    for (name, script) in [
        ("clang++", CLANG),
        ("quote-clang++", QUOTE_CLANG),
        ("failing-clang++", FAILING_CLANG),
        ("build_payload", BUILD_PAYLOAD),
        ("failing-build_payload", FAILING_BUILD_PAYLOAD),
        ("silent-build_payload", SILENT_BUILD_PAYLOAD),
    ] {
        install(&dir.path().join(name), script);
    }
    FakeTools { dir }
});

fn install(path: &Path, script: &str) {
    fs::write(path, script).unwrap();
    let mut permissions = fs::metadata(path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).unwrap();
}

pub fn tools() -> &'static FakeTools {
    &TOOLS
}

/// Write a file under `root`, creating parent directories
pub fn write(root: &Path, name: &str, contents: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}
