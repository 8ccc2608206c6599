//! Locating the executable behind a program name.

use crate::env::Environment;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Resolve a program name the way `execvp` would.
///
/// - A name containing a `/` (absolute, `./foo`, `bin/foo`) is used as a path,
///   relative ones against `env.current_dir`.
/// - A bare name is looked up in each directory of `PATH`, first match wins.
/// - An empty name never resolves.
///
/// Only regular files with at least one execute bit set count as a match.
pub fn find_command_path<P: AsRef<OsStr> + ?Sized>(env: &Environment, program: &P) -> Option<PathBuf> {
    let program = program.as_ref();
    if program.is_empty() {
        return None;
    }

    if program.as_bytes().contains(&b'/') {
        let path = env.resolve(program);
        return is_executable(&path).then_some(path);
    }

    let search_paths = env.get_var("PATH")?;
    find_in_path(OsStr::new(&search_paths), &env.current_dir, program)
}

fn find_in_path(search_paths: &OsStr, current_dir: &Path, program: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| {
            // An empty PATH entry means the current directory.
            if dir.as_os_str().is_empty() {
                current_dir.join(program)
            } else if dir.is_relative() {
                current_dir.join(dir).join(program)
            } else {
                dir.join(program)
            }
        })
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}
