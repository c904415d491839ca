use std::{env, io, path::PathBuf};

use anyhow::Result;

/// Resolves the directory all records and logs live in. `DAYKEEPER_DATA_DIR`
/// wins over the platform defaults so tests and scripts can point the store
/// anywhere.
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = if let Ok(dir) = env::var("DAYKEEPER_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        platform_state_dir()?
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

fn platform_state_dir() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let mut path = PathBuf::from(
            env::var("APPDATA").expect("APPDATA should be present on Windows"),
        );
        path.push("daykeeper");
        Ok(path)
    }
    #[cfg(not(windows))]
    {
        let mut path = env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|_| {
                env::var("HOME").map(|home| {
                    let mut path = PathBuf::from(home);
                    path.push(".local/state");
                    path
                })
            })
            .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
        path.push("daykeeper");
        Ok(path)
    }
}
