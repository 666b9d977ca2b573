use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Locate `~/.relicrsps/chatlogs`, where the Chat Logger plugin writes one
/// folder per logged-in user.
pub fn chatlog_root() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let root = home.join(".relicrsps").join("chatlogs");
    if !root.is_dir() {
        bail!(
            "chat log directory not found at {}. Ensure the Chat Logger plugin \
             is installed and the 'Game Chat' checkbox is ticked.",
            root.display()
        );
    }
    Ok(root)
}

/// User folders directly under the chatlog root, sorted for stable output.
pub fn list_users(root: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("failed to read chat log directory {}", root.display()))?;

    let mut users = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                users.push(name.to_string());
            }
        }
    }
    users.sort();
    Ok(users)
}

/// The game chat log the plugin keeps appending to for `user`.
pub fn latest_log_path(root: &Path, user: &str) -> PathBuf {
    root.join(user).join("game").join("latest.log")
}

/// Pick the log file to monitor. An explicit user must exist; with no user
/// given, a sole folder is auto-selected and anything else is an error that
/// names the candidates.
pub fn resolve_log_path(user: Option<&str>) -> Result<PathBuf> {
    let root = chatlog_root()?;
    let users = list_users(&root)?;

    match user {
        Some(name) => {
            if !users.iter().any(|u| u == name) {
                bail!(
                    "no chat log folder for user '{}' under {}",
                    name,
                    root.display()
                );
            }
            Ok(latest_log_path(&root, name))
        }
        None => match users.as_slice() {
            [] => bail!("no user folders found under {}", root.display()),
            [only] => Ok(latest_log_path(&root, only)),
            many => bail!(
                "multiple user folders found ({}); select one with --user",
                many.join(", ")
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_log_lives_under_user_game_folder() {
        let path = latest_log_path(Path::new("/logs"), "alice");
        assert_eq!(path, PathBuf::from("/logs/alice/game/latest.log"));
    }

    #[test]
    fn list_users_returns_sorted_directories_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("zed")).unwrap();
        std::fs::create_dir(dir.path().join("alice")).unwrap();
        std::fs::write(dir.path().join("stray.txt"), "not a user").unwrap();

        let users = list_users(dir.path()).unwrap();
        assert_eq!(users, vec!["alice".to_string(), "zed".to_string()]);
    }
}
