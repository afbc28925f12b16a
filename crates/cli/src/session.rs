//! The signed-in user, persisted as `session.json`.

use std::path::Path;

use anyhow::{Context, Result};
use taskdeck_core::{Session, UserId};
use tokio::fs;

/// Read the session, `None` when nobody is signed in.
pub async fn load(path: &Path) -> Result<Option<Session>> {
    match fs::read_to_string(path).await {
        Ok(s) => {
            let session = serde_json::from_str(&s)
                .with_context(|| format!("corrupt session file {}", path.display()))?;
            Ok(Some(session))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

/// Start a session for `user`, replacing any existing one.
pub async fn login(path: &Path, user: UserId, display_name: Option<String>) -> Result<Session> {
    let name = display_name.unwrap_or_else(|| user.to_string());
    let session = Session::start(user, name);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }
    fs::write(path, serde_json::to_string_pretty(&session)?)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(session)
}

/// End the session. Returns false if nobody was signed in.
pub async fn logout(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}

/// The acting user, or an error telling how to sign in.
pub async fn require(path: &Path) -> Result<Session> {
    load(path)
        .await?
        .context("not signed in; run `taskdeck login <user>` first")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deck").join("session.json");

        assert!(load(&path).await.unwrap().is_none());
        assert!(require(&path).await.is_err());

        let session = login(&path, UserId::new("alice"), Some("Alice".into())).await.unwrap();
        assert_eq!(session.display_name, "Alice");
        assert_eq!(require(&path).await.unwrap().user_id, UserId::new("alice"));

        assert!(logout(&path).await.unwrap());
        assert!(!logout(&path).await.unwrap());
        assert!(load(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        assert!(load(&path).await.is_err());
    }
}
