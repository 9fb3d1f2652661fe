//! Session bootstrap shared by every command.
//!
//! Remembered credentials live in the data directory. Credentials that
//! should end with the user's login session live in the runtime directory,
//! which the platform clears on logout or reboot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use tracing::{debug, warn};

use tokenward_core::{ApiUrl, CredentialStore, StorageBackend};
use tokenward_http::{ApiClient, AuthSession, ClientConfig, Endpoints};
use tokenward_store::{FileBackend, MemoryBackend};

use crate::cli::Settings;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "tokenward")
}

fn data_dir(settings: &Settings) -> Result<PathBuf> {
    if let Some(dir) = &settings.data_dir {
        return Ok(dir.clone());
    }
    let dirs = project_dirs().context("Could not determine data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

fn ephemeral_backend(settings: &Settings) -> Arc<dyn StorageBackend> {
    let dir = settings.runtime_dir.clone().or_else(|| {
        project_dirs()
            .and_then(|dirs| dirs.runtime_dir().map(|dir| dir.to_path_buf()))
    });

    match dir {
        Some(dir) => {
            debug!(dir = %dir.display(), "Ephemeral credentials directory");
            Arc::new(FileBackend::new(dir))
        }
        None => {
            warn!(
                "No runtime directory available; credentials without --remember \
                 will not outlive this command"
            );
            Arc::new(MemoryBackend::new())
        }
    }
}

/// Build the session from settings and restore any stored credential.
pub fn open_session(settings: &Settings) -> Result<AuthSession> {
    let api_url = ApiUrl::new(&settings.api_url).context("Invalid API URL")?;
    if settings.timeout_secs == 0 {
        bail!("Timeout must be at least one second");
    }

    let mut config = ClientConfig::new(api_url)
        .with_timeout(Duration::from_secs(settings.timeout_secs));
    if settings.trailing_slashes {
        config = config.with_endpoints(Endpoints::default().with_trailing_slashes());
    }
    let client = ApiClient::new(config).context("Failed to create HTTP client")?;

    let durable = data_dir(settings)?;
    debug!(dir = %durable.display(), "Durable credentials directory");
    let store = CredentialStore::new(
        ephemeral_backend(settings),
        Arc::new(FileBackend::new(durable)),
    );

    let session = AuthSession::new(client, store);
    session.restore();
    Ok(session)
}

/// Open the session and require it to hold a credential.
pub fn require_session(settings: &Settings) -> Result<AuthSession> {
    let session = open_session(settings)?;
    if !session.is_authenticated() {
        bail!("Not logged in. Run 'tokenward login' first.");
    }
    Ok(session)
}
