//! A filesystem-backed download host.
//!
//! Each submission spawns a transfer task that fetches the response
//! body, writes it to a file under the host's root directory and
//! records the outcome in a handle table. The table is the only state shared across
//! tasks and sits behind a mutex.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    error::{HibikiError, HibikiResult},
    host::{DownloadHost, HandleState},
};

pub struct FsDownloadHost {
    client: reqwest::Client,
    root: PathBuf,
    handles: Arc<Mutex<HashMap<u64, HandleState>>>,
    next_handle: AtomicU64,
}

impl FsDownloadHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_client(root, reqwest::Client::new())
    }

    pub fn with_client(root: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            client,
            root: root.into(),
            handles: Arc::new(Mutex::new(HashMap::new())),
            next_handle: AtomicU64::new(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn register(&self) -> u64 {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.handles
            .lock()
            .unwrap()
            .insert(handle, HandleState::Pending);
        handle
    }

    fn settle(handles: &Mutex<HashMap<u64, HandleState>>, handle: u64, state: HandleState) {
        handles.lock().unwrap().insert(handle, state);
    }

    fn destination_path(&self, destination: &str) -> PathBuf {
        self.root.join(destination)
    }
}

async fn transfer(client: reqwest::Client, url: String, path: PathBuf) -> HibikiResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(HibikiError::HostRejected(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let bytes = response.bytes().await?;
    tokio::fs::write(&path, &bytes).await?;

    Ok(())
}

impl DownloadHost for FsDownloadHost {
    type Handle = u64;

    async fn submit(&self, url: &str, destination: &str) -> HibikiResult<Self::Handle> {
        let handle = self.register();
        let client = self.client.clone();
        let url = url.to_string();
        let path = self.destination_path(destination);
        let handles = self.handles.clone();

        tokio::spawn(async move {
            let state = match transfer(client, url, path.clone()).await {
                Ok(()) => HandleState::Complete {
                    resolved_path: Some(path.display().to_string()),
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Transfer failed: {e}");
                    HandleState::Interrupted {
                        error: e.to_string(),
                    }
                }
            };
            Self::settle(&handles, handle, state);
        });

        Ok(handle)
    }

    async fn submit_data(&self, data: Vec<u8>, destination: &str) -> HibikiResult<Self::Handle> {
        let handle = self.register();
        let path = self.destination_path(destination);
        let handles = self.handles.clone();

        tokio::spawn(async move {
            let result = async {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, &data).await
            }
            .await;

            let state = match result {
                Ok(()) => HandleState::Complete {
                    resolved_path: Some(path.display().to_string()),
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Sidecar write failed: {e}");
                    HandleState::Interrupted {
                        error: e.to_string(),
                    }
                }
            };
            Self::settle(&handles, handle, state);
        });

        Ok(handle)
    }

    async fn query_state(&self, handle: &Self::Handle) -> HibikiResult<HandleState> {
        self.handles
            .lock()
            .unwrap()
            .get(handle)
            .cloned()
            .ok_or(HibikiError::UnknownHandle)
    }
}
