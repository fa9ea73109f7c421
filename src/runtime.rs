use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::app::{Completion, Request};
use crate::error::MonitorError;
use crate::network::{export_file_name, SessionClient};

/// Runs remote requests off the event loop.
///
/// Each request gets its own task and reports back through the channel, so
/// completions interleave freely with input and with each other.
#[derive(Clone)]
pub struct Executor {
    client: SessionClient,
    export_dir: PathBuf,
    tx: UnboundedSender<Completion>,
}

impl Executor {
    pub fn new(client: SessionClient, export_dir: PathBuf, tx: UnboundedSender<Completion>) -> Self {
        Self {
            client,
            export_dir,
            tx,
        }
    }

    pub fn spawn(&self, request: Request) {
        let client = self.client.clone();
        let export_dir = self.export_dir.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let completion = execute(&client, &export_dir, request).await;
            if tx.send(completion).is_err() {
                debug!("event loop gone; dropping completion");
            }
        });
    }
}

pub async fn execute(client: &SessionClient, export_dir: &Path, request: Request) -> Completion {
    match request {
        Request::ListInterfaces => Completion::Interfaces(client.list_interfaces().await),
        Request::Start(start) => {
            let result = client.start(&start).await;
            Completion::Started {
                interface: start.interface,
                result,
            }
        }
        Request::Stop => Completion::Stopped(client.stop().await),
        Request::FetchRecords { seq } => Completion::Records {
            seq,
            result: client.fetch_records().await,
        },
        Request::ExportCheck => {
            Completion::ExportChecked(client.fetch_records().await.map(|records| records.len()))
        }
        Request::FetchDetail(request) => Completion::Detail {
            request,
            result: client.fetch_detail(request.index).await,
        },
        Request::Export => Completion::Exported(export(client, export_dir).await),
    }
}

async fn export(client: &SessionClient, export_dir: &Path) -> Result<PathBuf, MonitorError> {
    let bytes = client.export_capture().await?;
    let path = export_dir.join(export_file_name(Utc::now()));
    tokio::fs::write(&path, &bytes).await.map_err(|err| {
        warn!(path = %path.display(), error = %err, "writing capture failed");
        MonitorError::Io(format!("Error saving capture to {}: {err}", path.display()))
    })?;
    Ok(path)
}
