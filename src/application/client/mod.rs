pub mod session;

pub use session::{ClientSession, PredictionState, PredictionTable, SampleState};

use crate::domain::ports::{PredictOutcome, PredictionApi};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Requests from the UI thread to the background runtime
#[derive(Debug, Clone)]
pub enum ClientCommand {
    FetchSample,
    Predict { file_name: String, bytes: Vec<u8> },
}

/// Unified event type for the user interface
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Sample(Result<Vec<u8>, String>),
    Prediction(PredictOutcome),
    Log(String),
}

/// UI-side handle: sends commands and drains events without blocking.
pub struct PredictionClient {
    command_tx: mpsc::Sender<ClientCommand>,
    event_rx: Receiver<ClientEvent>,
    log_rx: Receiver<String>,
}

impl PredictionClient {
    pub fn new(
        command_tx: mpsc::Sender<ClientCommand>,
        event_rx: Receiver<ClientEvent>,
        log_rx: Receiver<String>,
    ) -> Self {
        Self {
            command_tx,
            event_rx,
            log_rx,
        }
    }

    /// Poll for the next available event. Logs are drained first.
    pub fn poll_next(&mut self) -> Option<ClientEvent> {
        if let Ok(msg) = self.log_rx.try_recv() {
            return Some(ClientEvent::Log(msg));
        }
        self.event_rx.try_recv().ok()
    }

    pub fn send(&self, command: ClientCommand) -> anyhow::Result<()> {
        self.command_tx
            .try_send(command)
            .map_err(|e| anyhow::anyhow!("Failed to send client command: {}", e))
    }
}

/// Serve UI commands until the command channel closes.
pub async fn run_worker(
    api: Arc<dyn PredictionApi>,
    mut command_rx: mpsc::Receiver<ClientCommand>,
    event_tx: Sender<ClientEvent>,
) {
    info!("Client worker started");
    while let Some(command) = command_rx.recv().await {
        let event = match command {
            ClientCommand::FetchSample => ClientEvent::Sample(api.fetch_sample().await),
            ClientCommand::Predict { file_name, bytes } => {
                debug!(file = %file_name, bytes = bytes.len(), "Uploading file");
                ClientEvent::Prediction(api.predict(&file_name, bytes).await)
            }
        };
        if event_tx.send(event).is_err() {
            break;
        }
    }
    info!("Client worker stopped");
}
