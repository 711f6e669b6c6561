use std::{sync::Arc, thread::JoinHandle};

use anyhow::{anyhow, Result};
use flume::{Receiver, Sender};
use uuid::Uuid;

use crate::{core::error::OverlayError, panel::document::PanelId, source::{DataSource, Dataset}};

/// Messages sent from the UI thread to the core worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiToCore {
    /// Fetch the dataset for a panel. The request id comes back with the
    /// result so stale answers can be told apart.
    Fetch { request: Uuid, panel: PanelId },
    /// Graceful shutdown request.
    Quit,
}

/// Messages sent from the core worker thread back to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreToUi {
    Loaded {
        request: Uuid,
        panel: PanelId,
        outcome: Result<Dataset, OverlayError>,
    },
    /// Core is exiting.
    Quit,
}

/// Holder passed into the UI loop: the receiving side from core and the
/// sending side to core.
#[derive(Debug, Clone)]
pub struct Bus {
    pub core_rx: Receiver<CoreToUi>,
    pub ui_tx: Sender<UiToCore>,
}

impl Bus {
    pub fn new(core_rx: Receiver<CoreToUi>, ui_tx: Sender<UiToCore>) -> Self {
        Self { core_rx, ui_tx }
    }

    /// Queue a fetch for `panel` and return its request id.
    pub fn request_fetch(&self, panel: PanelId) -> Result<Uuid> {
        let request = Uuid::new_v4();
        self.ui_tx
            .send(UiToCore::Fetch { request, panel })
            .map_err(|err| anyhow!("core thread is gone: {err}"))?;
        Ok(request)
    }
}

/// Start the core worker thread serving fetches from `source`.
pub fn spawn_core(source: Arc<dyn DataSource>) -> Result<(Bus, JoinHandle<Result<()>>)> {
    let (core_tx, core_rx) = flume::unbounded::<CoreToUi>();
    let (ui_tx, ui_rx) = flume::unbounded::<UiToCore>();
    let handle = std::thread::Builder::new()
        .name("overlaykit-core".into())
        .spawn(move || run_core_thread(source, ui_rx, core_tx))?;
    Ok((Bus::new(core_rx, ui_tx), handle))
}

/// Core loop: one fetch at a time, until `Quit` or the UI side hangs up.
pub fn run_core_thread(
    source: Arc<dyn DataSource>,
    ui_rx: Receiver<UiToCore>,
    core_tx: Sender<CoreToUi>,
) -> Result<()> {
    log::info!("⚙️ Core thread started for {}", source.describe());
    while let Ok(message) = ui_rx.recv() {
        match message {
            UiToCore::Fetch { request, panel } => {
                log::debug!("Fetch {request} for panel {panel}");
                let outcome = source.fetch();
                if let Err(err) = &outcome {
                    log::warn!("{err}");
                }
                if core_tx
                    .send(CoreToUi::Loaded {
                        request,
                        panel,
                        outcome,
                    })
                    .is_err()
                {
                    break;
                }
            }
            UiToCore::Quit => {
                let _ = core_tx.send(CoreToUi::Quit);
                break;
            }
        }
    }
    log::info!("⚙️ Core thread exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use std::time::Duration;

    #[test]
    fn test_fetch_round_trip() -> Result<()> {
        let source = StaticSource {
            name: "static".into(),
            dataset: Dataset {
                headers: vec!["A".into()],
                rows: vec![vec!["1".into()]],
            },
        };
        let (bus, handle) = spawn_core(Arc::new(source))?;
        let request = bus.request_fetch(PanelId(7))?;
        match bus.core_rx.recv_timeout(Duration::from_secs(5))? {
            CoreToUi::Loaded {
                request: got,
                panel,
                outcome,
            } => {
                assert_eq!(got, request);
                assert_eq!(panel, PanelId(7));
                assert_eq!(outcome.map(|d| d.len()), Ok(1));
            }
            other => panic!("unexpected {other:?}"),
        }

        bus.ui_tx.send(UiToCore::Quit)?;
        assert_eq!(bus.core_rx.recv_timeout(Duration::from_secs(5))?, CoreToUi::Quit);
        handle
            .join()
            .map_err(|_| anyhow!("core thread panicked"))??;
        Ok(())
    }
}
