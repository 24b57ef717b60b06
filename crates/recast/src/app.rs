use crate::{
    AppCommand, AppError, AppResult, TrayCommand, TrayIconState, TrayMenuIds, backend,
    config::Config,
};

use recast_core::{Orchestrator, SessionEvent, overlay::PointerTracker};

use std::{fs, sync::Arc};

use tao::event_loop::EventLoopProxy;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::MenuEvent;

/// Main application state.
///
/// Runs on the async runtime thread and owns the orchestrator. Tray updates
/// go back to the main thread through `tray_proxy` because `TrayIcon` is
/// `!Send` and must remain on the UI thread.
pub struct App {
    pub(crate) orchestrator: Orchestrator,
    pub(crate) session_events: mpsc::UnboundedReceiver<SessionEvent>,
    pub(crate) config: Config,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) menu_ids: TrayMenuIds,
    pub(crate) pointer: Option<Arc<dyn PointerTracker>>,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Recast starting");

        // MenuEvent::receiver() is a crossbeam channel with a blocking recv().
        // When tray_event_rx is dropped the next blocking_send() fails and the
        // forwarder ends.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        let mut shown = (TrayIconState::Idle, 0);

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    self.handle_tray_event(event).await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::ToggleRecording => {
                            if let Err(e) = self.toggle_recording() {
                                error!(error = %e, "Failed to toggle recording");
                            }
                        }
                        AppCommand::TogglePause => self.orchestrator.toggle_pause(),
                        AppCommand::Screenshot => {
                            if let Err(e) = self.take_screenshot() {
                                error!(error = %e, "Failed to take screenshot");
                            }
                        }
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }

                Some(event) = self.session_events.recv() => {
                    self.orchestrator.handle_event(event);
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }

            shown = self.sync_tray(shown);
        }

        drop(tray_event_rx);

        // Saves still running on the blocking pool must land before exit.
        self.orchestrator.shutdown().await;

        match tokio::time::timeout(std::time::Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        let _ = self.shutdown_tx.send(true);
        self.send_tray(TrayCommand::Shutdown);
        info!("Recast shut down successfully");

        Ok(())
    }

    /// Start a session from the current config, or stop the active one.
    #[instrument(skip(self))]
    fn toggle_recording(&mut self) -> AppResult<()> {
        let config = &self.config;
        let pointer = self.pointer.clone();
        let result = self
            .orchestrator
            .toggle_recording(|| backend::session_plan(config, pointer));

        self.persist_source_fallback();

        match result {
            Err(e) if e.is_silent() => {
                debug!(reason = %e, "Session not started");
                Ok(())
            }
            Err(e) => Err(AppError::from(e)),
            Ok(()) => Ok(()),
        }
    }

    /// Capture a still of the configured source.
    #[instrument(skip(self))]
    fn take_screenshot(&mut self) -> AppResult<()> {
        let result = self
            .orchestrator
            .take_screenshot(backend::session_plan(&self.config, self.pointer.clone()));
        self.persist_source_fallback();

        match result {
            Err(e) if e.is_silent() => {
                debug!(reason = %e, "Screenshot not taken");
                Ok(())
            }
            Err(e) => Err(AppError::from(e)),
            Ok(Some(path)) => {
                info!(path = %path.display(), "Screenshot saved");
                Ok(())
            }
            Ok(None) => Ok(()),
        }
    }

    fn persist_source_fallback(&mut self) {
        if let Some(kind) = self.orchestrator.take_source_fallback() {
            info!(%kind, "Switching video source");
            self.config.video.source = kind;
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to persist source change");
            }
        }
    }

    /// Push state changes to the tray. Returns what is now shown.
    fn sync_tray(&self, shown: (TrayIconState, u64)) -> (TrayIconState, u64) {
        let state = TrayIconState::from_session(
            self.orchestrator.state(),
            self.orchestrator.pending_stops().count(),
        );
        let elapsed = self.orchestrator.elapsed_clock().seconds();

        if state != shown.0 {
            self.send_tray(TrayCommand::SetState(state));
        }
        if state != shown.0 || elapsed != shown.1 {
            self.send_tray(TrayCommand::SetElapsed(elapsed));
        }

        (state, elapsed)
    }

    fn send_tray(&self, command: TrayCommand) {
        if let Err(e) = self.tray_proxy.send_event(command) {
            debug!(error = %e, "Tray event loop already closed");
        }
    }

    /// Handle tray menu events.
    #[instrument(skip(self))]
    async fn handle_tray_event(&mut self, event: MenuEvent) {
        let event_id = &event.id;

        if *event_id == self.menu_ids.record {
            if let Err(e) = self.toggle_recording() {
                error!(error = %e, "Failed to toggle recording");
            }
        } else if *event_id == self.menu_ids.pause {
            self.orchestrator.toggle_pause();
        } else if *event_id == self.menu_ids.screenshot {
            if let Err(e) = self.take_screenshot() {
                error!(error = %e, "Failed to take screenshot");
            }
        } else if *event_id == self.menu_ids.open_folder {
            self.open_output_folder();
        } else if *event_id == self.menu_ids.exit {
            info!("Exit requested from tray menu");
            if let Err(e) = self.command_tx.send(AppCommand::Shutdown).await {
                error!(error = ?e, "Failed to send shutdown command");
            }
        }
    }

    fn open_output_folder(&self) {
        let directory = &self.config.output.directory;
        if let Err(e) = fs::create_dir_all(directory) {
            warn!(directory = ?directory, error = %e, "Failed to create output folder");
            return;
        }
        match open::that(directory) {
            Ok(()) => info!(directory = ?directory, "Opened output folder"),
            Err(e) => warn!(directory = ?directory, error = %e, "Failed to open output folder"),
        }
    }
}
