//! Global hotkeys for recording control.
//!
//! Registers CTRL+SHIFT+R (start/stop), CTRL+SHIFT+P (pause/resume) and
//! CTRL+SHIFT+S (screenshot) and forwards presses to the application as
//! [`AppCommand`]s. The session state itself lives in the orchestrator, so
//! this handler is stateless.

use crate::{AppCommand, AppError, AppResult};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey, Modifiers},
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Ids of the registered hotkeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyIds {
    /// Start/stop recording.
    pub record: u32,
    /// Pause/resume.
    pub pause: u32,
    /// Screenshot.
    pub screenshot: u32,
}

/// Forwards global hotkey presses as application commands.
pub struct HotkeyHandler {
    ids: HotkeyIds,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Register the recording hotkeys.
    ///
    /// Must be called on a thread with a message pump (e.g. the main thread
    /// running a `tao`/`winit` event loop) so that `WM_HOTKEY` messages are
    /// dispatched on Windows. The returned [`GlobalHotKeyManager`] must be
    /// kept alive on that thread for the hotkeys to remain registered.
    #[track_caller]
    #[instrument]
    pub fn register_hotkeys() -> AppResult<(GlobalHotKeyManager, HotkeyIds)> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let modifiers = Some(Modifiers::CONTROL | Modifiers::SHIFT);
        let record = HotKey::new(modifiers, Code::KeyR);
        let pause = HotKey::new(modifiers, Code::KeyP);
        let screenshot = HotKey::new(modifiers, Code::KeyS);

        for (hotkey, label) in [
            (record, "CTRL+SHIFT+R"),
            (pause, "CTRL+SHIFT+P"),
            (screenshot, "CTRL+SHIFT+S"),
        ] {
            manager
                .register(hotkey)
                .map_err(|e| AppError::HotkeyRegistrationFailed {
                    reason: format!("Failed to register {}: {}", label, e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            info!(hotkey = label, "Global hotkey registered");
        }

        Ok((
            manager,
            HotkeyIds {
                record: record.id(),
                pause: pause.id(),
                screenshot: screenshot.id(),
            },
        ))
    }

    /// Create a handler for previously registered hotkeys.
    ///
    /// This struct is `Send` and can live on any thread; it only listens on
    /// the global [`GlobalHotKeyEvent`] channel.
    pub fn new(ids: HotkeyIds, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { ids, command_tx }
    }

    /// Command bound to a hotkey id.
    pub fn command_for(&self, hotkey_id: u32) -> Option<AppCommand> {
        if hotkey_id == self.ids.record {
            Some(AppCommand::ToggleRecording)
        } else if hotkey_id == self.ids.pause {
            Some(AppCommand::TogglePause)
        } else if hotkey_id == self.ids.screenshot {
            Some(AppCommand::Screenshot)
        } else {
            None
        }
    }

    /// Run the hotkey handler event loop until shutdown is signalled.
    #[instrument(skip(self))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // GlobalHotKeyEvent::receiver() is a crossbeam channel with a blocking
        // recv(). Dropping event_rx makes the next blocking_send() fail, which
        // ends the forwarder.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    // key-up events would toggle a second time
                    if event.state == HotKeyState::Pressed {
                        self.dispatch(event.id).await?;
                    }
                }
            }
        }

        drop(event_rx);

        // The forwarder may sit in recv() until the next hotkey event; it is
        // cleaned up on process exit regardless.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// Send the command bound to `hotkey_id`, if any.
    #[instrument(skip(self))]
    pub async fn dispatch(&self, hotkey_id: u32) -> AppResult<()> {
        let Some(command) = self.command_for(hotkey_id) else {
            debug!("Ignoring unknown hotkey");
            return Ok(());
        };

        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send {:?}: {}", command, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(?command, "Hotkey command sent");
        Ok(())
    }
}
