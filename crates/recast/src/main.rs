//! Recast: tray-driven screen and audio recorder with global hotkey control.

mod app;
mod app_command;
mod backend;
mod config;
mod error;
mod hotkey_handler;
mod surfaces;
#[cfg(test)]
mod tests;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::{TrayManager, TrayMenuIds},
};

use crate::{
    backend::{CommandProbe, EnigoPointer, MicrophoneSource},
    config::Config,
    surfaces::{ConfiguredRegion, DesktopShell, HeadlessPreview, NotificationSurface},
};

use recast_core::{
    Orchestrator, OrchestratorDeps,
    overlay::{OverlayDeps, PointerTracker},
};

use std::sync::Arc;

use global_hotkey::GlobalHotKeyManager;
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{mpsc, watch};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn orchestrator_deps(config: &Config, pointer: Arc<dyn PointerTracker>) -> OrchestratorDeps {
    OrchestratorDeps {
        messages: Arc::new(NotificationSurface::new(config.behaviour.confirm_default)),
        shell: Arc::new(DesktopShell),
        region: Arc::new(ConfiguredRegion),
        preview: Arc::new(HeadlessPreview),
        encoders: Arc::new(CommandProbe),
        audio: Arc::new(MicrophoneSource),
        overlays: OverlayDeps {
            pointer: Some(pointer),
            ..OverlayDeps::default()
        },
    }
}

/// Application entry point.
fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("recast=debug,recast_core=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new() {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Dropping it unregisters the hotkeys.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                let updated = match cmd {
                    TrayCommand::SetState(state) => tray_manager.update_state(state),
                    TrayCommand::SetElapsed(seconds) => tray_manager.update_elapsed(seconds),
                    TrayCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                        Ok(())
                    }
                };
                if let Err(e) = updated {
                    error!(error = ?e, "Failed to update tray icon");
                }
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let config = match Config::load() {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let (command_tx, command_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);

                // Register on the main thread: tao's event loop pumps the
                // Windows messages needed for WM_HOTKEY delivery.
                let (manager, hotkey_ids) = match HotkeyHandler::register_hotkeys() {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Failed to register hotkeys: {:?}", e);
                        std::process::exit(1);
                    }
                };
                hotkey_manager = Some(manager);

                let tray_proxy = tray_proxy.clone();
                let menu_ids = tray_manager.menu_ids().clone();

                // TrayManager and hotkey_manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let hotkey_handler = HotkeyHandler::new(hotkey_ids, command_tx.clone());
                        let pointer: Arc<dyn PointerTracker> = EnigoPointer::spawn();
                        let (orchestrator, session_events) =
                            Orchestrator::new(orchestrator_deps(&config, Arc::clone(&pointer)));

                        let app = App {
                            orchestrator,
                            session_events,
                            config,
                            tray_proxy,
                            command_tx,
                            command_rx,
                            shutdown_tx,
                            menu_ids,
                            pointer: Some(pointer),
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }

        // Keep hotkey_manager alive in the closure for the app's lifetime.
        let _ = &hotkey_manager;
    });
}
