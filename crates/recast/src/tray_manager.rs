//! System tray icon with state-based updates.
//!
//! Manages a system tray icon with four states (Idle, Recording, Paused,
//! Saving) and a context menu for recording control, screenshots, the output
//! folder and Exit.

use crate::{AppError, AppResult, TrayIconState};

use recast_core::overlay::format_elapsed;

use std::panic::Location;

use error_location::ErrorLocation;
use image::{Rgba, RgbaImage};
use tracing::{info, instrument};
use tray_icon::menu::{Menu, MenuId, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const ICON_SIZE: u32 = 32;

/// Menu item ids the async side matches tray events against.
#[derive(Debug, Clone)]
pub struct TrayMenuIds {
    /// Start or stop recording.
    pub record: MenuId,
    /// Pause or resume.
    pub pause: MenuId,
    /// Capture a still.
    pub screenshot: MenuId,
    /// Open the recordings folder.
    pub open_folder: MenuId,
    /// Quit after flushing recordings.
    pub exit: MenuId,
}

/// A filled disc in the state's color on a transparent square.
pub(crate) fn icon_image(state: TrayIconState) -> RgbaImage {
    let color = Rgba(state.color());
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 2.0;

    RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        if dx * dx + dy * dy <= radius * radius {
            color
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    record_item: MenuItem,
    pause_item: MenuItem,
    ids: TrayMenuIds,
    state: TrayIconState,
}

impl TrayManager {
    /// Create a new tray manager with initial state.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let record_item = MenuItem::new("Start Recording", true, None);
        let pause_item = MenuItem::new("Pause", false, None);
        let screenshot_item = MenuItem::new("Take Screenshot", true, None);
        let open_folder_item = MenuItem::new("Open Output Folder", true, None);
        let exit_item = MenuItem::new("Exit", true, None);

        let ids = TrayMenuIds {
            record: record_item.id().clone(),
            pause: pause_item.id().clone(),
            screenshot: screenshot_item.id().clone(),
            open_folder: open_folder_item.id().clone(),
            exit: exit_item.id().clone(),
        };

        for item in [
            &record_item,
            &pause_item,
            &screenshot_item,
            &open_folder_item,
            &exit_item,
        ] {
            menu.append(item).map_err(|e| AppError::TrayError {
                reason: format!("Failed to add menu item '{}': {}", item.text(), e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        let icon = Self::load_icon(TrayIconState::Idle)?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(TrayIconState::Idle.tooltip())
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            record_item,
            pause_item,
            ids,
            state: TrayIconState::Idle,
        })
    }

    /// Update the tray icon, tooltip and menu for a new state.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        self.tray_icon
            .set_icon(Some(Self::load_icon(state)?))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let active = matches!(state, TrayIconState::Recording | TrayIconState::Paused);
        self.record_item.set_text(if active {
            "Stop Recording"
        } else {
            "Start Recording"
        });
        self.pause_item.set_enabled(active);
        self.pause_item.set_text(if state == TrayIconState::Paused {
            "Resume"
        } else {
            "Pause"
        });

        self.state = state;
        self.set_tooltip(state.tooltip())
    }

    /// Append the session's running time to the tooltip.
    #[track_caller]
    pub fn update_elapsed(&mut self, seconds: u64) -> AppResult<()> {
        if !matches!(
            self.state,
            TrayIconState::Recording | TrayIconState::Paused
        ) {
            return Ok(());
        }
        let tooltip = format!("{} {}", self.state.tooltip(), format_elapsed(seconds));
        self.set_tooltip(&tooltip)
    }

    /// Menu item ids.
    pub fn menu_ids(&self) -> &TrayMenuIds {
        &self.ids
    }

    #[track_caller]
    fn set_tooltip(&self, tooltip: &str) -> AppResult<()> {
        self.tray_icon
            .set_tooltip(Some(tooltip))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    #[track_caller]
    fn load_icon(state: TrayIconState) -> AppResult<Icon> {
        let rgba = icon_image(state);
        let (width, height) = (rgba.width(), rgba.height());

        Icon::from_rgba(rgba.into_raw(), width, height).map_err(|e| AppError::TrayError {
            reason: format!("Failed to create icon from RGBA: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
