mod config;
mod surfaces;
mod tray;
