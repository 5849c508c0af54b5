//! # Errors
//!
//! Every fallible operation in the studio returns a [`StudioError`]. None of them is
//! surfaced to the user: the handler that receives one logs it and falls back to a
//! degraded mode (canvas appended to the body, movement disabled, solid-color material,
//! or a halted frame loop).

use std::path::PathBuf;

/// Errors produced while setting up or running the studio.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// A UI host element the page was expected to provide is missing.
    #[error("missing UI element `#{0}`")]
    MissingElement(&'static str),

    /// The platform cannot capture the pointer, so first-person look and movement are off.
    #[error("pointer lock is unavailable: {0}")]
    PointerLockUnavailable(String),

    /// An optional asset could not be read or decoded.
    #[error("failed to load asset {path}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    /// Asset loading is not supported on this target.
    #[error("asset loading is not supported on this platform ({0})")]
    AssetsUnsupported(PathBuf),

    /// The configuration file exists but could not be used.
    #[error("invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("failed to create a rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter was found")]
    NoAdapter,

    #[error("the surface offers no texture format on this adapter")]
    NoSurfaceFormat,

    #[error("failed to request a GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to acquire the next surface texture: {0}")]
    SurfaceTexture(#[from] wgpu::SurfaceError),

    #[error("event loop failure: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// A frame tick observed state it cannot continue from.
    #[error("frame tick failed: {0}")]
    Tick(String),
}
