//! # Assets
//!
//! Optional images under the asset root:
//!
//! - `textures/skybox/{px,nx,py,ny,pz,nz}.jpg`
//! - `textures/ground.jpg`
//! - `textures/demo_texture.jpg`
//!
//! Every one of them has a solid-color fallback, so loading never stops the studio. The
//! `*_or_fallback` helpers log the failure and return `None`. The caller then keeps the
//! plain material color.
//!
//! Native builds decode with the `image` crate. WebAssembly builds have no synchronous
//! file access and always report [`StudioError::AssetsUnsupported`].

use std::path::{Path, PathBuf};

use crate::error::StudioError;
use crate::graph::TextureImage;

/// Cube-map face file stems in `px, nx, py, ny, pz, nz` order.
pub const SKYBOX_FACES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

pub fn ground_texture_path(root: &Path) -> PathBuf {
    root.join("textures").join("ground.jpg")
}

pub fn demo_texture_path(root: &Path) -> PathBuf {
    root.join("textures").join("demo_texture.jpg")
}

pub fn skybox_dir(root: &Path) -> PathBuf {
    root.join("textures").join("skybox")
}

/// Decodes an encoded image into RGBA8.
pub fn decode_texture(path: &Path, bytes: &[u8]) -> Result<TextureImage, StudioError> {
    let image = image::load_from_memory(bytes).map_err(|e| StudioError::AssetLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let rgba = image.to_rgba8();
    Ok(TextureImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_texture(path: &Path) -> Result<TextureImage, StudioError> {
    let bytes = std::fs::read(path).map_err(|e| StudioError::AssetLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    decode_texture(path, &bytes)
}

#[cfg(target_arch = "wasm32")]
pub fn load_texture(path: &Path) -> Result<TextureImage, StudioError> {
    Err(StudioError::AssetsUnsupported(path.to_path_buf()))
}

/// Loads all six faces. They must be square and share one size.
pub fn load_skybox(dir: &Path) -> Result<Vec<TextureImage>, StudioError> {
    let faces = SKYBOX_FACES
        .iter()
        .map(|face| load_texture(&dir.join(format!("{face}.jpg"))))
        .collect::<Result<Vec<_>, _>>()?;

    let (width, height) = (faces[0].width, faces[0].height);
    if width != height || faces.iter().any(|f| f.width != width || f.height != height) {
        return Err(StudioError::AssetLoad {
            path: dir.to_path_buf(),
            reason: "skybox faces must be square and all the same size".to_string(),
        });
    }
    Ok(faces)
}

pub fn texture_or_fallback(path: &Path) -> Option<TextureImage> {
    match load_texture(path) {
        Ok(texture) => {
            log::info!(
                "Loaded texture {} ({}x{})",
                path.display(),
                texture.width,
                texture.height
            );
            Some(texture)
        }
        Err(error) => {
            log::warn!("{error}; using a solid color instead");
            None
        }
    }
}

pub fn skybox_or_fallback(dir: &Path) -> Option<Vec<TextureImage>> {
    match load_skybox(dir) {
        Ok(faces) => {
            log::info!("Loaded skybox from {}", dir.display());
            Some(faces)
        }
        Err(error) => {
            log::warn!("{error}; using the background color instead");
            None
        }
    }
}
