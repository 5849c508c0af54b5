//! Translation from `winit` input to the studio's [`Key`] and [`MouseButton`].

use winit::keyboard::KeyCode;

use super::{Key, MouseButton};

/// WASD or arrows move, Space jumps, Tab or `I` toggles the UI panel.
pub fn key_from_code(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Key::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Key::Backward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::Space => Some(Key::Jump),
        KeyCode::Tab | KeyCode::KeyI => Some(Key::ToggleUi),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

pub fn mouse_button_from_winit(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasd_and_arrows_share_bindings() {
        assert_eq!(key_from_code(KeyCode::KeyW), key_from_code(KeyCode::ArrowUp));
        assert_eq!(key_from_code(KeyCode::KeyA), Some(Key::Left));
        assert_eq!(key_from_code(KeyCode::ArrowRight), Some(Key::Right));
    }

    #[test]
    fn test_ui_toggle_keys() {
        assert_eq!(key_from_code(KeyCode::Tab), Some(Key::ToggleUi));
        assert_eq!(key_from_code(KeyCode::KeyI), Some(Key::ToggleUi));
        assert_eq!(key_from_code(KeyCode::KeyQ), None);
    }
}
