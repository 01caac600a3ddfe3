//! Selection state for the region overlay

use super::geometry::Rect;

/// Drag state for rectangle selection handles
#[repr(u8)]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    #[default]
    None,
    /// North-West corner
    NW,
    /// North edge
    N,
    /// North-East corner
    NE,
    /// East edge
    E,
    /// South-East corner
    SE,
    /// South edge
    S,
    /// South-West corner
    SW,
    /// West edge
    W,
}

impl From<u8> for DragState {
    fn from(state: u8) -> Self {
        match state {
            0 => DragState::None,
            1 => DragState::NW,
            2 => DragState::N,
            3 => DragState::NE,
            4 => DragState::E,
            5 => DragState::SE,
            6 => DragState::S,
            7 => DragState::SW,
            8 => DragState::W,
            _ => DragState::None,
        }
    }
}

impl From<DragState> for u8 {
    fn from(state: DragState) -> Self {
        match state {
            DragState::None => 0,
            DragState::NW => 1,
            DragState::N => 2,
            DragState::NE => 3,
            DragState::E => 4,
            DragState::SE => 5,
            DragState::S => 6,
            DragState::SW => 7,
            DragState::W => 8,
        }
    }
}

/// The rectangle the user has drawn, plus the handle currently being dragged.
///
/// The rect is in global logical coordinates so a selection can span outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub rect: Rect,
    pub drag: DragState,
}

impl Selection {
    pub fn new(rect: Rect, drag: DragState) -> Self {
        Self { rect, drag }
    }

    /// Whether the selection encloses any pixels at all
    pub fn is_empty(&self) -> bool {
        self.rect.dimensions().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_state_roundtrip() {
        for raw in 0u8..=8 {
            let state = DragState::from(raw);
            assert_eq!(u8::from(state), raw);
        }
    }

    #[test]
    fn test_default_selection_is_empty() {
        assert!(Selection::default().is_empty());
    }

    #[test]
    fn test_selection_with_area_is_not_empty() {
        let sel = Selection::new(Rect::new(0, 0, 10, 10), DragState::None);
        assert!(!sel.is_empty());
    }
}
