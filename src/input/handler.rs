use crate::core::constants::MOVE_STEP;
use crate::core::geo::{MapPosition, ScreenPoint, ScreenSize};
use crate::input::events::{InputEvent, KeyCode, MouseButton};

/// What the map should do in response to input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Place the viewport's top-left corner at a map position (drag)
    MoveTo(MapPosition),
    /// Shift the viewport by a pixel offset
    Pan { dx: i64, dy: i64 },
    /// Zoom one level in, keeping `pivot` fixed
    ZoomIn { pivot: ScreenPoint, animate: bool },
    /// Zoom one level out, keeping `pivot` fixed
    ZoomOut { pivot: ScreenPoint, animate: bool },
    /// Centre the view on the map point under a viewport point
    Recenter(ScreenPoint),
    Resize(ScreenSize),
}

/// Where a drag started, in both viewport and map space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DragAnchor {
    screen: ScreenPoint,
    position: MapPosition,
}

/// Translates raw input into [`Action`]s and tracks pointer state.
#[derive(Debug, Clone)]
pub struct InputHandler {
    pub enabled: bool,
    pub zoom_on_wheel: bool,
    pub zoom_on_double_click: bool,
    pub pan_on_drag: bool,
    pub keyboard: bool,
    drag: Option<DragAnchor>,
    cursor: ScreenPoint,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            enabled: true,
            zoom_on_wheel: true,
            zoom_on_double_click: true,
            pan_on_drag: true,
            keyboard: true,
            drag: None,
            cursor: ScreenPoint::default(),
        }
    }

    /// Last known pointer position.
    pub fn cursor(&self) -> ScreenPoint {
        self.cursor
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Forgets the drag anchor. Zoom animations call this because the anchor's
    /// map position belongs to the old zoom level.
    pub fn clear_drag(&mut self) {
        self.drag = None;
    }

    /// Handle one event. `position` is the view's current top-left map position
    /// and `size` its viewport size.
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        position: MapPosition,
        size: ScreenSize,
    ) -> Vec<Action> {
        if !self.enabled {
            return vec![];
        }
        if let Some(pointer) = event.position() {
            self.cursor = pointer;
        }

        let mut actions = vec![];
        match *event {
            InputEvent::Click { position, button } => {
                if button == MouseButton::Middle {
                    actions.push(Action::Recenter(position));
                }
            }
            InputEvent::DoubleClick { position, button } => {
                if self.zoom_on_double_click {
                    match button {
                        MouseButton::Left => actions.push(Action::ZoomIn {
                            pivot: position,
                            animate: true,
                        }),
                        MouseButton::Right => actions.push(Action::ZoomOut {
                            pivot: position,
                            animate: true,
                        }),
                        _ => {}
                    }
                }
            }
            InputEvent::MouseMove { .. } => {}
            InputEvent::DragStart { position: screen } => {
                if self.pan_on_drag {
                    self.drag = Some(DragAnchor { screen, position });
                }
            }
            InputEvent::Drag { position: screen } => {
                if let Some(action) = self.drag_to(screen) {
                    actions.push(action);
                }
            }
            InputEvent::DragEnd { position: screen } => {
                if let Some(action) = self.drag_to(screen) {
                    actions.push(action);
                }
                self.drag = None;
            }
            InputEvent::Scroll { delta, position } => {
                if self.zoom_on_wheel && delta != 0.0 {
                    actions.push(if delta > 0.0 {
                        Action::ZoomIn {
                            pivot: position,
                            animate: true,
                        }
                    } else {
                        Action::ZoomOut {
                            pivot: position,
                            animate: true,
                        }
                    });
                }
            }
            InputEvent::KeyPress { key } => {
                if self.keyboard {
                    if let Some(action) = key_action(key, size) {
                        actions.push(action);
                    }
                }
            }
            InputEvent::Resize { size } => actions.push(Action::Resize(size)),
        }

        actions
    }

    fn drag_to(&self, screen: ScreenPoint) -> Option<Action> {
        let anchor = self.drag?;
        Some(Action::MoveTo(MapPosition::new(
            anchor.position.x + anchor.screen.x - screen.x,
            anchor.position.y + anchor.screen.y - screen.y,
        )))
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn key_action(key: KeyCode, size: ScreenSize) -> Option<Action> {
    let action = match key {
        KeyCode::ArrowUp => Action::Pan {
            dx: 0,
            dy: -MOVE_STEP,
        },
        KeyCode::ArrowDown => Action::Pan {
            dx: 0,
            dy: MOVE_STEP,
        },
        KeyCode::ArrowLeft => Action::Pan {
            dx: -MOVE_STEP,
            dy: 0,
        },
        KeyCode::ArrowRight => Action::Pan {
            dx: MOVE_STEP,
            dy: 0,
        },
        KeyCode::Plus => Action::ZoomIn {
            pivot: size.center(),
            animate: true,
        },
        KeyCode::Minus => Action::ZoomOut {
            pivot: size.center(),
            animate: true,
        },
        KeyCode::Other(_) => return None,
    };
    Some(action)
}
