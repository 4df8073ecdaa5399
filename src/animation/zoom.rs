use crate::animation::controller::AnimationKind;
use crate::core::constants::{INDICATOR_BASE_SHADE, INDICATOR_SIZE, INDICATOR_SHADE_RANGE};
use crate::core::geo::{MapPosition, ScreenPoint};

/// Snapshot of the view taken when an animated zoom starts.
///
/// The view itself jumps to the new zoom immediately. The transition keeps
/// what is needed to keep drawing the old frame on top while it fades out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomTransition {
    pub kind: AnimationKind,
    /// Top-left map position before the zoom, at the old zoom level.
    pub position: MapPosition,
    /// Viewport point that stays fixed during the zoom.
    pub pivot: ScreenPoint,
}

impl ZoomTransition {
    pub fn new(kind: AnimationKind, position: MapPosition, pivot: ScreenPoint) -> Self {
        Self {
            kind,
            position,
            pivot,
        }
    }

    /// Old zoom relative to the current one.
    pub fn zoom_offset(&self) -> i8 {
        match self.kind {
            AnimationKind::ZoomIn => -1,
            AnimationKind::ZoomOut => 1,
        }
    }

    /// Zoom level the old frame is drawn at.
    pub fn source_zoom(&self, current: u8) -> u8 {
        current.saturating_add_signed(self.zoom_offset())
    }

    /// Scale applied to the old frame around the pivot.
    pub fn scale_at(&self, factor: f64) -> f64 {
        match self.kind {
            AnimationKind::ZoomIn => 1.0 + factor,
            AnimationKind::ZoomOut => 1.0 - 0.5 * factor,
        }
    }

    pub fn opacity_at(&self, factor: f64) -> f32 {
        (1.0 - factor).clamp(0.0, 1.0) as f32
    }

    pub fn indicator_at(&self, factor: f64) -> Indicator {
        let scale = match self.kind {
            AnimationKind::ZoomIn => 1.0 + factor,
            AnimationKind::ZoomOut => 2.0 - factor,
        };
        Indicator {
            center: self.pivot,
            width: INDICATOR_SIZE.0,
            height: INDICATOR_SIZE.1,
            scale,
            shade: indicator_shade(factor),
        }
    }
}

/// Outline rectangle drawn around the pivot while zooming.
///
/// The rectangle is `width × height` centred on `center` before `scale` is
/// applied about the same point. `shade` is the grey level of its stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Indicator {
    pub center: ScreenPoint,
    pub width: i64,
    pub height: i64,
    pub scale: f64,
    pub shade: u8,
}

fn indicator_shade(factor: f64) -> u8 {
    let shade = INDICATOR_BASE_SHADE as f64 + (factor * INDICATOR_SHADE_RANGE).floor();
    shade.clamp(0.0, 255.0) as u8
}
