//! Constants used throughout the application

/// Circle size derivation: `circle = RADIUS_SCALER / (RES_SCALER / max_res)`
pub const RADIUS_SCALER: f64 = 10.0;

/// Reference resolution for size auto-derivation
pub const RES_SCALER: f64 = 1500.0;

/// Font size derivation: `font = FONT_SCALER / (RES_SCALER / max_res)`
pub const FONT_SCALER: f64 = 0.8;

/// Default polyline thickness for path plots
pub const DEFAULT_LINE_THICKNESS: i32 = 2;

/// Default label font thickness for path plots
pub const DEFAULT_FONT_THICKNESS: i32 = 2;

/// Default trajectory history length in seconds of frames
pub const DEFAULT_HISTORY_SECONDS: f64 = 2.0;

/// Fill value for windowed statistics before the window is full
pub const UNFILLED_WINDOW_SENTINEL: f64 = -1.0;

/// Fill value for border distances before the window is full
pub const UNFILLED_BORDER_SENTINEL: i32 = -1;

/// Trailing window for rolling velocity aggregation, in seconds
pub const VELOCITY_WINDOW_SECONDS: f64 = 1.0;

/// Millimetres per centimetre, for px/mm to cm conversions
pub const MM_PER_CM: f64 = 10.0;
