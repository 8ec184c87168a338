//! Compositor-wide policy knobs

use crate::utils::{Logical, Rectangle};
use crate::wayland::shell::xdg::{DecorationMode, ToplevelStates};

/// Highest `xdg_wm_base` version implemented
pub const XDG_WM_BASE_VERSION: u32 = 6;

/// Options of a [`Compositor`](crate::state::Compositor)
///
/// ```
/// use trellis::config::ShellConfig;
/// use trellis::utils::Rectangle;
///
/// let config = ShellConfig::default()
///     .with_xdg_version(3)
///     .with_popup_bounds(Rectangle::from((0, 0, 1920, 1080)));
/// assert_eq!(config.xdg_version, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Version of `xdg_wm_base` advertised to clients
    ///
    /// Clients binding a lower version keep it, higher versions are capped to this one.
    pub xdg_version: u32,
    /// States set on the initial configure of every toplevel
    pub initial_toplevel_states: ToplevelStates,
    /// Decoration mode suggested to toplevels that do not express a preference
    pub default_decoration_mode: DecorationMode,
    /// Area popups are constrained to, in global coordinates
    ///
    /// Overridden per popup by [`Compositor::set_popup_bounds`](crate::state::Compositor::set_popup_bounds).
    pub popup_bounds: Option<Rectangle<i32, Logical>>,
    /// Constrain popups without explicit bounds to the current output
    pub constrain_popups_to_output: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        ShellConfig {
            xdg_version: XDG_WM_BASE_VERSION,
            initial_toplevel_states: ToplevelStates::ACTIVATED,
            default_decoration_mode: DecorationMode::ClientSide,
            popup_bounds: None,
            constrain_popups_to_output: true,
        }
    }
}

impl ShellConfig {
    /// Set the advertised `xdg_wm_base` version
    pub fn with_xdg_version(mut self, version: u32) -> Self {
        self.xdg_version = version.clamp(1, XDG_WM_BASE_VERSION);
        self
    }

    /// Set the states of the initial toplevel configure
    pub fn with_initial_toplevel_states(mut self, states: ToplevelStates) -> Self {
        self.initial_toplevel_states = states;
        self
    }

    /// Set the default decoration mode
    pub fn with_default_decoration_mode(mut self, mode: DecorationMode) -> Self {
        self.default_decoration_mode = mode;
        self
    }

    /// Set the default popup bounds
    pub fn with_popup_bounds(mut self, bounds: Rectangle<i32, Logical>) -> Self {
        self.popup_bounds = Some(bounds);
        self
    }

    /// Whether to constrain popups to the current output
    pub fn with_popups_constrained_to_output(mut self, constrain: bool) -> Self {
        self.constrain_popups_to_output = constrain;
        self
    }
}
