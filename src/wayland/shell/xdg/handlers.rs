mod positioner;
pub(crate) use positioner::positioner_request;

mod surface;
pub(crate) use surface::{popup_request, toplevel_request, xdg_surface_request};

mod wm_base;

pub(crate) use super::decoration::decoration_request;
