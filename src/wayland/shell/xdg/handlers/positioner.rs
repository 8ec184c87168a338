use tracing::trace;

use crate::state::State;
use crate::utils::{ClientId, PositionerId};
use crate::wayland::protocol::{PositionerRequest, ProtocolError};

pub(crate) fn positioner_request(
    state: &mut State,
    client: ClientId,
    id: PositionerId,
    request: PositionerRequest,
) -> Result<(), ProtocolError> {
    let data = state
        .positioners
        .get_mut(&id)
        .filter(|p| p.client == client)
        .ok_or_else(|| ProtocolError::InvalidObject(id.to_string()))?;
    trace!(positioner = %id, ?request, "xdg_positioner request");

    let positioner = &mut data.state;
    match request {
        PositionerRequest::SetSize(size) => {
            if size.w < 1 || size.h < 1 {
                return Err(ProtocolError::InvalidInput("invalid size for positioner"));
            }
            positioner.rect_size = size;
        }
        PositionerRequest::SetAnchorRect(rect) => {
            if rect.size.w < 0 || rect.size.h < 0 {
                return Err(ProtocolError::InvalidInput("invalid size for positioner's anchor rectangle"));
            }
            positioner.anchor_rect = rect;
        }
        PositionerRequest::SetAnchor(anchor) => positioner.anchor_edges = anchor,
        PositionerRequest::SetGravity(gravity) => positioner.gravity = gravity,
        PositionerRequest::SetConstraintAdjustment(adjustment) => {
            positioner.constraint_adjustment = adjustment;
        }
        PositionerRequest::SetOffset(offset) => positioner.offset = offset,
        PositionerRequest::SetReactive => positioner.reactive = true,
        PositionerRequest::SetParentSize(size) => positioner.parent_size = Some(size),
        PositionerRequest::SetParentConfigure(serial) => positioner.parent_configure = Some(serial),
        PositionerRequest::Destroy => {
            state.positioners.shift_remove(&id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::ShellConfig;
    use crate::state::Compositor;
    use crate::utils::Rectangle;
    use crate::wayland::protocol::{PositionerRequest, ProtocolError, Request};

    #[test]
    fn zero_size_is_invalid_input() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let positioner = compositor.create_positioner(client).unwrap();
        let result = compositor.dispatch(
            client,
            Request::Positioner(positioner, PositionerRequest::SetSize((0, 10).into())),
        );
        assert!(matches!(result, Err(ProtocolError::InvalidInput(_))));
    }

    #[test]
    fn negative_anchor_rect_is_invalid_input() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let positioner = compositor.create_positioner(client).unwrap();
        let result = compositor.dispatch(
            client,
            Request::Positioner(
                positioner,
                PositionerRequest::SetAnchorRect(Rectangle::from((0, 0, -1, 10))),
            ),
        );
        assert!(matches!(result, Err(ProtocolError::InvalidInput(_))));
    }

    #[test]
    fn destroyed_positioner_is_gone() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let positioner = compositor.create_positioner(client).unwrap();
        compositor
            .dispatch(client, Request::Positioner(positioner, PositionerRequest::Destroy))
            .unwrap();
        let result = compositor.dispatch(client, Request::Positioner(positioner, PositionerRequest::SetReactive));
        assert!(matches!(result, Err(ProtocolError::InvalidObject(_))));
    }
}
