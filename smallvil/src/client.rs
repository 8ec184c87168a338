//! A well-behaved client, following the xdg_shell handshake

use tracing::{error, info};
use trellis::{
    config::XDG_WM_BASE_VERSION,
    state::Compositor,
    utils::{ClientId, Logical, Rectangle, Serial, Size, SurfaceId},
    wayland::{
        compositor::BufferInfo,
        protocol::{
            ClientEvent, PopupRequest, PositionerRequest, Request, SurfaceRequest, ToplevelRequest,
            XdgSurfaceRequest,
        },
        shell::xdg::{Anchor, ConstraintAdjustment, Gravity},
    },
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

pub struct ScriptedClient {
    pub id: ClientId,
    pub window: SurfaceId,
    pub menu: Option<SurfaceId>,
    closed: bool,
}

impl ScriptedClient {
    pub fn connect(compositor: &Compositor, title: &str) -> Result<Self> {
        let id = compositor.new_client(XDG_WM_BASE_VERSION);
        let window = compositor.create_surface(id)?;
        compositor.dispatch(id, Request::XdgSurface(window, XdgSurfaceRequest::Create))?;
        compositor.dispatch(id, Request::XdgSurface(window, XdgSurfaceRequest::GetToplevel))?;
        compositor.dispatch(id, Request::Toplevel(window, ToplevelRequest::SetTitle(title.into())))?;
        compositor.dispatch(
            id,
            Request::Toplevel(window, ToplevelRequest::SetAppId("org.trellis.smallvil".into())),
        )?;
        // initial commit, without a buffer
        compositor.dispatch(id, Request::Surface(window, SurfaceRequest::Commit))?;
        Ok(ScriptedClient {
            id,
            window,
            menu: None,
            closed: false,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn request(&self, compositor: &Compositor, request: Request) -> Result<()> {
        compositor.dispatch(self.id, request)?;
        Ok(())
    }

    /// Open a menu below the given area of the window
    pub fn open_menu(&mut self, compositor: &Compositor, anchor: Rectangle<i32, Logical>) -> Result<()> {
        let positioner = compositor.create_positioner(self.id)?;
        for request in [
            PositionerRequest::SetSize((200, 300).into()),
            PositionerRequest::SetAnchorRect(anchor),
            PositionerRequest::SetAnchor(Anchor::BottomLeft),
            PositionerRequest::SetGravity(Gravity::BottomRight),
            PositionerRequest::SetConstraintAdjustment(
                ConstraintAdjustment::FLIP_Y | ConstraintAdjustment::SLIDE_X,
            ),
            PositionerRequest::SetReactive,
        ] {
            self.request(compositor, Request::Positioner(positioner, request))?;
        }

        let menu = compositor.create_surface(self.id)?;
        self.request(compositor, Request::XdgSurface(menu, XdgSurfaceRequest::Create))?;
        self.request(
            compositor,
            Request::XdgSurface(
                menu,
                XdgSurfaceRequest::GetPopup {
                    parent: Some(self.window),
                    positioner,
                },
            ),
        )?;
        self.request(compositor, Request::Positioner(positioner, PositionerRequest::Destroy))?;
        self.request(compositor, Request::Surface(menu, SurfaceRequest::Commit))?;
        self.menu = Some(menu);
        Ok(())
    }

    /// Process the events sent by the compositor
    pub fn dispatch_events(&mut self, compositor: &Compositor) -> Result<()> {
        for event in compositor.drain_client_events(self.id) {
            match event {
                ClientEvent::ToplevelConfigure {
                    surface, serial, size, states, ..
                } => {
                    info!(%surface, %serial, ?size, ?states, "configure");
                    let size = size.unwrap_or_else(|| (640, 480).into());
                    self.redraw(compositor, surface, serial, size)?;
                }
                ClientEvent::PopupConfigure {
                    surface,
                    serial,
                    geometry,
                } => {
                    info!(%surface, %serial, ?geometry, "popup configure");
                    self.redraw(compositor, surface, serial, geometry.size)?;
                }
                ClientEvent::PopupDone { surface } => {
                    self.request(compositor, Request::Popup(surface, PopupRequest::Destroy))?;
                    self.destroy_xdg_surface(compositor, surface)?;
                    self.menu = None;
                }
                ClientEvent::Close { surface } => {
                    self.request(compositor, Request::Toplevel(surface, ToplevelRequest::Destroy))?;
                    self.destroy_xdg_surface(compositor, surface)?;
                    self.closed = true;
                }
                ClientEvent::Error { interface, code, message } => {
                    error!(interface, code, %message, "protocol error");
                    self.closed = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn redraw(
        &self,
        compositor: &Compositor,
        surface: SurfaceId,
        serial: Serial,
        size: Size<i32, Logical>,
    ) -> Result<()> {
        self.request(
            compositor,
            Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(serial)),
        )?;
        let buffer = BufferInfo {
            size: (size.w, size.h).into(),
        };
        self.request(compositor, Request::Surface(surface, SurfaceRequest::Attach(Some(buffer))))?;
        self.request(
            compositor,
            Request::Surface(surface, SurfaceRequest::DamageBuffer(Rectangle::from((0, 0, size.w, size.h)))),
        )?;
        self.request(compositor, Request::Surface(surface, SurfaceRequest::Commit))
    }

    fn destroy_xdg_surface(&self, compositor: &Compositor, surface: SurfaceId) -> Result<()> {
        self.request(compositor, Request::XdgSurface(surface, XdgSurfaceRequest::Destroy))?;
        self.request(compositor, Request::Surface(surface, SurfaceRequest::Destroy))
    }
}
