//! Fullscreen rectangle selection widget
//!
//! Paints a dimming layer over the frozen screenshot with a hole for the
//! current selection, and turns mouse drags into selection updates. State
//! round-trips through messages: the parent stores the rect and drag state
//! and rebuilds the widget each frame.

use cosmic::{
    iced::mouse,
    iced_core::{
        self, Border, Color, Length, Point, Rectangle, Shadow, Size, layout::Node, renderer::Quad,
    },
    iced_core::Renderer,
    widget::Widget,
};

use crate::domain::{DragState, Rect};

const EDGE_GRAB_THICKNESS: f32 = 8.0;
const CORNER_DIAMETER: f32 = 16.0;

pub struct RectangleSelection<Msg> {
    output_rect: Rect,
    selection: Rect,
    drag_state: DragState,
    on_rectangle: Box<dyn Fn(DragState, Rect) -> Msg>,
    on_release: Msg,
}

impl<Msg: Clone> RectangleSelection<Msg> {
    pub fn new(
        output_rect: Rect,
        selection: Rect,
        drag_state: DragState,
        on_rectangle: impl Fn(DragState, Rect) -> Msg + 'static,
        on_release: Msg,
    ) -> Self {
        Self {
            output_rect,
            selection,
            drag_state,
            on_rectangle: Box::new(on_rectangle),
            on_release,
        }
    }

    /// Selection translated into output-local coordinates
    fn translated_inner_rect(&self) -> Rectangle {
        let inner_rect = self.selection;
        let inner_rect = Rectangle::new(
            Point::new(inner_rect.left as f32, inner_rect.top as f32),
            Size::new(
                (inner_rect.right - inner_rect.left).abs() as f32,
                (inner_rect.bottom - inner_rect.top).abs() as f32,
            ),
        );
        Rectangle::new(
            Point::new(
                inner_rect.x - self.output_rect.left as f32,
                inner_rect.y - self.output_rect.top as f32,
            ),
            inner_rect.size(),
        )
    }

    /// Which handle the cursor would grab
    fn grab_state(&self, cursor: mouse::Cursor) -> DragState {
        let inner_rect = self.translated_inner_rect();

        let corners = [
            (DragState::NW, inner_rect.x, inner_rect.y),
            (DragState::NE, inner_rect.x + inner_rect.width, inner_rect.y),
            (
                DragState::SW,
                inner_rect.x,
                inner_rect.y + inner_rect.height,
            ),
            (
                DragState::SE,
                inner_rect.x + inner_rect.width,
                inner_rect.y + inner_rect.height,
            ),
        ];
        for (state, x, y) in corners {
            let corner_rect = Rectangle::new(
                Point::new(x - CORNER_DIAMETER / 2.0, y - CORNER_DIAMETER / 2.0),
                Size::new(CORNER_DIAMETER, CORNER_DIAMETER),
            );
            if cursor.is_over(corner_rect) {
                return state;
            }
        }

        let edges = [
            (
                DragState::N,
                Rectangle::new(
                    Point::new(inner_rect.x, inner_rect.y - EDGE_GRAB_THICKNESS / 2.0),
                    Size::new(inner_rect.width, EDGE_GRAB_THICKNESS),
                ),
            ),
            (
                DragState::S,
                Rectangle::new(
                    Point::new(
                        inner_rect.x,
                        inner_rect.y + inner_rect.height - EDGE_GRAB_THICKNESS / 2.0,
                    ),
                    Size::new(inner_rect.width, EDGE_GRAB_THICKNESS),
                ),
            ),
            (
                DragState::W,
                Rectangle::new(
                    Point::new(inner_rect.x - EDGE_GRAB_THICKNESS / 2.0, inner_rect.y),
                    Size::new(EDGE_GRAB_THICKNESS, inner_rect.height),
                ),
            ),
            (
                DragState::E,
                Rectangle::new(
                    Point::new(
                        inner_rect.x + inner_rect.width - EDGE_GRAB_THICKNESS / 2.0,
                        inner_rect.y,
                    ),
                    Size::new(EDGE_GRAB_THICKNESS, inner_rect.height),
                ),
            ),
        ];
        for (state, rect) in edges {
            if cursor.is_over(rect) {
                return state;
            }
        }
        DragState::None
    }

    fn handle_drag_pos(&mut self, x: i32, y: i32, shell: &mut iced_core::Shell<'_, Msg>) {
        let prev = self.selection;

        let d_x = self.output_rect.left + x;
        let d_y = self.output_rect.top + y;

        let prev_state = self.drag_state;
        let reflection_point = match prev_state {
            DragState::None => return,
            DragState::NW => (prev.right, prev.bottom),
            DragState::N => (0, prev.bottom),
            DragState::NE => (prev.left, prev.bottom),
            DragState::E => (prev.left, 0),
            DragState::SE => (prev.left, prev.top),
            DragState::S => (0, prev.top),
            DragState::SW => (prev.right, prev.top),
            DragState::W => (prev.right, 0),
        };

        // A drag past the opposite corner flips which handle is being held
        let new_drag_state = match prev_state {
            DragState::SE | DragState::NW | DragState::NE | DragState::SW => {
                if d_x < reflection_point.0 && d_y < reflection_point.1 {
                    DragState::NW
                } else if d_x > reflection_point.0 && d_y > reflection_point.1 {
                    DragState::SE
                } else if d_x > reflection_point.0 && d_y < reflection_point.1 {
                    DragState::NE
                } else if d_x < reflection_point.0 && d_y > reflection_point.1 {
                    DragState::SW
                } else {
                    prev_state
                }
            }
            DragState::N | DragState::S => {
                if d_y < reflection_point.1 {
                    DragState::N
                } else {
                    DragState::S
                }
            }
            DragState::E | DragState::W => {
                if d_x > reflection_point.0 {
                    DragState::E
                } else {
                    DragState::W
                }
            }

            DragState::None => DragState::None,
        };
        let top_left = match new_drag_state {
            DragState::NW => (d_x, d_y),
            DragState::NE => (reflection_point.0, d_y),
            DragState::SE => (reflection_point.0, reflection_point.1),
            DragState::SW => (d_x, reflection_point.1),
            DragState::N => (prev.left, d_y),
            DragState::E => (reflection_point.0, prev.top),
            DragState::S => (prev.left, reflection_point.1),
            DragState::W => (d_x, prev.top),
            DragState::None => (prev.left, prev.top),
        };

        let bottom_right = match new_drag_state {
            DragState::NW => (reflection_point.0, reflection_point.1),
            DragState::NE => (d_x, reflection_point.1),
            DragState::SE => (d_x, d_y),
            DragState::SW => (reflection_point.0, d_y),
            DragState::N => (prev.right, reflection_point.1),
            DragState::E => (d_x, prev.bottom),
            DragState::S => (prev.right, d_y),
            DragState::W => (reflection_point.0, prev.bottom),
            DragState::None => (prev.right, prev.bottom),
        };
        let new_rect = Rect {
            left: top_left.0,
            top: top_left.1,
            right: bottom_right.0,
            bottom: bottom_right.1,
        };
        self.selection = new_rect;
        self.drag_state = new_drag_state;

        shell.publish((self.on_rectangle)(new_drag_state, new_rect));
    }
}

impl<Msg: 'static + Clone> Widget<Msg, cosmic::Theme, cosmic::Renderer>
    for RectangleSelection<Msg>
{
    fn size(&self) -> Size<Length> {
        Size::new(Length::Fill, Length::Fill)
    }

    fn layout(
        &self,
        _tree: &mut cosmic::iced_core::widget::Tree,
        _renderer: &cosmic::Renderer,
        limits: &cosmic::iced_core::layout::Limits,
    ) -> cosmic::iced_core::layout::Node {
        Node::new(limits.width(Length::Fill).height(Length::Fill).resolve(
            Length::Fill,
            Length::Fill,
            cosmic::iced_core::Size::ZERO,
        ))
    }

    fn tag(&self) -> iced_core::widget::tree::Tag {
        struct MyState;
        iced_core::widget::tree::Tag::of::<MyState>()
    }

    fn mouse_interaction(
        &self,
        _state: &iced_core::widget::Tree,
        _layout: iced_core::Layout<'_>,
        cursor: iced_core::mouse::Cursor,
        _viewport: &Rectangle,
        _renderer: &cosmic::Renderer,
    ) -> iced_core::mouse::Interaction {
        match self.grab_state(cursor) {
            DragState::None => {
                if self.drag_state == DragState::None {
                    iced_core::mouse::Interaction::Crosshair
                } else {
                    iced_core::mouse::Interaction::Grabbing
                }
            }
            DragState::NW | DragState::NE | DragState::SE | DragState::SW => {
                if self.drag_state == DragState::None {
                    iced_core::mouse::Interaction::Grab
                } else {
                    iced_core::mouse::Interaction::Grabbing
                }
            }
            DragState::N | DragState::S => iced_core::mouse::Interaction::ResizingVertically,
            DragState::E | DragState::W => iced_core::mouse::Interaction::ResizingHorizontally,
        }
    }

    fn on_event(
        &mut self,
        _state: &mut iced_core::widget::Tree,
        event: iced_core::Event,
        layout: iced_core::Layout<'_>,
        cursor: iced_core::mouse::Cursor,
        _renderer: &cosmic::Renderer,
        _clipboard: &mut dyn iced_core::Clipboard,
        shell: &mut iced_core::Shell<'_, Msg>,
        _viewport: &Rectangle,
    ) -> iced_core::event::Status {
        let cosmic::iced_core::Event::Mouse(e) = event else {
            return cosmic::iced_core::event::Status::Ignored;
        };
        if !cursor.is_over(layout.bounds()) && self.drag_state == DragState::None {
            return cosmic::iced_core::event::Status::Ignored;
        }

        match e {
            iced_core::mouse::Event::ButtonPressed(iced_core::mouse::Button::Left) => {
                let s = self.grab_state(cursor);
                if let DragState::None = s {
                    // Not on a handle: start a fresh selection at the cursor
                    let mut pos = cursor.position().unwrap_or_default();
                    pos.x += self.output_rect.left as f32;
                    pos.y += self.output_rect.top as f32;
                    self.drag_state = DragState::SE;
                    shell.publish((self.on_rectangle)(
                        DragState::SE,
                        Rect {
                            left: pos.x as i32,
                            top: pos.y as i32,
                            right: pos.x as i32 + 1,
                            bottom: pos.y as i32 + 1,
                        },
                    ));
                } else {
                    self.drag_state = s;
                    shell.publish((self.on_rectangle)(s, self.selection));
                }
                cosmic::iced_core::event::Status::Captured
            }
            iced_core::mouse::Event::CursorMoved { position } => {
                if self.drag_state == DragState::None {
                    return cosmic::iced_core::event::Status::Ignored;
                }
                self.handle_drag_pos(position.x.round() as i32, position.y.round() as i32, shell);
                cosmic::iced_core::event::Status::Captured
            }
            iced_core::mouse::Event::ButtonReleased(iced_core::mouse::Button::Left) => {
                if self.drag_state == DragState::None {
                    return cosmic::iced_core::event::Status::Ignored;
                }
                self.drag_state = DragState::None;
                shell.publish((self.on_rectangle)(DragState::None, self.selection));
                shell.publish(self.on_release.clone());
                cosmic::iced_core::event::Status::Captured
            }
            _ => cosmic::iced_core::event::Status::Ignored,
        }
    }

    fn draw(
        &self,
        _tree: &cosmic::iced_core::widget::Tree,
        renderer: &mut cosmic::Renderer,
        theme: &cosmic::Theme,
        _style: &cosmic::iced_core::renderer::Style,
        _layout: cosmic::iced_core::Layout<'_>,
        _cursor: cosmic::iced_core::mouse::Cursor,
        _viewport: &cosmic::iced_core::Rectangle,
    ) {
        let cosmic = theme.cosmic();
        let accent = Color::from(cosmic.accent_color());
        let inner_rect = self.selection;
        let inner_rect = Rectangle::new(
            Point::new(inner_rect.left as f32, inner_rect.top as f32),
            Size::new(
                (inner_rect.right - inner_rect.left).abs() as f32,
                (inner_rect.bottom - inner_rect.top).abs() as f32,
            ),
        );
        let outer_size = Size::new(
            (self.output_rect.right - self.output_rect.left).abs() as f32,
            (self.output_rect.bottom - self.output_rect.top).abs() as f32,
        );
        let outer_top_left = Point::new(self.output_rect.left as f32, self.output_rect.top as f32);
        let outer_rect = Rectangle::new(outer_top_left, outer_size);
        let Some(clipped_inner_rect) = inner_rect.intersection(&outer_rect) else {
            return;
        };
        #[cfg(feature = "wgpu")]
        {
            use cosmic::iced_core::Transformation;
            use cosmic::iced_widget::graphics::{
                Mesh,
                color::pack,
                mesh::{Indexed, Renderer as MeshRenderer, SolidVertex2D},
            };
            let mut overlay = Color::BLACK;
            overlay.a = 0.3;

            // Mesh vertices are in output-local coordinates
            let local_inner = self.translated_inner_rect();
            let outer_top_left = (0.0f32, 0.0f32);
            let outer_bottom_right = (outer_size.width, outer_size.height);
            let inner_top_left = (local_inner.x, local_inner.y);
            let inner_bottom_right = (
                local_inner.x + local_inner.width,
                local_inner.y + local_inner.height,
            );
            let vertices = vec![
                outer_top_left,
                (outer_bottom_right.0, outer_top_left.1),
                outer_bottom_right,
                (outer_top_left.0, outer_bottom_right.1),
                inner_top_left,
                (inner_bottom_right.0, inner_top_left.1),
                inner_bottom_right,
                (inner_top_left.0, inner_bottom_right.1),
            ];
            #[rustfmt::skip]
            let indices = vec![
                5, 2, 1,
                5, 6, 2,
                6, 4, 2,
                6, 8, 4,
                8, 3, 4,
                8, 7, 3,
                7, 1, 3,
                7, 5, 1,
            ];

            renderer.draw_mesh(Mesh::Solid {
                buffers: Indexed {
                    vertices: vertices
                        .into_iter()
                        .map(|v| SolidVertex2D {
                            position: [v.0, v.1],
                            color: pack(overlay),
                        })
                        .collect(),
                    indices,
                },
                transformation: Transformation::IDENTITY,
                clip_bounds: Rectangle::new(Point::ORIGIN, outer_size),
            })
        }

        let translated_clipped_inner_rect = Rectangle::new(
            Point::new(
                clipped_inner_rect.x - outer_rect.x,
                clipped_inner_rect.y - outer_rect.y,
            ),
            clipped_inner_rect.size(),
        );
        let quad = Quad {
            bounds: translated_clipped_inner_rect,
            border: Border {
                radius: 0.0.into(),
                width: 4.0,
                color: accent,
            },
            shadow: Shadow::default(),
        };
        renderer.fill_quad(quad, Color::TRANSPARENT);

        let radius_s = cosmic.radius_s();
        for (x, y) in &[
            (inner_rect.x, inner_rect.y),
            (inner_rect.x + inner_rect.width, inner_rect.y),
            (inner_rect.x, inner_rect.y + inner_rect.height),
            (
                inner_rect.x + inner_rect.width,
                inner_rect.y + inner_rect.height,
            ),
        ] {
            if !outer_rect.contains(Point::new(*x, *y)) {
                continue;
            }
            let translated_x = x - outer_rect.x;
            let translated_y = y - outer_rect.y;
            let bounds = Rectangle::new(
                Point::new(
                    translated_x - CORNER_DIAMETER / 2.0,
                    translated_y - CORNER_DIAMETER / 2.0,
                ),
                Size::new(CORNER_DIAMETER, CORNER_DIAMETER),
            );
            let quad = Quad {
                bounds,
                border: Border {
                    radius: radius_s.into(),
                    width: 0.0,
                    color: Color::TRANSPARENT,
                },
                shadow: Shadow::default(),
            };
            renderer.fill_quad(quad, accent);
        }
    }
}

impl<'a, Message> From<RectangleSelection<Message>> for cosmic::Element<'a, Message>
where
    Message: 'static + Clone,
{
    fn from(w: RectangleSelection<Message>) -> cosmic::Element<'a, Message> {
        cosmic::Element::new(w)
    }
}
