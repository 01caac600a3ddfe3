use crate::capture::ScreenshotImage;
use crate::domain::Rect;
use crate::ocr::OcrBackend;
use crate::screenshot;
use crate::wayland::{CaptureSource, WaylandHelper};
use cosmic::iced_core::event::wayland::OutputEvent;
use cosmic::{
    app,
    iced::window,
    iced_futures::{Subscription, event::listen_with},
};
use wayland_client::protocol::wl_output::WlOutput;

/// Startup options resolved from CLI flags and config
pub struct Flags {
    /// The backend chosen for this run
    pub backend: &'static dyn OcrBackend,
    /// Language hints forwarded to the backend
    pub languages: Vec<String>,
    /// Whether to write the cropped selection to shot.png
    pub save_debug_screenshot: bool,
}

pub(crate) fn run(flags: Flags) -> cosmic::iced::Result {
    let settings = cosmic::app::Settings::default()
        .no_main_window(true)
        .exit_on_close(false);
    cosmic::app::run::<App>(settings, flags)
}

pub struct App {
    pub core: app::Core,
    pub flags: Flags,
    pub wayland_helper: WaylandHelper,
    pub outputs: Vec<OutputState>,
    pub session: screenshot::Session,
}

#[derive(Debug, Clone)]
pub struct OutputState {
    pub output: WlOutput,
    pub id: window::Id,
    pub name: String,
    pub logical_size: (u32, u32),
    pub logical_pos: (i32, i32),
    pub scale_factor: i32,
}

impl OutputState {
    /// Output rectangle in global logical coordinates
    pub fn logical_rect(&self) -> Rect {
        Rect {
            left: self.logical_pos.0,
            top: self.logical_pos.1,
            right: self.logical_pos.0 + self.logical_size.0 as i32,
            bottom: self.logical_pos.1 + self.logical_size.1 as i32,
        }
    }
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone)]
pub enum Msg {
    Screenshot(screenshot::Msg),
    Output(OutputEvent, WlOutput),
    Keyboard(cosmic::iced::keyboard::Event),
}

impl App {
    /// Capture an output's frame; the overlay surface is mapped once the
    /// frame arrives so the user never sees an unfrozen background.
    fn capture_output(&self, output: &OutputState) -> cosmic::Task<cosmic::Action<Msg>> {
        let helper = self.wayland_helper.clone();
        let wl_output = output.output.clone();
        let name = output.name.clone();
        cosmic::Task::perform(
            async move {
                match helper
                    .capture_source_shm(CaptureSource::Output(wl_output), false)
                    .await
                {
                    Some(frame) => ScreenshotImage::new(frame).map_err(|err| err.to_string()),
                    None => Err("shm screencopy failed".to_string()),
                }
            },
            move |res| {
                cosmic::Action::App(Msg::Screenshot(screenshot::Msg::Captured(
                    name.clone(),
                    res,
                )))
            },
        )
    }
}

impl cosmic::Application for App {
    type Executor = cosmic::executor::Default;

    type Flags = Flags;

    type Message = Msg;

    const APP_ID: &'static str = "io.github.cosmic-utils.snaptext";

    fn core(&self) -> &app::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut app::Core {
        &mut self.core
    }

    fn init(
        core: app::Core,
        flags: Self::Flags,
    ) -> (Self, cosmic::iced::Task<cosmic::Action<Self::Message>>) {
        let wayland_conn = wayland_client::Connection::connect_to_env().unwrap();
        let wayland_helper = WaylandHelper::new(wayland_conn);

        (
            Self {
                core,
                flags,
                wayland_helper,
                outputs: Default::default(),
                session: Default::default(),
            },
            cosmic::iced::Task::none(),
        )
    }

    fn view(&self) -> cosmic::Element<'_, Self::Message> {
        unimplemented!()
    }

    fn view_window(&self, id: window::Id) -> cosmic::Element<'_, Self::Message> {
        if self.outputs.iter().any(|o| o.id == id) {
            screenshot::view(self, id).map(Msg::Screenshot)
        } else {
            cosmic::widget::horizontal_space()
                .width(cosmic::iced_core::Length::Fixed(1.0))
                .into()
        }
    }

    fn update(
        &mut self,
        message: Self::Message,
    ) -> cosmic::iced::Task<cosmic::Action<Self::Message>> {
        match message {
            Msg::Keyboard(cosmic::iced::keyboard::Event::KeyPressed { key, .. }) => {
                use cosmic::iced::keyboard::{Key, key::Named};
                match key {
                    Key::Named(Named::Escape) => {
                        self.update(Msg::Screenshot(screenshot::Msg::Cancel))
                    }
                    Key::Named(Named::Enter) => {
                        self.update(Msg::Screenshot(screenshot::Msg::Confirm))
                    }
                    _ => cosmic::iced::Task::none(),
                }
            }
            Msg::Keyboard(_) => cosmic::iced::Task::none(),
            Msg::Screenshot(m) => screenshot::update_msg(self, m).map(cosmic::Action::App),
            Msg::Output(o_event, wl_output) => {
                match o_event {
                    OutputEvent::Created(Some(info))
                        if info.name.is_some()
                            && info.logical_size.is_some()
                            && info.logical_position.is_some() =>
                    {
                        let state = OutputState {
                            output: wl_output,
                            id: window::Id::unique(),
                            name: info.name.unwrap(),
                            logical_size: info
                                .logical_size
                                .map(|(w, h)| (w as u32, h as u32))
                                .unwrap(),
                            logical_pos: info.logical_position.unwrap(),
                            scale_factor: info.scale_factor,
                        };
                        let capture = self.capture_output(&state);
                        self.outputs.push(state);
                        return capture;
                    }
                    OutputEvent::Removed => self.outputs.retain(|o| o.output != wl_output),
                    OutputEvent::InfoUpdate(info)
                        if info.name.is_some()
                            && info.logical_size.is_some()
                            && info.logical_position.is_some() =>
                    {
                        if let Some(state) =
                            self.outputs.iter_mut().find(|o| o.output == wl_output)
                        {
                            state.name = info.name.unwrap();
                            state.logical_size = info
                                .logical_size
                                .map(|(w, h)| (w as u32, h as u32))
                                .unwrap();
                            state.logical_pos = info.logical_position.unwrap();
                            state.scale_factor = info.scale_factor;
                        } else {
                            log::warn!("Updated output {:?} not found", wl_output);
                        }
                    }
                    e => {
                        log::warn!("Unhandled output event: {:?} {e:?}", wl_output);
                    }
                };

                cosmic::iced::Task::none()
            }
        }
    }

    fn subscription(&self) -> cosmic::iced_futures::Subscription<Self::Message> {
        let subscriptions = vec![listen_with(|e, _, _| match e {
            cosmic::iced_core::Event::PlatformSpecific(
                cosmic::iced_core::event::PlatformSpecific::Wayland(
                    cosmic::iced_core::event::wayland::Event::Output(o_event, wl_output),
                ),
            ) => Some(Msg::Output(o_event, wl_output)),
            cosmic::iced_core::Event::Keyboard(keyboard_event) => {
                Some(Msg::Keyboard(keyboard_event))
            }
            _ => None,
        })];

        Subscription::batch(subscriptions)
    }
}
