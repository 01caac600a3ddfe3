//! The one-shot capture session
//!
//! Owns the per-output overlay surfaces, the selection state, and the
//! crop → recognize → clipboard → notify pipeline that runs exactly once
//! before the process exits.

use std::collections::HashMap;

use cosmic::iced::{Limits, window};
use cosmic::iced_core::{ContentFit, Length};
use cosmic::iced_runtime::clipboard;
use cosmic::iced_runtime::platform_specific::wayland::layer_surface::{
    IcedOutput, SctkLayerSurfaceSettings,
};
use cosmic::iced_widget::stack;
use cosmic::iced_winit::commands::layer_surface::{destroy_layer_surface, get_layer_surface};
use cosmic::widget::horizontal_space;
use cosmic_client_toolkit::sctk::shell::wlr_layer::{Anchor, KeyboardInteractivity, Layer};
use image::RgbaImage;

use crate::capture::{self, ScreenshotImage};
use crate::core::app::{App, Msg as AppMsg, OutputState};
use crate::domain::{DragState, Rect, Selection};
use crate::fl;
use crate::notify;
use crate::ocr::{self, OcrStatus};
use crate::widget::RectangleSelection;

/// State of the single capture-and-recognize cycle
#[derive(Default)]
pub struct Session {
    /// Captured frame per output name
    pub images: HashMap<String, ScreenshotImage>,
    pub selection: Selection,
    pub status: OcrStatus,
}

#[derive(Debug, Clone)]
pub enum Msg {
    /// An output frame was captured (or failed to)
    Captured(String, Result<ScreenshotImage, String>),
    /// Selection rect or drag handle changed
    Selection(DragState, Rect),
    /// Mouse released / Enter pressed: crop and recognize
    Confirm,
    /// Escape pressed: exit without capturing
    Cancel,
    /// OCR finished
    Recognized(OcrStatus),
    /// Notification dispatched, the cycle is complete
    Notified,
}

pub(crate) fn view(app: &App, id: window::Id) -> cosmic::Element<'_, Msg> {
    let Some(output) = app.outputs.iter().find(|o| o.id == id) else {
        return horizontal_space().width(Length::Fixed(1.0)).into();
    };
    let Some(img) = app.session.images.get(&output.name) else {
        return horizontal_space().width(Length::Fixed(1.0)).into();
    };

    let background = cosmic::widget::image::Image::new(img.handle.clone())
        .content_fit(ContentFit::Fill)
        .width(Length::Fill)
        .height(Length::Fill);

    let selection = RectangleSelection::new(
        output.logical_rect(),
        app.session.selection.rect,
        app.session.selection.drag,
        |drag, rect| Msg::Selection(drag, rect),
        Msg::Confirm,
    );

    stack![background, selection]
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

pub fn update_msg(app: &mut App, msg: Msg) -> cosmic::Task<AppMsg> {
    match msg {
        Msg::Captured(name, Ok(img)) => {
            let Some(output) = app.outputs.iter().find(|o| o.name == name) else {
                log::warn!("Captured frame for unknown output {name}");
                return cosmic::Task::none();
            };
            log::debug!(
                "Output image {}: {}x{} pixels, scale factor {}",
                name,
                img.width(),
                img.height(),
                output.scale_factor
            );
            let surface = map_overlay_surface(output);
            app.session.images.insert(name, img);
            surface
        }
        Msg::Captured(name, Err(err)) => {
            log::error!("Failed to capture output {name}: {err}");
            cosmic::Task::none()
        }
        Msg::Selection(drag, rect) => {
            app.session.selection = Selection::new(rect, drag);
            cosmic::Task::none()
        }
        Msg::Confirm => {
            // Zero-area selections emit no capture
            if app.session.selection.is_empty() {
                return cosmic::Task::none();
            }
            // A second Enter while OCR runs must not start another cycle
            if app.session.status != OcrStatus::Idle {
                return cosmic::Task::none();
            }
            let rect = app.session.selection.rect;
            let Some(region) = crop_from_outputs(app, rect) else {
                log::warn!("Selection {rect:?} does not intersect any captured output");
                return cosmic::Task::none();
            };

            let mut cmds: Vec<cosmic::Task<AppMsg>> = app
                .outputs
                .iter()
                .map(|o| destroy_layer_surface(o.id))
                .collect();

            if app.flags.save_debug_screenshot {
                if let Err(err) = capture::write_debug_screenshot(&region) {
                    log::error!(
                        "Failed to write {}: {err}",
                        capture::DEBUG_SCREENSHOT_PATH
                    );
                }
            }

            app.session.status = OcrStatus::Running;
            let backend = app.flags.backend;
            let languages = app.flags.languages.clone();
            cmds.push(cosmic::Task::perform(
                async move {
                    let result = tokio::time::timeout(
                        ocr::OCR_TIMEOUT,
                        tokio::task::spawn_blocking(move || {
                            backend
                                .recognize(&region, &languages)
                                .map(|text| ocr::text::normalize(&text, &languages))
                        }),
                    )
                    .await;
                    match result {
                        Err(_) => OcrStatus::Error(fl!("ocr-timed-out")),
                        Ok(Err(_)) => OcrStatus::Error("OCR task panicked".to_string()),
                        Ok(Ok(Err(err))) => OcrStatus::Error(err.to_string()),
                        Ok(Ok(Ok(text))) => OcrStatus::Done(text),
                    }
                },
                |status| AppMsg::Screenshot(Msg::Recognized(status)),
            ));
            cosmic::Task::batch(cmds)
        }
        Msg::Recognized(status) => {
            app.session.status = status.clone();
            match status {
                OcrStatus::Done(text) if !text.is_empty() => {
                    log::info!("OCR result copied to clipboard ({} chars)", text.len());
                    let body = fl!("copied", text = text.clone());
                    cosmic::Task::batch(vec![
                        clipboard::write(text),
                        cosmic::Task::perform(
                            notify::send_or_log(fl!("app-name"), body),
                            |_| AppMsg::Screenshot(Msg::Notified),
                        ),
                    ])
                }
                OcrStatus::Done(_) => {
                    log::info!("OCR found no text, nothing copied");
                    cosmic::Task::perform(
                        notify::send_or_log(fl!("app-name"), fl!("no-text-found")),
                        |_| AppMsg::Screenshot(Msg::Notified),
                    )
                }
                OcrStatus::Error(err) => {
                    log::error!("OCR failed: {err}");
                    cosmic::Task::perform(
                        notify::send_or_log(fl!("app-name"), fl!("ocr-failed", error = err)),
                        |_| AppMsg::Screenshot(Msg::Notified),
                    )
                }
                OcrStatus::Idle | OcrStatus::Running => cosmic::Task::none(),
            }
        }
        Msg::Notified => {
            log::info!("Capture cycle complete");
            std::process::exit(0);
        }
        Msg::Cancel => {
            log::info!("Selection cancelled");
            std::process::exit(0);
        }
    }
}

/// Map the overlay layer surface for an output whose frame just arrived
fn map_overlay_surface(output: &OutputState) -> cosmic::Task<AppMsg> {
    get_layer_surface(SctkLayerSurfaceSettings {
        id: output.id,
        layer: Layer::Overlay,
        keyboard_interactivity: KeyboardInteractivity::Exclusive,
        input_zone: None,
        anchor: Anchor::all(),
        output: IcedOutput::Output(output.output.clone()),
        namespace: "snaptext".to_string(),
        size: Some((None, None)),
        exclusive_zone: -1,
        size_limits: Limits::NONE.min_height(1.0).min_width(1.0),
        ..Default::default()
    })
}

/// Crop the selection from the first output it intersects
fn crop_from_outputs(app: &App, rect: Rect) -> Option<RgbaImage> {
    for output in &app.outputs {
        let Some(img) = app.session.images.get(&output.name) else {
            continue;
        };
        if let Some(region) = capture::crop_selection(&img.rgba, output.logical_rect(), rect) {
            return Some(region);
        }
    }
    None
}
