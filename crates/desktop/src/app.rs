use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use iced::widget::{button, canvas, column, container, image, row, stack, text, Space};
use iced::{alignment, ContentFit, Element, Length, Size, Subscription, Task, Theme};

use facecam_core::capture::domain::camera_device::DeviceDiscovery;
use facecam_core::capture::infrastructure::ffmpeg_device_discovery::FfmpegDeviceDiscovery;
use facecam_core::capture::preview_output::PreviewOutput;
use facecam_core::detection::domain::face_detector::FaceDetector;
use facecam_core::detection::error::DetectionError;
use facecam_core::detection::infrastructure::model_resolver::{self, ModelSource};
use facecam_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use facecam_core::overlay::overlay_event::OverlayEvent;
use facecam_core::overlay::overlay_screen::OverlayScreen;
use facecam_core::overlay::preview_surface::PreviewGravity;
use facecam_core::permission::domain::authorization::AuthorizationState;
use facecam_core::permission::permission_gate::PermissionGate;
use facecam_core::pipeline::live_overlay_config::LiveOverlayConfig;
use facecam_core::pipeline::live_overlay_use_case::LiveOverlayUseCase;
use facecam_core::pipeline::session_logger::{self, NullSessionLogger};
use facecam_core::shared::geometry::ScreenRect;

use crate::dialog_authorizer::{DialogAuthorizer, PromptResponder};
use crate::overlay_canvas::OverlayCanvas;
use crate::settings::Settings;

pub const WINDOW_SIZE: Size = Size::new(430.0, 760.0);
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    WindowResized(Size),
    PermissionAnswered(bool),
}

pub struct App {
    settings: Settings,
    screen: OverlayScreen,
    session: Option<LiveSession>,
    prompts: Receiver<PromptResponder>,
    pending_prompt: Option<PromptResponder>,
    preview: Option<image::Handle>,
    overlay_cache: canvas::Cache,
    drawn_generation: u64,
    startup_error: Option<String>,
}

struct LiveSession {
    use_case: LiveOverlayUseCase,
    events: Receiver<OverlayEvent>,
    frames: PreviewOutput,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let screen = OverlayScreen::new(
            ScreenRect::new(0.0, 0.0, WINDOW_SIZE.width as f64, WINDOW_SIZE.height as f64),
            settings.gravity(),
            settings.stroke_style(),
            settings.caption.clone(),
        );
        let (authorizer, prompts) = DialogAuthorizer::new(settings.authorization());

        let (session, startup_error) = match start_session(&settings, authorizer) {
            Ok(session) => (Some(session), None),
            Err(e) => {
                log::error!("Could not start the camera session: {e}");
                (None, Some(e.to_string()))
            }
        };

        (
            Self {
                settings,
                screen,
                session,
                prompts,
                pending_prompt: None,
                preview: None,
                overlay_cache: canvas::Cache::new(),
                drawn_generation: 0,
                startup_error,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                if self.pending_prompt.is_none() {
                    self.pending_prompt = self.prompts.try_recv().ok();
                }
                if let Some(ref session) = self.session {
                    for event in session.events.try_iter() {
                        self.screen.handle(event);
                    }
                    if let Some(frame) = session.frames.take_latest() {
                        self.preview = Some(image::Handle::from_rgba(
                            frame.width(),
                            frame.height(),
                            frame.to_rgba(),
                        ));
                    }
                    if self.screen.is_running() && !session.use_case.is_running() {
                        self.screen.session_stopped();
                    }
                }
                let generation = self.screen.layer().generation();
                if generation != self.drawn_generation {
                    self.drawn_generation = generation;
                    self.overlay_cache.clear();
                }
            }
            Message::WindowResized(size) => {
                self.screen.resize(ScreenRect::new(
                    0.0,
                    0.0,
                    size.width as f64,
                    size.height as f64,
                ));
            }
            Message::PermissionAnswered(granted) => {
                if let Some(responder) = self.pending_prompt.take() {
                    let _ = responder.send(granted);
                }
                self.settings.camera_access = Some(granted);
                self.settings.save();
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let preview: Element<'_, Message> = match self.preview {
            Some(ref handle) => image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(content_fit(self.screen.surface().gravity()))
                .into(),
            None => container(text(self.status_line()).size(15))
                .center(Length::Fill)
                .into(),
        };

        let overlay = canvas(OverlayCanvas::new(self.screen.shapes(), &self.overlay_cache))
            .width(Length::Fill)
            .height(Length::Fill);

        let mut footer = column![text(self.screen.caption()).size(28)]
            .spacing(6)
            .align_x(alignment::Horizontal::Center);
        if let Some(message) = self.screen.diagnostics().last() {
            footer = footer.push(text(message.clone()).size(12));
        }
        let caption = container(footer)
            .width(Length::Fill)
            .height(Length::Fill)
            .align_x(alignment::Horizontal::Center)
            .align_y(alignment::Vertical::Bottom)
            .padding(24);

        let mut layers = stack![preview, overlay, caption];
        if self.pending_prompt.is_some() {
            layers = layers.push(permission_dialog());
        }
        layers.into()
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            iced::time::every(FRAME_INTERVAL).map(|_| Message::Tick),
            iced::window::resize_events().map(|(_id, size)| Message::WindowResized(size)),
        ])
    }

    fn status_line(&self) -> String {
        if let Some(ref error) = self.startup_error {
            return format!("Camera unavailable: {error}");
        }
        match self.screen.authorization() {
            AuthorizationState::Denied => "Camera access was denied".to_string(),
            AuthorizationState::Undetermined => "Waiting for camera access".to_string(),
            AuthorizationState::Granted if self.screen.is_running() => String::new(),
            AuthorizationState::Granted => "Starting camera".to_string(),
        }
    }
}

fn start_session(
    settings: &Settings,
    authorizer: DialogAuthorizer,
) -> std::io::Result<LiveSession> {
    let discovery: Arc<dyn DeviceDiscovery> = match settings.device {
        Some(ref id) => Arc::new(FfmpegDeviceDiscovery::with_device(id.clone())),
        None => Arc::new(FfmpegDeviceDiscovery::new()),
    };
    let config = LiveOverlayConfig {
        video_rotation: settings.rotation(),
        policy: settings.policy(),
        ..LiveOverlayConfig::default()
    };
    let confidence = settings.confidence();

    let (use_case, events) = LiveOverlayUseCase::new(
        PermissionGate::new(Arc::new(authorizer)),
        discovery,
        Box::new(move || build_detector(confidence)),
        config,
        session_logger::shared(NullSessionLogger),
    )?;
    let state = use_case.start();
    log::info!("Camera authorization at launch: {state}");

    let frames = use_case.preview();
    Ok(LiveSession {
        use_case,
        events,
        frames,
    })
}

fn build_detector(confidence: f64) -> Result<Box<dyn FaceDetector>, DetectionError> {
    let model_path = model_resolver::resolve_face_model(&ModelSource::default(), None)?;
    Ok(Box::new(OnnxYoloDetector::new(&model_path, confidence)?))
}

fn permission_dialog<'a>() -> Element<'a, Message> {
    let card = container(
        column![
            text("Allow FaceCam to use the camera?").size(17),
            text("Video stays on this computer. Faces are outlined live.").size(13),
            Space::new().height(8),
            row![
                button(text("Don't Allow"))
                    .on_press(Message::PermissionAnswered(false))
                    .style(button::secondary)
                    .padding([8, 16]),
                button(text("Allow"))
                    .on_press(Message::PermissionAnswered(true))
                    .style(button::primary)
                    .padding([8, 16]),
            ]
            .spacing(12),
        ]
        .spacing(8)
        .align_x(alignment::Horizontal::Center),
    )
    .padding(20)
    .style(container::rounded_box);

    container(card).center(Length::Fill).into()
}

fn content_fit(gravity: PreviewGravity) -> ContentFit {
    match gravity {
        PreviewGravity::Resize => ContentFit::Fill,
        PreviewGravity::ResizeAspect => ContentFit::Contain,
        PreviewGravity::ResizeAspectFill => ContentFit::Cover,
    }
}
