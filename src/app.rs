use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender};
use iced::keyboard;
use iced::time::Instant;
use iced::widget::{canvas, center, column, container, text};
use iced::{Element, Length, Subscription, Task, Theme};

use crate::audio::analyzer::SpectralAnalyzer;
use crate::audio::engine::{self, AudioEngine};
use crate::audio::loader;
use crate::audio::types::AudioData;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::renderer::{SpectrumRenderer, WaveformRenderer};
use crate::transport::{LoadOutcome, LoadTicket, TransportEvent, TransportState};
use crate::ui::canvas::{CanvasMessage, SceneCanvas};
use crate::ui::controls::{self, ControlMessage};
use crate::visualizer::Visualizer;

const KEY_SEEK_STEP: f64 = 5.0;

/// Which renderer the window hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ViewMode {
    #[default]
    Waveform,
    Spectrum,
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Loaded as soon as the output device is open.
    pub url: Option<String>,
    pub config: Config,
    pub view: ViewMode,
}

enum Widget {
    Waveform(Visualizer<WaveformRenderer, AudioEngine>),
    Spectrum(Visualizer<SpectrumRenderer, AudioEngine>),
}

/// Run `$body` against whichever visualizer the widget holds.
macro_rules! with_vis {
    ($widget:expr, $vis:ident => $body:expr) => {
        match $widget {
            Widget::Waveform($vis) => $body,
            Widget::Spectrum($vis) => $body,
        }
    };
}

pub struct App {
    options: Options,
    widget: Option<Widget>,

    // Transport events, forwarded by the widget's subscriber
    event_tx: Sender<TransportEvent>,
    event_rx: Receiver<TransportEvent>,

    source: Option<String>,
    notice: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Message {
    EngineReady(Result<AudioEngine>),
    Loaded(LoadTicket, Result<AudioData>),
    Control(ControlMessage),
    Canvas(CanvasMessage),
    Frame(Instant),
    KeyEvent(keyboard::Event),
    FileDialogResult(Option<PathBuf>),
}

fn boot(options: Options) -> (App, Task<Message>) {
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let app = App {
        options,
        widget: None,
        event_tx,
        event_rx,
        source: None,
        notice: None,
        error: None,
    };

    let task = Task::perform(
        async {
            tokio::task::spawn_blocking(engine::spawn_engine)
                .await
                .map_err(|e| Error::Output(format!("engine startup panicked: {e}")))
                .and_then(|r| r)
        },
        Message::EngineReady,
    );

    (app, task)
}

fn build_widget(options: &Options, engine: AudioEngine) -> Result<Widget> {
    Ok(match options.view {
        ViewMode::Waveform => {
            let renderer = WaveformRenderer::new(options.config.waveform.clone())?;
            Widget::Waveform(Visualizer::new(renderer, engine))
        }
        ViewMode::Spectrum => {
            let spectrum = options.config.spectrum.clone();
            let analyzer =
                SpectralAnalyzer::with_exponent(spectrum.fft_exponent)?.with_tap(engine.tap());
            let renderer = SpectrumRenderer::new(spectrum, analyzer)?;
            Widget::Spectrum(Visualizer::new(renderer, engine))
        }
    })
}

fn title(app: &App) -> String {
    match &app.source {
        Some(name) => format!("Waveslab - {name}"),
        None => "Waveslab".to_string(),
    }
}

fn start_load(app: &mut App, url: String) -> Task<Message> {
    let Some(widget) = &mut app.widget else {
        // Picked up once the engine is ready.
        app.options.url = Some(url);
        return Task::none();
    };

    log::info!("Loading {url}");
    let ticket = with_vis!(widget, vis => vis.generate(&url));
    app.source = Some(url.clone());
    app.notice = Some("Loading...".to_string());
    app.error = None;

    Task::perform(loader::fetch_and_decode(url), move |result| {
        Message::Loaded(ticket, result)
    })
}

fn report(app: &mut App, result: Result<()>) {
    if let Err(e) = result {
        log::warn!("{e}");
        app.error = Some(e.to_string());
    }
}

fn drain_events(app: &mut App) {
    while let Ok(event) = app.event_rx.try_recv() {
        match event {
            TransportEvent::AudioReady { duration } => {
                app.notice = Some(format!("Ready ({})", controls::format_time(duration)));
            }
            TransportEvent::PlayStarted => app.notice = None,
            TransportEvent::PlaybackComplete => {
                app.notice = Some("Playback complete".to_string());
            }
            TransportEvent::Stopped | TransportEvent::PlaybackTimeChanged { .. } => {}
        }
    }
}

fn update(app: &mut App, message: Message) -> Task<Message> {
    match message {
        Message::EngineReady(result) => {
            let widget = result.and_then(|engine| build_widget(&app.options, engine));
            match widget {
                Ok(mut widget) => {
                    let tx = app.event_tx.clone();
                    with_vis!(&mut widget, vis => vis.subscribe(move |e| {
                        let _ = tx.send(*e);
                    }));
                    app.widget = Some(widget);
                    match app.options.url.take() {
                        Some(url) => start_load(app, url),
                        None => Task::none(),
                    }
                }
                Err(e) => {
                    log::error!("Audio engine error: {e}");
                    app.error = Some(format!("Audio engine error: {e}"));
                    Task::none()
                }
            }
        }
        Message::Loaded(ticket, result) => {
            let Some(widget) = &mut app.widget else {
                return Task::none();
            };
            match with_vis!(widget, vis => vis.finish_load(&ticket, result)) {
                Ok(LoadOutcome::Ready) => log::info!("Loaded {}", ticket.url()),
                Ok(LoadOutcome::Superseded) => {
                    log::debug!("Dropped stale load of {}", ticket.url());
                }
                Err(e) => {
                    log::error!("{e}");
                    app.notice = None;
                    app.error = Some(e.to_string());
                }
            }
            drain_events(app);
            Task::none()
        }
        Message::Control(ctrl) => match ctrl {
            ControlMessage::OpenFile => Task::perform(
                async {
                    let handle = rfd::AsyncFileDialog::new()
                        .add_filter("Audio", &["mp3", "wav", "flac", "ogg", "aac"])
                        .pick_file()
                        .await;
                    handle.map(|h| h.path().to_path_buf())
                },
                Message::FileDialogResult,
            ),
            ControlMessage::PlayPause => {
                if let Some(widget) = &mut app.widget {
                    let result = with_vis!(widget, vis => vis.play_pause());
                    report(app, result);
                    drain_events(app);
                }
                Task::none()
            }
            ControlMessage::Stop => {
                if let Some(widget) = &mut app.widget {
                    with_vis!(widget, vis => vis.stop());
                    drain_events(app);
                }
                Task::none()
            }
            ControlMessage::Rewind => {
                if let Some(widget) = &mut app.widget {
                    let result = with_vis!(widget, vis => vis.seek(0.0));
                    report(app, result);
                    drain_events(app);
                }
                Task::none()
            }
        },
        Message::FileDialogResult(path) => match path {
            Some(path) => start_load(app, path.display().to_string()),
            None => Task::none(),
        },
        Message::Canvas(event) => {
            if let Some(widget) = &mut app.widget {
                let result = with_vis!(widget, vis => match event {
                    CanvasMessage::Resized(size) => {
                        vis.resize(size);
                        Ok(())
                    }
                    CanvasMessage::PointerDown(x) => vis.pointer_down(x),
                    CanvasMessage::PointerMoved(x) => vis.pointer_move(x),
                    CanvasMessage::PointerUp(x) => vis.pointer_up(x),
                });
                report(app, result);
                drain_events(app);
            }
            Task::none()
        }
        Message::Frame(_) => {
            if let Some(widget) = &mut app.widget {
                with_vis!(widget, vis => vis.frame());
                drain_events(app);
            }
            Task::none()
        }
        Message::KeyEvent(keyboard::Event::KeyPressed { key, .. }) => {
            let Some(widget) = &mut app.widget else {
                return Task::none();
            };
            let step = match key.as_ref() {
                keyboard::Key::Named(keyboard::key::Named::Space) => {
                    return update(app, Message::Control(ControlMessage::PlayPause));
                }
                keyboard::Key::Named(keyboard::key::Named::ArrowLeft) => -KEY_SEEK_STEP,
                keyboard::Key::Named(keyboard::key::Named::ArrowRight) => KEY_SEEK_STEP,
                _ => return Task::none(),
            };
            let result = with_vis!(widget, vis => {
                if vis.state() == TransportState::Idle {
                    Ok(())
                } else {
                    let target = (vis.playback_time() + step).clamp(0.0, vis.duration());
                    vis.seek(target)
                }
            });
            report(app, result);
            drain_events(app);
            Task::none()
        }
        Message::KeyEvent(_) => Task::none(),
    }
}

fn view(app: &App) -> Element<'_, Message> {
    let (state, position, duration) = match &app.widget {
        Some(widget) => {
            with_vis!(widget, vis => (vis.state(), vis.playback_time(), vis.duration()))
        }
        None => (TransportState::Idle, 0.0, 0.0),
    };

    let controls = controls::view_controls(state, position, duration).map(Message::Control);

    let surface: Element<Message> = match &app.widget {
        Some(widget) if state != TransportState::Idle => {
            let scene = with_vis!(widget, vis => vis.scene());
            let canvas_el: Element<CanvasMessage> = canvas::Canvas::new(SceneCanvas::new(scene))
                .width(Length::Fill)
                .height(Length::Fixed(200.0))
                .into();
            canvas_el.map(Message::Canvas)
        }
        _ => {
            let hint = app.notice.as_deref().unwrap_or("Open an audio file to begin");
            center(text(hint).size(18))
                .width(Length::Fill)
                .height(Length::Fixed(200.0))
                .into()
        }
    };

    let mut content = column![controls, surface].spacing(5);

    if state != TransportState::Idle {
        if let Some(notice) = &app.notice {
            content = content.push(container(text(notice.as_str())).padding(10));
        }
    }

    if let Some(err) = &app.error {
        content = content.push(
            container(text(format!("Error: {err}")).color(iced::Color::from_rgb(1.0, 0.3, 0.3)))
                .padding(10),
        );
    }

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn subscription(app: &App) -> Subscription<Message> {
    let keys = keyboard::listen().map(Message::KeyEvent);

    let rendering = app
        .widget
        .as_ref()
        .is_some_and(|widget| with_vis!(widget, vis => vis.is_rendering()));

    if rendering {
        Subscription::batch([iced::window::frames().map(Message::Frame), keys])
    } else {
        keys
    }
}

fn theme(_app: &App) -> Theme {
    Theme::Dark
}

pub fn run(options: Options) -> iced::Result {
    iced::application(move || boot(options.clone()), update, view)
        .title(title)
        .subscription(subscription)
        .theme(theme)
        .window_size((1000.0, 400.0))
        .run()
}
