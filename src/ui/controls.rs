use iced::widget::{button, container, text, Column, Row};
use iced::{Alignment, Element};

use crate::transport::TransportState;

#[derive(Debug, Clone)]
pub enum ControlMessage {
    PlayPause,
    Stop,
    Rewind,
    OpenFile,
}

/// Format seconds as M:SS.
pub fn format_time(seconds: f64) -> String {
    let total_secs = seconds.max(0.0) as u64;
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{mins}:{secs:02}")
}

/// Build the transport controls view.
pub fn view_controls<'a>(
    state: TransportState,
    position: f64,
    duration: f64,
) -> Element<'a, ControlMessage> {
    let play_label = match state {
        TransportState::Playing => "Pause",
        _ => "Play",
    };
    let loaded = state != TransportState::Idle;

    let play_btn =
        button(text(play_label)).on_press_maybe(loaded.then_some(ControlMessage::PlayPause));
    let stop_btn = button(text("Stop")).on_press_maybe(loaded.then_some(ControlMessage::Stop));
    let rewind_btn =
        button(text("|<")).on_press_maybe(loaded.then_some(ControlMessage::Rewind));
    let open_btn = button(text("Open File")).on_press(ControlMessage::OpenFile);

    let time_display = text(format!(
        "{} / {}",
        format_time(position),
        format_time(duration)
    ))
    .size(16);

    let controls_row = Row::new()
        .spacing(10)
        .align_y(Alignment::Center)
        .push(open_btn)
        .push(rewind_btn)
        .push(play_btn)
        .push(stop_btn)
        .push(time_display);

    container(Column::new().push(controls_row))
        .padding(10)
        .into()
}
