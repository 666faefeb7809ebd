use ratatui::{style::Stylize, text::Line};

use crate::cmd::console::state::Focus;

/// Context-aware keybindings for the bottom border
pub(crate) fn controls_line(focus: Focus, streaming: bool) -> Line<'static> {
    let stream_label = if streaming { " | Stop " } else { " | Stream " };
    match focus {
        Focus::Groups => Line::from(vec![
            " Quit ".into(),
            "<q> ".blue().bold(),
            " | Navigate ".into(),
            "<↑↓/jk Tab> ".blue().bold(),
            " | Select ".into(),
            "<Enter> ".blue().bold(),
            " | All groups ".into(),
            "<a> ".blue().bold(),
            " | Rediscover ".into(),
            "<g> ".blue().bold(),
            stream_label.into(),
            "<s> ".blue().bold(),
        ]),
        Focus::Logs => Line::from(vec![
            " Quit ".into(),
            "<q> ".blue().bold(),
            " | Navigate ".into(),
            "<↑↓/jk Tab> ".blue().bold(),
            stream_label.into(),
            "<s> ".blue().bold(),
            " | Refresh ".into(),
            "<r> ".blue().bold(),
            " | Clear ".into(),
            "<c> ".blue().bold(),
            " | Unfilter ".into(),
            "<x> ".blue().bold(),
            " | Inspect ".into(),
            "<i> ".blue().bold(),
        ]),
        Focus::Inspect => Line::from(vec![
            " Quit ".into(),
            "<q> ".blue().bold(),
            " | Navigate ".into(),
            "<↑↓/jk> ".blue().bold(),
            " | Close ".into(),
            "<i/Esc> ".blue().bold(),
        ]),
    }
}
