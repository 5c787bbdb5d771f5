use anyhow::Result;
use crossterm::event::Event as CrosstermEvent;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::event::MouseEventKind;
use futures::StreamExt;
use tokio::time;
use tui_textarea::Input;
use tui_textarea::Key;

use super::Console;
use crate::domain::models::UiEvent;

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;

pub struct EventsService {
    crossterm_events: EventStream,
}

impl Default for EventsService {
    fn default() -> EventsService {
        EventsService::new()
    }
}

impl EventsService {
    pub fn new() -> EventsService {
        return EventsService {
            crossterm_events: EventStream::new(),
        };
    }

    /// Maps one terminal event to what the console view reacts to.
    pub fn handle_crossterm(event: CrosstermEvent) -> Option<UiEvent> {
        match event {
            CrosstermEvent::Paste(text) => Some(UiEvent::KeyboardPaste(text)),
            CrosstermEvent::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => Some(UiEvent::UIScrollUp),
                MouseEventKind::ScrollDown => Some(UiEvent::UIScrollDown),
                _ => None,
            },
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                key_input(key).map(console_key)
            }
            _ => None,
        }
    }

    pub async fn next(&mut self, console: &mut Console) -> Result<UiEvent> {
        loop {
            let evt = tokio::select! {
                event = console.recv() => event.map(UiEvent::Console),
                event = self.crossterm_events.next() => match event {
                    Some(Ok(input)) => EventsService::handle_crossterm(input),
                    Some(Err(_)) => None,
                    None => None
                },
                _ = time::sleep(time::Duration::from_millis(500)) => Some(UiEvent::UITick)
            };

            if let Some(event) = evt {
                return Ok(event);
            }
        }
    }
}

fn key_input(event: KeyEvent) -> Option<Input> {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Tab => Key::Tab,
        KeyCode::Delete => Key::Delete,
        KeyCode::F(n) => Key::F(n),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Esc => Key::Esc,
        _ => return None,
    };

    Some(Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    })
}

/// Console hotkeys first; anything else edits the input line.
fn console_key(input: Input) -> UiEvent {
    match (input.ctrl, input.key) {
        (_, Key::Up) => UiEvent::UIScrollUp,
        (_, Key::Down) => UiEvent::UIScrollDown,
        (_, Key::PageUp) | (true, Key::Char('u')) => UiEvent::UIScrollPageUp,
        (_, Key::PageDown) | (true, Key::Char('d')) => UiEvent::UIScrollPageDown,
        (true, Key::Char('c')) => UiEvent::KeyboardCTRLC,
        (true, Key::Char('l')) => UiEvent::KeyboardCTRLL,
        (true, Key::Char('r')) | (_, Key::F(5)) => UiEvent::KeyboardCTRLR,
        (_, Key::Esc) => UiEvent::KeyboardEsc,
        (_, Key::Enter) => UiEvent::KeyboardEnter,
        _ => UiEvent::KeyboardCharInput(input),
    }
}
