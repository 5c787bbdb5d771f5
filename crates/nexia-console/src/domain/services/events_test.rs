use crossterm::event::Event as CrosstermEvent;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;

use super::*;

fn key(code: KeyCode, modifiers: KeyModifiers) -> Option<UiEvent> {
    EventsService::handle_crossterm(CrosstermEvent::Key(KeyEvent::new(code, modifiers)))
}

#[test]
fn it_maps_console_hotkeys() {
    assert!(matches!(
        key(KeyCode::F(5), KeyModifiers::NONE),
        Some(UiEvent::KeyboardCTRLR)
    ));
    assert!(matches!(
        key(KeyCode::Char('r'), KeyModifiers::CONTROL),
        Some(UiEvent::KeyboardCTRLR)
    ));
    assert!(matches!(
        key(KeyCode::Char('l'), KeyModifiers::CONTROL),
        Some(UiEvent::KeyboardCTRLL)
    ));
    assert!(matches!(
        key(KeyCode::Esc, KeyModifiers::NONE),
        Some(UiEvent::KeyboardEsc)
    ));
    assert!(matches!(
        key(KeyCode::Enter, KeyModifiers::NONE),
        Some(UiEvent::KeyboardEnter)
    ));
    assert!(matches!(
        key(KeyCode::Char('d'), KeyModifiers::CONTROL),
        Some(UiEvent::UIScrollPageDown)
    ));
}

#[test]
fn it_passes_plain_characters_to_the_input_line() {
    match key(KeyCode::Char('r'), KeyModifiers::NONE) {
        Some(UiEvent::KeyboardCharInput(input)) => {
            assert_eq!(input.key, Key::Char('r'));
            assert!(!input.ctrl);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn it_ignores_key_releases() {
    let mut release = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
    release.kind = KeyEventKind::Release;

    assert!(EventsService::handle_crossterm(CrosstermEvent::Key(release)).is_none());
    assert!(key(KeyCode::Insert, KeyModifiers::NONE).is_none());
}
