use super::*;

fn chat_event(user: &str, message: &str) -> PanelEvent {
    PanelEvent::WsMessage {
        data: frames::encode(&ChatMessage {
            user: user.to_owned(),
            message: message.to_owned(),
        }),
    }
}

fn game_event(json: &str) -> PanelEvent {
    PanelEvent::Karirs {
        data: json.to_owned(),
    }
}

#[test]
fn log_length_matches_parsed_frames_in_order() {
    let mut view = PanelView::default();
    let events = [
        chat_event("a", "1"),
        PanelEvent::WsMessage {
            data: "garbage".into(),
        },
        chat_event("b", "2"),
        chat_event("c", "3"),
    ];

    let parsed = events.iter().filter(|e| view.apply(e).is_ok()).count();

    assert_eq!(parsed, 3);
    assert_eq!(view.chat.len(), 3);
    let users: Vec<_> = view.chat.lines().iter().map(|m| m.user.as_str()).collect();
    assert_eq!(users, ["a", "b", "c"]);
}

#[test]
fn echoed_message_renders_as_one_line_with_both_fields() {
    let mut view = PanelView::default();
    let Some(PanelRequest::Chat { data }) = view.submit_text("hi") else {
        panic!("expected chat request");
    };

    // The remote endpoint echoes the frame back unchanged.
    let echoed = PanelEvent::WsMessage {
        data: frames::encode(&data),
    };
    view.apply(&echoed).expect("echo parses");

    assert_eq!(view.chat.len(), 1);
    let line = chat_log::render_line(view.chat.latest().expect("line"));
    assert!(line.contains("anonymous"));
    assert!(line.contains("hi"));
}

#[test]
fn submit_text_trims_and_ignores_blank_input() {
    let view = PanelView::default();
    assert_eq!(view.submit_text("   "), None);
    assert_eq!(
        view.submit_text("  hello  "),
        Some(PanelRequest::Chat {
            data: ChatMessage::anonymous("hello")
        })
    );
}

#[test]
fn selecting_endpoint_clears_log_and_requests_switch() {
    let mut view = PanelView::default();
    view.apply(&chat_event("a", "old")).expect("chat");

    let request = view.select_endpoint("ws://example.com/chat/2");

    assert!(view.chat.is_empty());
    assert_eq!(
        request,
        Some(PanelRequest::SwitchSession {
            url: "ws://example.com/chat/2".into()
        })
    );
}

#[test]
fn empty_endpoint_selection_is_ignored() {
    let mut view = PanelView::default();
    view.apply(&chat_event("a", "kept")).expect("chat");

    assert_eq!(view.select_endpoint(""), None);
    assert_eq!(view.chat.len(), 1);
}

#[test]
fn clear_chat_event_empties_log() {
    let mut view = PanelView::default();
    view.apply(&chat_event("a", "1")).expect("chat");
    view.apply(&PanelEvent::ClearChat).expect("clear");
    assert!(view.chat.is_empty());
}

#[test]
fn game_event_replaces_board_and_marks_leader() {
    let mut view = PanelView::default();
    view.apply(&game_event(
        r#"{"started":false,"spectators":1,"players":[{"name":"A","position":5},{"name":"B","position":9},{"name":"C","position":9}]}"#,
    ))
    .expect("game");

    assert_eq!(view.race.leader().map(|r| r.name.as_str()), Some("B"));

    view.apply(&game_event(r#"{"started":false,"players":[]}"#))
        .expect("game");
    assert!(view.race.rows().is_empty());
}

#[test]
fn malformed_game_event_leaves_board_alone() {
    let mut view = PanelView::default();
    view.apply(&game_event(r#"{"players":[{"name":"A","position":3}]}"#))
        .expect("game");

    assert!(view.apply(&game_event("{")).is_err());
    assert_eq!(view.race.rows().len(), 1);
}

#[test]
fn start_runs_countdown_then_issues_start_once() {
    let mut view = PanelView::default();
    assert!(view.press_start());
    assert!(!view.press_start(), "second press is ignored");

    let mut commands = Vec::new();
    for _ in 0..20 {
        if let Some(request) = view.tick_countdown() {
            commands.push(request);
        }
    }

    assert_eq!(
        commands,
        vec![PanelRequest::Karirs {
            data: GameCommand::new(GameAction::Start)
        }]
    );
    assert_eq!(view.countdown.display(), None);
}

#[test]
fn start_is_unavailable_while_race_runs() {
    let mut view = PanelView::default();
    view.apply(&game_event(r#"{"started":true}"#)).expect("game");
    assert!(!view.press_start());
}

#[test]
fn race_starting_cancels_pending_countdown() {
    let mut view = PanelView::default();
    view.press_start();
    view.tick_countdown();

    view.apply(&game_event(r#"{"started":true}"#)).expect("game");

    assert!(!view.countdown.is_running());
    assert_eq!(view.tick_countdown(), None);
}

#[test]
fn stop_cancels_countdown_and_sends_immediately() {
    let mut view = PanelView::default();
    view.press_start();

    let request = view.press_stop();

    assert_eq!(
        request,
        PanelRequest::Karirs {
            data: GameCommand::new(GameAction::Stop)
        }
    );
    assert!(!view.countdown.is_running());
}

#[test]
fn change_sends_immediately() {
    let view = PanelView::default();
    assert_eq!(
        view.press_change(),
        PanelRequest::Karirs {
            data: GameCommand::new(GameAction::Change)
        }
    );
}

#[test]
fn drawer_lock_toggles_locally() {
    let mut view = PanelView::default();
    assert!(!view.drawer_unlocked());
    assert!(view.toggle_drawer_lock());
    assert!(!view.toggle_drawer_lock());
}

#[test]
fn status_events_update_read_side() {
    let mut view = PanelView::default();
    view.apply(&PanelEvent::Connection {
        feed: Feed::Game,
        state: ConnectionState::Open,
        url: "ws://x/".into(),
    })
    .expect("connection");
    view.apply(&PanelEvent::Badge {
        value: 4,
        tooltip: "4 unread messages".into(),
    })
    .expect("badge");
    view.apply(&PanelEvent::DeliveryFailed {
        feed: Feed::Chat,
        reason: "chat connection is closed".into(),
    })
    .expect("failure");

    assert_eq!(view.connection(Feed::Game), ConnectionState::Open);
    assert_eq!(view.connection(Feed::Chat), ConnectionState::Disconnected);
    assert_eq!(view.badge(), 4);
    assert_eq!(view.last_failure(), Some("chat: chat connection is closed"));
}
