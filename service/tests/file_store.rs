use mineroom_core::{ActionKind, ErrorKind, SessionStatus};
use mineroom_protocol::{CreateRoomRequest, CreateSessionRequest, PlayerAction};
use mineroom_service::*;

fn config(dir: &std::path::Path) -> ServiceConfig {
    ServiceConfig {
        seed: Some(21),
        store: StoreConfig::File {
            path: dir.to_owned(),
        },
        users: vec![UserConfig::new("alice")],
    }
}

#[test]
fn sessions_and_rooms_outlive_the_hub() {
    let dir = tempfile::tempdir().unwrap();

    let (session_id, room_id) = {
        let hub = GameHub::from_config(&config(dir.path())).unwrap();
        let session = hub
            .start_game(&CreateSessionRequest::new(9, 9, 10).with_user("alice"))
            .unwrap();
        hub.sessions()
            .apply_action(&session.session_id, &PlayerAction::new(ActionKind::Flag, 2, 3))
            .unwrap();
        hub.sessions().pause(&session.session_id).unwrap();
        let room = hub
            .rooms()
            .create_room(&CreateRoomRequest {
                room_name: "saved".into(),
                max_players: 4,
                host_id: "alice".into(),
            })
            .unwrap();
        (session.session_id, room.room_id)
    };

    assert!(dir.path().join("sessions").join(format!("{session_id}.json")).exists());

    let hub = GameHub::from_config(&config(dir.path())).unwrap();
    let view = hub.sessions().get_view(&session_id).unwrap();
    assert_eq!(view.status, SessionStatus::Paused);
    assert_eq!(view.mines_left, 9);
    assert_eq!(view.players, ["alice"]);
    assert_eq!(hub.rooms().get_room(&room_id).unwrap().room_name, "saved");

    hub.sessions().resume(&session_id).unwrap();
    hub.sessions().delete_session(&session_id).unwrap();
    assert_eq!(
        hub.sessions().get_view(&session_id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn corrupt_session_file_is_internal() {
    let dir = tempfile::tempdir().unwrap();
    let hub = GameHub::from_config(&config(dir.path())).unwrap();
    std::fs::write(dir.path().join("sessions").join("GAME_broken.json"), "[]").unwrap();

    let err = hub.sessions().get_view("GAME_broken").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn inconsistent_session_file_is_internal_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let hub = GameHub::from_config(&config(dir.path())).unwrap();
    let id = hub
        .start_game(&CreateSessionRequest::new(9, 9, 10))
        .unwrap()
        .session_id;
    let path = dir.path().join("sessions").join(format!("{id}.json"));

    let mut record: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    record["flagged"] = serde_json::to_value(ndarray::Array2::<bool>::default((2, 2))).unwrap();
    std::fs::write(&path, serde_json::to_vec(&record).unwrap()).unwrap();

    let action = PlayerAction::new(ActionKind::Flag, 8, 8);
    let err = hub.sessions().apply_action(&id, &action).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(
        hub.sessions().get_view(&id).unwrap_err().kind(),
        ErrorKind::Internal
    );
}
