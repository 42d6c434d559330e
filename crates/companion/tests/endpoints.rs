mod support;

use std::time::Duration;

use companion::{CompanionClient, CompanionConfig, CompanionError, ErrorKind, SyncState};
use support::{closed_port, serve, Routes};

fn client_for(port: u16) -> CompanionClient {
    let config = CompanionConfig::new("127.0.0.1", port, Duration::from_secs(2)).unwrap();
    CompanionClient::new(config).unwrap()
}

#[test]
fn state_one_reads_as_changed() {
    let routes = Routes::default();
    routes.set("/state/", 200, "1");
    let client = client_for(serve(routes.clone()));
    assert_eq!(client.check_state().unwrap(), SyncState::Changed);

    routes.set("/state/", 200, "0");
    assert_eq!(client.check_state().unwrap(), SyncState::Unchanged);

    routes.set("/state/", 200, "");
    assert_eq!(client.check_state().unwrap(), SyncState::Unchanged);
}

#[test]
fn non_success_status_is_transport_error() {
    let routes = Routes::default();
    routes.set("/state/", 503, "busy");
    let client = client_for(serve(routes));
    let err = client.check_state().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(err, CompanionError::Status { status, .. } if status.as_u16() == 503));
}

#[test]
fn binary_state_body_is_protocol_error() {
    let routes = Routes::default();
    routes.set("/state/", 200, vec![0xff, 0x00, 0xfe]);
    let client = client_for(serve(routes));
    let err = client.check_state().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[test]
fn unreachable_companion_is_transport_error() {
    let client = client_for(closed_port());
    let err = client.check_state().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(err, CompanionError::Unreachable { .. }));
}

#[test]
fn fetches_background_bytes_verbatim() {
    let routes = Routes::default();
    let payload: Vec<u8> = (0u8..=255).collect();
    routes.set("/bg/", 200, payload.clone());
    let client = client_for(serve(routes));
    assert_eq!(client.fetch_background().unwrap(), payload);
}

#[test]
fn missing_background_is_transport_error() {
    let client = client_for(serve(Routes::default()));
    let err = client.fetch_background().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
