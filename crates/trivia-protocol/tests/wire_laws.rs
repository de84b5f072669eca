//! Properties the wire format must hold for every tag length, checked
//! through the public API only.

use serde_json::json;
use trivia_protocol::{
    decode, encode, Command, ErrorKind, GameRequest, GameRequestKind,
    TAG_WIDTH,
};

#[test]
fn test_round_trip_holds_for_every_tag_length() {
    let payload = json!({ "gameId": "g1", "nested": { "ok": true, "n": [1, 2] } });
    for len in 0..=TAG_WIDTH {
        let tag = "X".repeat(len);
        let bytes = encode(&tag, &payload).expect("tag fits");
        assert!(bytes.len() > TAG_WIDTH);

        let env = decode(&bytes).expect("should decode");
        assert_eq!(env.tag.as_str(), tag, "len {len}");
        assert_eq!(env.payload, payload, "len {len}");
    }
}

#[test]
fn test_short_input_is_never_a_payload_error() {
    let sample = b"GAMEPLAY                        {}";
    for len in 0..TAG_WIDTH {
        let err = decode(&sample[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Framing, "len {len}");
    }
}

#[test]
fn test_oversized_tags_are_rejected_not_truncated() {
    for len in [TAG_WIDTH + 1, TAG_WIDTH * 2] {
        let err = encode(&"Y".repeat(len), &json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }
}

#[test]
fn test_join_without_game_id_never_produces_bytes() {
    let result = GameRequest::new(GameRequestKind::Join, None)
        .map(Command::from)
        .and_then(|cmd| cmd.encode());
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
}
