use std::thread;

use scenelink_transport::{ChannelConfig, MessageReceiver, MessageSender, shared_channel};
use scenelink_wire::{Identity, Message, MeshPayload, TransformPayload, decode, encode};

fn mesh_with_triangles(triangles: usize) -> MeshPayload {
    let vertices = triangles * 3;
    MeshPayload {
        triangle_count: triangles as u32,
        material: Identity::NIL,
        positions: vec![0.25; vertices * 3],
        uvs: vec![0.5; vertices * 2],
        normals: vec![1.0; vertices * 3],
    }
}

#[test]
fn test_messages_arrive_in_order_across_threads() {
    let config = ChannelConfig::default()
        .with_capacity_bytes(64 * 1024)
        .with_max_message_size(16 * 1024)
        .with_send_timeout_ms(5_000);
    let (mut tx, mut rx) = shared_channel(&config).unwrap();

    let ids: Vec<Identity> = (0..200).map(|_| Identity::new_v4()).collect();
    let sent = ids.clone();
    let producer = thread::spawn(move || {
        for (i, id) in sent.iter().enumerate() {
            let msg = if i % 2 == 0 {
                Message::add(*id, mesh_with_triangles(i % 7 + 1))
            } else {
                Message::update(*id, TransformPayload::default())
            };
            tx.send(&encode(&msg).unwrap()).unwrap();
        }
    });

    let mut received = Vec::new();
    while received.len() < ids.len() {
        match rx.try_receive().unwrap() {
            Some(bytes) => received.push(decode(&bytes).unwrap().id()),
            None => thread::yield_now(),
        }
    }
    producer.join().unwrap();
    assert_eq!(received, ids);
}

#[test]
fn test_dense_mesh_exceeds_ceiling() {
    let config = ChannelConfig::default()
        .with_capacity_bytes(64 * 1024)
        .with_max_message_size(4 * 1024);
    let (mut tx, mut rx) = shared_channel(&config).unwrap();

    let bytes = encode(&Message::add(Identity::new_v4(), mesh_with_triangles(64))).unwrap();
    assert!(bytes.len() > tx.max_message_size());
    assert!(tx.send(&bytes).is_err());
    assert_eq!(rx.try_receive().unwrap(), None);
}
