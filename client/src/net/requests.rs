//! Every call the UI makes, named and typed.
//!
//! Acknowledged calls take an `on_reply` handler that receives the
//! classified [`Reply`]. The handler is armed on `<name>-callback` before
//! the request is sent.

#[cfg(test)]
#[path = "requests_test.rs"]
mod requests_test;

use frames::channels;
use serde_json::Value;

use crate::net::bridge::ChannelBridge;
use crate::net::reply::{Reply, ServerStatus};
use crate::state::identity::SceneId;

fn acked<F>(bridge: &ChannelBridge, channel: &str, args: Vec<Value>, mut on_reply: F)
where
    F: FnMut(Reply) + 'static,
{
    bridge.send_and_receive(channel, move |reply| on_reply(Reply::from_args(reply)), args);
}

fn on_status<F>(bridge: &ChannelBridge, channel: &str, mut handler: F)
where
    F: FnMut(ServerStatus) + 'static,
{
    let name = channel.to_owned();
    bridge.listen(channel, move |args| match ServerStatus::from_args(args) {
        Some(status) => handler(status),
        None => log::warn!("malformed status payload on {name}"),
    });
}

// --- Host-local ---

/// Ask the host to open the remote connection. Status arrives on
/// [`on_initial_status`] until the first success, then on [`on_server_status`].
pub fn connect_to_server(bridge: &ChannelBridge, url: &str) {
    bridge.send(channels::CONNECT_TO_SERVER, vec![Value::from(url)]);
}

/// Return to server selection: the next success counts as the first again.
pub fn reset(bridge: &ChannelBridge) {
    bridge.send(channels::RESET, Vec::new());
}

pub fn on_initial_status<F>(bridge: &ChannelBridge, handler: F)
where
    F: FnMut(ServerStatus) + 'static,
{
    on_status(bridge, channels::INITIAL_SERVER_STATUS, handler);
}

pub fn on_server_status<F>(bridge: &ChannelBridge, handler: F)
where
    F: FnMut(ServerStatus) + 'static,
{
    on_status(bridge, channels::SERVER_STATUS, handler);
}

/// Merge `partial` into the host's credential file.
pub fn save_user_data(bridge: &ChannelBridge, partial: Value) {
    bridge.send(channels::SAVE_USER_DATA, vec![partial]);
}

/// Read the host's credential file.
pub fn initial_data<F>(bridge: &ChannelBridge, mut on_data: F)
where
    F: FnMut(Value) + 'static,
{
    bridge.send_and_receive(
        channels::INITIAL_DATA,
        move |args| on_data(args.first().cloned().unwrap_or(Value::Null)),
        Vec::new(),
    );
}

// --- Acknowledged remote calls ---

pub fn login<F>(bridge: &ChannelBridge, user: &str, password: &str, on_reply: F)
where
    F: FnMut(Reply) + 'static,
{
    acked(bridge, channels::LOGIN, vec![Value::from(user), Value::from(password)], on_reply);
}

pub fn password_reset<F>(bridge: &ChannelBridge, user: &str, new_password: &str, on_reply: F)
where
    F: FnMut(Reply) + 'static,
{
    acked(bridge, channels::PASSWORD_RESET, vec![Value::from(user), Value::from(new_password)], on_reply);
}

pub fn user_save<F>(bridge: &ChannelBridge, id: &str, on_reply: F)
where
    F: FnMut(Reply) + 'static,
{
    acked(bridge, channels::USER_SAVE, vec![Value::from(id)], on_reply);
}

pub fn scene_save<F>(bridge: &ChannelBridge, name: &str, graph: &str, on_reply: F)
where
    F: FnMut(Reply) + 'static,
{
    acked(bridge, channels::SCENE_SAVE, vec![Value::from(name), Value::from(graph)], on_reply);
}

pub fn scene_create<F>(bridge: &ChannelBridge, name: &str, graph: &str, on_reply: F)
where
    F: FnMut(Reply) + 'static,
{
    acked(bridge, channels::SCENE_CREATE, vec![Value::from(name), Value::from(graph)], on_reply);
}

/// Make `scene_id` this user's scene. The server answers with the scene
/// list on `set-my-scene-callback` and pushes `scene-data`.
pub fn set_my_scene<F>(bridge: &ChannelBridge, scene_id: &SceneId, user_id: &str, on_reply: F)
where
    F: FnMut(Reply) + 'static,
{
    acked(bridge, channels::SET_MY_SCENE, vec![scene_id.to_value(), Value::from(user_id)], on_reply);
}

pub fn get_maps<F>(bridge: &ChannelBridge, on_reply: F)
where
    F: FnMut(Reply) + 'static,
{
    acked(bridge, channels::GET_MAPS, Vec::new(), on_reply);
}

// --- Fire-and-forget remote calls ---

pub fn set_current_scene(bridge: &ChannelBridge, scene_id: &SceneId, user_id: &str) {
    bridge.send(channels::SET_CURRENT_SCENE, vec![scene_id.to_value(), Value::from(user_id)]);
}

pub fn get_scene(bridge: &ChannelBridge, scene_id: &SceneId) {
    bridge.send(channels::GET_SCENE, vec![scene_id.to_value()]);
}

/// Publish a full serialized graph as the new state of `scene_id`.
pub fn scene_update(bridge: &ChannelBridge, scene_id: &SceneId, graph: String) {
    bridge.send(channels::SCENE_UPDATE, vec![scene_id.to_value(), Value::from(graph)]);
}

pub fn message(bridge: &ChannelBridge, body: Value) {
    bridge.send(channels::MESSAGE, vec![body]);
}

pub fn logout(bridge: &ChannelBridge) {
    bridge.send(channels::LOGOUT, Vec::new());
}
