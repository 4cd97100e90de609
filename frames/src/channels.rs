//! Channel names shared by the UI, the host, and the remote server.

// ── UI → host → remote, acknowledged ────────────────────────────

pub const LOGIN: &str = "login";
pub const PASSWORD_RESET: &str = "password-reset";
pub const USER_SAVE: &str = "user-save";
pub const SCENE_SAVE: &str = "scene-save";
pub const SCENE_CREATE: &str = "scene-create";
pub const SET_MY_SCENE: &str = "set-my-scene";
pub const GET_MAPS: &str = "get-maps";

// ── UI → host → remote, fire-and-forget ─────────────────────────

pub const SET_CURRENT_SCENE: &str = "set-current-scene";
pub const SCENE_UPDATE: &str = "scene-update";
pub const GET_SCENE: &str = "get-scene";
pub const MESSAGE: &str = "message";
pub const LOGOUT: &str = "logout";

// ── UI → host only ──────────────────────────────────────────────

pub const CONNECT_TO_SERVER: &str = "connect-to-server";
pub const RESET: &str = "reset";
pub const SAVE_USER_DATA: &str = "save-user-data";
pub const INITIAL_DATA: &str = "initial-data";

// ── host → UI status ────────────────────────────────────────────

/// Connection status while the blocking connect screen is up.
pub const INITIAL_SERVER_STATUS: &str = "initial-server-status";
/// Connection status after the first successful connect.
pub const SERVER_STATUS: &str = "server-status";

// ── remote → host → UI broadcasts ───────────────────────────────

pub const CURRENT_USERS: &str = "current-users";
pub const SCENE_DATA: &str = "scene-data";
pub const CURRENT_MESSAGES: &str = "current-messages";

// ── UI window events ────────────────────────────────────────────

/// Scene editor proposal dispatched to the window that owns the scene.
pub const SCENE_MANAGE: &str = "scene-manage";
