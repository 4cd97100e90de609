//! Shared fixtures for unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use frames::Frame;
use scene::graph::SceneConfig;

use crate::net::bridge::{ChannelBridge, HostLink};

/// Host link that records every frame instead of sending it.
#[derive(Default)]
pub struct RecordingLink {
    pub sent: RefCell<Vec<Frame>>,
    pub closed: Cell<bool>,
}

impl RecordingLink {
    pub fn channels(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|f| f.channel.clone()).collect()
    }

    pub fn last(&self) -> Frame {
        self.sent.borrow().last().cloned().expect("a frame was sent")
    }

    pub fn last_on(&self, channel: &str) -> Frame {
        self.sent
            .borrow()
            .iter()
            .rev()
            .find(|f| f.channel == channel)
            .cloned()
            .unwrap_or_else(|| panic!("no frame on {channel}"))
    }
}

impl HostLink for RecordingLink {
    fn send_frame(&self, frame: Frame) -> bool {
        if self.closed.get() {
            return false;
        }
        self.sent.borrow_mut().push(frame);
        true
    }
}

pub fn recording_bridge() -> (Rc<RecordingLink>, Rc<ChannelBridge>) {
    let link = Rc::new(RecordingLink::default());
    let bridge = Rc::new(ChannelBridge::new(link.clone()));
    (link, bridge)
}

/// A 10x8 map of 100px cells with two tokens.
pub fn scene_config() -> SceneConfig {
    SceneConfig {
        map_url: "maps/cave.png".to_owned(),
        map_width: 1000.0,
        map_height: 800.0,
        grid_columns: 10,
        grid_rows: 8,
        map_x: 0.0,
        map_z: 0.0,
        grid_lines: true,
        token_urls: vec!["images/token1.png".to_owned(), "images/token2.png".to_owned()],
    }
}

pub fn scene_json() -> String {
    scene::model::build_scene(&scene_config()).expect("valid config builds")
}
