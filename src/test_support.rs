//! In-memory remote transport shared by the host unit tests.

use std::sync::{Arc, Mutex, MutexGuard};

use frames::Frame;

use crate::remote::{Connector, Generation, RemoteEvent, RemoteEventSink, RemoteSocket};

#[derive(Default)]
pub struct FakeState {
    pub urls: Vec<String>,
    pub sinks: Vec<RemoteEventSink>,
    pub sent: Vec<(Generation, Frame)>,
    /// Ids of sent frames that asked for an acknowledgement.
    pub acked: Vec<String>,
    pub disconnected: Vec<Generation>,
}

/// Connector whose sockets record what they are asked to do.
#[derive(Clone, Default)]
pub struct FakeConnector(Arc<Mutex<FakeState>>);

impl FakeConnector {
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.0.lock().expect("fake state poisoned")
    }

    /// Report `event` from the most recent transport.
    pub fn emit(&self, event: RemoteEvent) {
        let sink = self.state().sinks.last().cloned().expect("no transport opened");
        assert!(sink.emit(event), "host stopped listening");
    }

    pub fn connects(&self) -> usize {
        self.state().urls.len()
    }

    pub fn sent_channels(&self) -> Vec<String> {
        self.state().sent.iter().map(|(_, f)| f.channel.clone()).collect()
    }

    pub fn last_sent(&self) -> Frame {
        self.state().sent.last().map(|(_, f)| f.clone()).expect("nothing sent")
    }
}

impl Connector for FakeConnector {
    fn connect(&self, url: &str, sink: RemoteEventSink) -> Box<dyn RemoteSocket> {
        let generation = sink.generation();
        let mut state = self.state();
        state.urls.push(url.to_owned());
        state.sinks.push(sink);
        Box::new(FakeSocket { state: Arc::clone(&self.0), generation })
    }
}

struct FakeSocket {
    state: Arc<Mutex<FakeState>>,
    generation: Generation,
}

impl RemoteSocket for FakeSocket {
    fn send(&self, frame: Frame) -> bool {
        self.state.lock().expect("fake state poisoned").sent.push((self.generation, frame));
        true
    }

    fn send_with_ack(&self, frame: Frame) -> bool {
        let mut state = self.state.lock().expect("fake state poisoned");
        state.acked.push(frame.id.clone());
        state.sent.push((self.generation, frame));
        true
    }

    fn disconnect(&self) {
        self.state.lock().expect("fake state poisoned").disconnected.push(self.generation);
    }
}
