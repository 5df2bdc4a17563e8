use crate::networking::messages::CharacterInformationMessage;
use log::trace;

pub mod messages;
pub mod sync_timer;

/// The outgoing half of the network connection, as far as character movement is concerned.
pub trait NetworkSink {
    fn send_to_server(&mut self, message: CharacterInformationMessage);
}

/// For running without a server.
#[derive(Debug, Default)]
pub struct LoggingNetworkSink {
    pub sent: usize,
}

impl NetworkSink for LoggingNetworkSink {
    fn send_to_server(&mut self, message: CharacterInformationMessage) {
        trace!("-> {:?}", message);
        self.sent += 1;
    }
}

/// Keeps everything that has been sent, so it can be inspected later.
#[derive(Debug, Default)]
pub struct RecordingNetworkSink {
    pub messages: Vec<CharacterInformationMessage>,
}

impl NetworkSink for RecordingNetworkSink {
    fn send_to_server(&mut self, message: CharacterInformationMessage) {
        self.messages.push(message);
    }
}
