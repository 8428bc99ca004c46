//! Output sink: emits switching commands as OSC datagrams to the mixer
//! and keeps an in-memory audit log of everything sent.

use std::net::UdpSocket;
use std::sync::Mutex;

use rosc::{OscMessage, OscPacket, OscType};
use serde::{Deserialize, Serialize};

use crate::config::OscConfig;

/// One emitted command, as recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub address: String,
    pub value: String,
}

/// Best-effort UDP/OSC sender plus an append-only audit log.
///
/// Transport failures are logged and swallowed: the tick's decisions stay
/// consistent locally even if the mixer is unreachable.
pub struct OutputSink {
    socket: Option<UdpSocket>,
    target: String,
    audit_log: Mutex<Vec<AuditEntry>>,
}

impl OutputSink {
    pub fn new(config: &OscConfig) -> Self {
        let socket = match UdpSocket::bind("0.0.0.0:0") {
            Ok(s) => Some(s),
            Err(err) => {
                log::warn!("[OutputSink] failed to bind UDP socket: {}", err);
                None
            }
        };

        Self {
            socket,
            target: format!("{}:{}", config.host, config.port),
            audit_log: Mutex::new(Vec::new()),
        }
    }

    /// `/camera = target_id` — go to the named camera.
    pub fn cam(&self, target_id: &str) {
        self.emit("/camera", target_id);
    }

    /// `/wide = reason` — force the wide shot with the given reason.
    pub fn wide(&self, reason: &str) {
        self.emit("/wide", reason);
    }

    fn emit(&self, address: &str, value: &str) {
        self.record(address, value);
        self.send(address, value);
    }

    fn record(&self, address: &str, value: &str) {
        if let Ok(mut log) = self.audit_log.lock() {
            log.push(AuditEntry {
                address: address.to_string(),
                value: value.to_string(),
            });
        }
    }

    fn send(&self, address: &str, value: &str) {
        let Some(socket) = &self.socket else {
            return;
        };

        let packet = OscPacket::Message(OscMessage {
            addr: address.to_string(),
            args: vec![OscType::String(value.to_string())],
        });

        let buf = match rosc::encoder::encode(&packet) {
            Ok(buf) => buf,
            Err(err) => {
                log::warn!("[OutputSink] failed to encode OSC message: {}", err);
                return;
            }
        };

        if let Err(err) = socket.send_to(&buf, &self.target) {
            log::warn!("[OutputSink] failed to send to {}: {}", self.target, err);
        }
    }

    /// Copy of everything emitted so far, oldest first.
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.audit_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OscConfig {
        OscConfig {
            host: "127.0.0.1".to_string(),
            port: 19_999,
        }
    }

    #[test]
    fn cam_appends_to_audit_log() {
        let sink = OutputSink::new(&config());
        sink.cam("A");
        let log = sink.audit_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].address, "/camera");
        assert_eq!(log[0].value, "A");
    }

    #[test]
    fn wide_appends_to_audit_log() {
        let sink = OutputSink::new(&config());
        sink.wide("silence");
        let log = sink.audit_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].address, "/wide");
        assert_eq!(log[0].value, "silence");
    }

    #[test]
    fn audit_log_is_append_only_in_order() {
        let sink = OutputSink::new(&config());
        sink.cam("A");
        sink.wide("silence");
        sink.cam("B");
        let log = sink.audit_log();
        assert_eq!(log.len(), 3);
        assert_eq!(log[2].value, "B");
    }
}
