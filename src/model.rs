// src/model.rs
use serde::{Deserialize, Serialize};

/// One captured packet as listed by the capture server.
///
/// Identity is the 0-based position in the server's list, which is also the
/// key for detail lookups. `no` is the server's 1-based display number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub no: u64,
    pub time: String,
    pub src: String,
    pub dst: String,
    pub protocol: String,
    pub length: u64,
    pub info: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Up,
    Down,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    Ethernet,
    Wifi,
    Loopback,
    Bluetooth,
    #[serde(other)]
    Unknown,
}

impl InterfaceKind {
    pub fn label(self) -> &'static str {
        match self {
            InterfaceKind::Ethernet => "ethernet",
            InterfaceKind::Wifi => "wifi",
            InterfaceKind::Loopback => "loopback",
            InterfaceKind::Bluetooth => "bluetooth",
            InterfaceKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default = "unknown_status")]
    pub status: LinkStatus,
    #[serde(rename = "type", default = "unknown_kind")]
    pub kind: InterfaceKind,
}

fn unknown_status() -> LinkStatus {
    LinkStatus::Unknown
}

fn unknown_kind() -> InterfaceKind {
    InterfaceKind::Unknown
}

impl Interface {
    /// The server reports "no address" as an empty string.
    pub fn address(&self) -> Option<&str> {
        self.ip.as_deref().filter(|ip| !ip.trim().is_empty())
    }

    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    pub fn tooltip(&self) -> String {
        let status = match self.status {
            LinkStatus::Up => "up",
            LinkStatus::Down => "down",
            LinkStatus::Unknown => "unknown",
        };
        format!(
            "Interface: {} | IP: {} | Status: {} | Type: {}",
            self.name,
            self.address().unwrap_or("No IP"),
            status,
            self.kind.label()
        )
    }

    fn is_default_candidate(&self) -> bool {
        self.status == LinkStatus::Up
            && self.address().is_some()
            && self.kind != InterfaceKind::Loopback
    }
}

/// First interface that is up, has an address and is not loopback.
pub fn default_interface(interfaces: &[Interface]) -> Option<usize> {
    interfaces.iter().position(Interface::is_default_candidate)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    pub interface: String,
    pub filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Capturing,
    Stopped,
}

// Wire envelopes.

#[derive(Debug, Deserialize)]
pub(crate) struct InterfacesEnvelope {
    #[serde(default)]
    pub interfaces: Vec<Interface>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordsEnvelope {
    #[serde(default)]
    pub packets: Vec<Record>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailEnvelope {
    pub details: String,
}
