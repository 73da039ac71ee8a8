use serde::Deserialize;
use wsmux_core::error::{Result, WsMuxError};
use wsmux_core::protocol::{BoolDecoding, WireFormat, DEFAULT_PREFIX, DEFAULT_SEPARATOR};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub wire: WireSection,

    #[serde(default)]
    pub transport: TransportSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            wire: WireSection::default(),
            transport: TransportSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(WsMuxError::UnsupportedVersion);
        }

        self.wire_format()?;
        self.transport.validate()?;

        Ok(())
    }

    /// Build the wire format both encoder and decoder will share.
    pub fn wire_format(&self) -> Result<WireFormat> {
        Ok(WireFormat::new(self.wire.prefix.clone(), self.wire.separator)?
            .with_bool_decoding(self.wire.bool_decoding))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireSection {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_separator")]
    pub separator: char,

    #[serde(default)]
    pub bool_decoding: BoolDecoding,
}

impl Default for WireSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            separator: default_separator(),
            bool_decoding: BoolDecoding::default(),
        }
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.into()
}
fn default_separator() -> char {
    DEFAULT_SEPARATOR
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportSection {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Keepalive ping period; `0` disables pings.
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    /// Close the connection when nothing (pongs included) arrives for this
    /// long; `0` disables the check.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Bound on a single frame write; `0` means unbounded.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    /// Inbound text larger than this is dropped; `0` means unlimited.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            ping_interval_ms: default_ping_interval_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            outbound_queue: default_outbound_queue(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

impl TransportSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=120_000).contains(&self.connect_timeout_ms) {
            return Err(WsMuxError::BadConfig(
                "transport.connect_timeout_ms must be between 100 and 120000".into(),
            ));
        }
        if self.ping_interval_ms != 0 && !(1_000..=300_000).contains(&self.ping_interval_ms) {
            return Err(WsMuxError::BadConfig(
                "transport.ping_interval_ms must be 0 or between 1000 and 300000".into(),
            ));
        }
        if self.read_timeout_ms != 0 && !(1_000..=600_000).contains(&self.read_timeout_ms) {
            return Err(WsMuxError::BadConfig(
                "transport.read_timeout_ms must be 0 or between 1000 and 600000".into(),
            ));
        }
        // pongs are the only traffic on an idle connection
        if self.read_timeout_ms != 0
            && self.ping_interval_ms != 0
            && self.read_timeout_ms <= self.ping_interval_ms
        {
            return Err(WsMuxError::BadConfig(
                "transport.read_timeout_ms must be greater than transport.ping_interval_ms".into(),
            ));
        }
        if self.write_timeout_ms != 0 && !(100..=120_000).contains(&self.write_timeout_ms) {
            return Err(WsMuxError::BadConfig(
                "transport.write_timeout_ms must be 0 or between 100 and 120000".into(),
            ));
        }
        if !(1..=65_536).contains(&self.outbound_queue) {
            return Err(WsMuxError::BadConfig(
                "transport.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}
fn default_ping_interval_ms() -> u64 {
    30_000
}
fn default_read_timeout_ms() -> u64 {
    60_000
}
fn default_write_timeout_ms() -> u64 {
    15_000
}
fn default_outbound_queue() -> usize {
    256
}
fn default_max_message_bytes() -> usize {
    1024 * 1024
}
