use crate::bytes_serializable::BytesSerializable;
use crate::error::ShoalError;
use crate::validatable::Validatable;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Maximum length of a node address in bytes, length-prefixed with a single byte on the wire.
pub const MAX_IP_LENGTH: usize = 255;

/// `ReplicaNode` identifies a cluster member for protocol addressing.
/// It consists of the following fields:
/// - `ip` - IP address (or hostname) of the node, max length is 255 bytes.
/// - `port` - primary client-facing port of the node.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
pub struct ReplicaNode {
    /// IP address of the node.
    pub ip: String,
    /// Primary client-facing port of the node.
    pub port: u16,
}

impl ReplicaNode {
    pub fn new(ip: &str, port: u16) -> Self {
        Self {
            ip: ip.to_string(),
            port,
        }
    }

    pub fn get_size_bytes(&self) -> usize {
        1 + self.ip.len() + 2
    }
}

impl Validatable<ShoalError> for ReplicaNode {
    fn validate(&self) -> Result<(), ShoalError> {
        if self.ip.is_empty() || self.ip.len() > MAX_IP_LENGTH {
            return Err(ShoalError::InvalidReplicaAddress);
        }

        if self.port == 0 {
            return Err(ShoalError::InvalidReplicaAddress);
        }

        Ok(())
    }
}

impl BytesSerializable for ReplicaNode {
    fn to_bytes(&self) -> Bytes {
        let mut bytes = BytesMut::with_capacity(self.get_size_bytes());
        #[allow(clippy::cast_possible_truncation)]
        bytes.put_u8(self.ip.len() as u8);
        bytes.put_slice(self.ip.as_bytes());
        bytes.put_u16_le(self.port);
        bytes.freeze()
    }

    fn from_bytes(bytes: Bytes) -> Result<Self, ShoalError> {
        if bytes.len() < 4 {
            return Err(ShoalError::InvalidCommand);
        }

        let ip_length = bytes[0] as usize;
        if ip_length == 0 || bytes.len() < 1 + ip_length + 2 {
            return Err(ShoalError::InvalidReplicaAddress);
        }

        let ip = std::str::from_utf8(&bytes[1..1 + ip_length])?.to_string();
        let port = u16::from_le_bytes(bytes[1 + ip_length..1 + ip_length + 2].try_into()?);
        Ok(ReplicaNode { ip, port })
    }
}

impl Display for ReplicaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_serialized_as_bytes() {
        let node = ReplicaNode::new("127.0.0.1", 9221);
        let bytes = node.to_bytes();

        assert_eq!(bytes[0] as usize, node.ip.len());
        assert_eq!(&bytes[1..10], node.ip.as_bytes());
        assert_eq!(u16::from_le_bytes(bytes[10..12].try_into().unwrap()), 9221);
    }

    #[test]
    fn should_be_deserialized_from_bytes() {
        let node = ReplicaNode::new("10.0.0.7", 6380);
        let deserialized = ReplicaNode::from_bytes(node.to_bytes());

        assert!(deserialized.is_ok());
        assert_eq!(deserialized.unwrap(), node);
    }

    #[test]
    fn should_fail_validation_for_port_zero() {
        let node = ReplicaNode::new("127.0.0.1", 0);
        assert!(matches!(
            node.validate(),
            Err(ShoalError::InvalidReplicaAddress)
        ));
    }
}
