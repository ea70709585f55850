use crate::bytes_serializable::BytesSerializable;
use crate::command::{Command, META_SYNC_CODE};
use crate::error::ShoalError;
use crate::models::node::ReplicaNode;
use crate::validatable::Validatable;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Maximum length of the shared-secret auth token in bytes.
pub const MAX_AUTH_TOKEN_LENGTH: usize = 255;

/// `MetaSync` is the handshake a replica sends when it joins or reconnects to a master.
/// It has additional payload:
/// - `node` - the replica's own identity (client-facing address).
/// - `auth` - optional shared-secret token, sent only when the master requires one.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Clone)]
pub struct MetaSync {
    /// The replica's own identity.
    pub node: ReplicaNode,
    /// Optional shared-secret auth token.
    pub auth: Option<String>,
}

impl Command for MetaSync {
    fn code(&self) -> u32 {
        META_SYNC_CODE
    }
}

impl Validatable<ShoalError> for MetaSync {
    fn validate(&self) -> Result<(), ShoalError> {
        self.node.validate()?;
        if let Some(auth) = &self.auth {
            if auth.is_empty() || auth.len() > MAX_AUTH_TOKEN_LENGTH {
                return Err(ShoalError::InvalidAuthToken);
            }
        }

        Ok(())
    }
}

impl BytesSerializable for MetaSync {
    fn to_bytes(&self) -> Bytes {
        let node_bytes = self.node.to_bytes();
        let auth_length = self.auth.as_ref().map_or(0, |auth| auth.len());
        let mut bytes = BytesMut::with_capacity(node_bytes.len() + 1 + auth_length);
        bytes.put_slice(&node_bytes);
        #[allow(clippy::cast_possible_truncation)]
        bytes.put_u8(auth_length as u8);
        if let Some(auth) = &self.auth {
            bytes.put_slice(auth.as_bytes());
        }
        bytes.freeze()
    }

    fn from_bytes(bytes: Bytes) -> Result<MetaSync, ShoalError> {
        let node = ReplicaNode::from_bytes(bytes.clone())?;
        let mut position = node.get_size_bytes();
        if bytes.len() < position + 1 {
            return Err(ShoalError::InvalidCommand);
        }

        let auth_length = bytes[position] as usize;
        position += 1;
        let auth = if auth_length == 0 {
            None
        } else {
            if bytes.len() < position + auth_length {
                return Err(ShoalError::InvalidAuthToken);
            }
            Some(std::str::from_utf8(&bytes[position..position + auth_length])?.to_string())
        };

        Ok(MetaSync { node, auth })
    }
}

impl Display for MetaSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.node, self.auth.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_serialized_as_bytes() {
        let command = MetaSync {
            node: ReplicaNode::new("127.0.0.1", 9221),
            auth: Some("sup3rsecret".to_string()),
        };

        let bytes = command.to_bytes();
        let node = ReplicaNode::from_bytes(bytes.clone()).unwrap();
        let position = node.get_size_bytes();
        let auth_length = bytes[position] as usize;
        let auth =
            std::str::from_utf8(&bytes[position + 1..position + 1 + auth_length]).unwrap();

        assert!(!bytes.is_empty());
        assert_eq!(node, command.node);
        assert_eq!(auth, command.auth.as_deref().unwrap());
    }

    #[test]
    fn should_be_deserialized_from_bytes() {
        let command = MetaSync {
            node: ReplicaNode::new("10.1.2.3", 6380),
            auth: None,
        };

        let deserialized = MetaSync::from_bytes(command.to_bytes());
        assert!(deserialized.is_ok());
        assert_eq!(deserialized.unwrap(), command);
    }

    #[test]
    fn should_fail_validation_for_oversized_auth_token() {
        let command = MetaSync {
            node: ReplicaNode::new("127.0.0.1", 9221),
            auth: Some("a".repeat(MAX_AUTH_TOKEN_LENGTH + 1)),
        };

        assert!(matches!(
            command.validate(),
            Err(ShoalError::InvalidAuthToken)
        ));
    }
}
