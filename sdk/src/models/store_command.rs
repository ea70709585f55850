use crate::bytes_serializable::BytesSerializable;
use crate::error::ShoalError;
use crate::validatable::Validatable;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// `StoreCommand` is a decoded write operation replicated from the master,
/// represented as the argument vector of the original client command
/// (e.g. `["set", "user:1", "alice"]`). The replication core never interprets
/// the arguments - it only carries them to the storage engine.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct StoreCommand {
    /// Arguments of the command, starting with its name.
    pub args: Vec<String>,
}

impl StoreCommand {
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    pub fn get_size_bytes(&self) -> usize {
        4 + self.args.iter().map(|arg| 4 + arg.len()).sum::<usize>()
    }
}

impl Validatable<ShoalError> for StoreCommand {
    fn validate(&self) -> Result<(), ShoalError> {
        if self.args.is_empty() {
            return Err(ShoalError::EmptyStoreCommand);
        }

        Ok(())
    }
}

impl BytesSerializable for StoreCommand {
    fn to_bytes(&self) -> Bytes {
        let mut bytes = BytesMut::with_capacity(self.get_size_bytes());
        #[allow(clippy::cast_possible_truncation)]
        bytes.put_u32_le(self.args.len() as u32);
        for arg in &self.args {
            #[allow(clippy::cast_possible_truncation)]
            bytes.put_u32_le(arg.len() as u32);
            bytes.put_slice(arg.as_bytes());
        }
        bytes.freeze()
    }

    fn from_bytes(bytes: Bytes) -> Result<Self, ShoalError> {
        if bytes.len() < 4 {
            return Err(ShoalError::InvalidCommand);
        }

        let count = u32::from_le_bytes(bytes[0..4].try_into()?) as usize;
        // Each argument needs at least its own length prefix.
        if count > (bytes.len() - 4) / 4 {
            return Err(ShoalError::InvalidCommand);
        }

        let mut args = Vec::with_capacity(count);
        let mut position = 4;
        for _ in 0..count {
            if bytes.len() < position + 4 {
                return Err(ShoalError::InvalidCommand);
            }
            let length = u32::from_le_bytes(bytes[position..position + 4].try_into()?) as usize;
            position += 4;
            if bytes.len() < position + length {
                return Err(ShoalError::InvalidCommand);
            }
            args.push(std::str::from_utf8(&bytes[position..position + length])?.to_string());
            position += length;
        }

        Ok(StoreCommand { args })
    }
}

impl Display for StoreCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_be_serialized_as_bytes() {
        let command = StoreCommand::new(vec![
            "set".to_string(),
            "user:1".to_string(),
            "alice".to_string(),
        ]);
        let bytes = command.to_bytes();

        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()), 3);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 3);
        assert_eq!(&bytes[8..11], b"set");
    }

    #[test]
    fn should_be_deserialized_from_bytes() {
        let command = StoreCommand::new(vec!["del".to_string(), "user:2".to_string()]);
        let deserialized = StoreCommand::from_bytes(command.to_bytes());

        assert!(deserialized.is_ok());
        assert_eq!(deserialized.unwrap(), command);
    }

    #[test]
    fn should_fail_for_truncated_argument() {
        let bytes = StoreCommand::new(vec!["set".to_string(), "key".to_string()]).to_bytes();
        let truncated = bytes.slice(0..bytes.len() - 2);
        let result = StoreCommand::from_bytes(truncated);
        assert!(matches!(result, Err(ShoalError::InvalidCommand)));
    }

    #[test]
    fn should_fail_validation_when_empty() {
        let command = StoreCommand::default();
        assert!(matches!(
            command.validate(),
            Err(ShoalError::EmptyStoreCommand)
        ));
    }
}
