//! Calldata for the registry contract.

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::Function;
use alloy_primitives::Address;
use chainreg_core::RegistryError;

const CHANGE_STATUSES: &str =
    "function changeRegistrationStatuses(address[] addresses, bool isRegistered)";
const REGISTERED: &str = "function registered(address account) returns (bool)";
const OWNER: &str = "function owner() returns (address)";

fn parse(signature: &str) -> Result<Function, RegistryError> {
    Function::parse(signature).map_err(|e| RegistryError::Abi(format!("'{signature}': {e}")))
}

/// Encoder/decoder for the three registry functions the engine uses.
#[derive(Debug, Clone)]
pub struct RegistryAbi {
    change_statuses: Function,
    registered: Function,
    owner: Function,
}

impl RegistryAbi {
    pub fn new() -> Result<Self, RegistryError> {
        Ok(Self {
            change_statuses: parse(CHANGE_STATUSES)?,
            registered: parse(REGISTERED)?,
            owner: parse(OWNER)?,
        })
    }

    /// `changeRegistrationStatuses(addresses, register)` calldata.
    pub fn change_statuses(
        &self,
        addresses: &[Address],
        register: bool,
    ) -> Result<Vec<u8>, RegistryError> {
        let list = addresses.iter().copied().map(DynSolValue::Address).collect();
        self.change_statuses
            .abi_encode_input(&[DynSolValue::Array(list), DynSolValue::Bool(register)])
            .map_err(|e| RegistryError::Abi(e.to_string()))
    }

    /// `registered(address)` calldata.
    pub fn registered(&self, address: Address) -> Result<Vec<u8>, RegistryError> {
        self.registered
            .abi_encode_input(&[DynSolValue::Address(address)])
            .map_err(|e| RegistryError::Abi(e.to_string()))
    }

    pub fn decode_registered(&self, data: &[u8]) -> Result<bool, RegistryError> {
        let values = self
            .registered
            .abi_decode_output(data, true)
            .map_err(|e| RegistryError::Abi(e.to_string()))?;
        values
            .first()
            .and_then(DynSolValue::as_bool)
            .ok_or_else(|| RegistryError::Abi("registered() did not return a bool".into()))
    }

    /// `owner()` calldata.
    pub fn owner(&self) -> Result<Vec<u8>, RegistryError> {
        self.owner
            .abi_encode_input(&[])
            .map_err(|e| RegistryError::Abi(e.to_string()))
    }

    pub fn decode_owner(&self, data: &[u8]) -> Result<Address, RegistryError> {
        let values = self
            .owner
            .abi_decode_output(data, true)
            .map_err(|e| RegistryError::Abi(e.to_string()))?;
        values
            .first()
            .and_then(DynSolValue::as_address)
            .ok_or_else(|| RegistryError::Abi("owner() did not return an address".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(last: &[u8]) -> Vec<u8> {
        let mut w = vec![0u8; 32 - last.len()];
        w.extend_from_slice(last);
        w
    }

    #[test]
    fn change_statuses_layout() {
        let abi = RegistryAbi::new().unwrap();
        let addrs = [Address::repeat_byte(0x11), Address::repeat_byte(0x22), Address::repeat_byte(0x33)];
        let data = abi.change_statuses(&addrs, true).unwrap();

        // selector, offset, bool, length, 3 elements
        assert_eq!(data.len(), 4 + 32 * 6);
        assert_eq!(&data[4..36], word(&[0x40]).as_slice());
        assert_eq!(&data[36..68], word(&[1]).as_slice());
        assert_eq!(&data[68..100], word(&[3]).as_slice());
        assert_eq!(&data[100..132], word(Address::repeat_byte(0x11).as_slice()).as_slice());
    }

    #[test]
    fn batch_size_changes_calldata_length() {
        let abi = RegistryAbi::new().unwrap();
        let one = abi.change_statuses(&[Address::ZERO], true).unwrap();
        let five = abi.change_statuses(&[Address::ZERO; 5], true).unwrap();
        assert_eq!(five.len() - one.len(), 4 * 32);
        assert_eq!(one[..4], five[..4]);
    }

    #[test]
    fn registered_roundtrip() {
        let abi = RegistryAbi::new().unwrap();
        let data = abi.registered(Address::repeat_byte(0x42)).unwrap();
        assert_eq!(data.len(), 36);
        assert!(abi.decode_registered(&word(&[1])).unwrap());
        assert!(!abi.decode_registered(&word(&[0])).unwrap());
    }

    #[test]
    fn decode_owner_word() {
        let abi = RegistryAbi::new().unwrap();
        let owner = Address::repeat_byte(0xab);
        assert_eq!(abi.decode_owner(&word(owner.as_slice())).unwrap(), owner);
        assert!(abi.decode_owner(&[]).is_err());
        assert_eq!(abi.owner().unwrap().len(), 4);
    }
}
