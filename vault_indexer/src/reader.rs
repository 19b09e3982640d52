//! External collaborators of the indexer: contract view reads and dynamic
//! source registration.
//!
//! Every read may fail. Callers decide what a failed read means and
//! substitute a default at the call site.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::{
    types::*,
    utils::{common::decode_abi_response, error::IndexerResult},
};

/// Synchronous `eth_call` against the block being processed
#[cfg_attr(test, mockall::automock)]
pub trait ContractReader {
    fn call(&self, to: Address, data: Vec<u8>) -> IndexerResult<Vec<u8>>;
}

/// Encodes `call`, sends it to `to` and decodes its return value
fn read<R: ContractReader + ?Sized, F: SolCall>(
    reader: &R,
    to: Address,
    call: F,
) -> IndexerResult<F::Return> {
    let response = reader.call(to, call.abi_encode())?;
    decode_abi_response::<F::Return, F>(&response)
}

/// Typed view of a vault contract
pub struct VaultView<'a, R: ContractReader + ?Sized> {
    reader: &'a R,
    address: Address,
}

impl<'a, R: ContractReader + ?Sized> VaultView<'a, R> {
    pub fn new(reader: &'a R, address: Address) -> Self {
        Self { reader, address }
    }

    pub fn total_assets(&self) -> IndexerResult<U256> {
        read(self.reader, self.address, totalAssetsCall {}).map(|data| data._0)
    }

    pub fn total_supply(&self) -> IndexerResult<U256> {
        read(self.reader, self.address, totalSupplyCall {}).map(|data| data._0)
    }

    pub fn price_per_share(&self) -> IndexerResult<U256> {
        read(self.reader, self.address, pricePerShareCall {}).map(|data| data._0)
    }

    pub fn token(&self) -> IndexerResult<Address> {
        read(self.reader, self.address, tokenCall {}).map(|data| data._0)
    }

    /// Live `(totalAssets, totalSupply)`, each zero when unreadable
    pub fn totals(&self) -> (U256, U256) {
        (
            self.total_assets().unwrap_or(U256::ZERO),
            self.total_supply().unwrap_or(U256::ZERO),
        )
    }
}

/// Typed view of a strategy contract
pub struct StrategyView<'a, R: ContractReader + ?Sized> {
    reader: &'a R,
    address: Address,
}

impl<'a, R: ContractReader + ?Sized> StrategyView<'a, R> {
    pub fn new(reader: &'a R, address: Address) -> Self {
        Self { reader, address }
    }

    pub fn name(&self) -> IndexerResult<String> {
        read(self.reader, self.address, nameCall {}).map(|data| data._0)
    }

    pub fn health_check(&self) -> IndexerResult<Address> {
        read(self.reader, self.address, healthCheckCall {}).map(|data| data._0)
    }

    pub fn do_health_check(&self) -> IndexerResult<bool> {
        read(self.reader, self.address, doHealthCheckCall {}).map(|data| data._0)
    }

    pub fn vault(&self) -> IndexerResult<Address> {
        read(self.reader, self.address, vaultCall {}).map(|data| data._0)
    }
}

/// Contract whose events the ingestion layer should start delivering
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Vault(Address),
    Strategy(Address),
}

/// Registers new event sources with the ingestion layer. Fire-and-forget.
pub trait SourceRegistrar {
    fn register(&mut self, source: DataSource);
}

/// Registrar that records the sources for the host to pick up
#[derive(Clone, Debug, Default)]
pub struct PendingSources {
    sources: Vec<DataSource>,
}

impl PendingSources {
    pub fn sources(&self) -> &[DataSource] {
        &self.sources
    }

    pub fn take(&mut self) -> Vec<DataSource> {
        std::mem::take(&mut self.sources)
    }
}

impl SourceRegistrar for PendingSources {
    fn register(&mut self, source: DataSource) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::utils::error::{read_err, IndexerError};

    /// ABI encoding of a single `uint256` return value
    pub fn encode_u256(value: U256) -> Vec<u8> {
        value.to_be_bytes::<32>().to_vec()
    }

    /// ABI encoding of a single `address` return value
    pub fn encode_address(address: Address) -> Vec<u8> {
        let mut word = vec![0u8; 12];
        word.extend_from_slice(address.as_slice());
        word
    }

    /// ABI encoding of a single `bool` return value
    pub fn encode_bool(value: bool) -> Vec<u8> {
        encode_u256(U256::from(value as u8))
    }

    /// ABI encoding of a single `string` return value
    pub fn encode_string(value: &str) -> Vec<u8> {
        let mut data = encode_u256(U256::from(32u64));
        data.extend(encode_u256(U256::from(value.len())));
        let mut bytes = value.as_bytes().to_vec();
        let padded_len = bytes.len().div_ceil(32) * 32;
        bytes.resize(padded_len, 0);
        data.extend(bytes);
        data
    }

    fn selector_of<F: SolCall>() -> Vec<u8> {
        F::SELECTOR.to_vec()
    }

    #[test]
    fn vault_view_decodes_totals() {
        let vault = Address::repeat_byte(0x01);
        let mut reader = MockContractReader::new();
        reader.expect_call().returning(move |to, data| {
            assert_eq!(to, vault);
            if data == selector_of::<totalAssetsCall>() {
                Ok(encode_u256(U256::from(2_000u64)))
            } else if data == selector_of::<totalSupplyCall>() {
                Ok(encode_u256(U256::from(1_000u64)))
            } else {
                Err(read_err("unexpected call"))
            }
        });

        let view = VaultView::new(&reader, vault);
        assert_eq!(view.total_assets().unwrap(), U256::from(2_000u64));
        assert_eq!(view.totals(), (U256::from(2_000u64), U256::from(1_000u64)));
        assert!(view.price_per_share().is_err());
    }

    #[test]
    fn failed_totals_read_as_zero() {
        let mut reader = MockContractReader::new();
        reader
            .expect_call()
            .returning(|_, _| Err(read_err("execution reverted")));

        let view = VaultView::new(&reader, Address::ZERO);
        assert_eq!(view.totals(), (U256::ZERO, U256::ZERO));
    }

    #[test]
    fn strategy_view_decodes_name_and_health_check() {
        let health_check = Address::repeat_byte(0x0c);
        let mut reader = MockContractReader::new();
        reader.expect_call().returning(move |_, data| {
            if data == selector_of::<nameCall>() {
                Ok(encode_string("StrategyCurveUSDC"))
            } else if data == selector_of::<healthCheckCall>() {
                Ok(encode_address(health_check))
            } else if data == selector_of::<doHealthCheckCall>() {
                Ok(encode_bool(true))
            } else {
                Err(read_err("unexpected call"))
            }
        });

        let view = StrategyView::new(&reader, Address::repeat_byte(0x0a));
        assert_eq!(view.name().unwrap(), "StrategyCurveUSDC");
        assert_eq!(view.health_check().unwrap(), health_check);
        assert!(view.do_health_check().unwrap());
    }

    #[test]
    fn truncated_response_is_a_read_failure() {
        let mut reader = MockContractReader::new();
        reader.expect_call().returning(|_, _| Ok(vec![0u8; 4]));

        let view = VaultView::new(&reader, Address::ZERO);
        assert!(matches!(
            view.total_supply(),
            Err(IndexerError::ExternalReadFailed(_))
        ));
    }

    #[test]
    fn pending_sources_deduplicates() {
        let mut sources = PendingSources::default();
        sources.register(DataSource::Strategy(Address::repeat_byte(1)));
        sources.register(DataSource::Strategy(Address::repeat_byte(1)));
        sources.register(DataSource::Vault(Address::repeat_byte(1)));

        assert_eq!(sources.sources().len(), 2);
        assert_eq!(sources.take().len(), 2);
        assert!(sources.sources().is_empty());
    }
}
