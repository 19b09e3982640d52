//! Share ledger: deposits, withdrawals and share transfers
//!
//! Each movement is stored as a fact keyed by the log/call id. A fact that
//! already exists means the input was re-delivered; positions are then left
//! untouched.

use alloy_primitives::{Address, U256};

use crate::{
    constants::ZERO_ADDRESS,
    entities::{Account, AccountVaultPosition, Deposit, Transfer, Withdrawal},
    indexer::Indexer,
    journal::LogType,
    reader::{ContractReader, SourceRegistrar, VaultView},
    store::{Entity, Store},
    types::{ShareTransfer, TransactionContext, VaultDeposit, VaultWithdraw},
    utils::{
        common::address_id,
        conversion::{assets_to_shares, shares_to_assets},
        error::IndexerResult,
    },
};

impl<S: Store, R: ContractReader, T: SourceRegistrar> Indexer<S, R, T> {
    /// Mints shares to the recipient (or the depositor).
    /// Returns `None` if the call was skipped.
    pub fn deposit(
        &mut self,
        deposit: &VaultDeposit,
        tx: &TransactionContext,
    ) -> IndexerResult<Option<Deposit>> {
        if self.is_minimal_proxy_call(&deposit.depositor, &deposit.vault)? {
            self.journal.append_note(
                Ok(()),
                LogType::Skipped,
                "Deposit is a delegated call between vaults.",
            );
            return Ok(None);
        }
        if self.already_recorded::<Deposit>(&tx.id())? {
            return Ok(None);
        }
        self.create_vault_if_needed(deposit.vault, tx)?;

        let amount = match deposit.amount {
            Some(amount) => amount,
            None => {
                let (total_assets, total_supply) = self.live_totals(deposit.vault);
                if total_supply.is_zero() {
                    self.note_zero_denominator("totalSupply", deposit.vault);
                }
                shares_to_assets(deposit.shares_out, total_assets, total_supply)
            }
        };
        let account = deposit.recipient.unwrap_or(deposit.depositor);

        self.update_position(account, deposit.vault, tx, |p| {
            p.mint(deposit.shares_out, amount);
        })?;

        let fact = Deposit {
            id: tx.id(),
            account,
            vault: deposit.vault,
            token_amount: amount,
            shares_minted: deposit.shares_out,
            block_number: tx.block_number,
            timestamp: tx.timestamp,
        };
        self.store.save(&fact)?;
        self.journal.append_note(
            Ok(()),
            LogType::EntityCreated,
            format!(
                "Deposit of {} into {} by {}.",
                amount, address_id(&deposit.vault), address_id(&account)
            ),
        );
        Ok(Some(fact))
    }

    /// Burns the withdrawer's shares.
    /// Returns `None` if the call was skipped.
    pub fn withdraw(
        &mut self,
        withdraw: &VaultWithdraw,
        tx: &TransactionContext,
    ) -> IndexerResult<Option<Withdrawal>> {
        if self.is_minimal_proxy_call(&withdraw.withdrawer, &withdraw.vault)? {
            self.journal.append_note(
                Ok(()),
                LogType::Skipped,
                "Withdrawal is a delegated call between vaults.",
            );
            return Ok(None);
        }
        if self.already_recorded::<Withdrawal>(&tx.id())? {
            return Ok(None);
        }
        self.create_vault_if_needed(withdraw.vault, tx)?;

        let shares = match withdraw.shares {
            Some(shares) => shares,
            None => {
                let (total_assets, total_supply) = self.live_totals(withdraw.vault);
                if total_assets.is_zero() {
                    self.note_zero_denominator("totalAssets", withdraw.vault);
                }
                assets_to_shares(withdraw.amount, total_assets, total_supply)
            }
        };

        self.update_position(withdraw.withdrawer, withdraw.vault, tx, |p| {
            p.burn(shares, withdraw.amount);
        })?;

        let fact = Withdrawal {
            id: tx.id(),
            account: withdraw.withdrawer,
            vault: withdraw.vault,
            token_amount: withdraw.amount,
            shares_burnt: shares,
            block_number: tx.block_number,
            timestamp: tx.timestamp,
        };
        self.store.save(&fact)?;
        self.journal.append_note(
            Ok(()),
            LogType::EntityCreated,
            format!(
                "Withdrawal of {} from {} by {}.",
                withdraw.amount, address_id(&withdraw.vault), address_id(&withdraw.withdrawer)
            ),
        );
        Ok(Some(fact))
    }

    /// Moves shares between two accounts. Mints and burns (a zero endpoint)
    /// are covered by the deposit and withdraw calls and are skipped here.
    pub fn transfer(
        &mut self,
        transfer: &ShareTransfer,
        tx: &TransactionContext,
    ) -> IndexerResult<Option<Transfer>> {
        if transfer.sender == ZERO_ADDRESS || transfer.receiver == ZERO_ADDRESS {
            self.journal.append_note(
                Ok(()),
                LogType::Skipped,
                "Transfer from or to the zero address.",
            );
            return Ok(None);
        }
        if self.already_recorded::<Transfer>(&tx.id())? {
            return Ok(None);
        }
        let vault = self.create_vault_if_needed(transfer.vault, tx)?;

        let (total_assets, total_supply) = self.live_totals(transfer.vault);
        if total_supply.is_zero() {
            self.note_zero_denominator("totalSupply", transfer.vault);
        }
        let amount = shares_to_assets(transfer.share_delta, total_assets, total_supply);

        self.update_position(transfer.sender, transfer.vault, tx, |p| {
            p.send(transfer.share_delta, amount);
        })?;
        self.update_position(transfer.receiver, transfer.vault, tx, |p| {
            p.receive(transfer.share_delta, amount);
        })?;

        let fact = Transfer {
            id: tx.id(),
            vault: transfer.vault,
            from: transfer.sender,
            to: transfer.receiver,
            token: vault.token,
            token_amount: amount,
            share_amount: transfer.share_delta,
            block_number: tx.block_number,
            timestamp: tx.timestamp,
        };
        self.store.save(&fact)?;
        self.journal.append_note(
            Ok(()),
            LogType::EntityCreated,
            format!(
                "Transfer of {} shares in {}.",
                transfer.share_delta, address_id(&transfer.vault)
            ),
        );
        Ok(Some(fact))
    }

    fn already_recorded<E: Entity>(&mut self, id: &str) -> IndexerResult<bool> {
        let exists = self.store.exists::<E>(id)?;
        if exists {
            self.journal.append_note(
                Ok(()),
                LogType::Warning,
                format!("{} {} was already recorded.", E::KIND, id),
            );
        }
        Ok(exists)
    }

    /// Live `(totalAssets, totalSupply)` of `vault`. A failed read counts as zero.
    fn live_totals(&mut self, vault: Address) -> (U256, U256) {
        let view = VaultView::new(&self.reader, vault);
        let total_assets = view.total_assets();
        let total_supply = view.total_supply();
        let mut read = |value: IndexerResult<U256>, name: &str| match value {
            Ok(value) => value,
            Err(err) => {
                self.journal.append_note(
                    Err(err),
                    LogType::Guarded,
                    format!("Could not read {} of vault {}.", name, address_id(&vault)),
                );
                U256::ZERO
            }
        };
        (read(total_assets, "totalAssets"), read(total_supply, "totalSupply"))
    }

    fn note_zero_denominator(&mut self, name: &str, vault: Address) {
        self.journal.append_note(
            Ok(()),
            LogType::Guarded,
            format!("{} of vault {} is zero.", name, address_id(&vault)),
        );
    }

    fn update_position<F: FnOnce(&mut AccountVaultPosition)>(
        &mut self,
        account: Address,
        vault: Address,
        tx: &TransactionContext,
        update: F,
    ) -> IndexerResult<()> {
        self.store
            .load_or_create(&address_id(&account), || Ok(Account { address: account }))?;
        let mut position = self
            .store
            .load_or_create(&AccountVaultPosition::build_id(&account, &vault), || {
                Ok(AccountVaultPosition::new(account, vault))
            })?
            .into_inner();
        update(&mut position);
        position.latest_transaction = tx.id();
        self.store.save(&position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        indexer::tests::{indexer_with, reverting_reader, tx_at},
        reader::{tests::encode_u256, MockContractReader},
        types::{totalAssetsCall, totalSupplyCall},
        utils::error::read_err,
    };
    use alloy_sol_types::SolCall;

    const VAULT: Address = Address::new([0xee; 20]);
    const ALICE: Address = Address::new([0xa1; 20]);
    const BOB: Address = Address::new([0xb0; 20]);

    fn totals_reader(total_assets: u64, total_supply: u64) -> MockContractReader {
        let mut reader = MockContractReader::new();
        reader.expect_call().returning(move |_, data| {
            if data == totalAssetsCall::SELECTOR.to_vec() {
                Ok(encode_u256(U256::from(total_assets)))
            } else if data == totalSupplyCall::SELECTOR.to_vec() {
                Ok(encode_u256(U256::from(total_supply)))
            } else {
                Err(read_err("unexpected call"))
            }
        });
        reader
    }

    fn position<S: Store, R: ContractReader, T: SourceRegistrar>(
        indexer: &Indexer<S, R, T>,
        account: Address,
    ) -> AccountVaultPosition {
        indexer
            .store()
            .load(&AccountVaultPosition::build_id(&account, &VAULT))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn deposit_with_amount_mints_to_recipient() {
        let mut indexer = indexer_with(reverting_reader());
        let deposit = VaultDeposit {
            vault: VAULT,
            depositor: ALICE,
            recipient: Some(BOB),
            amount: Some(U256::from(100u64)),
            shares_out: U256::from(90u64),
        };
        let fact = indexer.deposit(&deposit, &tx_at(1, 0)).unwrap().unwrap();

        assert_eq!(fact.account, BOB);
        let bob = position(&indexer, BOB);
        assert_eq!(bob.share_balance, U256::from(90u64));
        assert_eq!(bob.tokens_deposited, U256::from(100u64));
        assert_eq!(indexer.store().count::<Account>(), 1);
    }

    #[test]
    fn deposit_without_amount_uses_live_totals() {
        let mut indexer = indexer_with(totals_reader(2_000, 1_000));
        let deposit = VaultDeposit {
            vault: VAULT,
            depositor: ALICE,
            shares_out: U256::from(50u64),
            ..Default::default()
        };
        let fact = indexer.deposit(&deposit, &tx_at(1, 0)).unwrap().unwrap();

        assert_eq!(fact.token_amount, U256::from(100u64));
        assert_eq!(position(&indexer, ALICE).tokens_deposited, U256::from(100u64));
    }

    #[test]
    fn deposit_into_empty_vault_is_guarded() {
        let mut indexer = indexer_with(totals_reader(0, 0));
        let deposit = VaultDeposit {
            vault: VAULT,
            depositor: ALICE,
            shares_out: U256::from(50u64),
            ..Default::default()
        };
        let fact = indexer.deposit(&deposit, &tx_at(1, 0)).unwrap().unwrap();

        assert_eq!(fact.token_amount, U256::ZERO);
        assert!(indexer.journal().of_type(LogType::Guarded).count() >= 1);
    }

    #[test]
    fn redelivered_deposit_is_applied_once() {
        let mut indexer = indexer_with(reverting_reader());
        let deposit = VaultDeposit {
            vault: VAULT,
            depositor: ALICE,
            amount: Some(U256::from(100u64)),
            shares_out: U256::from(100u64),
            ..Default::default()
        };
        indexer.deposit(&deposit, &tx_at(1, 0)).unwrap();
        assert!(indexer.deposit(&deposit, &tx_at(1, 0)).unwrap().is_none());

        assert_eq!(position(&indexer, ALICE).share_balance, U256::from(100u64));
        assert_eq!(indexer.store().count::<Deposit>(), 1);
    }

    #[test]
    fn proxy_deposit_mutates_nothing() {
        let mut indexer = indexer_with(reverting_reader());
        let outer = Address::repeat_byte(0x01);
        indexer.create_vault_if_needed(outer, &tx_at(1, 0)).unwrap();
        indexer.create_vault_if_needed(VAULT, &tx_at(1, 1)).unwrap();

        let deposit = VaultDeposit {
            vault: VAULT,
            depositor: outer,
            amount: Some(U256::from(100u64)),
            shares_out: U256::from(100u64),
            ..Default::default()
        };
        assert!(indexer.deposit(&deposit, &tx_at(2, 0)).unwrap().is_none());
        assert_eq!(indexer.store().count::<Deposit>(), 0);
        assert_eq!(indexer.store().count::<Account>(), 0);
        assert_eq!(indexer.store().count::<AccountVaultPosition>(), 0);
    }

    #[test]
    fn withdraw_without_shares_uses_live_totals() {
        let mut indexer = indexer_with(totals_reader(2_000, 1_000));
        let withdraw = VaultWithdraw {
            vault: VAULT,
            withdrawer: ALICE,
            amount: U256::from(100u64),
            shares: None,
        };
        let fact = indexer.withdraw(&withdraw, &tx_at(1, 0)).unwrap().unwrap();

        assert_eq!(fact.shares_burnt, U256::from(50u64));
        assert_eq!(position(&indexer, ALICE).shares_burnt, U256::from(50u64));
    }

    #[test]
    fn withdraw_from_empty_vault_burns_the_amount() {
        let mut indexer = indexer_with(totals_reader(0, 0));
        let withdraw = VaultWithdraw {
            vault: VAULT,
            withdrawer: ALICE,
            amount: U256::from(100u64),
            shares: None,
        };
        let fact = indexer.withdraw(&withdraw, &tx_at(1, 0)).unwrap().unwrap();
        assert_eq!(fact.shares_burnt, U256::from(100u64));
    }

    #[test]
    fn transfer_moves_shares_between_positions() {
        let mut indexer = indexer_with(totals_reader(3_000, 1_000));
        let transfer = ShareTransfer {
            vault: VAULT,
            sender: ALICE,
            receiver: BOB,
            share_delta: U256::from(10u64),
        };
        let fact = indexer.transfer(&transfer, &tx_at(1, 0)).unwrap().unwrap();

        assert_eq!(fact.token_amount, U256::from(30u64));
        assert_eq!(position(&indexer, ALICE).shares_sent, U256::from(10u64));
        assert_eq!(position(&indexer, BOB).share_balance, U256::from(10u64));
        assert_eq!(position(&indexer, BOB).tokens_received, U256::from(30u64));
    }

    #[test]
    fn mint_and_burn_transfers_are_skipped() {
        let mut indexer = indexer_with(reverting_reader());
        let mint = ShareTransfer {
            vault: VAULT,
            sender: ZERO_ADDRESS,
            receiver: BOB,
            share_delta: U256::from(10u64),
        };
        assert!(indexer.transfer(&mint, &tx_at(1, 0)).unwrap().is_none());
        assert_eq!(indexer.store().count::<Transfer>(), 0);
        assert_eq!(indexer.store().count::<AccountVaultPosition>(), 0);
    }
}
