use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::transaction::TransferRecord;
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::info;

use super::block::Block;
use super::chain::Blockchain;

/// A committed transfer together with the height of the block holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry<'a> {
    pub height: usize,
    pub record: &'a TransferRecord,
}

/// A mined chain of transfer records plus the pool of records waiting for
/// the next mining round.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Blockchain<Vec<TransferRecord>>,
    pending: Vec<TransferRecord>,
}

impl Ledger {
    pub fn new(config: ChainConfig) -> Self {
        Self::from_chain(Blockchain::new(config))
    }

    /// Wraps an existing chain with an empty pending pool.
    pub fn from_chain(chain: Blockchain<Vec<TransferRecord>>) -> Self {
        Ledger {
            chain,
            pending: Vec::new(),
        }
    }

    pub fn chain(&self) -> &Blockchain<Vec<TransferRecord>> {
        &self.chain
    }

    pub fn blocks(&self) -> &[Block<Vec<TransferRecord>>] {
        self.chain.blocks()
    }

    pub fn config(&self) -> &ChainConfig {
        self.chain.config()
    }

    /// Records waiting for the next mining round, in submission order.
    pub fn pending(&self) -> &[TransferRecord] {
        &self.pending
    }

    /// Queues `record` for the next round. Balances are not checked.
    pub fn add_transaction(&mut self, record: TransferRecord) {
        self.pending.push(record);
    }

    /// Runs a mining round stamped now. See [`Ledger::mine_pending_at`].
    pub fn mine_pending(&mut self, reward_address: &str) -> &Block<Vec<TransferRecord>> {
        self.mine_pending_at(Utc::now(), reward_address)
    }

    /// Bundles every pending record into a mined block, then seeds the pool
    /// with the reward for `reward_address`. The reward is committed by the
    /// following round.
    pub fn mine_pending_at(
        &mut self,
        timestamp: DateTime<Utc>,
        reward_address: &str,
    ) -> &Block<Vec<TransferRecord>> {
        let transactions = std::mem::take(&mut self.pending);
        let count = transactions.len();
        self.chain.mine_block(timestamp, transactions);

        let reward = self.chain.config().mining_reward;
        self.pending = vec![TransferRecord::reward(reward_address, reward)];
        info!(
            "Mining round committed {} transaction(s) at height {}; queued reward of {} for {}",
            count,
            self.chain.height(),
            reward,
            reward_address
        );
        self.chain.tip()
    }

    /// Net amount received by `address` over all committed blocks.
    ///
    /// Pending records are ignored. The result may be negative. Summed as
    /// `i128`, so no sequence of `i64` amounts can overflow it.
    pub fn balance_of(&self, address: &str) -> i128 {
        self.chain
            .iter()
            .flat_map(|block| block.payload().iter())
            .map(|record| record.balance_delta(address))
            .sum()
    }

    /// Committed records sent from or to `address`, oldest first.
    pub fn history_of<'a>(&'a self, address: &'a str) -> impl Iterator<Item = LedgerEntry<'a>> + 'a {
        self.chain
            .iter()
            .enumerate()
            .flat_map(|(height, block)| {
                block
                    .payload()
                    .iter()
                    .map(move |record| LedgerEntry { height, record })
            })
            .filter(move |entry| entry.record.from == address || entry.record.to == address)
    }

    pub fn is_valid(&self) -> bool {
        self.chain.is_valid()
    }

    pub fn verify(&self) -> Result<(), ChainError> {
        self.chain.verify()
    }

    pub fn to_json(&self) -> Result<String, ChainError> {
        self.chain.to_json()
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn config(difficulty: u32) -> ChainConfig {
        ChainConfig {
            difficulty,
            mining_reward: 100,
        }
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = Ledger::new(config(0));
        assert_eq!(ledger.blocks().len(), 1);
        assert!(ledger.pending().is_empty());
        assert!(ledger.blocks()[0].payload().is_empty());
        assert_eq!(ledger.balance_of("anyone"), 0);
    }

    #[test]
    fn test_add_transaction_only_queues() {
        let mut ledger = Ledger::new(config(0));
        ledger.add_transaction(TransferRecord::new("a", "b", 10));
        ledger.add_transaction(TransferRecord::new("b", "c", 5));
        assert_eq!(ledger.pending().len(), 2);
        assert_eq!(ledger.blocks().len(), 1);
        assert_eq!(ledger.balance_of("b"), 0);
    }

    #[test]
    fn test_mining_round_commits_pending_in_order() {
        let mut ledger = Ledger::new(config(1));
        let first = TransferRecord::new("a", "b", 10);
        let second = TransferRecord::new("b", "a", 4);
        ledger.add_transaction(first.clone());
        ledger.add_transaction(second.clone());

        let block = ledger.mine_pending_at(at(1), "miner");
        assert_eq!(block.payload(), &vec![first, second]);
        assert!(block.hash().starts_with('0'));
        assert!(ledger.is_valid());
        assert!(ledger.verify().is_ok());
    }

    #[test]
    fn test_pending_reset_to_single_reward() {
        let mut ledger = Ledger::new(config(0));
        ledger.add_transaction(TransferRecord::new("a", "b", 10));
        ledger.mine_pending_at(at(1), "miner");
        assert_eq!(ledger.pending(), &[TransferRecord::reward("miner", 100)]);

        ledger.mine_pending_at(at(2), "other");
        assert_eq!(ledger.pending(), &[TransferRecord::reward("other", 100)]);
        assert_eq!(ledger.blocks()[2].payload(), &vec![TransferRecord::reward("miner", 100)]);
    }

    #[test]
    fn test_overdraft_is_reported_not_prevented() {
        let mut ledger = Ledger::new(config(0));
        ledger.add_transaction(TransferRecord::new("broke", "rich", 500));
        ledger.mine_pending_at(at(1), "miner");
        assert_eq!(ledger.balance_of("broke"), -500);
        assert_eq!(ledger.balance_of("rich"), 500);
    }

    #[test]
    fn test_balance_with_extreme_amounts() {
        let mut ledger = Ledger::new(config(0));
        ledger.add_transaction(TransferRecord::new("a", "b", i64::MIN));
        ledger.add_transaction(TransferRecord::new("c", "d", i64::MAX));
        ledger.add_transaction(TransferRecord::new("c", "d", 1));
        ledger.mine_pending_at(at(1), "r");

        assert_eq!(ledger.balance_of("a"), -i128::from(i64::MIN));
        assert_eq!(ledger.balance_of("b"), i128::from(i64::MIN));
        assert_eq!(ledger.balance_of("d"), i128::from(i64::MAX) + 1);
        assert_eq!(ledger.balance_of("c"), -(i128::from(i64::MAX) + 1));
    }

    #[test]
    fn test_reward_uses_configured_amount() {
        let mut ledger = Ledger::new(ChainConfig {
            difficulty: 0,
            mining_reward: 25,
        });
        ledger.mine_pending_at(at(1), "miner");
        ledger.mine_pending_at(at(2), "miner");
        assert_eq!(ledger.balance_of("miner"), 25);
    }

    #[test]
    fn test_history_of_address() {
        let mut ledger = Ledger::new(config(0));
        ledger.add_transaction(TransferRecord::new("a", "b", 10));
        ledger.add_transaction(TransferRecord::new("c", "d", 1));
        ledger.mine_pending_at(at(1), "a");
        ledger.add_transaction(TransferRecord::new("b", "a", 3));
        ledger.mine_pending_at(at(2), "z");

        let history: Vec<(usize, i64)> = ledger
            .history_of("a")
            .map(|entry| (entry.height, entry.record.amount))
            .collect();
        assert_eq!(history, vec![(1, 10), (2, 100), (2, 3)]);
    }

    #[test]
    fn test_display_labels_transactions() {
        let mut ledger = Ledger::new(config(0));
        ledger.add_transaction(TransferRecord::new("address1", "address2", 100));
        ledger.mine_pending_at(at(1), "reward_address");
        let rendered = ledger.to_string();
        assert!(rendered.contains(
            "transactions: \n\tfrom_address: address1, to_address: address2, amount: 100"
        ));
    }
}
