//! hashlink - A hash-linked, proof-of-work block chain
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Blockchain
//! - [`blockchain`] - Blocks, chain management, validation and the transfer ledger
//! - [`transaction`] - Transfer records carried by ledger blocks
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work target checks
//!
//! ## Cryptography
//! - [`crypto`] - SHA-256 digests with retry on primitive failure
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```
//! use hashlink::blockchain::Ledger;
//! use hashlink::config::ChainConfig;
//! use hashlink::transaction::TransferRecord;
//!
//! let mut ledger = Ledger::new(ChainConfig { difficulty: 1, mining_reward: 100 });
//! ledger.add_transaction(TransferRecord::new("alice", "bob", 40));
//! ledger.mine_pending("miner");
//!
//! assert!(ledger.is_valid());
//! assert_eq!(ledger.balance_of("bob"), 40);
//! assert_eq!(ledger.pending().len(), 1);
//! ```

#![forbid(unsafe_code)]

// ============================================================================
// Core Blockchain
// ============================================================================
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
